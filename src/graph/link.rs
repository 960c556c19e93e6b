//! Link type and related structures.
//!
//! Links are the springs between nodes. Each link has:
//! - A stable identifier, stamped lazily on first synchronization
//! - Source and target indices into the simulation's node list

use std::fmt;

/// Stable link identifier.
///
/// Assigned once per link and never reused within a layout instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(pub u32);

impl LinkId {
    /// Create a new LinkId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link({})", self.0)
    }
}

impl From<u32> for LinkId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<LinkId> for u32 {
    #[inline]
    fn from(id: LinkId) -> Self {
        id.0
    }
}

/// A spring between two nodes, addressed by their index in the node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Stable identifier, `None` until first synchronization.
    pub id: Option<LinkId>,
    pub source: usize,
    pub target: usize,
}

impl Link {
    /// Create a link between two node indices.
    pub fn new(source: usize, target: usize) -> Self {
        Self {
            id: None,
            source,
            target,
        }
    }

    /// Whether this link touches the node at `index`.
    #[inline]
    pub fn touches(&self, index: usize) -> bool {
        self.source == index || self.target == index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_id() {
        let id = LinkId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "Link(42)");
    }

    #[test]
    fn test_new_link_has_no_id() {
        let link = Link::new(0, 3);
        assert_eq!(link.id, None);
        assert!(link.touches(0));
        assert!(link.touches(3));
        assert!(!link.touches(1));
    }
}

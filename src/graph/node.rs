//! Node type and related structures.
//!
//! Nodes are the vertices handed to a force simulation. Each node has:
//! - A stable identifier, stamped lazily on first synchronization
//! - Position (x, y) and previous position (px, py) for Verlet integration
//! - An optional depth (z) fed back by the 3D synchronizer
//! - Interaction state (fixed, hovered, dragging)

use std::fmt;

/// Stable node identifier.
///
/// Assigned once per node and never reused within a layout instance.
/// It wraps a u32 for efficient storage and WebAssembly interop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
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

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Node interaction flags packed into a single byte.
///
/// A node with any flag set is held at its previous position by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    flags: u8,
}

impl NodeState {
    const FIXED: u8 = 0b0000_0001;
    const HOVERED: u8 = 0b0000_0010;
    const DRAGGING: u8 = 0b0000_0100;

    /// Create a new default node state.
    #[inline]
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    /// Check if the node is excluded from integration for any reason.
    #[inline]
    pub fn is_held(self) -> bool {
        self.flags != 0
    }

    /// Check if the node is fixed by the host.
    #[inline]
    pub fn is_fixed(self) -> bool {
        self.flags & Self::FIXED != 0
    }

    /// Set the fixed state.
    #[inline]
    pub fn set_fixed(&mut self, fixed: bool) {
        self.set(Self::FIXED, fixed);
    }

    /// Check if the pointer is over the node.
    #[inline]
    pub fn is_hovered(self) -> bool {
        self.flags & Self::HOVERED != 0
    }

    /// Set the hovered state.
    #[inline]
    pub fn set_hovered(&mut self, hovered: bool) {
        self.set(Self::HOVERED, hovered);
    }

    /// Check if the node is being dragged.
    #[inline]
    pub fn is_dragging(self) -> bool {
        self.flags & Self::DRAGGING != 0
    }

    /// Set the dragging state.
    #[inline]
    pub fn set_dragging(&mut self, dragging: bool) {
        self.set(Self::DRAGGING, dragging);
    }

    #[inline]
    fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }
}

/// A simulated node.
///
/// `px`/`py` hold the previous position; velocity is implicit as
/// `(x - px, y - py)`. A node built with [`Node::new`] has no position yet
/// and is placed by the engine on `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Stable identifier, `None` until first synchronization.
    pub id: Option<NodeId>,
    pub x: f32,
    pub y: f32,
    pub px: f32,
    pub py: f32,
    /// Depth written back by the 3D synchronizer, or seeded by the host.
    pub z: Option<f32>,
    /// Number of links touching this node, computed on `start`.
    pub weight: u32,
    pub state: NodeState,
    placed: bool,
}

impl Node {
    /// Create an unplaced node. The engine assigns its position on start.
    pub fn new() -> Self {
        Self {
            id: None,
            x: 0.0,
            y: 0.0,
            px: 0.0,
            py: 0.0,
            z: None,
            weight: 0,
            state: NodeState::new(),
            placed: false,
        }
    }

    /// Create a node at rest at the given position.
    pub fn at(x: f32, y: f32) -> Self {
        Self::with_previous(x, y, x, y)
    }

    /// Create a node with an explicit previous position.
    pub fn with_previous(x: f32, y: f32, px: f32, py: f32) -> Self {
        Self {
            x,
            y,
            px,
            py,
            placed: true,
            ..Self::new()
        }
    }

    /// Seed the depth used when the node is first synchronized.
    pub fn with_z(mut self, z: f32) -> Self {
        self.z = Some(z);
        self
    }

    /// Whether the node has a position.
    #[inline]
    pub fn is_placed(&self) -> bool {
        self.placed
    }

    /// Place the node at rest at the given position.
    pub fn place(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.px = x;
        self.py = y;
        self.placed = true;
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

//! R-tree based spatial index using the rstar crate.
//!
//! Provides O(log n) spatial queries for:
//! - Nearest neighbor (pointer hit testing)
//! - Point-in-radius (charge neighbourhoods)

use rstar::{AABB, PointDistance, RTree, RTreeObject};

/// A node position in the spatial index, tagged with its slot in the node list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePoint {
    /// Index of the node in the simulation's node list.
    pub slot: usize,
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl NodePoint {
    /// Create a new NodePoint.
    pub fn new(slot: usize, x: f32, y: f32) -> Self {
        Self { slot, x, y }
    }
}

impl RTreeObject for NodePoint {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for NodePoint {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        (self.x - point[0]).abs() < f32::EPSILON && (self.y - point[1]).abs() < f32::EPSILON
    }
}

/// Spatial index over node positions.
///
/// Uses an R*-tree. Positions move every tick, so the index is bulk-loaded
/// from a snapshot rather than updated incrementally.
pub struct SpatialIndex {
    tree: RTree<NodePoint>,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Build an index from node slots and positions.
    pub fn from_points(points: impl IntoIterator<Item = (usize, f32, f32)>) -> Self {
        let mut index = Self::new();
        index.rebuild(points);
        index
    }

    /// Find the nearest node within a maximum distance.
    pub fn nearest_within(&self, x: f32, y: f32, max_distance: f32) -> Option<usize> {
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&[x, y])
            .filter(|point| point.distance_2(&[x, y]) <= max_distance_sq)
            .map(|point| point.slot)
    }

    /// Visit all nodes within a radius of a point.
    pub fn in_radius(&self, x: f32, y: f32, radius: f32) -> impl Iterator<Item = &NodePoint> {
        self.tree.locate_within_distance([x, y], radius * radius)
    }

    /// Rebuild the index from `(slot, x, y)` tuples.
    pub fn rebuild(&mut self, points: impl IntoIterator<Item = (usize, f32, f32)>) {
        let node_points: Vec<_> = points
            .into_iter()
            .map(|(slot, x, y)| NodePoint::new(slot, x, y))
            .collect();

        self.tree = RTree::bulk_load(node_points);
    }

    /// Get the number of nodes in the index.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

//! Spatial indexing for neighbourhood queries and hit testing.
//!
//! This module provides an R-tree based spatial index used by the charge
//! force (bounded by the charge distance) and by pointer picking.

mod rtree;

pub use rtree::{NodePoint, SpatialIndex};

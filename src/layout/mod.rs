//! Layout algorithms for graph visualization.
//!
//! This module composes planar force simulations into higher-dimensional
//! layouts. Positions are integrated in place on the simulation's node
//! records and can be read back per tick for rendering.

pub mod force3d;

pub use force3d::{Force3d, ShadowLink, ShadowNode};

//! Graph records shared by the force simulations.
//!
//! Nodes and links are plain records owned by a simulation engine. Their
//! stable identifiers are optional and stamped lazily by the 3D
//! synchronizer, so hosts can hand over raw records.

mod link;
mod node;

pub use link::{Link, LinkId};
pub use node::{Node, NodeId, NodeState};

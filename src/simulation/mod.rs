//! Planar force simulation.
//!
//! [`ForceSimulation`] is the contract the 3D synchronizer drives: node and
//! link collections, parameters, the start/resume/stop lifecycle, single
//! stepping, and event registration. [`ForceLayout`] is the bundled
//! implementation.

mod config;
mod events;
mod force;

pub use config::ForceConfig;
pub use events::{Dispatcher, EventHandler, EventKind, ForceEvent};
pub use force::ForceLayout;

use crate::error::LayoutError;
use crate::graph::{Link, Node};

/// A 2D force simulation over shared node and link records.
///
/// Engines integrate by mutating their own node records in place, so a
/// caller that reads `nodes()` after a tick observes the new positions.
pub trait ForceSimulation {
    /// Active nodes.
    fn nodes(&self) -> &[Node];

    /// Mutable access to the active node list.
    fn nodes_mut(&mut self) -> &mut Vec<Node>;

    /// Active links, with endpoints as indices into `nodes()`.
    fn links(&self) -> &[Link];

    /// Mutable access to the active link list.
    fn links_mut(&mut self) -> &mut Vec<Link>;

    /// Current parameters.
    fn config(&self) -> &ForceConfig;

    /// Mutable access to the parameters.
    fn config_mut(&mut self) -> &mut ForceConfig;

    /// Current temperature; zero when cooled.
    fn alpha(&self) -> f32;

    /// Set the temperature, emitting `Start` or `End` on transitions.
    fn set_alpha(&mut self, alpha: f32);

    /// Seed per-node state (weights, missing positions) and resume.
    fn start(&mut self) -> Result<(), LayoutError>;

    /// Run one integration step.
    ///
    /// Returns the emitted tick event, or `None` once the simulation has
    /// cooled (or was never started).
    fn tick(&mut self) -> Option<ForceEvent>;

    /// Install or clear the handler for an event kind.
    fn on(&mut self, kind: EventKind, handler: Option<EventHandler>);

    /// Reheat to the resume temperature.
    fn resume(&mut self) {
        self.set_alpha(RESUME_ALPHA);
    }

    /// Cool immediately.
    fn stop(&mut self) {
        self.set_alpha(0.0);
    }

    /// Replace the node list.
    fn set_nodes(&mut self, nodes: Vec<Node>) {
        *self.nodes_mut() = nodes;
    }

    /// Replace the link list.
    fn set_links(&mut self, links: Vec<Link>) {
        *self.links_mut() = links;
    }

    /// Replace all parameters. Invalid parameters are rejected and the
    /// current ones kept.
    fn configure(&mut self, config: ForceConfig) -> Result<(), LayoutError> {
        config.validate()?;
        *self.config_mut() = config;
        Ok(())
    }

    /// Apply `change` to a copy of the parameters and keep it if valid.
    fn update_config(&mut self, change: impl FnOnce(&mut ForceConfig)) -> Result<(), LayoutError> {
        let mut config = self.config().clone();
        change(&mut config);
        self.configure(config)
    }

    fn set_size(&mut self, width: f32, height: f32) -> Result<(), LayoutError> {
        self.update_config(|c| c.size = [width, height])
    }

    fn set_link_distance(&mut self, distance: f32) -> Result<(), LayoutError> {
        self.update_config(|c| c.link_distance = distance)
    }

    fn set_link_strength(&mut self, strength: f32) -> Result<(), LayoutError> {
        self.update_config(|c| c.link_strength = strength)
    }

    fn set_friction(&mut self, friction: f32) -> Result<(), LayoutError> {
        self.update_config(|c| c.friction = friction)
    }

    fn set_charge(&mut self, charge: f32) -> Result<(), LayoutError> {
        self.update_config(|c| c.charge = charge)
    }

    fn set_charge_distance(&mut self, distance: Option<f32>) -> Result<(), LayoutError> {
        self.update_config(|c| c.charge_distance = distance)
    }

    fn set_gravity(&mut self, gravity: f32) -> Result<(), LayoutError> {
        self.update_config(|c| c.gravity = gravity)
    }

    /// Append a node and return its index.
    fn add_node(&mut self, node: Node) -> usize {
        let nodes = self.nodes_mut();
        nodes.push(node);
        nodes.len() - 1
    }

    /// Append a link between existing nodes and return its index.
    fn add_link(&mut self, link: Link) -> Result<usize, LayoutError> {
        let node_count = self.nodes().len();
        if link.source >= node_count || link.target >= node_count {
            return Err(LayoutError::LinkOutOfRange {
                link: self.links().len(),
                from: link.source,
                to: link.target,
                nodes: node_count,
            });
        }

        let links = self.links_mut();
        links.push(link);
        Ok(links.len() - 1)
    }

    /// Remove a node and every link touching it.
    ///
    /// Links to later nodes are reindexed so they keep their endpoints.
    fn remove_node(&mut self, index: usize) -> Result<Node, LayoutError> {
        let node_count = self.nodes().len();
        if index >= node_count {
            return Err(LayoutError::NodeOutOfRange {
                index,
                nodes: node_count,
            });
        }

        let node = self.nodes_mut().remove(index);
        let links = self.links_mut();
        links.retain(|link| !link.touches(index));
        for link in links.iter_mut() {
            if link.source > index {
                link.source -= 1;
            }
            if link.target > index {
                link.target -= 1;
            }
        }
        Ok(node)
    }

    /// Remove a link by index.
    fn remove_link(&mut self, index: usize) -> Result<Link, LayoutError> {
        let link_count = self.links().len();
        if index >= link_count {
            return Err(LayoutError::LinkIndexOutOfRange {
                index,
                links: link_count,
            });
        }
        Ok(self.links_mut().remove(index))
    }
}

/// Temperature set by `resume` and `start`.
pub const RESUME_ALPHA: f32 = 0.1;

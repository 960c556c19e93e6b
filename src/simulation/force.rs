//! Verlet-integrated force-directed layout.
//!
//! Each tick cools the simulation and applies, in order:
//!
//! 1. **Link constraints:** Gauss-Seidel relaxation of every link toward its
//!    rest length, split between the endpoints by degree so hubs move less.
//! 2. **Gravity:** a pull toward the centre of the layout area.
//! 3. **Charge:** pairwise inverse-square repulsion applied to the previous
//!    positions, bounded by the charge distance through an R-tree query.
//! 4. **Integration:** position Verlet with friction. Held nodes snap back
//!    to their previous position.
//!
//! The simulation stops once alpha decays below [`ALPHA_MIN`].

use log::debug;
use petgraph::graph::{NodeIndex, UnGraph};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::ForceConfig;
use super::events::{Dispatcher, EventHandler, EventKind, ForceEvent};
use super::ForceSimulation;
use crate::error::LayoutError;
use crate::graph::{Link, Node};
use crate::spatial::SpatialIndex;

/// Multiplier applied to alpha on every tick.
pub const ALPHA_DECAY: f32 = 0.99;

/// Below this temperature the simulation ends.
pub const ALPHA_MIN: f32 = 0.005;

/// Offset applied when a node is placed on a neighbour, so the two can separate.
const PLACEMENT_JITTER: f32 = 0.5;

/// The bundled planar force simulation.
pub struct ForceLayout {
    nodes: Vec<Node>,
    links: Vec<Link>,
    config: ForceConfig,
    alpha: f32,
    events: Dispatcher,
    rng: StdRng,
}

impl ForceLayout {
    /// Create an empty simulation with default parameters.
    pub fn new() -> Self {
        Self::with_config(ForceConfig::default())
    }

    /// Create an empty simulation with the given parameters.
    pub fn with_config(config: ForceConfig) -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            alpha: 0.0,
            events: Dispatcher::new(),
        }
    }

    /// Whether the simulation is running.
    pub fn is_running(&self) -> bool {
        self.alpha > 0.0
    }

    fn check_links(&self) -> Result<(), LayoutError> {
        let node_count = self.nodes.len();
        match self
            .links
            .iter()
            .position(|link| link.source >= node_count || link.target >= node_count)
        {
            Some(index) => Err(LayoutError::LinkOutOfRange {
                link: index,
                from: self.links[index].source,
                to: self.links[index].target,
                nodes: node_count,
            }),
            None => Ok(()),
        }
    }

    /// Give every unplaced node a position: next to its first placed
    /// neighbour, or uniformly at random inside the layout area.
    fn place_unplaced(&mut self) {
        if self.nodes.iter().all(Node::is_placed) {
            return;
        }

        let mut neighbors = UnGraph::<(), ()>::with_capacity(self.nodes.len(), self.links.len());
        for _ in 0..self.nodes.len() {
            neighbors.add_node(());
        }
        for link in &self.links {
            neighbors.add_edge(NodeIndex::new(link.source), NodeIndex::new(link.target), ());
        }

        let [width, height] = self.config.size;
        for i in 0..self.nodes.len() {
            if self.nodes[i].is_placed() {
                continue;
            }

            let anchor = neighbors
                .neighbors(NodeIndex::new(i))
                .map(|n| &self.nodes[n.index()])
                .find(|n| n.is_placed())
                .map(|n| (n.x, n.y));

            let (x, y) = match anchor {
                Some((x, y)) => (
                    x + self.rng.gen_range(-PLACEMENT_JITTER..PLACEMENT_JITTER),
                    y + self.rng.gen_range(-PLACEMENT_JITTER..PLACEMENT_JITTER),
                ),
                None => (self.rng.r#gen::<f32>() * width, self.rng.r#gen::<f32>() * height),
            };
            self.nodes[i].place(x, y);
        }
    }

    fn apply_links(&mut self, alpha: f32) {
        let distance = self.config.link_distance;
        let strength = self.config.link_strength;

        for link in &self.links {
            let (s, t) = (link.source, link.target);
            if s == t {
                continue;
            }
            // Links added after `start` are not validated yet.
            let (Some(source), Some(target)) = (self.nodes.get(s), self.nodes.get(t)) else {
                continue;
            };

            let mut dx = target.x - source.x;
            let mut dy = target.y - source.y;
            let length_sq = dx * dx + dy * dy;
            if length_sq <= 0.0 {
                continue;
            }

            let length = length_sq.sqrt();
            let scale = alpha * strength * (length - distance) / length;
            dx *= scale;
            dy *= scale;

            let (ws, wt) = (source.weight as f32, target.weight as f32);
            let k = if ws + wt > 0.0 { ws / (ws + wt) } else { 0.5 };

            let target = &mut self.nodes[t];
            target.x -= dx * k;
            target.y -= dy * k;
            let source = &mut self.nodes[s];
            source.x += dx * (1.0 - k);
            source.y += dy * (1.0 - k);
        }
    }

    fn apply_gravity(&mut self, alpha: f32) {
        let k = alpha * self.config.gravity;
        if k == 0.0 {
            return;
        }

        let cx = self.config.size[0] / 2.0;
        let cy = self.config.size[1] / 2.0;
        for node in &mut self.nodes {
            node.x += (cx - node.x) * k;
            node.y += (cy - node.y) * k;
        }
    }

    fn apply_charge(&mut self, alpha: f32) {
        let charge = self.config.charge;
        if charge == 0.0 || self.nodes.len() < 2 {
            return;
        }

        let k = alpha * charge;
        let positions: Vec<(f32, f32)> = self.nodes.iter().map(|n| (n.x, n.y)).collect();
        let radius = self.config.charge_distance;
        let index = radius.map(|_| {
            SpatialIndex::from_points(positions.iter().enumerate().map(|(i, &(x, y))| (i, x, y)))
        });

        for (i, node) in self.nodes.iter_mut().enumerate() {
            if node.state.is_held() {
                continue;
            }

            let (x, y) = positions[i];
            match (&index, radius) {
                (Some(index), Some(radius)) => {
                    for other in index.in_radius(x, y, radius).filter(|p| p.slot != i) {
                        repulse(node, other.x - x, other.y - y, k);
                    }
                }
                _ => {
                    for (j, &(ox, oy)) in positions.iter().enumerate() {
                        if j != i {
                            repulse(node, ox - x, oy - y, k);
                        }
                    }
                }
            }
        }
    }

    fn integrate(&mut self) {
        let friction = self.config.friction;
        for node in &mut self.nodes {
            if node.state.is_held() {
                node.x = node.px;
                node.y = node.py;
            } else {
                let (x, y) = (node.x, node.y);
                node.x += (x - node.px) * friction;
                node.y += (y - node.py) * friction;
                node.px = x;
                node.py = y;
            }
        }
    }
}

/// Push a node's previous position toward `(dx, dy)`, which with a negative
/// charge accelerates it away from the other node.
#[inline]
fn repulse(node: &mut Node, dx: f32, dy: f32, k: f32) {
    let distance_sq = dx * dx + dy * dy;
    if distance_sq > 0.0 {
        let f = k / distance_sq;
        node.px -= dx * f;
        node.py -= dy * f;
    }
}

impl ForceSimulation for ForceLayout {
    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }

    fn links(&self) -> &[Link] {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.links
    }

    fn config(&self) -> &ForceConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ForceConfig {
        &mut self.config
    }

    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        if self.alpha > 0.0 {
            if alpha > 0.0 {
                self.alpha = alpha;
            } else {
                self.alpha = 0.0;
                self.events.emit(&ForceEvent::new(EventKind::End, 0.0));
            }
        } else if alpha > 0.0 {
            self.alpha = alpha;
            self.events.emit(&ForceEvent::new(EventKind::Start, alpha));
        }
    }

    fn start(&mut self) -> Result<(), LayoutError> {
        self.config.validate()?;
        self.check_links()?;

        for node in &mut self.nodes {
            node.weight = 0;
        }
        for link in &self.links {
            self.nodes[link.source].weight += 1;
            self.nodes[link.target].weight += 1;
        }
        self.place_unplaced();

        debug!(nodes = self.nodes.len(), links = self.links.len(); "Force layout started");
        self.resume();
        Ok(())
    }

    fn tick(&mut self) -> Option<ForceEvent> {
        if self.alpha <= 0.0 {
            return None;
        }

        self.alpha *= ALPHA_DECAY;
        if self.alpha < ALPHA_MIN {
            self.alpha = 0.0;
            self.events.emit(&ForceEvent::new(EventKind::End, 0.0));
            return None;
        }

        let alpha = self.alpha;
        self.apply_links(alpha);
        self.apply_gravity(alpha);
        self.apply_charge(alpha);
        self.integrate();

        let event = ForceEvent::new(EventKind::Tick, alpha);
        self.events.emit(&event);
        Some(event)
    }

    fn on(&mut self, kind: EventKind, handler: Option<EventHandler>) {
        self.events.on(kind, handler);
    }
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self::new()
    }
}

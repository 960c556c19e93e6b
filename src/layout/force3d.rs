//! Three-dimensional force layout from two planar simulations.
//!
//! The planar engine integrates X/Y as usual. A second engine integrates
//! depth: every node is mirrored by a [`ShadowNode`] whose `x`, `y`, `px`
//! and `py` all carry that node's Z, so the depth engine solves the same
//! graph as a one-dimensional problem.
//!
//! # Synchronization
//!
//! Whenever the planar engine ticks:
//!
//! 1. Shadow positions are read back from the depth engine.
//! 2. Every planar node gets an id if it has none, and a shadow if it has
//!    none (seeded from its own `z`, or `0.0`). The shadow's depth is
//!    written to the node's `z`.
//! 3. Every planar link gets an id if it has none, and a shadow link
//!    between its endpoints' shadows.
//! 4. Shadows of nodes and links no longer present are dropped.
//! 5. The depth engine's collections are replaced with the shadows and the
//!    engine is restarted, which seeds new shadows and reheats it.
//! 6. The tick handler runs, then the depth engine advances one step.
//!
//! Ids come from per-instance counters starting at 1 and are never reused.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, error, trace, warn};

use crate::error::LayoutError;
use crate::graph::{Link, LinkId, Node, NodeId};
use crate::simulation::{
    EventHandler, EventKind, ForceConfig, ForceEvent, ForceLayout, ForceSimulation,
};

/// Depth state mirrored for one planar node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowNode {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub px: f32,
    pub py: f32,
}

impl ShadowNode {
    /// A shadow at rest at depth `z`.
    pub fn new(id: NodeId, z: f32) -> Self {
        Self {
            id,
            x: z,
            y: z,
            px: z,
            py: z,
        }
    }

    /// Current depth.
    #[inline]
    pub fn depth(&self) -> f32 {
        self.x
    }

    fn to_node(self) -> Node {
        let mut node = Node::with_previous(self.x, self.y, self.px, self.py);
        node.id = Some(self.id);
        node
    }

    fn update_from(&mut self, node: &Node) {
        self.x = node.x;
        self.y = node.y;
        self.px = node.px;
        self.py = node.py;
    }
}

/// Depth spring mirrored for one planar link, joining two shadow nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowLink {
    pub source: NodeId,
    pub target: NodeId,
}

/// A force layout in three dimensions.
///
/// Presents the planar engine's surface. Parameter and lifecycle calls go
/// to both engines; node and link collections belong to the planar engine
/// only, and the depth engine is fed exclusively from the shadows.
pub struct Force3d<S = ForceLayout> {
    xy: S,
    z: S,
    shadow_nodes: BTreeMap<NodeId, ShadowNode>,
    shadow_links: BTreeMap<LinkId, ShadowLink>,
    next_node_id: u32,
    next_link_id: u32,
    tick_handler: Option<EventHandler>,
}

impl Force3d<ForceLayout> {
    /// Create a layout backed by two default [`ForceLayout`] engines.
    pub fn new() -> Self {
        Self::with_config(ForceConfig::default())
    }

    /// Create a layout whose engines share the given parameters.
    pub fn with_config(config: ForceConfig) -> Self {
        Self::from_engines(
            ForceLayout::with_config(config.clone()),
            ForceLayout::with_config(config),
        )
    }
}

impl Default for Force3d<ForceLayout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ForceSimulation> Force3d<S> {
    /// Compose a planar engine and a depth engine.
    ///
    /// Any nodes or links already in the depth engine are replaced on the
    /// first tick.
    pub fn from_engines(xy: S, z: S) -> Self {
        Self {
            xy,
            z,
            shadow_nodes: BTreeMap::new(),
            shadow_links: BTreeMap::new(),
            next_node_id: 1,
            next_link_id: 1,
            tick_handler: None,
        }
    }

    // =========================================================================
    // Nodes and links (planar engine only)
    // =========================================================================

    pub fn nodes(&self) -> &[Node] {
        self.xy.nodes()
    }

    pub fn nodes_mut(&mut self) -> &mut Vec<Node> {
        self.xy.nodes_mut()
    }

    pub fn set_nodes(&mut self, nodes: Vec<Node>) -> &mut Self {
        self.xy.set_nodes(nodes);
        self
    }

    pub fn links(&self) -> &[Link] {
        self.xy.links()
    }

    pub fn links_mut(&mut self) -> &mut Vec<Link> {
        self.xy.links_mut()
    }

    pub fn set_links(&mut self, links: Vec<Link>) -> &mut Self {
        self.xy.set_links(links);
        self
    }

    /// Append a node and return its index.
    pub fn add_node(&mut self, node: Node) -> usize {
        self.xy.add_node(node)
    }

    /// Append a link between existing nodes and return its index.
    pub fn add_link(&mut self, link: Link) -> Result<usize, LayoutError> {
        self.xy.add_link(link)
    }

    /// Remove a node and its links. Its shadow goes on the next tick.
    pub fn remove_node(&mut self, index: usize) -> Result<Node, LayoutError> {
        self.xy.remove_node(index)
    }

    /// Remove a link. Its shadow goes on the next tick.
    pub fn remove_link(&mut self, index: usize) -> Result<Link, LayoutError> {
        self.xy.remove_link(index)
    }

    // =========================================================================
    // Parameters (both engines)
    // =========================================================================

    /// Parameters of the planar engine.
    pub fn config(&self) -> &ForceConfig {
        self.xy.config()
    }

    /// Replace the parameters of both engines.
    ///
    /// Invalid parameters are rejected and neither engine changes.
    pub fn configure(&mut self, config: ForceConfig) -> Result<&mut Self, LayoutError> {
        config.validate()?;
        self.xy.configure(config.clone())?;
        self.z.configure(config)?;
        Ok(self)
    }

    pub fn set_size(&mut self, width: f32, height: f32) -> Result<&mut Self, LayoutError> {
        self.update_both(|engine| engine.set_size(width, height))
    }

    pub fn set_link_distance(&mut self, distance: f32) -> Result<&mut Self, LayoutError> {
        self.update_both(|engine| engine.set_link_distance(distance))
    }

    pub fn set_link_strength(&mut self, strength: f32) -> Result<&mut Self, LayoutError> {
        self.update_both(|engine| engine.set_link_strength(strength))
    }

    pub fn set_friction(&mut self, friction: f32) -> Result<&mut Self, LayoutError> {
        self.update_both(|engine| engine.set_friction(friction))
    }

    pub fn set_charge(&mut self, charge: f32) -> Result<&mut Self, LayoutError> {
        self.update_both(|engine| engine.set_charge(charge))
    }

    pub fn set_charge_distance(&mut self, distance: Option<f32>) -> Result<&mut Self, LayoutError> {
        self.update_both(|engine| engine.set_charge_distance(distance))
    }

    pub fn set_gravity(&mut self, gravity: f32) -> Result<&mut Self, LayoutError> {
        self.update_both(|engine| engine.set_gravity(gravity))
    }

    /// Apply a parameter change to both engines. The depth engine is left
    /// alone when the planar engine rejects the change.
    fn update_both(
        &mut self,
        change: impl Fn(&mut S) -> Result<(), LayoutError>,
    ) -> Result<&mut Self, LayoutError> {
        change(&mut self.xy)?;
        change(&mut self.z)?;
        Ok(self)
    }

    /// Temperature of the planar engine.
    pub fn alpha(&self) -> f32 {
        self.xy.alpha()
    }

    pub fn set_alpha(&mut self, alpha: f32) -> &mut Self {
        self.xy.set_alpha(alpha);
        self.z.set_alpha(alpha);
        self
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start both engines.
    pub fn start(&mut self) -> Result<&mut Self, LayoutError> {
        self.xy.start()?;
        self.z.start()?;
        debug!(nodes = self.xy.nodes().len(), links = self.xy.links().len(); "3D layout started");
        Ok(self)
    }

    pub fn resume(&mut self) -> &mut Self {
        self.xy.resume();
        self.z.resume();
        self
    }

    pub fn stop(&mut self) -> &mut Self {
        self.xy.stop();
        self.z.stop();
        debug!("3D layout stopped");
        self
    }

    /// Register an event handler.
    ///
    /// The tick handler is held here, in a single slot: registering again
    /// replaces it and `None` clears it. Other kinds go to the planar engine.
    pub fn on(&mut self, kind: EventKind, handler: Option<EventHandler>) -> &mut Self {
        match kind {
            EventKind::Tick => self.tick_handler = handler,
            _ => self.xy.on(kind, handler),
        }
        self
    }

    /// Advance the layout by one step.
    ///
    /// Returns the planar tick event, or `None` once the planar engine has
    /// cooled, in which case nothing is synchronized.
    pub fn tick(&mut self) -> Option<ForceEvent> {
        let event = self.xy.tick()?;
        self.synchronize();
        if let Some(handler) = self.tick_handler.as_mut() {
            handler(&event);
        }
        self.z.tick();
        Some(event)
    }

    /// Tick until the planar engine cools or `max_ticks` is reached.
    ///
    /// Returns the number of ticks run.
    pub fn run(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.tick().is_some() {
            ticks += 1;
        }
        ticks
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// The planar engine, for diagnostics.
    pub fn xy_engine(&self) -> &S {
        &self.xy
    }

    /// The depth engine, for diagnostics.
    pub fn z_engine(&self) -> &S {
        &self.z
    }

    pub fn shadow_node(&self, id: NodeId) -> Option<&ShadowNode> {
        self.shadow_nodes.get(&id)
    }

    pub fn shadow_link(&self, id: LinkId) -> Option<&ShadowLink> {
        self.shadow_links.get(&id)
    }

    pub fn shadow_node_count(&self) -> usize {
        self.shadow_nodes.len()
    }

    pub fn shadow_link_count(&self) -> usize {
        self.shadow_links.len()
    }

    /// Position of the node at `index` as `[x, y, z]`.
    ///
    /// Nodes not yet synchronized report a depth of `0.0`.
    pub fn position(&self, index: usize) -> Option<[f32; 3]> {
        self.xy
            .nodes()
            .get(index)
            .map(|n| [n.x, n.y, n.z.unwrap_or(0.0)])
    }

    /// All positions as a flat `[x0, y0, z0, x1, y1, z1, ...]` buffer.
    pub fn positions(&self) -> Vec<f32> {
        let nodes = self.xy.nodes();
        let mut positions = Vec::with_capacity(nodes.len() * 3);
        for node in nodes {
            positions.extend_from_slice(&[node.x, node.y, node.z.unwrap_or(0.0)]);
        }
        positions
    }

    // =========================================================================
    // Synchronization
    // =========================================================================

    /// Mirror the planar nodes and links into the depth engine.
    fn synchronize(&mut self) {
        for node in self.z.nodes() {
            if let Some(shadow) = node.id.and_then(|id| self.shadow_nodes.get_mut(&id)) {
                shadow.update_from(node);
            }
        }

        let reserved = self.xy.nodes().iter().filter_map(|n| n.id).map(NodeId::raw).max();
        raise_past(&mut self.next_node_id, reserved);

        let mut shadow_nodes = BTreeMap::new();
        for node in self.xy.nodes_mut().iter_mut() {
            // Id 0 and ids already taken this pass are treated as unassigned.
            let id = match node.id {
                Some(id) if id.raw() != 0 && !shadow_nodes.contains_key(&id) => id,
                _ => NodeId(take_id(&mut self.next_node_id)),
            };
            node.id = Some(id);
            let shadow = self
                .shadow_nodes
                .get(&id)
                .copied()
                .unwrap_or_else(|| ShadowNode::new(id, node.z.unwrap_or(0.0)));
            node.z = Some(shadow.depth());
            shadow_nodes.insert(id, shadow);
        }
        self.shadow_nodes = shadow_nodes;

        let endpoints: Vec<Option<NodeId>> = self.xy.nodes().iter().map(|n| n.id).collect();
        let endpoint = |index: usize| endpoints.get(index).copied().flatten();

        let reserved = self.xy.links().iter().filter_map(|l| l.id).map(LinkId::raw).max();
        raise_past(&mut self.next_link_id, reserved);

        let mut shadow_links = BTreeMap::new();
        let mut link_ids = BTreeSet::new();
        for link in self.xy.links_mut().iter_mut() {
            let id = match link.id {
                Some(id) if id.raw() != 0 && !link_ids.contains(&id) => id,
                _ => LinkId(take_id(&mut self.next_link_id)),
            };
            link.id = Some(id);
            link_ids.insert(id);

            let kept = self.shadow_links.get(&id).copied().filter(|shadow| {
                self.shadow_nodes.contains_key(&shadow.source)
                    && self.shadow_nodes.contains_key(&shadow.target)
            });
            let shadow = match kept {
                Some(shadow) => shadow,
                None => match (endpoint(link.source), endpoint(link.target)) {
                    (Some(source), Some(target)) => ShadowLink { source, target },
                    _ => {
                        warn!(
                            link = id.raw(), source = link.source, target = link.target;
                            "Skipping link with a missing endpoint"
                        );
                        continue;
                    }
                },
            };
            shadow_links.insert(id, shadow);
        }
        self.shadow_links = shadow_links;

        self.push_shadows();
        trace!(
            nodes = self.shadow_nodes.len(), links = self.shadow_links.len();
            "Synchronized depth shadows"
        );
    }

    /// Replace the depth engine's collections with the shadows and restart it.
    fn push_shadows(&mut self) {
        let slots: HashMap<NodeId, usize> = self
            .shadow_nodes
            .keys()
            .enumerate()
            .map(|(slot, &id)| (id, slot))
            .collect();

        let nodes = self.shadow_nodes.values().map(|s| s.to_node()).collect();
        let links = self
            .shadow_links
            .iter()
            .filter_map(|(&id, shadow)| {
                Some(Link {
                    id: Some(id),
                    source: *slots.get(&shadow.source)?,
                    target: *slots.get(&shadow.target)?,
                })
            })
            .collect();

        self.z.set_nodes(nodes);
        self.z.set_links(links);
        if let Err(err) = self.z.start() {
            error!("Depth engine failed to restart, stopping layout: {err}");
            self.xy.stop();
            self.z.stop();
        }
    }
}

/// Move an id counter past the largest id already in use.
fn raise_past(counter: &mut u32, reserved: Option<u32>) {
    if let Some(max) = reserved {
        *counter = (*counter).max(max.saturating_add(1));
    }
}

fn take_id(counter: &mut u32) -> u32 {
    let id = *counter;
    *counter += 1;
    id
}

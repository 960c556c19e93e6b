//! Force3d - WASM Module
//!
//! This module lays out graphs in three dimensions by running two planar
//! force simulations side by side. It is compiled to WebAssembly and loaded
//! inside a Web Worker, where the host drives the simulation and reads
//! positions back each frame.
//!
//! # Architecture
//!
//! - `graph`: Node and link records with lazily stamped stable ids
//! - `simulation`: The planar force simulation contract and engine
//! - `layout`: The 3D synchronizer composing a planar and a depth engine
//! - `spatial`: R-tree spatial indexing for charge neighbourhoods and picking

use js_sys::{Float32Array, Function};
use wasm_bindgen::prelude::*;

mod error;
pub mod graph;
pub mod layout;
mod logger;
pub mod simulation;
pub mod spatial;

pub use error::LayoutError;

use graph::{Link, Node};
use layout::Force3d;
use simulation::{EventHandler, EventKind, ForceConfig, ForceEvent};
use spatial::SpatialIndex;

/// Initialize the WASM module when the worker loads it.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logger::install(log::LevelFilter::Info);
}

/// Change how much the module logs to the console ("error" through "trace").
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> Result<(), JsError> {
    let level = level
        .parse::<log::LevelFilter>()
        .map_err(|_| JsError::new(&format!("unknown log level: {level}")))?;
    logger::install(level);
    Ok(())
}

fn read_config(config: JsValue) -> Result<ForceConfig, LayoutError> {
    let config: ForceConfig = serde_wasm_bindgen::from_value(config)
        .map_err(|err| LayoutError::Config(err.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Worker-side entry point for a 3D force layout.
///
/// This struct wraps [`Force3d`] and provides the public API exposed to
/// JavaScript. Nodes and links are addressed by their index.
#[wasm_bindgen]
pub struct ForceWorker {
    layout: Force3d,
}

#[wasm_bindgen]
impl ForceWorker {
    /// Create a worker with default parameters.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            layout: Force3d::new(),
        }
    }

    /// Create a worker from a parameter object, e.g.
    /// `{ size: [960, 500], linkDistance: 30, charge: -120 }`.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config: JsValue) -> Result<ForceWorker, JsError> {
        Ok(Self {
            layout: Force3d::with_config(read_config(config)?),
        })
    }

    /// Replace all parameters on both engines.
    pub fn configure(&mut self, config: JsValue) -> Result<(), JsError> {
        self.layout.configure(read_config(config)?)?;
        Ok(())
    }

    // =========================================================================
    // Parameters
    // =========================================================================
    //
    // Each setter rejects values the integrator cannot use and keeps the
    // previous parameters.

    #[wasm_bindgen(js_name = setSize)]
    pub fn set_size(&mut self, width: f32, height: f32) -> Result<(), JsError> {
        self.layout.set_size(width, height)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = setLinkDistance)]
    pub fn set_link_distance(&mut self, distance: f32) -> Result<(), JsError> {
        self.layout.set_link_distance(distance)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = setLinkStrength)]
    pub fn set_link_strength(&mut self, strength: f32) -> Result<(), JsError> {
        self.layout.set_link_strength(strength)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = setFriction)]
    pub fn set_friction(&mut self, friction: f32) -> Result<(), JsError> {
        self.layout.set_friction(friction)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = setCharge)]
    pub fn set_charge(&mut self, charge: f32) -> Result<(), JsError> {
        self.layout.set_charge(charge)?;
        Ok(())
    }

    /// Limit charge to a radius; pass `undefined` for no limit.
    #[wasm_bindgen(js_name = setChargeDistance)]
    pub fn set_charge_distance(&mut self, distance: Option<f32>) -> Result<(), JsError> {
        self.layout.set_charge_distance(distance)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = setGravity)]
    pub fn set_gravity(&mut self, gravity: f32) -> Result<(), JsError> {
        self.layout.set_gravity(gravity)?;
        Ok(())
    }

    // =========================================================================
    // Node and Link Operations
    // =========================================================================

    /// Add a node at the specified position, optionally with a starting depth.
    ///
    /// Returns the node's index.
    #[wasm_bindgen(js_name = addNode)]
    pub fn add_node(&mut self, x: f32, y: f32, z: Option<f32>) -> u32 {
        let mut node = Node::at(x, y);
        node.z = z;
        self.layout.add_node(node) as u32
    }

    /// Add a node the engine will place on the next `start`.
    #[wasm_bindgen(js_name = addUnplacedNode)]
    pub fn add_unplaced_node(&mut self) -> u32 {
        self.layout.add_node(Node::new()) as u32
    }

    /// Add a link between two node indices.
    ///
    /// Returns the link's index.
    #[wasm_bindgen(js_name = addLink)]
    pub fn add_link(&mut self, source: u32, target: u32) -> Result<u32, JsError> {
        let index = self
            .layout
            .add_link(Link::new(source as usize, target as usize))?;
        Ok(index as u32)
    }

    /// Remove a node and its links. Later nodes shift down by one index.
    #[wasm_bindgen(js_name = removeNode)]
    pub fn remove_node(&mut self, index: u32) -> Result<(), JsError> {
        self.layout.remove_node(index as usize)?;
        Ok(())
    }

    /// Remove a link. Later links shift down by one index.
    #[wasm_bindgen(js_name = removeLink)]
    pub fn remove_link(&mut self, index: u32) -> Result<(), JsError> {
        self.layout.remove_link(index as usize)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.layout.nodes().len() as u32
    }

    #[wasm_bindgen(js_name = linkCount)]
    pub fn link_count(&self) -> u32 {
        self.layout.links().len() as u32
    }

    /// Stable node ids in index order; 0 for nodes not yet synchronized.
    #[wasm_bindgen(js_name = nodeIds)]
    pub fn node_ids(&self) -> Vec<u32> {
        self.layout
            .nodes()
            .iter()
            .map(|n| n.id.map_or(0, |id| id.raw()))
            .collect()
    }

    // =========================================================================
    // Simulation Control
    // =========================================================================

    pub fn start(&mut self) -> Result<(), JsError> {
        self.layout.start()?;
        Ok(())
    }

    pub fn resume(&mut self) {
        self.layout.resume();
    }

    pub fn stop(&mut self) {
        self.layout.stop();
    }

    /// Advance one step. Returns false once the layout has cooled.
    pub fn tick(&mut self) -> bool {
        self.layout.tick().is_some()
    }

    /// Tick until cooled or `max_ticks` is reached. Returns the ticks run.
    pub fn run(&mut self, max_ticks: u32) -> u32 {
        self.layout.run(max_ticks as usize) as u32
    }

    pub fn alpha(&self) -> f32 {
        self.layout.alpha()
    }

    /// Register a callback for "start", "tick" or "end"; it receives alpha.
    ///
    /// Pass `undefined` to remove the callback.
    pub fn on(&mut self, name: &str, callback: Option<Function>) -> Result<(), JsError> {
        let kind = name.parse::<EventKind>()?;
        let handler = callback.map(|callback| -> EventHandler {
            Box::new(move |event: &ForceEvent| {
                let alpha = JsValue::from_f64(f64::from(event.alpha));
                if let Err(err) = callback.call1(&JsValue::NULL, &alpha) {
                    log::error!("{} callback threw: {err:?}", event.kind);
                }
            })
        });
        self.layout.on(kind, handler);
        Ok(())
    }

    // =========================================================================
    // Positions and Interaction
    // =========================================================================

    /// Node positions as `[x0, y0, z0, x1, y1, z1, ...]`.
    pub fn positions(&self) -> Float32Array {
        Float32Array::from(&self.layout.positions()[..])
    }

    /// Pin or release a node.
    #[wasm_bindgen(js_name = fixNode)]
    pub fn fix_node(&mut self, index: u32, fixed: bool) -> Result<(), JsError> {
        self.node_mut(index)?.state.set_fixed(fixed);
        Ok(())
    }

    /// Mark a node as under the pointer; hovered nodes are held in place.
    #[wasm_bindgen(js_name = hoverNode)]
    pub fn hover_node(&mut self, index: u32, hovered: bool) -> Result<(), JsError> {
        self.node_mut(index)?.state.set_hovered(hovered);
        Ok(())
    }

    /// Begin dragging a node.
    #[wasm_bindgen(js_name = dragStart)]
    pub fn drag_start(&mut self, index: u32) -> Result<(), JsError> {
        self.node_mut(index)?.state.set_dragging(true);
        Ok(())
    }

    /// Move a dragged node and reheat the layout.
    #[wasm_bindgen(js_name = dragMove)]
    pub fn drag_move(&mut self, index: u32, x: f32, y: f32) -> Result<(), JsError> {
        let node = self.node_mut(index)?;
        node.px = x;
        node.py = y;
        self.layout.resume();
        Ok(())
    }

    /// Release a dragged node. Hover and drag flags are cleared; a fixed
    /// node stays fixed.
    #[wasm_bindgen(js_name = dragEnd)]
    pub fn drag_end(&mut self, index: u32) -> Result<(), JsError> {
        let node = self.node_mut(index)?;
        node.state.set_dragging(false);
        node.state.set_hovered(false);
        Ok(())
    }

    /// Find the node nearest to a point in the X/Y plane.
    ///
    /// Returns the node index, or None if no node is within the distance.
    #[wasm_bindgen(js_name = findNearestNode)]
    pub fn find_nearest_node(&self, x: f32, y: f32, max_distance: f32) -> Option<u32> {
        let index = SpatialIndex::from_points(
            self.layout
                .nodes()
                .iter()
                .enumerate()
                .map(|(i, n)| (i, n.x, n.y)),
        );
        index.nearest_within(x, y, max_distance).map(|i| i as u32)
    }
}

impl ForceWorker {
    /// The wrapped layout.
    pub fn layout(&self) -> &Force3d {
        &self.layout
    }

    fn node_mut(&mut self, index: u32) -> Result<&mut Node, LayoutError> {
        let nodes = self.layout.nodes_mut();
        let count = nodes.len();
        nodes
            .get_mut(index as usize)
            .ok_or(LayoutError::NodeOutOfRange {
                index: index as usize,
                nodes: count,
            })
    }
}

impl Default for ForceWorker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use graph::NodeId;

    /// A small tree grown from one root, laid out until it cools.
    fn tree_worker(node_count: u32) -> ForceWorker {
        let mut worker = ForceWorker::new();
        worker.set_size(800.0, 600.0).unwrap();
        worker.set_link_distance(30.0).unwrap();
        worker.add_node(400.0, 300.0, None);
        for child in 1..node_count {
            worker.add_unplaced_node();
            worker.add_link((child - 1) / 3, child).unwrap();
        }
        worker
    }

    #[test]
    fn test_worker_lays_out_in_three_dimensions() {
        let mut worker = ForceWorker::new();
        worker.set_size(800.0, 600.0).unwrap();
        worker.set_link_distance(30.0).unwrap();
        for i in 0..12 {
            worker.add_node(400.0 + i as f32, 300.0, Some(i as f32));
        }
        for i in 1..12 {
            worker.add_link(i - 1, i).unwrap();
        }

        worker.start().unwrap();
        let ticks = worker.run(10_000);

        assert_eq!(ticks, 298, "layout should cool on schedule");
        assert!(!worker.tick());

        let positions = worker.layout().positions();
        assert_eq!(positions.len(), 12 * 3);
        assert!(positions.iter().all(|p| p.is_finite()));

        let depths: Vec<f32> = positions.chunks(3).map(|p| p[2]).collect();
        let min_z = depths.iter().copied().fold(f32::INFINITY, f32::min);
        let max_z = depths.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert!(max_z - min_z > 1.0, "depth should spread, got {min_z}..{max_z}");
    }

    #[test]
    fn test_worker_ids_follow_node_order() {
        let mut worker = tree_worker(4);
        assert_eq!(worker.node_ids(), vec![0, 0, 0, 0]);

        worker.start().unwrap();
        assert!(worker.tick());
        assert_eq!(worker.node_ids(), vec![1, 2, 3, 4]);

        worker.remove_node(0).unwrap();
        worker.add_node(0.0, 0.0, Some(5.0));
        assert!(worker.tick());
        assert_eq!(worker.node_ids(), vec![2, 3, 4, 5]);
        assert_eq!(worker.link_count(), 0);
        assert!(worker.layout().shadow_node(NodeId(1)).is_none());
        assert_eq!(worker.layout().shadow_node(NodeId(5)).map(|s| s.depth()), Some(5.0));
    }

    #[test]
    fn test_worker_fixed_node_stays_put() {
        let mut worker = tree_worker(10);
        worker.start().unwrap();
        worker.fix_node(0, true).unwrap();
        worker.run(50);

        let root = worker.layout().position(0).unwrap();
        assert_eq!((root[0], root[1]), (400.0, 300.0));
    }

    #[test]
    fn test_worker_drag_moves_node() {
        let mut worker = tree_worker(5);
        worker.start().unwrap();
        worker.run(300);
        assert_eq!(worker.alpha(), 0.0);

        worker.drag_start(0).unwrap();
        worker.drag_move(0, 100.0, 50.0).unwrap();
        assert!(worker.alpha() > 0.0, "dragging reheats the layout");
        worker.run(5);

        let root = worker.layout().position(0).unwrap();
        assert_eq!((root[0], root[1]), (100.0, 50.0));

        worker.drag_end(0).unwrap();
        assert!(!worker.layout().nodes()[0].state.is_held());
    }

    #[test]
    fn test_worker_find_nearest_node() {
        let mut worker = ForceWorker::new();
        worker.add_node(0.0, 0.0, None);
        worker.add_node(100.0, 0.0, None);

        assert_eq!(worker.find_nearest_node(90.0, 5.0, 20.0), Some(1));
        assert_eq!(worker.find_nearest_node(50.0, 50.0, 20.0), None);
    }

    #[test]
    fn test_worker_stop_halts_ticks() {
        let mut worker = tree_worker(3);
        worker.start().unwrap();
        assert!(worker.tick());

        worker.stop();
        assert!(!worker.tick());
        assert_eq!(worker.run(100), 0);

        worker.resume();
        assert!(worker.tick());
    }
}

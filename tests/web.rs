//! Browser tests for the worker entry point.

#![cfg(target_arch = "wasm32")]

use force3d_wasm::ForceWorker;
use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

fn config(entries: &[(&str, JsValue)]) -> JsValue {
    let object = Object::new();
    for (key, value) in entries {
        Reflect::set(&object, &JsValue::from_str(key), value).unwrap();
    }
    object.into()
}

#[wasm_bindgen_test]
fn test_with_config_reads_camel_case() {
    let size = Array::of2(&JsValue::from(300.0), &JsValue::from(200.0));
    let worker = ForceWorker::with_config(config(&[
        ("size", size.into()),
        ("linkDistance", JsValue::from(45.0)),
    ]))
    .unwrap();

    assert_eq!(worker.layout().config().size, [300.0, 200.0]);
    assert_eq!(worker.layout().config().link_distance, 45.0);
}

#[wasm_bindgen_test]
fn test_with_config_rejects_bad_friction() {
    let result = ForceWorker::with_config(config(&[("friction", JsValue::from(2.0))]));
    assert!(result.is_err());
}

#[wasm_bindgen_test]
fn test_positions_buffer_is_flat_xyz() {
    let mut worker = ForceWorker::new();
    worker.add_node(1.0, 2.0, Some(3.0));
    worker.add_node(4.0, 5.0, None);

    assert_eq!(worker.positions().to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 0.0]);

    worker.set_charge(0.0).unwrap();
    worker.set_gravity(0.0).unwrap();
    worker.start().unwrap();
    assert!(worker.tick());
    assert_eq!(worker.positions().to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 0.0]);
}

#[wasm_bindgen_test]
fn test_tick_callback_receives_alpha() {
    let mut worker = ForceWorker::new();
    worker.add_node(0.0, 0.0, None);
    worker.add_node(1.0, 1.0, None);

    let seen = Array::new();
    let callback = Function::new_with_args("alpha", "this.push(alpha)");
    let callback = callback.bind(&seen);
    worker.on("tick", Some(callback)).unwrap();

    worker.start().unwrap();
    worker.run(3);

    assert_eq!(seen.length(), 3);
    let first = seen.get(0).as_f64().unwrap();
    assert!((first - 0.099).abs() < 1e-6);
}

#[wasm_bindgen_test]
fn test_setter_rejects_bad_friction() {
    let mut worker = ForceWorker::new();
    assert!(worker.set_friction(5.0).is_err());
    assert_eq!(worker.layout().config().friction, 0.9);
}

#[wasm_bindgen_test]
fn test_unknown_event_is_rejected() {
    let mut worker = ForceWorker::new();
    assert!(worker.on("drag", None).is_err());
}

#[wasm_bindgen_test]
fn test_bad_index_is_rejected() {
    let mut worker = ForceWorker::new();
    worker.add_node(0.0, 0.0, None);

    assert!(worker.add_link(0, 3).is_err());
    assert!(worker.remove_node(4).is_err());
    assert!(worker.fix_node(1, true).is_err());
}

#[wasm_bindgen_test]
fn test_log_level_parses() {
    force3d_wasm::init();
    assert!(force3d_wasm::set_log_level("debug").is_ok());
    assert!(force3d_wasm::set_log_level("loud").is_err());
}

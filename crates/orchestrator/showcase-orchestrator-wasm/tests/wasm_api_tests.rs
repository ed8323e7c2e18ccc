#![cfg(target_arch = "wasm32")]
use js_sys::{Array, Object, Reflect};
use serde_wasm_bindgen as swb;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

use showcase_orchestrator_wasm::{abi_version, ShowcasePage};

wasm_bindgen_test_configure!(run_in_browser);

fn config() -> serde_json::Value {
    serde_json::json!({
        "scenes": [{ "id": "main", "canvas": "#canvas" }],
        "variants": (1..=5).map(|i| serde_json::json!({
            "id": format!("v{i}"),
            "display_name": format!("V{i}"),
            "label_texture": format!("labels/v{i}.png"),
            "accents": ["#000000", "#ffffff"],
            "background": "#ffffff"
        })).collect::<Vec<_>>(),
        "products": [{
            "id": "can",
            "scene": "main",
            "model": "models/can.glb",
            "variant": "v1"
        }],
        "variant_switch": {
            "target": "can",
            "next_button": "#next",
            "previous_button": "#prev",
            "label_text": "#name",
            "background": "#section"
        }
    })
}

fn layout() -> serde_json::Value {
    serde_json::json!({
        "viewport": { "width": 1200, "height": 800 },
        "elements": {
            "#canvas": { "top": 0, "height": 800 },
            "#next": { "top": 0, "height": 0 },
            "#prev": { "top": 0, "height": 0 },
            "#name": { "top": 0, "height": 0 },
            "#section": { "top": 0, "height": 800 }
        }
    })
}

fn page() -> ShowcasePage {
    ShowcasePage::new(
        swb::to_value(&config()).unwrap(),
        swb::to_value(&layout()).unwrap(),
    )
    .unwrap()
}

#[wasm_bindgen_test]
fn abi_is_1() {
    assert_eq!(abi_version(), 1);
}

#[wasm_bindgen_test]
fn construct_rejects_missing_layout() {
    let res = ShowcasePage::new(swb::to_value(&config()).unwrap(), JsValue::UNDEFINED);
    assert!(res.is_err());
}

#[wasm_bindgen_test]
fn construct_accepts_json_strings() {
    let res = ShowcasePage::new(
        JsValue::from_str(&config().to_string()),
        JsValue::from_str(&layout().to_string()),
    );
    assert!(res.is_ok());
}

#[wasm_bindgen_test]
fn update_returns_frame_with_requests() {
    let mut p = page();
    let frame = Object::from(p.update(0.016, JsValue::UNDEFINED).unwrap());
    for key in ["epoch", "dt", "scenes", "events", "dom", "requests"] {
        assert!(Reflect::has(&frame, &JsValue::from_str(key)).unwrap(), "{key}");
    }
    let requests = Array::from(&Reflect::get(&frame, &JsValue::from_str("requests")).unwrap());
    assert!(requests.length() >= 2);
}

#[wasm_bindgen_test]
fn staged_clicks_apply_on_next_update() {
    let mut p = page();
    p.next_variant();
    p.next_variant();
    assert_eq!(p.variant_index(), Some(0));
    p.update(0.016, JsValue::NULL).unwrap();
    assert_eq!(p.variant_index(), Some(2));
}

#[wasm_bindgen_test]
fn runtime_placements_get_fresh_ids() {
    let mut p = page();
    let placement = |id: &str| {
        JsValue::from_str(
            &serde_json::json!({
                "id": id,
                "scene": "main",
                "model": "models/can.glb",
                "variant": "v2"
            })
            .to_string(),
        )
    };
    let first = p.place_product(placement("second")).unwrap();
    let second = p.place_product(placement("third")).unwrap();
    assert_ne!(first, second);
    assert!(p.place_product(placement("third")).is_err());
}

#[wasm_bindgen_test]
fn teardown_returns_events_once() {
    let mut p = page();
    let events = Array::from(&p.teardown().unwrap());
    assert!(events.length() >= 1);
    assert!(p.is_torn_down());
    let again = Array::from(&p.teardown().unwrap());
    assert_eq!(again.length(), 0);
}

//! JS-facing wrapper around [`showcase_orchestrator::Page`].
//!
//! The host measures the DOM, forwards scroll/resize/click events and asset
//! completions, then calls `update` once per animation frame and applies the
//! returned frame to its renderer and document.

use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use showcase_orchestrator::{Command, Inputs, Page, PageConfig, PageLayout};
use showcase_scene::{AssetPayload, Placement, Viewport};

mod staging;

pub use staging::{parse_json, Staged};

#[wasm_bindgen]
pub struct ShowcasePage {
    core: Page,
    staged: Staged,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

/// Accept either a JSON string or a plain JS object.
fn from_js<T: serde::de::DeserializeOwned>(what: &str, value: JsValue) -> Result<T, JsError> {
    if let Some(text) = value.as_string() {
        return parse_json(what, &text).map_err(|e| JsError::new(&format!("{e:#}")));
    }
    swb::from_value(value).map_err(|e| JsError::new(&format!("{what} error: {e}")))
}

#[wasm_bindgen]
impl ShowcasePage {
    /// Build a page from its configuration and the initial DOM measurements.
    /// Fails fast when the layout lacks an element the configuration names.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, layout: JsValue) -> Result<ShowcasePage, JsError> {
        #[cfg(feature = "console_error")]
        console_error_panic_hook::set_once();

        if jsvalue_is_undefined_or_null(&config) {
            return Err(JsError::new("page config is null/undefined"));
        }
        if jsvalue_is_undefined_or_null(&layout) {
            return Err(JsError::new("page layout is null/undefined"));
        }
        let config: PageConfig = from_js("config", config)?;
        let layout: PageLayout = from_js("layout", layout)?;
        let core = Page::new(config, layout).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(ShowcasePage {
            core,
            staged: Staged::default(),
        })
    }

    /// Advance by `dt` seconds. `inputs` is optional and merged over anything staged
    /// since the previous call. Returns the frame as a JS object.
    #[wasm_bindgen]
    pub fn update(&mut self, dt: f32, inputs: JsValue) -> Result<JsValue, JsError> {
        let explicit: Inputs = if jsvalue_is_undefined_or_null(&inputs) {
            Inputs::default()
        } else {
            from_js("inputs", inputs)?
        };
        let merged = self.staged.take(explicit);
        let frame = self.core.update(dt, merged);
        swb::to_value(frame).map_err(|e| JsError::new(&format!("frame error: {e}")))
    }

    #[wasm_bindgen]
    pub fn scroll(&mut self, offset: f32) {
        self.staged.scroll(offset);
    }

    #[wasm_bindgen]
    pub fn resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) {
        self.staged
            .resize(Viewport::new(width, height, device_pixel_ratio));
    }

    /// Stage a re-measured layout.
    #[wasm_bindgen(js_name = set_layout)]
    pub fn set_layout(&mut self, layout: JsValue) -> Result<(), JsError> {
        let layout: PageLayout = from_js("layout", layout)?;
        self.staged.layout(layout);
        Ok(())
    }

    #[wasm_bindgen(js_name = next_variant)]
    pub fn next_variant(&mut self) {
        self.staged.command(Command::NextVariant);
    }

    #[wasm_bindgen(js_name = previous_variant)]
    pub fn previous_variant(&mut self) {
        self.staged.command(Command::PreviousVariant);
    }

    /// Report a finished load. `asset` describes it, e.g. `{ type: "texture" }` or
    /// `{ type: "model", data: { meshes: [{ name: "cylinder_1" }] } }`.
    #[wasm_bindgen(js_name = asset_loaded)]
    pub fn asset_loaded(&mut self, url: String, asset: JsValue) -> Result<(), JsError> {
        let asset: AssetPayload = from_js("asset", asset)?;
        self.staged.command(Command::AssetLoaded { url, asset });
        Ok(())
    }

    #[wasm_bindgen(js_name = asset_failed)]
    pub fn asset_failed(&mut self, url: String, reason: String) {
        self.staged.command(Command::AssetFailed { url, reason });
    }

    /// Place another product. Returns its placement id; the model request goes out
    /// with the next frame.
    #[wasm_bindgen(js_name = place_product)]
    pub fn place_product(&mut self, placement: JsValue) -> Result<u32, JsError> {
        let placement: Placement = from_js("placement", placement)?;
        let handle = self
            .core
            .place_product(placement)
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(handle.id.0)
    }

    #[wasm_bindgen(js_name = variant_index)]
    pub fn variant_index(&self) -> Option<u32> {
        self.core.variant_index().map(|i| i as u32)
    }

    #[wasm_bindgen(js_name = is_torn_down)]
    pub fn is_torn_down(&self) -> bool {
        self.core.is_torn_down()
    }

    /// Release every scene object. Returns the teardown events; later updates are empty.
    #[wasm_bindgen]
    pub fn teardown(&mut self) -> Result<JsValue, JsError> {
        self.staged = Staged::default();
        let events = self.core.teardown();
        swb::to_value(&events).map_err(|e| JsError::new(&format!("events error: {e}")))
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}

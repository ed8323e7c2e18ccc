//! Measured document layout supplied by the host.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use showcase_scene::Viewport;

/// Vertical box of an element in document coordinates (CSS pixels).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementBox {
    pub top: f32,
    pub height: f32,
}

impl ElementBox {
    pub fn new(top: f32, height: f32) -> Self {
        Self { top, height }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub viewport: Viewport,
    /// Current document scroll offset.
    #[serde(default)]
    pub scroll: f32,
    /// Element boxes keyed by selector. Elements without a box (buttons, text
    /// nodes) are listed with a zero-height box.
    #[serde(default)]
    pub elements: HashMap<String, ElementBox>,
}

impl PageLayout {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            scroll: 0.0,
            elements: HashMap::new(),
        }
    }

    pub fn with_element(mut self, selector: impl Into<String>, bx: ElementBox) -> Self {
        self.elements.insert(selector.into(), bx);
        self
    }

    pub fn element(&self, selector: &str) -> Option<ElementBox> {
        self.elements.get(selector).copied()
    }

    pub fn has(&self, selector: &str) -> bool {
        self.elements.contains_key(selector)
    }
}

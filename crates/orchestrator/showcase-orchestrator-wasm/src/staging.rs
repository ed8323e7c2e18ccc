use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use showcase_orchestrator::{Command, Inputs, PageLayout};
use showcase_scene::Viewport;

/// Parse a JSON document handed over as a string.
pub fn parse_json<T: DeserializeOwned>(what: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).with_context(|| format!("{what}: invalid JSON"))
}

/// Browser events collected between two `update` calls.
///
/// Later scroll/resize/layout values replace earlier ones; commands keep their order.
#[derive(Debug, Default)]
pub struct Staged {
    inputs: Inputs,
}

impl Staged {
    pub fn scroll(&mut self, offset: f32) {
        self.inputs.scroll = Some(offset);
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.inputs.resize = Some(viewport);
    }

    pub fn layout(&mut self, layout: PageLayout) {
        self.inputs.layout = Some(layout);
    }

    pub fn command(&mut self, command: Command) {
        self.inputs.commands.push(command);
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.scroll.is_none()
            && self.inputs.resize.is_none()
            && self.inputs.layout.is_none()
            && self.inputs.commands.is_empty()
    }

    /// Drain the staged events, merged with `explicit` (which wins for single values
    /// and runs its commands after the staged ones).
    pub fn take(&mut self, explicit: Inputs) -> Inputs {
        let mut merged = std::mem::take(&mut self.inputs);
        if explicit.scroll.is_some() {
            merged.scroll = explicit.scroll;
        }
        if explicit.resize.is_some() {
            merged.resize = explicit.resize;
        }
        if explicit.layout.is_some() {
            merged.layout = explicit.layout;
        }
        merged.commands.extend(explicit.commands);
        merged
    }
}

//! Input contracts for a page tick.
//!
//! Hosts collect browser/engine events between frames and pass them to
//! `Page::update` in one batch.

use serde::{Deserialize, Serialize};
use showcase_scene::{AssetPayload, Viewport};

use crate::layout::PageLayout;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Inputs {
    /// Latest document scroll offset, if it changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll: Option<f32>,
    /// New viewport, if the window was resized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<Viewport>,
    /// Re-measured layout (after a resize or content reflow).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<PageLayout>,
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Inputs {
    pub fn scrolled(offset: f32) -> Self {
        Self {
            scroll: Some(offset),
            ..Self::default()
        }
    }

    pub fn command(command: Command) -> Self {
        Self {
            commands: vec![command],
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    NextVariant,
    PreviousVariant,
    AssetLoaded { url: String, asset: AssetPayload },
    AssetFailed { url: String, reason: String },
}

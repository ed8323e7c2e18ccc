//! Output contracts for a page tick.
//!
//! A `Frame` carries everything the host must apply: per-scene camera/target state
//! and composed object poses, DOM writes, asset requests and semantic events.

use serde::{Deserialize, Serialize};
use showcase_animation::Pose;
use showcase_scene::{
    AmbientId, AssetKind, AssetRequest, Camera, EnvironmentState, InstanceState, MeshBinding,
    RenderTarget, ToneMapping,
};

use crate::config::AmbientShape;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Scrolling forward past `start`.
    Enter,
    /// Scrolling forward past `end`.
    Leave,
    /// Scrolling backward past `end`.
    EnterBack,
    /// Scrolling backward past `start`.
    LeaveBack,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionEdge {
    pub region: String,
    pub edge: Edge,
    /// Raw scroll progress when the edge was crossed.
    pub progress: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DespawnReason {
    Completed,
    Evicted,
    Teardown,
    /// The spawner's model failed to load; the spawner halted.
    ModelUnavailable,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum PageEvent {
    RegionEdge(RegionEdge),
    AssetReady {
        url: String,
        kind: AssetKind,
    },
    AssetUnavailable {
        url: String,
        kind: AssetKind,
        reason: String,
    },
    ProductPlaced {
        object: String,
        scene: String,
    },
    LabelMeshMissing {
        object: String,
        mesh: String,
    },
    AmbientSpawned {
        scene: String,
        spawner: String,
        id: AmbientId,
    },
    AmbientDespawned {
        scene: String,
        id: AmbientId,
        reason: DespawnReason,
    },
    VariantChanged {
        index: usize,
        variant: String,
    },
    TornDown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomEffect {
    SetText { selector: String, text: String },
    SetStyle {
        selector: String,
        property: String,
        value: String,
    },
}

impl DomEffect {
    pub fn style(
        selector: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        DomEffect::SetStyle {
            selector: selector.into(),
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn selector(&self) -> &str {
        match self {
            DomEffect::SetText { selector, .. } | DomEffect::SetStyle { selector, .. } => selector,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectState {
    pub id: String,
    pub pose: Pose,
    pub materials: Vec<MeshBinding>,
    pub state: InstanceState,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AmbientState {
    pub id: AmbientId,
    pub spawner: String,
    pub shape: AmbientShape,
    /// Sphere radius (ignored for models).
    pub radius: f32,
    pub pose: Pose,
    /// Seconds until the object completes and is removed.
    pub remaining: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneFrame {
    pub scene: String,
    pub canvas: String,
    pub camera: Camera,
    pub render_target: RenderTarget,
    pub tone_mapping: ToneMapping,
    pub exposure: f32,
    pub environment: EnvironmentState,
    pub objects: Vec<ObjectState>,
    pub ambient: Vec<AmbientState>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub epoch: u64,
    pub dt: f32,
    pub scenes: Vec<SceneFrame>,
    pub dom: Vec<DomEffect>,
    pub requests: Vec<AssetRequest>,
    pub events: Vec<PageEvent>,
}

impl Frame {
    pub fn scene(&self, id: &str) -> Option<&SceneFrame> {
        self.scenes.iter().find(|s| s.scene == id)
    }

    pub fn object(&self, id: &str) -> Option<&ObjectState> {
        self.scenes
            .iter()
            .flat_map(|s| s.objects.iter())
            .find(|o| o.id == id)
    }

    pub fn edges(&self) -> impl Iterator<Item = &RegionEdge> + '_ {
        self.events.iter().filter_map(|e| match e {
            PageEvent::RegionEdge(edge) => Some(edge),
            _ => None,
        })
    }

    pub(crate) fn clear(&mut self) {
        self.scenes.clear();
        self.dom.clear();
        self.requests.clear();
        self.events.clear();
    }
}

//! Material conventions for the product model.
//!
//! One mesh, identified by name, carries the printed label; every other mesh shares a
//! single brushed-metal material.

use serde::{Deserialize, Serialize};
use showcase_animation::Color;

pub const DEFAULT_LABEL_MESH: &str = "cylinder_1";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelMaterial {
    /// URL of the label texture; `None` renders an untextured label.
    pub texture: Option<String>,
    pub roughness: f32,
    pub metalness: f32,
    pub reflectivity: f32,
}

impl Default for LabelMaterial {
    fn default() -> Self {
        Self {
            texture: None,
            roughness: 0.1,
            metalness: 0.75,
            reflectivity: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetalMaterial {
    pub roughness: f32,
    pub metalness: f32,
    pub color: Color,
}

impl Default for MetalMaterial {
    fn default() -> Self {
        Self {
            roughness: 0.3,
            metalness: 0.8,
            color: Color::rgb(0xbb as f32 / 255.0, 0xbb as f32 / 255.0, 0xbb as f32 / 255.0),
        }
    }
}

/// Material bound to one mesh. `SharedMetal` refers to the binder's single metal
/// material; it is never duplicated per mesh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MeshMaterial {
    Label(LabelMaterial),
    SharedMetal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metal_is_light_grey() {
        assert_eq!(MetalMaterial::default().color.to_hex(), "#bbbbbb");
    }

    #[test]
    fn serde_shape() {
        let v = serde_json::to_value(MeshMaterial::SharedMetal).unwrap();
        assert_eq!(v, serde_json::json!({ "type": "shared_metal" }));
        let label = MeshMaterial::Label(LabelMaterial {
            texture: Some("labels/grape.png".into()),
            ..LabelMaterial::default()
        });
        let v = serde_json::to_value(&label).unwrap();
        assert_eq!(v["data"]["texture"], "labels/grape.png");
    }
}

//! Binding loaded models to scene placements.
//!
//! A placement says where a product sits (position, tilt, scale) and which variant it
//! starts with. Once the model is available the binder walks its meshes and assigns
//! materials by name: the label mesh gets a per-instance label material pointing at
//! the variant's texture, everything else the shared metal.

use serde::{Deserialize, Serialize};
use showcase_animation::Pose;
use thiserror::Error;

use crate::assets::ModelAsset;
use crate::ids::PlacementId;
use crate::material::{LabelMaterial, MeshMaterial, MetalMaterial, DEFAULT_LABEL_MESH};
use crate::variant::ProductVariant;

#[derive(Debug, Error, PartialEq)]
pub enum BindError {
    #[error("object '{object}': model has no mesh named '{mesh}'")]
    MissingLabelMesh { object: String, mesh: String },
    #[error("object '{object}': unknown variant '{variant}'")]
    UnknownVariant { object: String, variant: String },
}

fn default_scale() -> f32 {
    4.0
}

/// Where a product instance sits inside a scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Object id; regions and loops address the instance by it.
    pub id: String,
    pub scene: String,
    pub model: String,
    #[serde(default)]
    pub position: [f32; 3],
    /// Rotation about Z in radians.
    #[serde(default)]
    pub tilt: f32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    pub variant: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum InstanceState {
    Bound,
    /// Model loaded but the label mesh is missing; every mesh is metal.
    Unlabeled,
    /// Model unavailable; the host should draw a stand-in.
    Placeholder(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshBinding {
    pub mesh: String,
    pub material: MeshMaterial,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductInstance {
    pub id: PlacementId,
    pub object: String,
    pub scene: String,
    pub base: Pose,
    /// Index of the variant currently shown.
    pub variant: usize,
    pub meshes: Vec<MeshBinding>,
    pub state: InstanceState,
}

impl ProductInstance {
    pub fn label_texture(&self) -> Option<&str> {
        self.meshes.iter().find_map(|m| match &m.material {
            MeshMaterial::Label(label) => label.texture.as_deref(),
            MeshMaterial::SharedMetal => None,
        })
    }

    pub fn has_label(&self) -> bool {
        self.meshes
            .iter()
            .any(|m| matches!(m.material, MeshMaterial::Label(_)))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialBinder {
    pub label_mesh: String,
    pub label: LabelMaterial,
    pub metal: MetalMaterial,
}

impl Default for MaterialBinder {
    fn default() -> Self {
        Self {
            label_mesh: DEFAULT_LABEL_MESH.to_string(),
            label: LabelMaterial::default(),
            metal: MetalMaterial::default(),
        }
    }
}

impl MaterialBinder {
    /// Rest pose of a placement: scaled, turned to face the camera, tilted.
    pub fn base_pose(placement: &Placement) -> Pose {
        Pose {
            position: placement.position,
            rotation: [0.0, std::f32::consts::PI, placement.tilt],
            scale: [placement.scale; 3],
            ..Pose::default()
        }
    }

    /// Bind `model` for `placement`. Fails if the label mesh is absent; callers
    /// that want to keep going use [`MaterialBinder::bind_metal_only`].
    pub fn bind(
        &self,
        id: PlacementId,
        placement: &Placement,
        model: &ModelAsset,
        variant_index: usize,
        variant: &ProductVariant,
        texture_available: bool,
    ) -> Result<ProductInstance, BindError> {
        if !model.has_mesh(&self.label_mesh) {
            return Err(BindError::MissingLabelMesh {
                object: placement.id.clone(),
                mesh: self.label_mesh.clone(),
            });
        }
        let texture = texture_available.then(|| variant.label_texture.clone());
        let meshes = model
            .meshes
            .iter()
            .map(|mesh| MeshBinding {
                mesh: mesh.name.clone(),
                material: if mesh.name == self.label_mesh {
                    MeshMaterial::Label(LabelMaterial {
                        texture: texture.clone(),
                        ..self.label.clone()
                    })
                } else {
                    MeshMaterial::SharedMetal
                },
            })
            .collect();
        Ok(ProductInstance {
            id,
            object: placement.id.clone(),
            scene: placement.scene.clone(),
            base: Self::base_pose(placement),
            variant: variant_index,
            meshes,
            state: InstanceState::Bound,
        })
    }

    pub fn bind_metal_only(
        &self,
        id: PlacementId,
        placement: &Placement,
        model: &ModelAsset,
        variant_index: usize,
    ) -> ProductInstance {
        ProductInstance {
            id,
            object: placement.id.clone(),
            scene: placement.scene.clone(),
            base: Self::base_pose(placement),
            variant: variant_index,
            meshes: model
                .meshes
                .iter()
                .map(|mesh| MeshBinding {
                    mesh: mesh.name.clone(),
                    material: MeshMaterial::SharedMetal,
                })
                .collect(),
            state: InstanceState::Unlabeled,
        }
    }

    pub fn placeholder(
        id: PlacementId,
        placement: &Placement,
        variant_index: usize,
        reason: impl Into<String>,
    ) -> ProductInstance {
        ProductInstance {
            id,
            object: placement.id.clone(),
            scene: placement.scene.clone(),
            base: Self::base_pose(placement),
            variant: variant_index,
            meshes: Vec::new(),
            state: InstanceState::Placeholder(reason.into()),
        }
    }

    /// Point the instance's label at `variant`'s texture. Only the texture reference
    /// changes; applying the current variant again is a no-op. Returns whether
    /// anything changed.
    pub fn apply_variant(
        &self,
        instance: &mut ProductInstance,
        variant_index: usize,
        variant: &ProductVariant,
        texture_available: bool,
    ) -> bool {
        let texture = texture_available.then(|| variant.label_texture.clone());
        let mut changed = instance.variant != variant_index;
        instance.variant = variant_index;
        for binding in &mut instance.meshes {
            if let MeshMaterial::Label(label) = &mut binding.material {
                if label.texture != texture {
                    label.texture = texture.clone();
                    changed = true;
                }
            }
        }
        changed
    }

    /// Drop references to a texture that failed to load.
    pub fn clear_texture(instance: &mut ProductInstance, url: &str) -> bool {
        let mut changed = false;
        for binding in &mut instance.meshes {
            if let MeshMaterial::Label(label) = &mut binding.material {
                if label.texture.as_deref() == Some(url) {
                    label.texture = None;
                    changed = true;
                }
            }
        }
        changed
    }
}

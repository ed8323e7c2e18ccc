//! Showcase Scene Core
//!
//! Everything the page needs to know about a visual scene without talking to a
//! renderer: camera and render-target math, environment-map state, the memoized
//! asset cache, the fixed flavor variants and the mesh-name material convention.

pub mod assets;
pub mod binder;
pub mod bootstrap;
pub mod ids;
pub mod material;
pub mod variant;

pub use assets::{AssetCache, AssetKind, AssetPayload, AssetRequest, AssetState, MeshInfo, ModelAsset};
pub use binder::{
    BindError, InstanceState, MaterialBinder, MeshBinding, Placement, ProductInstance,
};
pub use bootstrap::{
    Camera, CameraConfig, EnvironmentState, RenderTarget, SceneConfig, SceneContext, SceneError,
    ToneMapping, Viewport, MAX_PIXEL_RATIO,
};
pub use ids::{AmbientId, IdAllocator, IdError, PlacementId};
pub use material::{LabelMaterial, MeshMaterial, MetalMaterial, DEFAULT_LABEL_MESH};
pub use variant::{ProductVariant, VariantError, VariantTable, VARIANT_COUNT};

//! Scene bootstrapping: camera, render target and environment lighting state.
//!
//! A scene is bound to one canvas and owns a single perspective camera. The render
//! target follows the viewport: CSS size equals the viewport, the backing buffer is
//! scaled by the device pixel ratio capped at [`MAX_PIXEL_RATIO`].

use serde::{Deserialize, Serialize};
use showcase_animation::Extent;
use thiserror::Error;

/// Upper bound for the backing-buffer pixel ratio.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("scene '{scene}': degenerate viewport {width}x{height}")]
    DegenerateViewport {
        scene: String,
        width: f32,
        height: f32,
    },
    #[error("scene '{scene}': invalid camera ({reason})")]
    InvalidCamera { scene: String, reason: String },
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_dpr")]
    pub device_pixel_ratio: f32,
}

fn default_dpr() -> f32 {
    1.0
}

impl Viewport {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite()) || self.width <= 0.0 || self.height <= 0.0
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// CSS size, for resolving `vw`/`vh` animation values.
    #[inline]
    pub fn extent(&self) -> Extent {
        Extent::new(self.width, self.height)
    }

    /// Device pixel ratio clamped to `(0, MAX_PIXEL_RATIO]`; garbage falls back to 1.
    pub fn pixel_ratio(&self) -> f32 {
        let dpr = self.device_pixel_ratio;
        if dpr.is_finite() && dpr > 0.0 {
            dpr.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 25.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 0.0, 12.0],
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneMapping {
    None,
    Linear,
    Reinhard,
    #[default]
    AcesFilmic,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub id: String,
    /// Selector of the canvas this scene renders into.
    pub canvas: String,
    #[serde(default)]
    pub camera: CameraConfig,
    /// Equirectangular HDR used as image-based lighting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default)]
    pub tone_mapping: ToneMapping,
    #[serde(default = "default_exposure")]
    pub exposure: f32,
    /// Transparent clear color so the page background shows through.
    #[serde(default = "default_alpha")]
    pub alpha: bool,
}

fn default_exposure() -> f32 {
    1.0
}

fn default_alpha() -> bool {
    true
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderTarget {
    pub css_width: f32,
    pub css_height: f32,
    pub pixel_ratio: f32,
    pub buffer_width: u32,
    pub buffer_height: u32,
}

impl RenderTarget {
    fn for_viewport(viewport: &Viewport) -> Self {
        let pixel_ratio = viewport.pixel_ratio();
        Self {
            css_width: viewport.width,
            css_height: viewport.height,
            pixel_ratio,
            buffer_width: (viewport.width * pixel_ratio).round() as u32,
            buffer_height: (viewport.height * pixel_ratio).round() as u32,
        }
    }
}

/// Image-based lighting state. A scene without a ready map still renders, just
/// without environment reflections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "url", rename_all = "snake_case")]
pub enum EnvironmentState {
    Absent,
    Pending(String),
    Ready(String),
    Unavailable(String),
}

impl EnvironmentState {
    pub fn url(&self) -> Option<&str> {
        match self {
            EnvironmentState::Absent => None,
            EnvironmentState::Pending(u)
            | EnvironmentState::Ready(u)
            | EnvironmentState::Unavailable(u) => Some(u),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneContext {
    pub config: SceneConfig,
    pub camera: Camera,
    pub render_target: RenderTarget,
    pub environment: EnvironmentState,
}

impl SceneContext {
    pub fn bootstrap(config: SceneConfig, viewport: &Viewport) -> Result<Self, SceneError> {
        let cam = &config.camera;
        let camera_ok = cam.fov.is_finite()
            && cam.fov > 0.0
            && cam.fov < 180.0
            && cam.near > 0.0
            && cam.far > cam.near;
        if !camera_ok {
            return Err(SceneError::InvalidCamera {
                scene: config.id.clone(),
                reason: format!(
                    "fov {} near {} far {}",
                    cam.fov, cam.near, cam.far
                ),
            });
        }
        check_viewport(&config.id, viewport)?;

        let camera = Camera {
            fov: cam.fov,
            aspect: viewport.aspect(),
            near: cam.near,
            far: cam.far,
            position: cam.position,
        };
        let environment = match &config.environment {
            Some(url) => EnvironmentState::Pending(url.clone()),
            None => EnvironmentState::Absent,
        };
        log::debug!(
            "scene '{}' bootstrapped on '{}' ({}x{} @{}x)",
            config.id,
            config.canvas,
            viewport.width,
            viewport.height,
            viewport.pixel_ratio()
        );
        Ok(Self {
            render_target: RenderTarget::for_viewport(viewport),
            camera,
            environment,
            config,
        })
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Refit camera aspect and render target. A degenerate viewport leaves the
    /// previous state untouched.
    pub fn resize(&mut self, viewport: &Viewport) -> Result<(), SceneError> {
        check_viewport(&self.config.id, viewport)?;
        self.camera.aspect = viewport.aspect();
        self.render_target = RenderTarget::for_viewport(viewport);
        Ok(())
    }

    /// Mark the environment map ready if `url` is the one this scene waits on.
    pub fn environment_ready(&mut self, url: &str) -> bool {
        self.transition_environment(url, EnvironmentState::Ready(url.to_string()))
    }

    pub fn environment_unavailable(&mut self, url: &str) -> bool {
        self.transition_environment(url, EnvironmentState::Unavailable(url.to_string()))
    }

    fn transition_environment(&mut self, url: &str, next: EnvironmentState) -> bool {
        if self.environment.url() != Some(url) || self.environment == next {
            return false;
        }
        self.environment = next;
        true
    }
}

fn check_viewport(scene: &str, viewport: &Viewport) -> Result<(), SceneError> {
    if viewport.is_degenerate() {
        return Err(SceneError::DegenerateViewport {
            scene: scene.to_string(),
            width: viewport.width,
            height: viewport.height,
        });
    }
    Ok(())
}

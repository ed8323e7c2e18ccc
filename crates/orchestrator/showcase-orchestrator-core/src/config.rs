//! Page configuration and engine sizing.
//!
//! `PageConfig` is the declarative description of one showcase page, normally loaded
//! from JSON. `OrchestratorConfig` holds sizing knobs that are not part of the page.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use showcase_animation::{Ease, Extent, LoopSpec, Scalar, StepValues, TweenStep};
use showcase_scene::{MaterialBinder, Placement, ProductVariant, SceneConfig};

use crate::position::ScrollPosition;

/// Engine sizing and tolerances.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Maximum events kept per tick; the rest are dropped with a warning.
    pub max_events_per_tick: usize,
    /// Live-object cap for spawners that do not set `max_live`.
    pub default_ambient_cap: usize,
    /// Tolerance when comparing explicit edge resets to timeline endpoints.
    pub edge_tolerance: f32,
    /// Lagged scrub progress snaps to its target within this distance.
    pub scrub_snap: f32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_events_per_tick: 1024,
            default_ambient_cap: 200,
            edge_tolerance: 1e-4,
            scrub_snap: 1e-4,
        }
    }
}

/// What an animation drives: a placed 3D object or a DOM element.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRef {
    Object(String),
    Element(String),
}

impl std::fmt::Display for TargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetRef::Object(id) => write!(f, "object '{id}'"),
            TargetRef::Element(sel) => write!(f, "element '{sel}'"),
        }
    }
}

/// How region progress follows scroll. JSON: `true` or a lag in seconds.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub enum Scrub {
    #[default]
    Immediate,
    Lag(f32),
}

impl Serialize for Scrub {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scrub::Immediate => serializer.serialize_bool(true),
            Scrub::Lag(s) => serializer.serialize_f32(*s),
        }
    }
}

impl<'de> Deserialize<'de> for Scrub {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Seconds(f32),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Flag(true) => Ok(Scrub::Immediate),
            Raw::Flag(false) => Err(de::Error::custom(
                "scrub: false is not supported; regions always follow scroll",
            )),
            Raw::Seconds(s) if s.is_finite() && s > 0.0 => Ok(Scrub::Lag(s)),
            Raw::Seconds(s) if s == 0.0 => Ok(Scrub::Immediate),
            Raw::Seconds(s) => Err(de::Error::custom(format!(
                "scrub lag must be a positive number of seconds (got {s})"
            ))),
        }
    }
}

/// A style write applied to a DOM element. A value that is a single `vw`/`vh`
/// length (`"100vh"`) is written in pixels for the viewport current at the time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleEffect {
    pub selector: String,
    pub property: String,
    pub value: String,
}

impl StyleEffect {
    pub fn value_for(&self, viewport: Extent) -> String {
        match self.value.parse::<Scalar>() {
            Ok(len) if len.is_relative() => {
                format!("{}px", len.resolve(Some(viewport)).unwrap_or_default())
            }
            _ => self.value.clone(),
        }
    }
}

/// Optional explicit poses for each edge. They must agree with the region's
/// timeline endpoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeResets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enter: Option<StepValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave: Option<StepValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enter_back: Option<StepValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave_back: Option<StepValues>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeEffects {
    #[serde(default)]
    pub enter: Vec<StyleEffect>,
    #[serde(default)]
    pub leave: Vec<StyleEffect>,
    #[serde(default)]
    pub enter_back: Vec<StyleEffect>,
    #[serde(default)]
    pub leave_back: Vec<StyleEffect>,
}

fn default_start() -> ScrollPosition {
    ScrollPosition::new(crate::position::EdgeRef::Top, crate::position::EdgeRef::Bottom)
}

fn default_end() -> ScrollPosition {
    ScrollPosition::new(crate::position::EdgeRef::Bottom, crate::position::EdgeRef::Top)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub id: String,
    /// Selector of the element whose box defines the region.
    pub trigger: String,
    #[serde(default = "default_start")]
    pub start: ScrollPosition,
    #[serde(default = "default_end")]
    pub end: ScrollPosition,
    #[serde(default)]
    pub scrub: Scrub,
    pub target: TargetRef,
    pub steps: Vec<TweenStep>,
    /// Timeline length in seconds that progress maps onto; defaults to the end of
    /// the last step. Lets several regions share one schedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f32>,
    #[serde(default)]
    pub resets: EdgeResets,
    #[serde(default)]
    pub effects: EdgeEffects,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    pub target: TargetRef,
    /// More targets running the same loop, each starting `stagger` seconds after
    /// the one before it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub followers: Vec<TargetRef>,
    #[serde(default)]
    pub stagger: f32,
    #[serde(flatten)]
    pub spec: LoopSpec,
}

impl LoopConfig {
    /// One loop per target, with the stagger folded into each delay.
    pub fn expand(&self) -> impl Iterator<Item = (TargetRef, LoopSpec)> + '_ {
        std::iter::once(&self.target)
            .chain(&self.followers)
            .enumerate()
            .map(move |(i, target)| {
                let mut spec = self.spec.clone();
                spec.delay += i as f32 * self.stagger;
                (target.clone(), spec)
            })
    }
}

/// Inclusive `[min, max]` range sampled uniformly.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Span(pub f32, pub f32);

impl Span {
    pub const fn fixed(v: f32) -> Self {
        Span(v, v)
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_finite() && self.1.is_finite() && self.0 <= self.1
    }
}

impl Default for Span {
    fn default() -> Self {
        Span(0.0, 0.0)
    }
}

fn unit_span() -> Span {
    Span::fixed(1.0)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AmbientShape {
    Sphere {
        radius: Span,
        color: showcase_animation::Color,
    },
    Model {
        url: String,
    },
}

fn default_x_spread() -> f32 {
    1.0 / 50.0
}

/// Randomized template for spawned objects. `x` spreads across the viewport width
/// (`(r - 0.5) * width * x_spread_per_px`); the object rises to `rise_to` on Y.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AmbientTemplate {
    pub shape: AmbientShape,
    #[serde(default = "default_x_spread")]
    pub x_spread_per_px: f32,
    pub y: Span,
    #[serde(default)]
    pub z: Span,
    #[serde(default = "unit_span")]
    pub scale: Span,
    #[serde(default = "unit_span")]
    pub opacity: Span,
    #[serde(default)]
    pub rotation_x: Span,
    #[serde(default)]
    pub rotation_y: Span,
    pub rise_to: f32,
    pub duration: Span,
    #[serde(default)]
    pub delay: Span,
    #[serde(default)]
    pub ease: Ease,
    /// Extra turn about Y over the rise, in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnerConfig {
    pub id: String,
    pub scene: String,
    /// Seconds between spawns.
    pub interval: f32,
    /// Objects spawned at construction.
    #[serde(default)]
    pub initial_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_live: Option<usize>,
    pub template: AmbientTemplate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    pub duration: f32,
    /// Peak rotation offset about Z, radians.
    pub rotation: f32,
    /// Peak position offset on X, world units.
    pub offset: f32,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            duration: 0.4,
            rotation: 0.15,
            offset: 0.05,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantSwitchConfig {
    /// Object id of the product whose label follows the cursor.
    pub target: String,
    pub next_button: String,
    pub previous_button: String,
    pub label_text: String,
    #[serde(default)]
    pub rings: Vec<String>,
    pub background: String,
    /// Variant id shown first; defaults to the first variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
    #[serde(default)]
    pub jitter: JitterConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub scenes: Vec<SceneConfig>,
    #[serde(default)]
    pub materials: MaterialBinder,
    pub variants: Vec<ProductVariant>,
    #[serde(default)]
    pub products: Vec<Placement>,
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub loops: Vec<LoopConfig>,
    #[serde(default)]
    pub spawners: Vec<SpawnerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_switch: Option<VariantSwitchConfig>,
    /// Seed for spawner randomness.
    #[serde(default)]
    pub seed: u64,
}

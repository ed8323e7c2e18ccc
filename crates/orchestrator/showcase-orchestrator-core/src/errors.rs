//! Setup errors. Page construction is fail-fast: every error names the offending
//! selector or id.

use showcase_animation::{Channel, TimelineError};
use showcase_scene::{IdError, SceneError, VariantError};
use thiserror::Error;

use crate::outputs::Edge;

#[derive(Debug, Error, PartialEq)]
pub enum SetupError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("variants: {0}")]
    Variants(#[from] VariantError),
    #[error(transparent)]
    Ids(#[from] IdError),
    #[error("duplicate scene id '{0}'")]
    DuplicateScene(String),
    #[error("duplicate object id '{0}'")]
    DuplicateObject(String),
    #[error("duplicate region id '{0}'")]
    DuplicateRegion(String),
    #[error("{context}: unknown scene '{scene}'")]
    UnknownScene { context: String, scene: String },
    #[error("{context}: unknown object '{object}'")]
    UnknownObject { context: String, object: String },
    #[error("{context}: unknown variant '{variant}'")]
    UnknownVariant { context: String, variant: String },
    #[error("{context}: element '{selector}' not found in layout")]
    MissingElement { context: String, selector: String },
    #[error("region '{region}': start offset {start} must precede end offset {end}")]
    InvertedRegion { region: String, start: f32, end: f32 },
    #[error("region '{region}': {source}")]
    RegionTimeline {
        region: String,
        #[source]
        source: TimelineError,
    },
    #[error("loop on {target}: {source}")]
    LoopTimeline {
        target: String,
        #[source]
        source: TimelineError,
    },
    #[error("region '{region}': {edge:?} reset on {channel} is {reset}, timeline parks at {parked}")]
    EdgePoseMismatch {
        region: String,
        edge: Edge,
        channel: Channel,
        reset: f32,
        parked: f32,
    },
    #[error("region '{region}': {edge:?} reset sets {channel}, which the region does not animate")]
    EdgePoseUnanimated {
        region: String,
        edge: Edge,
        channel: Channel,
    },
    #[error("loop on {target}: stagger must be a non-negative number of seconds (got {stagger})")]
    InvalidStagger { target: String, stagger: f32 },
    #[error("page is torn down")]
    TornDown,
    #[error("spawner '{spawner}': {reason}")]
    InvalidSpawner { spawner: String, reason: String },
}

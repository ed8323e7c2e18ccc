//! Showcase Animation Core (engine-agnostic)
//!
//! Pose channels, easing curves, key-frame steps, timelines sampled by normalized
//! progress and time loops sampled by elapsed seconds. Nothing here knows about
//! scroll positions or scenes; the orchestrator drives these samplers.

pub mod channel;
pub mod ease;
pub mod interp;
pub mod looping;
pub mod step;
pub mod timeline;

pub use channel::{Channel, ChannelValues, Color, Pose};
pub use ease::{Ease, EaseDir};
pub use looping::{LoopAnimation, LoopSample, LoopSpec, Repeat};
pub use step::{
    Axes3, Extent, Scalar, ScalarParseError, StepMode, StepValues, TweenStep,
    DEFAULT_STEP_DURATION,
};
pub use timeline::{Timeline, TimelineError};

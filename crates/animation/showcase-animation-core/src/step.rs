//! Key-frame steps as authored in page configuration.
//!
//! JSON shape (all fields optional except at least one target value):
//! ```json
//! { "mode": "to", "duration": 5, "ease": "power2.inOut",
//!   "position": { "x": 3.14, "z": 1 }, "opacity": 0, "color": "#D9F99D" }
//! ```
//! `from` mode animates from the given values to the values current at that point of
//! the timeline; `from_to` additionally carries an explicit `from` block.
//!
//! Position, rotation and scale components may be viewport-relative: `"-90vw"` is
//! 90% of the viewport width, negated; `"100vh"` is the full viewport height. They
//! resolve against an [`Extent`] when the timeline is built.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::channel::{Channel, ChannelValues, Color};
use crate::ease::Ease;

/// Duration used when a step does not specify one.
pub const DEFAULT_STEP_DURATION: f32 = 0.5;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    #[default]
    To,
    From,
    FromTo,
}

/// Viewport size in CSS pixels.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub width: f32,
    pub height: f32,
}

impl Extent {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("'{0}' is not a number or a vw/vh length")]
pub struct ScalarParseError(pub String);

/// One component value: absolute, or a percentage of the viewport width/height.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Scalar {
    Abs(f32),
    Vw(f32),
    Vh(f32),
}

impl Scalar {
    /// Absolute value against `viewport`; `None` when relative and no viewport is
    /// known.
    pub fn resolve(self, viewport: Option<Extent>) -> Option<f32> {
        match (self, viewport) {
            (Scalar::Abs(v), _) => Some(v),
            (Scalar::Vw(pct), Some(e)) => Some(pct / 100.0 * e.width),
            (Scalar::Vh(pct), Some(e)) => Some(pct / 100.0 * e.height),
            (_, None) => None,
        }
    }

    pub fn is_relative(self) -> bool {
        !matches!(self, Scalar::Abs(_))
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Scalar::Abs(value)
    }
}

impl FromStr for Scalar {
    type Err = ScalarParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number = |n: &str| n.trim().parse::<f32>().ok().filter(|v| v.is_finite());
        let t = s.trim();
        let parsed = if let Some(n) = t.strip_suffix("vw") {
            number(n).map(Scalar::Vw)
        } else if let Some(n) = t.strip_suffix("vh") {
            number(n).map(Scalar::Vh)
        } else {
            number(t).map(Scalar::Abs)
        };
        parsed.ok_or_else(|| ScalarParseError(s.to_string()))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Abs(v) => write!(f, "{v}"),
            Scalar::Vw(v) => write!(f, "{v}vw"),
            Scalar::Vh(v) => write!(f, "{v}vh"),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Abs(v) => serializer.serialize_f32(*v),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f32),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(Scalar::Abs(v)),
            Raw::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Axes3 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<Scalar>,
}

impl Axes3 {
    pub fn xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: Some(x.into()),
            y: Some(y.into()),
            z: Some(z.into()),
        }
    }

    fn push_into(
        &self,
        out: &mut ChannelValues,
        channels: [Channel; 3],
        viewport: Option<Extent>,
    ) -> Result<(), Channel> {
        for (value, channel) in [self.x, self.y, self.z].into_iter().zip(channels) {
            if let Some(v) = value {
                out.set(channel, v.resolve(viewport).ok_or(channel)?);
            }
        }
        Ok(())
    }

    fn is_relative(&self) -> bool {
        [self.x, self.y, self.z]
            .into_iter()
            .flatten()
            .any(Scalar::is_relative)
    }
}

/// Sparse target values of a step.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Axes3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Axes3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Axes3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl StepValues {
    /// Channel values with relative components resolved against `viewport`. Fails
    /// with the first channel that is relative while `viewport` is `None`.
    pub fn resolve(&self, viewport: Option<Extent>) -> Result<ChannelValues, Channel> {
        let mut out = ChannelValues::new();
        if let Some(p) = &self.position {
            p.push_into(
                &mut out,
                [Channel::PositionX, Channel::PositionY, Channel::PositionZ],
                viewport,
            )?;
        }
        if let Some(r) = &self.rotation {
            r.push_into(
                &mut out,
                [Channel::RotationX, Channel::RotationY, Channel::RotationZ],
                viewport,
            )?;
        }
        if let Some(s) = &self.scale {
            s.push_into(
                &mut out,
                [Channel::ScaleX, Channel::ScaleY, Channel::ScaleZ],
                viewport,
            )?;
        }
        if let Some(o) = self.opacity {
            out.set(Channel::Opacity, o);
        }
        if let Some(Color([r, g, b, a])) = self.color {
            out.set(Channel::ColorR, r);
            out.set(Channel::ColorG, g);
            out.set(Channel::ColorB, b);
            out.set(Channel::ColorA, a);
        }
        Ok(out)
    }

    /// Whether any component depends on the viewport size.
    pub fn is_relative(&self) -> bool {
        [&self.position, &self.rotation, &self.scale]
            .into_iter()
            .flatten()
            .any(Axes3::is_relative)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TweenStep {
    #[serde(default)]
    pub mode: StepMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease: Option<Ease>,
    /// Seconds inserted before this step starts.
    #[serde(default)]
    pub delay: f32,
    /// Absolute start position inside the timeline; defaults to the end of the
    /// previous step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<f32>,
    #[serde(flatten)]
    pub values: StepValues,
    /// Explicit start values for `from_to`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<StepValues>,
}

impl TweenStep {
    pub fn to_values(values: StepValues, duration: f32) -> Self {
        Self {
            mode: StepMode::To,
            duration: Some(duration),
            values,
            ..Self::default()
        }
    }

    pub fn from_values(values: StepValues, duration: f32) -> Self {
        Self {
            mode: StepMode::From,
            duration: Some(duration),
            values,
            ..Self::default()
        }
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = Some(ease);
        self
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub fn at(mut self, at: f32) -> Self {
        self.at = Some(at);
        self
    }

    pub fn is_relative(&self) -> bool {
        self.values.is_relative() || self.from.as_ref().is_some_and(StepValues::is_relative)
    }

    #[inline]
    pub fn effective_duration(&self) -> f32 {
        self.duration.unwrap_or(DEFAULT_STEP_DURATION)
    }

    #[inline]
    pub fn effective_ease(&self) -> Ease {
        self.ease.unwrap_or_default()
    }
}

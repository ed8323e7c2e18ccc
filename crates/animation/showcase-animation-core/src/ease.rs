//! Easing curves.
//!
//! Names follow the GSAP vocabulary used by page authors (`"power2.inOut"`,
//! `"bounce.out"`, `"none"`). `powerN` has exponent `N + 1`, so `power1` is
//! quadratic and `power2` cubic. A bare family name without a direction means `out`.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EaseDir {
    In,
    Out,
    InOut,
}

impl EaseDir {
    fn name(self) -> &'static str {
        match self {
            EaseDir::In => "in",
            EaseDir::Out => "out",
            EaseDir::InOut => "inOut",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ease {
    Linear,
    /// Polynomial ease of exponent `degree + 1` (degree 1..=4).
    Power { degree: u8, dir: EaseDir },
    Bounce(EaseDir),
    Sine(EaseDir),
}

impl Default for Ease {
    /// GSAP's default ease for tweens.
    fn default() -> Self {
        Ease::Power {
            degree: 1,
            dir: EaseDir::Out,
        }
    }
}

/// Apply an in/out/inOut construction to an ease-in curve.
#[inline]
fn shaped(dir: EaseDir, t: f32, ease_in: impl Fn(f32) -> f32) -> f32 {
    match dir {
        EaseDir::In => ease_in(t),
        EaseDir::Out => 1.0 - ease_in(1.0 - t),
        EaseDir::InOut => {
            if t < 0.5 {
                ease_in(2.0 * t) * 0.5
            } else {
                1.0 - ease_in(2.0 * (1.0 - t)) * 0.5
            }
        }
    }
}

/// Classic piecewise-parabolic bounce (ease-out form).
fn bounce_out(t: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984_375
    }
}

impl Ease {
    /// Map linear progress `t` in `[0, 1]` to eased progress. Input is clamped;
    /// endpoints are exact (`apply(0) == 0`, `apply(1) == 1`).
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Ease::Linear => t,
            Ease::Power { degree, dir } => {
                let exp = i32::from(degree) + 1;
                shaped(dir, t, |x| x.powi(exp))
            }
            Ease::Bounce(dir) => shaped(dir, t, |x| 1.0 - bounce_out(1.0 - x)),
            Ease::Sine(dir) => shaped(dir, t, |x| 1.0 - (x * PI * 0.5).cos()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ease '{0}'")]
pub struct UnknownEase(pub String);

impl FromStr for Ease {
    type Err = UnknownEase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (family, dir) = match trimmed.split_once('.') {
            Some((family, dir)) => {
                let dir = match dir {
                    "in" => EaseDir::In,
                    "out" => EaseDir::Out,
                    "inOut" | "in_out" | "inout" => EaseDir::InOut,
                    _ => return Err(UnknownEase(s.to_string())),
                };
                (family, dir)
            }
            None => (trimmed, EaseDir::Out),
        };
        let ease = match family {
            "none" | "linear" | "power0" => Ease::Linear,
            "power1" | "quad" => Ease::Power { degree: 1, dir },
            "power2" | "cubic" => Ease::Power { degree: 2, dir },
            "power3" | "quart" => Ease::Power { degree: 3, dir },
            "power4" | "quint" | "strong" => Ease::Power { degree: 4, dir },
            "bounce" => Ease::Bounce(dir),
            "sine" => Ease::Sine(dir),
            _ => return Err(UnknownEase(s.to_string())),
        };
        Ok(ease)
    }
}

impl TryFrom<String> for Ease {
    type Error = UnknownEase;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ease::Linear => f.write_str("none"),
            Ease::Power { degree, dir } => write!(f, "power{}.{}", degree, dir.name()),
            Ease::Bounce(dir) => write!(f, "bounce.{}", dir.name()),
            Ease::Sine(dir) => write!(f, "sine.{}", dir.name()),
        }
    }
}

impl From<Ease> for String {
    fn from(value: Ease) -> Self {
        value.to_string()
    }
}

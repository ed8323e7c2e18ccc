//! Scroll position strings.
//!
//! A position is `"<trigger edge> <viewport edge>"`: the region boundary is reached
//! when that point of the trigger element lines up with that point of the viewport.
//! Each edge is `top`, `center`, `bottom`, a percentage (`90%`, `-15%`) or a pixel
//! length (`120px`, bare numbers are pixels).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PositionParseError {
    #[error("position '{0}' must have exactly two parts: '<trigger edge> <viewport edge>'")]
    Arity(String),
    #[error("position '{input}': unrecognized edge '{edge}'")]
    Edge { input: String, edge: String },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EdgeRef {
    Top,
    Center,
    Bottom,
    Percent(f32),
    Pixels(f32),
}

impl EdgeRef {
    /// Distance from the top of a box of height `length`.
    pub fn resolve(self, length: f32) -> f32 {
        match self {
            EdgeRef::Top => 0.0,
            EdgeRef::Center => length * 0.5,
            EdgeRef::Bottom => length,
            EdgeRef::Percent(p) => length * p / 100.0,
            EdgeRef::Pixels(px) => px,
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "top" => Some(EdgeRef::Top),
            "center" => Some(EdgeRef::Center),
            "bottom" => Some(EdgeRef::Bottom),
            _ => {
                if let Some(pct) = token.strip_suffix('%') {
                    pct.parse::<f32>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .map(EdgeRef::Percent)
                } else {
                    token
                        .strip_suffix("px")
                        .unwrap_or(token)
                        .parse::<f32>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .map(EdgeRef::Pixels)
                }
            }
        }
    }
}

impl fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeRef::Top => f.write_str("top"),
            EdgeRef::Center => f.write_str("center"),
            EdgeRef::Bottom => f.write_str("bottom"),
            EdgeRef::Percent(p) => write!(f, "{p}%"),
            EdgeRef::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScrollPosition {
    pub trigger: EdgeRef,
    pub viewport: EdgeRef,
}

impl ScrollPosition {
    pub const fn new(trigger: EdgeRef, viewport: EdgeRef) -> Self {
        Self { trigger, viewport }
    }

    /// Document scroll offset at which this position is reached.
    pub fn offset(&self, trigger_top: f32, trigger_height: f32, viewport_height: f32) -> f32 {
        trigger_top + self.trigger.resolve(trigger_height) - self.viewport.resolve(viewport_height)
    }
}

impl FromStr for ScrollPosition {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        let [trigger, viewport] = parts.as_slice() else {
            return Err(PositionParseError::Arity(s.to_string()));
        };
        let edge = |token: &str| {
            EdgeRef::parse(token).ok_or_else(|| PositionParseError::Edge {
                input: s.to_string(),
                edge: token.to_string(),
            })
        };
        Ok(Self {
            trigger: edge(*trigger)?,
            viewport: edge(*viewport)?,
        })
    }
}

impl TryFrom<String> for ScrollPosition {
    type Error = PositionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ScrollPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.trigger, self.viewport)
    }
}

impl From<ScrollPosition> for String {
    fn from(value: ScrollPosition) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keywords_and_lengths() {
        let p: ScrollPosition = "top 90%".parse().unwrap();
        assert_eq!(p, ScrollPosition::new(EdgeRef::Top, EdgeRef::Percent(90.0)));
        let p: ScrollPosition = "bottom  bottom".parse().unwrap();
        assert_eq!(p, ScrollPosition::new(EdgeRef::Bottom, EdgeRef::Bottom));
        let p: ScrollPosition = "top -15%".parse().unwrap();
        assert_eq!(p.viewport, EdgeRef::Percent(-15.0));
        let p: ScrollPosition = "center 120px".parse().unwrap();
        assert_eq!(p.viewport, EdgeRef::Pixels(120.0));
    }

    #[test]
    fn rejects_malformed() {
        assert!(matches!(
            "top".parse::<ScrollPosition>(),
            Err(PositionParseError::Arity(_))
        ));
        assert!(matches!(
            "middle top".parse::<ScrollPosition>(),
            Err(PositionParseError::Edge { .. })
        ));
        assert!(serde_json::from_str::<ScrollPosition>("\"top 90%x\"").is_err());
    }

    #[test]
    fn offsets_follow_trigger_and_viewport() {
        // Trigger at 1900px, 600px tall; viewport 1000px tall.
        let start: ScrollPosition = "top 90%".parse().unwrap();
        let end: ScrollPosition = "top 20%".parse().unwrap();
        assert_eq!(start.offset(1900.0, 600.0, 1000.0), 1000.0);
        assert_eq!(end.offset(1900.0, 600.0, 1000.0), 1700.0);
        let pinned: ScrollPosition = "bottom bottom".parse().unwrap();
        assert_eq!(pinned.offset(1900.0, 600.0, 1000.0), 1500.0);
    }

    #[test]
    fn display_roundtrip() {
        let p: ScrollPosition = "top -15%".parse().unwrap();
        assert_eq!(p.to_string(), "top -15%");
        let v = serde_json::to_value(p).unwrap();
        assert_eq!(v, serde_json::json!("top -15%"));
    }
}

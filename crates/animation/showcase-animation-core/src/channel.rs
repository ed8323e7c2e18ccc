//! Animatable channels and the pose they address.
//!
//! A `Pose` is the full animatable state of one target (a 3D object or a DOM
//! element). Steps and timelines only ever touch a sparse set of `Channel`s;
//! untouched channels keep whatever the layer below wrote.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    PositionX,
    PositionY,
    PositionZ,
    RotationX,
    RotationY,
    RotationZ,
    ScaleX,
    ScaleY,
    ScaleZ,
    Opacity,
    ColorR,
    ColorG,
    ColorB,
    ColorA,
}

impl Channel {
    pub const ALL: [Channel; 14] = [
        Channel::PositionX,
        Channel::PositionY,
        Channel::PositionZ,
        Channel::RotationX,
        Channel::RotationY,
        Channel::RotationZ,
        Channel::ScaleX,
        Channel::ScaleY,
        Channel::ScaleZ,
        Channel::Opacity,
        Channel::ColorR,
        Channel::ColorG,
        Channel::ColorB,
        Channel::ColorA,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Channel::PositionX => "position.x",
            Channel::PositionY => "position.y",
            Channel::PositionZ => "position.z",
            Channel::RotationX => "rotation.x",
            Channel::RotationY => "rotation.y",
            Channel::RotationZ => "rotation.z",
            Channel::ScaleX => "scale.x",
            Channel::ScaleY => "scale.y",
            Channel::ScaleZ => "scale.z",
            Channel::Opacity => "opacity",
            Channel::ColorR => "color.r",
            Channel::ColorG => "color.g",
            Channel::ColorB => "color.b",
            Channel::ColorA => "color.a",
        }
    }

    /// Channels that belong to the spatial transform (position/rotation/scale).
    #[inline]
    pub fn is_transform(self) -> bool {
        !matches!(
            self,
            Channel::Opacity | Channel::ColorR | Channel::ColorG | Channel::ColorB | Channel::ColorA
        )
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown channel '{s}'"))
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// RGBA color in `[0, 1]`. Serializes as `#rrggbb` (or `#rrggbbaa` when not opaque).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color(pub [f32; 4]);

impl Color {
    pub const WHITE: Color = Color([1.0, 1.0, 1.0, 1.0]);

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color([r, g, b, 1.0])
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Result<Self, String> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{s}' must start with '#'"))?;
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => hex.to_string(),
            _ => return Err(format!("color '{s}' must have 3, 6 or 8 hex digits")),
        };
        let byte = |i: usize| -> Result<f32, String> {
            expanded
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .map(|b| f32::from(b) / 255.0)
                .ok_or_else(|| format!("color '{s}' has invalid hex digits"))
        };
        let a = if expanded.len() == 8 { byte(6)? } else { 1.0 };
        Ok(Color([byte(0)?, byte(2)?, byte(4)?, a]))
    }

    pub fn to_hex(self) -> String {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let [r, g, b, a] = self.0;
        if to_byte(a) == 255 {
            format!("#{:02x}{:02x}{:02x}", to_byte(r), to_byte(g), to_byte(b))
        } else {
            format!(
                "#{:02x}{:02x}{:02x}{:02x}",
                to_byte(r),
                to_byte(g),
                to_byte(b),
                to_byte(a)
            )
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Full animatable state of a target. Rotation is Euler XYZ in radians.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    pub opacity: f32,
    pub color: [f32; 4],
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
            opacity: 1.0,
            color: [1.0; 4],
        }
    }
}

impl Pose {
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    #[inline]
    pub fn get(&self, channel: Channel) -> f32 {
        match channel {
            Channel::PositionX => self.position[0],
            Channel::PositionY => self.position[1],
            Channel::PositionZ => self.position[2],
            Channel::RotationX => self.rotation[0],
            Channel::RotationY => self.rotation[1],
            Channel::RotationZ => self.rotation[2],
            Channel::ScaleX => self.scale[0],
            Channel::ScaleY => self.scale[1],
            Channel::ScaleZ => self.scale[2],
            Channel::Opacity => self.opacity,
            Channel::ColorR => self.color[0],
            Channel::ColorG => self.color[1],
            Channel::ColorB => self.color[2],
            Channel::ColorA => self.color[3],
        }
    }

    #[inline]
    pub fn set(&mut self, channel: Channel, value: f32) {
        let slot = match channel {
            Channel::PositionX => &mut self.position[0],
            Channel::PositionY => &mut self.position[1],
            Channel::PositionZ => &mut self.position[2],
            Channel::RotationX => &mut self.rotation[0],
            Channel::RotationY => &mut self.rotation[1],
            Channel::RotationZ => &mut self.rotation[2],
            Channel::ScaleX => &mut self.scale[0],
            Channel::ScaleY => &mut self.scale[1],
            Channel::ScaleZ => &mut self.scale[2],
            Channel::Opacity => &mut self.opacity,
            Channel::ColorR => &mut self.color[0],
            Channel::ColorG => &mut self.color[1],
            Channel::ColorB => &mut self.color[2],
            Channel::ColorA => &mut self.color[3],
        };
        *slot = value;
    }

    pub fn apply(&mut self, values: &ChannelValues) {
        for (channel, value) in values.iter() {
            self.set(channel, value);
        }
    }

    pub fn with(mut self, values: &ChannelValues) -> Self {
        self.apply(values);
        self
    }
}

/// Sparse channel → value assignment, kept sorted by channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelValues(Vec<(Channel, f32)>);

impl ChannelValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite one channel.
    pub fn set(&mut self, channel: Channel, value: f32) {
        match self.0.binary_search_by(|(c, _)| c.cmp(&channel)) {
            Ok(i) => self.0[i].1 = value,
            Err(i) => self.0.insert(i, (channel, value)),
        }
    }

    pub fn get(&self, channel: Channel) -> Option<f32> {
        self.0
            .binary_search_by(|(c, _)| c.cmp(&channel))
            .ok()
            .map(|i| self.0[i].1)
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.get(channel).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, f32)> + '_ {
        self.0.iter().copied()
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.0.iter().map(|(c, _)| *c)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay `other` on top of `self` (other wins on shared channels).
    pub fn merge(&mut self, other: &ChannelValues) {
        for (c, v) in other.iter() {
            self.set(c, v);
        }
    }

    /// True when both assign the same channels and every value is within `eps`.
    pub fn approx_eq(&self, other: &ChannelValues, eps: f32) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((ca, va), (cb, vb))| ca == cb && (va - vb).abs() <= eps)
    }

    /// Channel-wise difference report used in diagnostics; only channels present in
    /// both sides and differing by more than `eps` are listed.
    pub fn mismatches(&self, other: &ChannelValues, eps: f32) -> Vec<(Channel, f32, f32)> {
        self.iter()
            .filter_map(|(c, v)| {
                other
                    .get(c)
                    .filter(|o| (o - v).abs() > eps)
                    .map(|o| (c, v, o))
            })
            .collect()
    }
}

impl FromIterator<(Channel, f32)> for ChannelValues {
    fn from_iter<I: IntoIterator<Item = (Channel, f32)>>(iter: I) -> Self {
        let mut out = ChannelValues::new();
        for (c, v) in iter {
            out.set(c, v);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_round_trip() {
        for c in Channel::ALL {
            assert_eq!(c.name().parse::<Channel>().unwrap(), c);
        }
        assert!("position.w".parse::<Channel>().is_err());
    }

    #[test]
    fn color_hex_parsing() {
        let c = Color::from_hex("#D9F99D").unwrap();
        assert_eq!(c.to_hex(), "#d9f99d");
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::WHITE);
        assert!(Color::from_hex("bbbbbb").is_err());
        assert!(Color::from_hex("#bbbbbz").is_err());
        let translucent = Color::from_hex("#00000080").unwrap();
        assert!((translucent.0[3] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn pose_get_set_cover_every_channel() {
        let mut pose = Pose::default();
        for (i, c) in Channel::ALL.iter().enumerate() {
            pose.set(*c, i as f32);
        }
        for (i, c) in Channel::ALL.iter().enumerate() {
            assert_eq!(pose.get(*c), i as f32);
        }
    }

    #[test]
    fn channel_values_stay_sorted_and_merge() {
        let mut a: ChannelValues = [(Channel::PositionZ, 1.0), (Channel::PositionX, 2.0)]
            .into_iter()
            .collect();
        assert_eq!(
            a.channels().collect::<Vec<_>>(),
            vec![Channel::PositionX, Channel::PositionZ]
        );
        let b: ChannelValues = [(Channel::PositionX, 5.0)].into_iter().collect();
        a.merge(&b);
        assert_eq!(a.get(Channel::PositionX), Some(5.0));
        assert_eq!(a.len(), 2);
        assert!(a.mismatches(&b, 1e-6).is_empty());
    }
}

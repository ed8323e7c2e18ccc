//! Time-driven loops: an optional intro timeline followed by a repeating cycle.
//!
//! This covers the ambient behaviors of the page: a one-shot entrance (`intro`),
//! an infinite yoyo sway, a forward loop that resets each cycle, and one-shot rises
//! of spawned objects (intro only, which reports completion).

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::channel::{ChannelValues, Pose};
use crate::step::{Extent, TweenStep};
use crate::timeline::{Timeline, TimelineError};

/// Number of extra plays of the cycle. `-1` in JSON means forever.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    Infinite,
    Count(u32),
}

impl Serialize for Repeat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Repeat::Infinite => serializer.serialize_i64(-1),
            Repeat::Count(n) => serializer.serialize_i64(i64::from(*n)),
        }
    }
}

impl<'de> Deserialize<'de> for Repeat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = i64::deserialize(deserializer)?;
        match n {
            -1 => Ok(Repeat::Infinite),
            n if n >= 0 => u32::try_from(n)
                .map(Repeat::Count)
                .map_err(|_| de::Error::custom("repeat count too large")),
            other => Err(de::Error::custom(format!(
                "repeat must be -1 or a non-negative count (got {other})"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopSpec {
    /// Played once, in order.
    #[serde(default)]
    pub intro: Vec<TweenStep>,
    /// Played after the intro, `repeat` more times.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<TweenStep>,
    #[serde(default)]
    pub yoyo: bool,
    #[serde(default)]
    pub repeat: Repeat,
    /// Seconds before the intro starts.
    #[serde(default)]
    pub delay: f32,
}

impl LoopSpec {
    /// Whether any step depends on the viewport size.
    pub fn is_relative(&self) -> bool {
        self.intro.iter().chain(self.cycle.as_ref()).any(TweenStep::is_relative)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoopSample {
    pub values: ChannelValues,
    pub finished: bool,
}

#[derive(Clone, Debug)]
pub struct LoopAnimation {
    intro: Timeline,
    cycle: Option<Timeline>,
    /// Values at the end of the intro; the cycle overlays these.
    intro_end: ChannelValues,
    yoyo: bool,
    repeat: Repeat,
    delay: f32,
}

impl LoopAnimation {
    pub fn build(base: &Pose, spec: &LoopSpec) -> Result<Self, TimelineError> {
        Self::assemble(base, spec, None)
    }

    /// Like [`LoopAnimation::build`], resolving `vw`/`vh` values against `viewport`.
    pub fn build_with_viewport(
        base: &Pose,
        spec: &LoopSpec,
        viewport: Extent,
    ) -> Result<Self, TimelineError> {
        Self::assemble(base, spec, Some(viewport))
    }

    fn assemble(
        base: &Pose,
        spec: &LoopSpec,
        viewport: Option<Extent>,
    ) -> Result<Self, TimelineError> {
        let intro = Timeline::assemble(base, &spec.intro, viewport)?;
        let intro_end = intro.end_values();
        let after_intro = base.with(&intro_end);
        let cycle = match &spec.cycle {
            Some(step) => Some(Timeline::assemble(
                &after_intro,
                std::slice::from_ref(step),
                viewport,
            )?),
            None => None,
        };
        Ok(Self {
            intro,
            cycle,
            intro_end,
            yoyo: spec.yoyo,
            repeat: spec.repeat,
            delay: spec.delay.max(0.0),
        })
    }

    /// Seconds until the loop finishes, or `None` when it runs forever.
    pub fn total_duration(&self) -> Option<f32> {
        let cycle_len = match &self.cycle {
            None => 0.0,
            Some(c) => match self.repeat {
                Repeat::Infinite if c.duration() > 0.0 => return None,
                Repeat::Infinite => 0.0,
                Repeat::Count(n) => c.duration() * (n as f32 + 1.0),
            },
        };
        Some(self.delay + self.intro.duration() + cycle_len)
    }

    pub fn touches(&self, channel: crate::channel::Channel) -> bool {
        self.intro.touches(channel) || self.cycle.as_ref().is_some_and(|c| c.touches(channel))
    }

    /// Sample at `elapsed` seconds since the loop started.
    pub fn sample(&self, elapsed: f32) -> LoopSample {
        let t = (elapsed - self.delay).max(0.0);
        if t < self.intro.duration() || (self.cycle.is_none() && !self.intro.is_empty()) {
            let finished = self.cycle.is_none() && t >= self.intro.duration();
            return LoopSample {
                values: self.intro.sample_time(t),
                finished,
            };
        }

        let mut values = self.intro_end.clone();
        let Some(cycle) = &self.cycle else {
            return LoopSample {
                values,
                finished: true,
            };
        };
        let period = cycle.duration();
        let t = t - self.intro.duration();
        if period <= 0.0 {
            values.merge(&cycle.end_values());
            return LoopSample {
                values,
                finished: !matches!(self.repeat, Repeat::Infinite),
            };
        }

        let plays = (t / period).floor();
        let (local, reversed, finished) = match self.repeat {
            Repeat::Count(n) if plays > n as f32 => {
                // Parked on the last play's end.
                let last_reversed = self.yoyo && n % 2 == 1;
                (period, last_reversed, true)
            }
            _ => {
                let local = t - plays * period;
                let reversed = self.yoyo && (plays as u64) % 2 == 1;
                (local, reversed, false)
            }
        };
        let cycle_t = if reversed { period - local } else { local };
        values.merge(&cycle.sample_time(cycle_t));
        LoopSample { values, finished }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::ease::Ease;
    use crate::step::{Axes3, StepValues};

    fn rot_y(v: f32) -> StepValues {
        StepValues {
            rotation: Some(Axes3 {
                y: Some(v.into()),
                ..Axes3::default()
            }),
            ..StepValues::default()
        }
    }

    #[test]
    fn yoyo_cycle_swings_back_and_forth() {
        let spec = LoopSpec {
            cycle: Some(TweenStep::to_values(rot_y(1.0), 2.0).with_ease(Ease::Linear)),
            yoyo: true,
            ..LoopSpec::default()
        };
        let anim = LoopAnimation::build(&Pose::default(), &spec).unwrap();
        assert_eq!(anim.total_duration(), None);
        let at = |t: f32| anim.sample(t).values.get(Channel::RotationY).unwrap();
        assert_eq!(at(1.0), 0.5);
        assert_eq!(at(2.0), 1.0);
        assert_eq!(at(3.0), 0.5);
        assert_eq!(at(4.0), 0.0);
        assert!(!anim.sample(100.0).finished);
    }

    #[test]
    fn forward_loop_resets_each_cycle() {
        let spec = LoopSpec {
            cycle: Some(TweenStep::to_values(rot_y(1.0), 2.0).with_ease(Ease::Linear)),
            ..LoopSpec::default()
        };
        let anim = LoopAnimation::build(&Pose::default(), &spec).unwrap();
        let at = |t: f32| anim.sample(t).values.get(Channel::RotationY).unwrap();
        assert_eq!(at(1.0), 0.5);
        assert_eq!(at(3.0), 0.5);
        assert_eq!(at(4.0), 0.0);
    }

    #[test]
    fn intro_then_cycle_starts_from_intro_end() {
        let spec = LoopSpec {
            intro: vec![TweenStep::to_values(rot_y(2.0), 1.0).with_ease(Ease::Linear)],
            cycle: Some(TweenStep::to_values(rot_y(4.0), 1.0).with_ease(Ease::Linear)),
            yoyo: true,
            ..LoopSpec::default()
        };
        let anim = LoopAnimation::build(&Pose::default(), &spec).unwrap();
        let at = |t: f32| anim.sample(t).values.get(Channel::RotationY).unwrap();
        assert_eq!(at(0.5), 1.0);
        assert_eq!(at(1.5), 3.0);
        assert_eq!(at(2.5), 3.0);
        assert_eq!(at(3.0), 2.0);
    }

    #[test]
    fn one_shot_reports_completion_after_delay() {
        let spec = LoopSpec {
            intro: vec![TweenStep::to_values(rot_y(1.0), 2.0)],
            delay: 1.0,
            ..LoopSpec::default()
        };
        let anim = LoopAnimation::build(&Pose::default(), &spec).unwrap();
        assert_eq!(anim.total_duration(), Some(3.0));
        assert!(!anim.sample(2.9).finished);
        let done = anim.sample(3.0);
        assert!(done.finished);
        assert_eq!(done.values.get(Channel::RotationY), Some(1.0));
    }

    #[test]
    fn counted_repeat_parks_on_last_play() {
        let spec = LoopSpec {
            cycle: Some(TweenStep::to_values(rot_y(1.0), 1.0).with_ease(Ease::Linear)),
            yoyo: true,
            repeat: Repeat::Count(1),
            ..LoopSpec::default()
        };
        let anim = LoopAnimation::build(&Pose::default(), &spec).unwrap();
        assert_eq!(anim.total_duration(), Some(2.0));
        let end = anim.sample(10.0);
        assert!(end.finished);
        assert_eq!(end.values.get(Channel::RotationY), Some(0.0));
    }

    #[test]
    fn repeat_serde_accepts_minus_one() {
        assert_eq!(serde_json::from_str::<Repeat>("-1").unwrap(), Repeat::Infinite);
        assert_eq!(serde_json::from_str::<Repeat>("3").unwrap(), Repeat::Count(3));
        assert!(serde_json::from_str::<Repeat>("-2").is_err());
    }

    #[test]
    fn relative_intro_resolves_against_the_viewport() {
        let spec: LoopSpec = serde_json::from_value(serde_json::json!({
            "intro": [{ "mode": "from", "position": { "x": "-50vw" }, "duration": 1, "ease": "none" }]
        }))
        .unwrap();
        assert!(spec.is_relative());
        assert!(LoopAnimation::build(&Pose::default(), &spec).is_err());
        let anim =
            LoopAnimation::build_with_viewport(&Pose::default(), &spec, Extent::new(800.0, 600.0))
                .unwrap();
        assert_eq!(anim.sample(0.0).values.get(Channel::PositionX), Some(-400.0));
        assert_eq!(anim.sample(1.0).values.get(Channel::PositionX), Some(0.0));
    }
}

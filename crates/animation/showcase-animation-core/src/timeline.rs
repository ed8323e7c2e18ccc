//! Key-frame timelines.
//!
//! Model:
//! - Steps are laid out in time: each starts at `at` (if given) or at the end of the
//!   previous step, plus its `delay`. Total duration is the latest step end.
//! - Start values are resolved once at build time by walking steps in start order:
//!   `to` starts from the current value, `from` swaps the roles, `from_to` uses the
//!   explicit block.
//! - Sampling a channel at time `t` evaluates the last started step that touches it
//!   (ties keep declaration order). Before any step on that channel starts, the first
//!   such step's start value holds, so `from` steps render immediately.
//!
//! Sampling is pure: the same `t` always yields the same values, which is what makes
//! scroll scrubbing reversible.

use thiserror::Error;

use crate::channel::{Channel, ChannelValues, Pose};
use crate::ease::Ease;
use crate::interp::lerp_f32;
use crate::step::{Extent, StepMode, TweenStep};

#[derive(Debug, Error, PartialEq)]
pub enum TimelineError {
    #[error("step {index}: duration must be finite and >= 0 (got {value})")]
    InvalidDuration { index: usize, value: f32 },
    #[error("step {index}: delay/position must be finite and >= 0")]
    InvalidPlacement { index: usize },
    #[error("step {index}: no target values")]
    EmptyStep { index: usize },
    #[error("step {index}: from_to step requires a 'from' block")]
    MissingFrom { index: usize },
    #[error("step {index}: non-finite target value on {channel}")]
    NonFiniteValue { index: usize, channel: Channel },
    #[error("step {index}: {channel} is viewport-relative but no viewport is known")]
    RelativeValue { index: usize, channel: Channel },
    #[error("length {length} is shorter than the steps ({duration} s)")]
    LengthTooShort { length: f32, duration: f32 },
}

#[derive(Clone, Debug, PartialEq)]
struct Segment {
    start: f32,
    duration: f32,
    ease: Ease,
    /// (channel, from, to)
    tracks: Vec<(Channel, f32, f32)>,
}

impl Segment {
    #[inline]
    fn end(&self) -> f32 {
        self.start + self.duration
    }

    #[inline]
    fn local(&self, t: f32) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            ((t - self.start) / self.duration).clamp(0.0, 1.0)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    segments: Vec<Segment>,
    /// For every touched channel, indices into `segments` in evaluation order.
    lanes: Vec<(Channel, Vec<usize>)>,
    duration: f32,
}

impl Timeline {
    /// Build a timeline from authored steps, resolving implicit start values against
    /// `base`. Steps must not carry viewport-relative values.
    pub fn build(base: &Pose, steps: &[TweenStep]) -> Result<Self, TimelineError> {
        Self::assemble(base, steps, None)
    }

    /// Like [`Timeline::build`], resolving `vw`/`vh` values against `viewport`.
    pub fn build_with_viewport(
        base: &Pose,
        steps: &[TweenStep],
        viewport: Extent,
    ) -> Result<Self, TimelineError> {
        Self::assemble(base, steps, Some(viewport))
    }

    pub(crate) fn assemble(
        base: &Pose,
        steps: &[TweenStep],
        viewport: Option<Extent>,
    ) -> Result<Self, TimelineError> {
        // 1) Place steps in time.
        let mut placed: Vec<(usize, f32, f32)> = Vec::with_capacity(steps.len());
        let mut cursor = 0.0f32;
        for (index, step) in steps.iter().enumerate() {
            let duration = step.effective_duration();
            if !duration.is_finite() || duration < 0.0 {
                return Err(TimelineError::InvalidDuration {
                    index,
                    value: duration,
                });
            }
            let anchor = step.at.unwrap_or(cursor);
            if !anchor.is_finite() || anchor < 0.0 || !step.delay.is_finite() || step.delay < 0.0
            {
                return Err(TimelineError::InvalidPlacement { index });
            }
            let start = anchor + step.delay;
            cursor = start + duration;
            placed.push((index, start, duration));
        }
        // Stable: equal starts keep declaration order.
        placed.sort_by(|a, b| a.1.total_cmp(&b.1));

        // 2) Resolve start/end values in start order.
        let mut current = *base;
        let mut segments: Vec<Segment> = Vec::with_capacity(steps.len());
        for (index, start, duration) in placed {
            let step = &steps[index];
            let relative = |channel| TimelineError::RelativeValue { index, channel };
            let targets = step.values.resolve(viewport).map_err(relative)?;
            if targets.is_empty() {
                return Err(TimelineError::EmptyStep { index });
            }
            if let Some((channel, _)) = targets.iter().find(|(_, v)| !v.is_finite()) {
                return Err(TimelineError::NonFiniteValue { index, channel });
            }
            let explicit_from = match step.mode {
                StepMode::FromTo => Some(
                    step.from
                        .as_ref()
                        .ok_or(TimelineError::MissingFrom { index })?
                        .resolve(viewport)
                        .map_err(relative)?,
                ),
                _ => None,
            };
            let mut tracks = Vec::with_capacity(targets.len());
            for (channel, value) in targets.iter() {
                let now = current.get(channel);
                let (from, to) = match step.mode {
                    StepMode::To => (now, value),
                    StepMode::From => (value, now),
                    StepMode::FromTo => (
                        explicit_from
                            .as_ref()
                            .and_then(|f| f.get(channel))
                            .unwrap_or(now),
                        value,
                    ),
                };
                tracks.push((channel, from, to));
            }
            for &(channel, _, to) in &tracks {
                current.set(channel, to);
            }
            segments.push(Segment {
                start,
                duration,
                ease: step.effective_ease(),
                tracks,
            });
        }

        // 3) Per-channel lanes.
        let mut lanes: Vec<(Channel, Vec<usize>)> = Vec::new();
        for (si, seg) in segments.iter().enumerate() {
            for &(channel, _, _) in &seg.tracks {
                match lanes.iter_mut().find(|(c, _)| *c == channel) {
                    Some((_, idxs)) => idxs.push(si),
                    None => lanes.push((channel, vec![si])),
                }
            }
        }
        lanes.sort_by_key(|(c, _)| *c);

        let duration = segments.iter().map(Segment::end).fold(0.0f32, f32::max);
        Ok(Self {
            segments,
            lanes,
            duration,
        })
    }

    /// Extend the timeline to `length` seconds; the tail holds the end values.
    /// Progress then maps onto the longer span.
    pub fn with_length(mut self, length: f32) -> Result<Self, TimelineError> {
        if !length.is_finite() || length < self.duration {
            return Err(TimelineError::LengthTooShort {
                length,
                duration: self.duration,
            });
        }
        self.duration = length;
        Ok(self)
    }

    /// Total duration in seconds (latest step end, or the length set by
    /// [`Timeline::with_length`]).
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Channels written by this timeline.
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.lanes.iter().map(|(c, _)| *c)
    }

    pub fn touches(&self, channel: Channel) -> bool {
        self.lanes.iter().any(|(c, _)| *c == channel)
    }

    /// Sample at absolute time `t` seconds (clamped to the timeline).
    pub fn sample_time(&self, t: f32) -> ChannelValues {
        let t = t.clamp(0.0, self.duration);
        let mut out = ChannelValues::new();
        for (channel, idxs) in &self.lanes {
            let active = idxs
                .iter()
                .rev()
                .map(|&i| &self.segments[i])
                .find(|seg| seg.start <= t);
            let value = match active {
                Some(seg) => {
                    let e = seg.ease.apply(seg.local(t));
                    seg.tracks
                        .iter()
                        .find(|(c, _, _)| c == channel)
                        .map(|&(_, from, to)| lerp_f32(from, to, e))
                }
                None => idxs.first().and_then(|&i| {
                    self.segments[i]
                        .tracks
                        .iter()
                        .find(|(c, _, _)| c == channel)
                        .map(|&(_, from, _)| from)
                }),
            };
            if let Some(v) = value {
                out.set(*channel, v);
            }
        }
        out
    }

    /// Sample at normalized progress `p` in `[0, 1]`, where each step owns a
    /// duration-weighted slice of `p`.
    pub fn sample(&self, p: f32) -> ChannelValues {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self.sample_time(p * self.duration)
    }

    /// Values at progress 0.
    pub fn start_values(&self) -> ChannelValues {
        self.sample(0.0)
    }

    /// Values at progress 1.
    pub fn end_values(&self) -> ChannelValues {
        self.sample(1.0)
    }
}

//! Scroll-synchronized regions.
//!
//! A region maps a document scroll range `[start, end]` onto a timeline. Inside the
//! range progress is `(s - start) / (end - start)`; outside it the region parks its
//! channels on the timeline endpoint for that side. Crossing a boundary produces an
//! [`Edge`]; the page dispatches it through [`ScrollRegion::apply_edge`], which is the
//! only place the region changes state.
//!
//! With a lagged scrub the *displayed* progress trails the scroll progress and
//! catches up exponentially with time constant `lag / 4`. Leaving the range snaps the
//! displayed progress to the endpoint, so parked values never depend on lag.
//!
//! Steps with `vw`/`vh` values are rebuilt on every relayout against the new
//! viewport; parked values follow.

use serde::{Deserialize, Serialize};
use showcase_animation::interp::inverse_lerp_clamped;
use showcase_animation::{Channel, ChannelValues, Pose, Timeline, TweenStep};

use crate::config::{EdgeEffects, RegionConfig, Scrub, StyleEffect, TargetRef};
use crate::errors::SetupError;
use crate::layout::PageLayout;
use crate::outputs::Edge;
use crate::position::ScrollPosition;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionState {
    BeforeStart,
    Active,
    AfterEnd,
}

/// Resolved document offsets of a region. `start < end` always holds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RegionRange {
    start: f32,
    end: f32,
}

impl RegionRange {
    pub fn new(region: &str, start: f32, end: f32) -> Result<Self, SetupError> {
        if !(start.is_finite() && end.is_finite()) || start >= end {
            return Err(SetupError::InvertedRegion {
                region: region.to_string(),
                start,
                end,
            });
        }
        Ok(Self { start, end })
    }

    /// Resolve `start`/`end` position strings against the trigger's box.
    pub fn resolve(
        region: &str,
        trigger: &str,
        start: &ScrollPosition,
        end: &ScrollPosition,
        layout: &PageLayout,
    ) -> Result<Self, SetupError> {
        let bx = layout
            .element(trigger)
            .ok_or_else(|| SetupError::MissingElement {
                context: format!("region '{region}'"),
                selector: trigger.to_string(),
            })?;
        let vh = layout.viewport.height;
        Self::new(
            region,
            start.offset(bx.top, bx.height, vh),
            end.offset(bx.top, bx.height, vh),
        )
    }

    #[inline]
    pub fn start(&self) -> f32 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> f32 {
        self.end
    }

    /// Scroll progress, clamped to `[0, 1]`.
    pub fn progress(&self, scroll: f32) -> f32 {
        inverse_lerp_clamped(self.start, self.end, scroll)
    }

    pub fn state_at(&self, scroll: f32) -> RegionState {
        if scroll < self.start {
            RegionState::BeforeStart
        } else if scroll > self.end {
            RegionState::AfterEnd
        } else {
            RegionState::Active
        }
    }
}

/// Edges crossed going from `from` to `to`, in crossing order.
pub fn transitions(from: RegionState, to: RegionState) -> &'static [Edge] {
    use RegionState::*;
    match (from, to) {
        (BeforeStart, Active) => &[Edge::Enter],
        (BeforeStart, AfterEnd) => &[Edge::Enter, Edge::Leave],
        (Active, AfterEnd) => &[Edge::Leave],
        (Active, BeforeStart) => &[Edge::LeaveBack],
        (AfterEnd, Active) => &[Edge::EnterBack],
        (AfterEnd, BeforeStart) => &[Edge::EnterBack, Edge::LeaveBack],
        _ => &[],
    }
}

#[derive(Clone, Debug)]
pub struct ScrollRegion {
    id: String,
    trigger: String,
    target: TargetRef,
    start_pos: ScrollPosition,
    end_pos: ScrollPosition,
    range: RegionRange,
    scrub: Scrub,
    steps: Vec<TweenStep>,
    length: Option<f32>,
    relative: bool,
    timeline: Timeline,
    parked_start: ChannelValues,
    parked_end: ChannelValues,
    effects: EdgeEffects,
    state: RegionState,
    /// Progress implied by the last scroll input.
    target_progress: f32,
    /// Progress currently rendered (trails `target_progress` when lagged).
    displayed: f32,
}

fn region_timeline(
    region: &str,
    steps: &[TweenStep],
    length: Option<f32>,
    base: &Pose,
    layout: &PageLayout,
) -> Result<Timeline, SetupError> {
    let wrap = |source| SetupError::RegionTimeline {
        region: region.to_string(),
        source,
    };
    let timeline =
        Timeline::build_with_viewport(base, steps, layout.viewport.extent()).map_err(wrap)?;
    match length {
        Some(length) => timeline.with_length(length).map_err(wrap),
        None => Ok(timeline),
    }
}

impl ScrollRegion {
    /// Build a region for a target whose rest pose is `base`, resolve its offsets and
    /// settle it on the current scroll without producing edges.
    pub fn build(cfg: &RegionConfig, base: &Pose, layout: &PageLayout) -> Result<Self, SetupError> {
        let timeline = region_timeline(&cfg.id, &cfg.steps, cfg.length, base, layout)?;
        let range = RegionRange::resolve(&cfg.id, &cfg.trigger, &cfg.start, &cfg.end, layout)?;
        let state = range.state_at(layout.scroll);
        let target_progress = range.progress(layout.scroll);
        Ok(Self {
            id: cfg.id.clone(),
            trigger: cfg.trigger.clone(),
            target: cfg.target.clone(),
            start_pos: cfg.start,
            end_pos: cfg.end,
            range,
            scrub: cfg.scrub,
            steps: cfg.steps.clone(),
            length: cfg.length,
            relative: cfg.steps.iter().any(TweenStep::is_relative),
            parked_start: timeline.start_values(),
            parked_end: timeline.end_values(),
            timeline,
            effects: cfg.effects.clone(),
            state,
            target_progress,
            displayed: target_progress,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target(&self) -> &TargetRef {
        &self.target
    }

    pub fn state(&self) -> RegionState {
        self.state
    }

    pub fn range(&self) -> RegionRange {
        self.range
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn scrub(&self) -> Scrub {
        self.scrub
    }

    /// Progress implied by the latest scroll offset.
    pub fn progress(&self) -> f32 {
        self.target_progress
    }

    /// Progress currently rendered.
    pub fn displayed_progress(&self) -> f32 {
        self.displayed
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.timeline.channels()
    }

    /// Values parked on when outside the range on the `start` side (or `end` side).
    pub fn parked(&self, after_end: bool) -> &ChannelValues {
        if after_end {
            &self.parked_end
        } else {
            &self.parked_start
        }
    }

    /// Whether any step depends on the viewport size.
    pub fn is_relative(&self) -> bool {
        self.relative
    }

    /// Re-resolve offsets after a layout change and rebuild viewport-relative steps
    /// from `base`. On failure the previous range and timeline are kept and the
    /// error returned for logging.
    pub fn relayout(&mut self, layout: &PageLayout, base: &Pose) -> Result<(), SetupError> {
        let range =
            RegionRange::resolve(&self.id, &self.trigger, &self.start_pos, &self.end_pos, layout)?;
        if self.relative {
            let timeline = region_timeline(&self.id, &self.steps, self.length, base, layout)?;
            self.parked_start = timeline.start_values();
            self.parked_end = timeline.end_values();
            self.timeline = timeline;
        }
        self.range = range;
        Ok(())
    }

    /// Record a new scroll offset and report the edges it crosses. State does not
    /// change until each edge is applied.
    pub fn scroll_to(&mut self, scroll: f32) -> &'static [Edge] {
        self.target_progress = self.range.progress(scroll);
        transitions(self.state, self.range.state_at(scroll))
    }

    /// Apply one crossed edge: move the state machine and snap the displayed progress
    /// to the side just crossed.
    pub fn apply_edge(&mut self, edge: Edge) {
        let (state, displayed) = match edge {
            Edge::Enter => (RegionState::Active, 0.0),
            Edge::Leave => (RegionState::AfterEnd, 1.0),
            Edge::EnterBack => (RegionState::Active, 1.0),
            Edge::LeaveBack => (RegionState::BeforeStart, 0.0),
        };
        self.state = state;
        self.displayed = displayed;
    }

    pub fn effects(&self, edge: Edge) -> &[StyleEffect] {
        match edge {
            Edge::Enter => &self.effects.enter,
            Edge::Leave => &self.effects.leave,
            Edge::EnterBack => &self.effects.enter_back,
            Edge::LeaveBack => &self.effects.leave_back,
        }
    }

    /// Advance the displayed progress by `dt` seconds.
    pub fn advance(&mut self, dt: f32, snap: f32) {
        if self.state != RegionState::Active {
            return;
        }
        match self.scrub {
            Scrub::Immediate => self.displayed = self.target_progress,
            Scrub::Lag(lag) => {
                let tau = lag / 4.0;
                let k = 1.0 - (-dt.max(0.0) / tau).exp();
                self.displayed += (self.target_progress - self.displayed) * k;
                if (self.target_progress - self.displayed).abs() <= snap {
                    self.displayed = self.target_progress;
                }
            }
        }
    }

    /// Channel values this region writes this frame.
    pub fn values(&self) -> ChannelValues {
        match self.state {
            RegionState::BeforeStart => self.parked_start.clone(),
            RegionState::AfterEnd => self.parked_end.clone(),
            RegionState::Active => self.timeline.sample(self.displayed),
        }
    }
}

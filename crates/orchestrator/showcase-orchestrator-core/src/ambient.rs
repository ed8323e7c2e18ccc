//! Time-driven ambient behavior: looping animations bound to targets, and periodic
//! spawners that keep a bounded pool of short-lived objects alive in a scene.

use indexmap::IndexMap;
use rand::{Rng, RngCore};
use showcase_animation::{
    Axes3, ChannelValues, Ease, Extent, LoopAnimation, LoopSpec, Pose, StepValues, TweenStep,
};
use showcase_scene::{AmbientId, IdAllocator};

use crate::config::{AmbientShape, Span, SpawnerConfig, TargetRef};
use crate::errors::SetupError;
use crate::outputs::{AmbientState, DespawnReason, PageEvent};

/// A looping animation bound to one target. Loops on products start when the
/// product is placed; loops on elements start with the page.
#[derive(Clone, Debug)]
pub struct AmbientLoop {
    target: TargetRef,
    spec: LoopSpec,
    base: Pose,
    anim: LoopAnimation,
    started_at: Option<f32>,
}

fn loop_animation(
    target: &TargetRef,
    spec: &LoopSpec,
    base: &Pose,
    viewport: Extent,
) -> Result<LoopAnimation, SetupError> {
    LoopAnimation::build_with_viewport(base, spec, viewport).map_err(|source| {
        SetupError::LoopTimeline {
            target: target.to_string(),
            source,
        }
    })
}

impl AmbientLoop {
    pub fn build(
        target: TargetRef,
        spec: LoopSpec,
        base: &Pose,
        viewport: Extent,
    ) -> Result<Self, SetupError> {
        let anim = loop_animation(&target, &spec, base, viewport)?;
        let started_at = match target {
            TargetRef::Element(_) => Some(0.0),
            TargetRef::Object(_) => None,
        };
        Ok(Self {
            target,
            spec,
            base: *base,
            anim,
            started_at,
        })
    }

    /// Rebuild `vw`/`vh` values for a new viewport. The loop keeps its phase.
    pub fn relayout(&mut self, viewport: Extent) -> Result<(), SetupError> {
        if self.spec.is_relative() {
            self.anim = loop_animation(&self.target, &self.spec, &self.base, viewport)?;
        }
        Ok(())
    }

    pub fn target(&self) -> &TargetRef {
        &self.target
    }

    pub fn animation(&self) -> &LoopAnimation {
        &self.anim
    }

    pub fn start(&mut self, now: f32) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Values at page time `now`; empty until started.
    pub fn sample(&self, now: f32) -> ChannelValues {
        match self.started_at {
            Some(t0) => self.anim.sample(now - t0).values,
            None => ChannelValues::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AmbientObject {
    pub id: AmbientId,
    pub radius: f32,
    pub base: Pose,
    pub born_at: f32,
    anim: LoopAnimation,
}

impl AmbientObject {
    fn pose(&self, now: f32) -> (Pose, bool) {
        let sample = self.anim.sample(now - self.born_at);
        (self.base.with(&sample.values), sample.finished)
    }

    /// Seconds of rise left at `now`.
    pub fn remaining(&self, now: f32) -> f32 {
        self.anim
            .total_duration()
            .map_or(f32::INFINITY, |d| (d - (now - self.born_at)).max(0.0))
    }
}

fn pick<R: RngCore + ?Sized>(rng: &mut R, span: Span) -> f32 {
    if span.0 >= span.1 {
        span.0
    } else {
        rng.random_range(span.0..span.1)
    }
}

/// Periodic spawner with a bounded live pool. Objects rise once and are removed on
/// completion; when the pool is full the oldest object is evicted first.
#[derive(Clone, Debug)]
pub struct Spawner {
    cfg: SpawnerConfig,
    cap: usize,
    since_last: f32,
    halted: bool,
    live: IndexMap<AmbientId, AmbientObject>,
}

impl Spawner {
    pub fn new(cfg: SpawnerConfig, default_cap: usize) -> Result<Self, SetupError> {
        let invalid = |reason: &str| SetupError::InvalidSpawner {
            spawner: cfg.id.clone(),
            reason: reason.to_string(),
        };
        if !(cfg.interval.is_finite() && cfg.interval > 0.0) {
            return Err(invalid("interval must be a positive number of seconds"));
        }
        let cap = cfg.max_live.unwrap_or(default_cap);
        if cap == 0 {
            return Err(invalid("max_live must be at least 1"));
        }
        let t = &cfg.template;
        let mut spans = vec![
            ("y", t.y),
            ("z", t.z),
            ("scale", t.scale),
            ("opacity", t.opacity),
            ("rotation_x", t.rotation_x),
            ("rotation_y", t.rotation_y),
            ("duration", t.duration),
            ("delay", t.delay),
        ];
        if let Some(spin) = t.spin {
            spans.push(("spin", spin));
        }
        if let AmbientShape::Sphere { radius, .. } = &t.shape {
            spans.push(("radius", *radius));
        }
        if let Some((name, _)) = spans.iter().find(|(_, s)| !s.is_valid()) {
            return Err(invalid(&format!("range '{name}' must be finite with min <= max")));
        }
        if t.duration.0 <= 0.0 {
            return Err(invalid("duration must be positive"));
        }
        Ok(Self {
            cfg,
            cap,
            since_last: 0.0,
            halted: false,
            live: IndexMap::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.cfg.id
    }

    pub fn scene(&self) -> &str {
        &self.cfg.scene
    }

    pub fn initial_count(&self) -> u32 {
        self.cfg.initial_count
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_ids(&self) -> impl Iterator<Item = AmbientId> + '_ {
        self.live.keys().copied()
    }

    /// A halted spawner keeps reaping but never spawns again.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Halt if this spawner's objects use the model at `url`, dropping the live ones.
    /// Returns whether the spawner halted.
    pub fn model_failed(&mut self, url: &str, events: &mut Vec<PageEvent>) -> bool {
        match &self.cfg.template.shape {
            AmbientShape::Model { url: model } if model == url => {}
            _ => return false,
        }
        log::warn!("spawner '{}': model '{url}' unavailable; halting", self.cfg.id);
        self.halted = true;
        self.since_last = 0.0;
        let dropped: Vec<AmbientId> = self.live.keys().copied().collect();
        self.live.clear();
        for id in dropped {
            events.push(self.despawned(id, DespawnReason::ModelUnavailable));
        }
        true
    }

    fn despawned(&self, id: AmbientId, reason: DespawnReason) -> PageEvent {
        PageEvent::AmbientDespawned {
            scene: self.cfg.scene.clone(),
            id,
            reason,
        }
    }

    /// Spawn one randomized object born at `born_at`. Returns `None` once halted.
    pub fn spawn<R: RngCore + ?Sized>(
        &mut self,
        ids: &mut IdAllocator,
        rng: &mut R,
        viewport_width: f32,
        born_at: f32,
        events: &mut Vec<PageEvent>,
    ) -> Option<AmbientId> {
        if self.halted {
            return None;
        }
        let id = match ids.alloc_ambient() {
            Ok(id) => id,
            Err(err) => {
                log::warn!("spawner '{}': {err}; halting", self.cfg.id);
                self.halted = true;
                return None;
            }
        };
        if self.live.len() >= self.cap {
            if let Some((old, _)) = self.live.shift_remove_index(0) {
                log::debug!("spawner '{}': evicting {:?}", self.cfg.id, old);
                events.push(self.despawned(old, DespawnReason::Evicted));
            }
        }

        let t = &self.cfg.template;
        let x = (rng.random::<f32>() - 0.5) * viewport_width * t.x_spread_per_px;
        let scale = pick(rng, t.scale);
        let rotation_y = pick(rng, t.rotation_y);
        let base = Pose {
            position: [x, pick(rng, t.y), pick(rng, t.z)],
            rotation: [pick(rng, t.rotation_x), rotation_y, 0.0],
            scale: [scale; 3],
            opacity: pick(rng, t.opacity).clamp(0.0, 1.0),
            ..Pose::default()
        };
        let radius = match &t.shape {
            AmbientShape::Sphere { radius, .. } => pick(rng, *radius),
            AmbientShape::Model { .. } => 1.0,
        };
        let duration = pick(rng, t.duration);
        let delay = pick(rng, t.delay);

        let mut intro = vec![TweenStep::to_values(
            StepValues {
                position: Some(Axes3 {
                    y: Some(t.rise_to.into()),
                    ..Axes3::default()
                }),
                ..StepValues::default()
            },
            duration,
        )
        .with_ease(t.ease)];
        if let Some(spin) = t.spin {
            let turn = pick(rng, spin);
            intro.push(
                TweenStep::to_values(
                    StepValues {
                        rotation: Some(Axes3 {
                            y: Some((rotation_y + turn).into()),
                            ..Axes3::default()
                        }),
                        ..StepValues::default()
                    },
                    duration,
                )
                .with_ease(Ease::Linear)
                .at(0.0),
            );
        }
        let spec = LoopSpec {
            intro,
            delay,
            ..LoopSpec::default()
        };
        // The template was validated at construction, so the rise always builds.
        match LoopAnimation::build(&base, &spec) {
            Ok(anim) => {
                self.live.insert(
                    id,
                    AmbientObject {
                        id,
                        radius,
                        base,
                        born_at,
                        anim,
                    },
                );
                events.push(PageEvent::AmbientSpawned {
                    scene: self.cfg.scene.clone(),
                    spawner: self.cfg.id.clone(),
                    id,
                });
                Some(id)
            }
            Err(err) => {
                log::warn!("spawner '{}': rise rejected: {err}", self.cfg.id);
                None
            }
        }
    }

    /// Remove objects whose rise finished by `now`.
    pub fn reap(&mut self, now: f32, events: &mut Vec<PageEvent>) {
        let done: Vec<AmbientId> = self
            .live
            .values()
            .filter(|o| o.pose(now).1)
            .map(|o| o.id)
            .collect();
        for id in done {
            self.live.shift_remove(&id);
            events.push(self.despawned(id, DespawnReason::Completed));
        }
    }

    /// Reap, then advance the interval clock by `dt` and spawn once per interval
    /// crossed. Each object is born at the time its interval elapsed, so a long
    /// frame does not spawn a lockstep batch. Returns the number of objects spawned.
    pub fn tick<R: RngCore + ?Sized>(
        &mut self,
        dt: f32,
        now: f32,
        ids: &mut IdAllocator,
        rng: &mut R,
        viewport_width: f32,
        events: &mut Vec<PageEvent>,
    ) -> usize {
        self.reap(now, events);
        if self.halted {
            return 0;
        }
        self.since_last += dt.max(0.0);
        let mut spawned = 0;
        while self.since_last >= self.cfg.interval {
            self.since_last -= self.cfg.interval;
            let born_at = now - self.since_last;
            if self.spawn(ids, rng, viewport_width, born_at, events).is_some() {
                spawned += 1;
            }
        }
        spawned
    }

    pub fn states(&self, now: f32) -> impl Iterator<Item = AmbientState> + '_ {
        self.live.values().map(move |o| AmbientState {
            id: o.id,
            spawner: self.cfg.id.clone(),
            shape: self.cfg.template.shape.clone(),
            radius: o.radius,
            pose: o.pose(now).0,
            remaining: o.remaining(now),
        })
    }

    /// Drop every live object.
    pub fn clear(&mut self) -> usize {
        let n = self.live.len();
        self.live.clear();
        self.since_last = 0.0;
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use showcase_animation::Channel;

    fn bubbles(max_live: Option<usize>) -> SpawnerConfig {
        serde_json::from_value(serde_json::json!({
            "id": "bubbles",
            "scene": "hero",
            "interval": 3.0,
            "initial_count": 0,
            "max_live": max_live,
            "template": {
                "shape": { "type": "sphere", "radius": [0.1, 0.3], "color": "#FFB6C1" },
                "y": [-4, -4],
                "z": [-1, 1],
                "opacity": [0, 1],
                "rise_to": 4,
                "duration": [2, 12],
                "ease": "power2.inOut"
            }
        }))
        .unwrap()
    }

    #[test]
    fn relative_loop_rebuilds_on_relayout() {
        let spec: LoopSpec = serde_json::from_value(serde_json::json!({
            "cycle": { "position": { "x": "-50vw" }, "duration": 2, "ease": "none" },
            "repeat": -1
        }))
        .unwrap();
        let target = TargetRef::Element("#marquee".into());
        let mut lp =
            AmbientLoop::build(target, spec, &Pose::default(), Extent::new(1000.0, 800.0)).unwrap();
        assert!(lp.is_started());
        assert_eq!(lp.sample(1.0).get(Channel::PositionX), Some(-250.0));
        lp.relayout(Extent::new(600.0, 800.0)).unwrap();
        assert_eq!(lp.sample(1.0).get(Channel::PositionX), Some(-150.0));
    }

    #[test]
    fn firings_without_completion_accumulate() {
        let mut s = Spawner::new(bubbles(None), 200).unwrap();
        let mut ids = IdAllocator::new();
        let mut rng = StdRng::seed_from_u64(7);
        let mut events = Vec::new();
        // All born at t=0; every rise lasts at least 2 s.
        for _ in 0..5 {
            s.spawn(&mut ids, &mut rng, 1440.0, 0.0, &mut events);
        }
        assert_eq!(s.live_count(), 5);
        s.reap(1.0, &mut events);
        assert_eq!(s.live_count(), 5);
        s.reap(100.0, &mut events);
        assert_eq!(s.live_count(), 0);
        let completed = events
            .iter()
            .filter(|e| matches!(e, PageEvent::AmbientDespawned { reason: DespawnReason::Completed, .. }))
            .count();
        assert_eq!(completed, 5);
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let mut s = Spawner::new(bubbles(Some(3)), 200).unwrap();
        let mut ids = IdAllocator::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut events = Vec::new();
        let first = s.spawn(&mut ids, &mut rng, 1440.0, 0.0, &mut events).unwrap();
        for _ in 0..3 {
            s.spawn(&mut ids, &mut rng, 1440.0, 0.0, &mut events);
        }
        assert_eq!(s.live_count(), 3);
        assert!(!s.live_ids().any(|id| id == first));
        assert!(events.iter().any(|e| matches!(
            e,
            PageEvent::AmbientDespawned { id, reason: DespawnReason::Evicted, .. } if *id == first
        )));
    }

    #[test]
    fn tick_fires_on_interval() {
        let mut s = Spawner::new(bubbles(None), 200).unwrap();
        let mut ids = IdAllocator::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut events = Vec::new();
        assert_eq!(s.tick(2.9, 2.9, &mut ids, &mut rng, 1440.0, &mut events), 0);
        assert_eq!(s.tick(0.2, 3.1, &mut ids, &mut rng, 1440.0, &mut events), 1);
        assert_eq!(s.tick(6.0, 9.1, &mut ids, &mut rng, 1440.0, &mut events), 2);
    }

    #[test]
    fn catch_up_births_are_stamped_per_interval() {
        let mut s = Spawner::new(bubbles(None), 200).unwrap();
        let mut ids = IdAllocator::new();
        let mut rng = StdRng::seed_from_u64(5);
        let mut events = Vec::new();
        assert_eq!(s.tick(9.5, 9.5, &mut ids, &mut rng, 1440.0, &mut events), 3);
        let births: Vec<f32> = s.live.values().map(|o| o.born_at).collect();
        assert_eq!(births, vec![3.0, 6.0, 9.0]);
    }

    #[test]
    fn failed_model_halts_its_spawner() {
        let mut cfg = bubbles(None);
        cfg.template.shape = AmbientShape::Model {
            url: "models/cloud.glb".into(),
        };
        let mut s = Spawner::new(cfg, 200).unwrap();
        let mut ids = IdAllocator::new();
        let mut rng = StdRng::seed_from_u64(9);
        let mut events = Vec::new();
        s.spawn(&mut ids, &mut rng, 1440.0, 0.0, &mut events);
        s.spawn(&mut ids, &mut rng, 1440.0, 0.0, &mut events);

        assert!(!s.model_failed("models/other.glb", &mut events));
        assert!(!s.is_halted());

        events.clear();
        assert!(s.model_failed("models/cloud.glb", &mut events));
        assert!(s.is_halted());
        assert_eq!(s.live_count(), 0);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, PageEvent::AmbientDespawned { reason: DespawnReason::ModelUnavailable, .. }))
                .count(),
            2
        );
        assert_eq!(s.tick(30.0, 30.0, &mut ids, &mut rng, 1440.0, &mut events), 0);
        assert_eq!(s.spawn(&mut ids, &mut rng, 1440.0, 30.0, &mut events), None);
        assert_eq!(s.live_count(), 0);
    }

    #[test]
    fn spawned_objects_start_low_and_rise() {
        let mut s = Spawner::new(bubbles(None), 200).unwrap();
        let mut ids = IdAllocator::new();
        let mut rng = StdRng::seed_from_u64(11);
        let mut events = Vec::new();
        s.spawn(&mut ids, &mut rng, 1440.0, 0.0, &mut events);
        let start = s.states(0.0).next().unwrap();
        assert_eq!(start.pose.get(Channel::PositionY), -4.0);
        assert!(start.pose.position[0].abs() <= 1440.0 / 50.0 / 2.0);
        assert!((0.1..0.3).contains(&start.radius));
        let later = s.states(1.0).next().unwrap();
        assert!(later.pose.position[1] > -4.0);
    }

    #[test]
    fn same_seed_same_objects() {
        let run = || {
            let mut s = Spawner::new(bubbles(None), 200).unwrap();
            let mut ids = IdAllocator::new();
            let mut rng = StdRng::seed_from_u64(42);
            let mut events = Vec::new();
            s.spawn(&mut ids, &mut rng, 1440.0, 0.0, &mut events);
            let pose = s.states(0.5).next().unwrap().pose;
            pose
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn rejects_bad_template() {
        let mut cfg = bubbles(None);
        cfg.template.duration = Span(5.0, 1.0);
        assert!(matches!(
            Spawner::new(cfg, 200),
            Err(SetupError::InvalidSpawner { .. })
        ));
        assert!(matches!(
            Spawner::new(bubbles(Some(0)), 200),
            Err(SetupError::InvalidSpawner { .. })
        ));
    }
}

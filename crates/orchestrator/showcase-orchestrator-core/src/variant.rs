//! Variant switching: a cyclic cursor over the flavor variants, the DOM updates that
//! follow it, and a short shake on the featured product.

use showcase_animation::{
    Axes3, ChannelValues, Ease, EaseDir, LoopAnimation, LoopSpec, Pose, StepValues, TweenStep,
};
use showcase_scene::{ProductVariant, VariantTable};

use crate::config::{JitterConfig, VariantSwitchConfig};
use crate::errors::SetupError;
use crate::layout::PageLayout;
use crate::outputs::DomEffect;

/// Index into the variant table, always in `[0, len)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VariantCursor {
    index: usize,
    len: usize,
}

impl VariantCursor {
    pub fn new(index: usize, len: usize) -> Self {
        let len = len.max(1);
        Self {
            index: index % len,
            len,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn next(&mut self) -> usize {
        self.index = (self.index + 1) % self.len;
        self.index
    }

    pub fn previous(&mut self) -> usize {
        self.index = (self.index + self.len - 1) % self.len;
        self.index
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Additive shake: rotation about Z and an X offset, back to zero at the end.
fn jitter_animation(cfg: &JitterConfig) -> Option<LoopAnimation> {
    let quarter = cfg.duration.max(0.0) / 4.0;
    let step = |scale: f32| {
        TweenStep::to_values(
            StepValues {
                position: Some(Axes3 {
                    x: Some((cfg.offset * scale).into()),
                    ..Axes3::default()
                }),
                rotation: Some(Axes3 {
                    z: Some((cfg.rotation * scale).into()),
                    ..Axes3::default()
                }),
                ..StepValues::default()
            },
            quarter,
        )
        .with_ease(Ease::Sine(EaseDir::InOut))
    };
    let spec = LoopSpec {
        intro: vec![step(1.0), step(-1.0), step(0.5), step(0.0)],
        ..LoopSpec::default()
    };
    LoopAnimation::build(&Pose::default(), &spec).ok()
}

#[derive(Clone, Debug)]
pub struct VariantController {
    cfg: VariantSwitchConfig,
    cursor: VariantCursor,
    jitter: Option<LoopAnimation>,
    jitter_started: Option<f32>,
}

impl VariantController {
    /// Validate selectors against the layout and resolve the initial variant.
    pub fn new(
        cfg: VariantSwitchConfig,
        variants: &VariantTable,
        layout: &PageLayout,
    ) -> Result<Self, SetupError> {
        let mut selectors = vec![
            &cfg.next_button,
            &cfg.previous_button,
            &cfg.label_text,
            &cfg.background,
        ];
        selectors.extend(cfg.rings.iter());
        if let Some(missing) = selectors.into_iter().find(|s| !layout.has(s)) {
            return Err(SetupError::MissingElement {
                context: "variant switch".into(),
                selector: missing.clone(),
            });
        }
        let index = match &cfg.initial {
            Some(id) => variants
                .index_of(id)
                .ok_or_else(|| SetupError::UnknownVariant {
                    context: "variant switch".into(),
                    variant: id.clone(),
                })?,
            None => 0,
        };
        Ok(Self {
            jitter: jitter_animation(&cfg.jitter),
            cfg,
            cursor: VariantCursor::new(index, variants.len()),
            jitter_started: None,
        })
    }

    pub fn config(&self) -> &VariantSwitchConfig {
        &self.cfg
    }

    /// Object id of the product that follows the cursor.
    pub fn target(&self) -> &str {
        &self.cfg.target
    }

    pub fn index(&self) -> usize {
        self.cursor.index()
    }

    /// Move the cursor and start the jitter unless one is already running.
    pub fn step(&mut self, direction: Direction, now: f32) -> usize {
        let index = match direction {
            Direction::Next => self.cursor.next(),
            Direction::Previous => self.cursor.previous(),
        };
        if !self.jitter_active(now) {
            self.jitter_started = Some(now);
        }
        index
    }

    pub fn jitter_active(&self, now: f32) -> bool {
        match (self.jitter_started, &self.jitter) {
            (Some(t0), Some(anim)) => !anim.sample(now - t0).finished,
            _ => false,
        }
    }

    /// Offsets to add to the target's pose at `now`, if a jitter is running.
    pub fn jitter_offsets(&mut self, now: f32) -> Option<ChannelValues> {
        let t0 = self.jitter_started?;
        let anim = self.jitter.as_ref()?;
        let sample = anim.sample(now - t0);
        if sample.finished {
            self.jitter_started = None;
            return None;
        }
        Some(sample.values)
    }

    /// DOM writes that present `variant`: label text, ring accents, background.
    pub fn dom_effects(&self, variant: &ProductVariant) -> Vec<DomEffect> {
        let mut out = vec![DomEffect::SetText {
            selector: self.cfg.label_text.clone(),
            text: variant.display_name.clone(),
        }];
        for (ring, accent) in self.cfg.rings.iter().zip(&variant.accents) {
            out.push(DomEffect::style(ring.clone(), "fill", accent.to_hex()));
        }
        out.push(DomEffect::style(
            self.cfg.background.clone(),
            "background-color",
            variant.background.to_hex(),
        ));
        out
    }
}

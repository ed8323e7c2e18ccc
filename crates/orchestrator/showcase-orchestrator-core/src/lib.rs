//! showcase-orchestrator
//!
//! The page context of the product showcase. A [`Page`] owns every scene, product
//! placement, scroll region, ambient loop, spawner and the variant switch; hosts feed
//! it [`Inputs`] once per frame and apply the [`Frame`] it returns.
//!
//! Per-tick order: inputs (assets, resize/layout, variant commands, scroll and the
//! edges it crosses), then time (scrub lag, loops, spawners), then composition.
//! Poses compose as rest pose, then ambient loops, then regions; regions own the
//! channels they animate. Several regions on one target hand a channel over in
//! scroll order: the latest-starting region already entered writes it, and before
//! any has been entered the earliest one holds its start pose.

pub mod ambient;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod inputs;
pub mod layout;
pub mod outputs;
pub mod position;
pub mod products;
pub mod region;
pub mod scheduler;
pub mod variant;

use hashbrown::HashMap;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use showcase_animation::{Channel, Pose};
use showcase_scene::{
    AssetCache, AssetKind, AssetRequest, IdAllocator, Placement, ProductInstance, SceneContext,
    VariantTable,
};

pub use crate::ambient::{AmbientLoop, Spawner};
pub use crate::config::{
    AmbientShape, AmbientTemplate, JitterConfig, LoopConfig, OrchestratorConfig, PageConfig,
    RegionConfig, Scrub, Span, SpawnerConfig, StyleEffect, TargetRef, VariantSwitchConfig,
};
pub use crate::errors::SetupError;
pub use crate::inputs::{Command, Inputs};
pub use crate::layout::{ElementBox, PageLayout};
pub use crate::outputs::{
    AmbientState, DespawnReason, DomEffect, Edge, Frame, ObjectState, PageEvent, RegionEdge,
    SceneFrame,
};
pub use crate::position::{EdgeRef, PositionParseError, ScrollPosition};
pub use crate::products::{PlacementHandle, Products};
pub use crate::region::{RegionRange, RegionState, ScrollRegion};
pub use crate::variant::{Direction, VariantController, VariantCursor};

/// Loops and regions bound to one target, by index.
#[derive(Debug, Default, Clone)]
pub(crate) struct TargetBindings {
    pub loops: Vec<usize>,
    pub regions: Vec<usize>,
    /// Every channel any of them writes.
    pub channels: Vec<Channel>,
}

impl TargetBindings {
    fn note_channels(&mut self, channels: impl Iterator<Item = Channel>) {
        for c in channels {
            if !self.channels.contains(&c) {
                self.channels.push(c);
            }
        }
    }
}

/// Validate a placement against the page; returns its variant index.
fn check_placement(
    placement: &Placement,
    products: &Products,
    scenes: &[SceneContext],
    variants: &VariantTable,
) -> Result<usize, SetupError> {
    if products.contains(&placement.id) {
        return Err(SetupError::DuplicateObject(placement.id.clone()));
    }
    let context = format!("object '{}'", placement.id);
    if !scenes.iter().any(|s| s.id() == placement.scene) {
        return Err(SetupError::UnknownScene {
            context,
            scene: placement.scene.clone(),
        });
    }
    variants
        .index_of(&placement.variant)
        .ok_or_else(|| SetupError::UnknownVariant {
            context,
            variant: placement.variant.clone(),
        })
}

/// Outputs produced outside a tick (during setup), flushed into the next frame.
#[derive(Debug, Default)]
pub(crate) struct Pending {
    pub requests: Vec<AssetRequest>,
    pub events: Vec<PageEvent>,
    pub dom: Vec<DomEffect>,
}

#[derive(Debug)]
pub struct Page {
    pub(crate) config: OrchestratorConfig,
    pub(crate) epoch: u64,
    pub(crate) clock: f32,
    pub(crate) layout: PageLayout,
    pub(crate) scenes: Vec<SceneContext>,
    pub(crate) variants: VariantTable,
    pub(crate) assets: AssetCache,
    pub(crate) ids: IdAllocator,
    pub(crate) products: Products,
    pub(crate) regions: Vec<ScrollRegion>,
    pub(crate) loops: Vec<AmbientLoop>,
    pub(crate) spawners: Vec<Spawner>,
    pub(crate) switch: Option<VariantController>,
    pub(crate) bindings: IndexMap<TargetRef, TargetBindings>,
    /// Last value written per (selector, property), so unchanged styles are skipped.
    pub(crate) styles: HashMap<(String, String), String>,
    pub(crate) rng: StdRng,
    pub(crate) pending: Pending,
    pub(crate) frame: Frame,
    pub(crate) torn_down: bool,
}

impl Page {
    /// Build a page with default engine sizing.
    pub fn new(config: PageConfig, layout: PageLayout) -> Result<Self, SetupError> {
        Self::with_config(config, layout, OrchestratorConfig::default())
    }

    pub fn with_config(
        page: PageConfig,
        layout: PageLayout,
        config: OrchestratorConfig,
    ) -> Result<Self, SetupError> {
        let variants = VariantTable::new(page.variants)?;
        let mut assets = AssetCache::new();
        let mut pending = Pending::default();

        // Scenes.
        let mut scenes: Vec<SceneContext> = Vec::with_capacity(page.scenes.len());
        for scene_cfg in page.scenes {
            if scenes.iter().any(|s| s.id() == scene_cfg.id) {
                return Err(SetupError::DuplicateScene(scene_cfg.id));
            }
            if !layout.has(&scene_cfg.canvas) {
                return Err(SetupError::MissingElement {
                    context: format!("scene '{}'", scene_cfg.id),
                    selector: scene_cfg.canvas,
                });
            }
            if let Some(url) = &scene_cfg.environment {
                pending
                    .requests
                    .extend(assets.request(url, AssetKind::EnvironmentMap));
            }
            scenes.push(SceneContext::bootstrap(scene_cfg, &layout.viewport)?);
        }
        let has_scene = |id: &str| scenes.iter().any(|s| s.id() == id);

        // Label textures are preloaded so switching never waits on a fetch.
        for v in variants.iter() {
            pending
                .requests
                .extend(assets.request(&v.label_texture, AssetKind::Texture));
        }

        // Placements.
        let mut ids = IdAllocator::new();
        let mut products = Products::new(page.materials);
        for placement in page.products {
            let variant = check_placement(&placement, &products, &scenes, &variants)?;
            products.place_product(
                placement,
                variant,
                &mut ids,
                &mut assets,
                &variants,
                &mut pending.requests,
                &mut pending.events,
            )?;
        }

        // Variant switch.
        let switch = match page.variant_switch {
            Some(cfg) => {
                if !products.contains(&cfg.target) {
                    return Err(SetupError::UnknownObject {
                        context: "variant switch".into(),
                        object: cfg.target,
                    });
                }
                let ctl = VariantController::new(cfg, &variants, &layout)?;
                products.apply_variant(ctl.target(), ctl.index(), &variants, &assets);
                if let Some(v) = variants.get(ctl.index()) {
                    pending.dom.extend(ctl.dom_effects(v));
                }
                Some(ctl)
            }
            None => None,
        };

        let base_pose = |target: &TargetRef, context: &str| -> Result<Pose, SetupError> {
            match target {
                TargetRef::Object(id) => {
                    products
                        .base_pose(id)
                        .ok_or_else(|| SetupError::UnknownObject {
                            context: context.to_string(),
                            object: id.clone(),
                        })
                }
                TargetRef::Element(sel) if layout.has(sel) => Ok(Pose::default()),
                TargetRef::Element(sel) => Err(SetupError::MissingElement {
                    context: context.to_string(),
                    selector: sel.clone(),
                }),
            }
        };

        // Regions.
        let mut bindings: IndexMap<TargetRef, TargetBindings> = IndexMap::new();
        let mut regions: Vec<ScrollRegion> = Vec::with_capacity(page.regions.len());
        for cfg in &page.regions {
            if regions.iter().any(|r| r.id() == cfg.id) {
                return Err(SetupError::DuplicateRegion(cfg.id.clone()));
            }
            let mut base = base_pose(&cfg.target, &format!("region '{}'", cfg.id))?;
            // A region starts from where the regions declared before it on the same
            // target leave off.
            let earlier = bindings
                .get(&cfg.target)
                .map(|bound| bound.regions.as_slice())
                .unwrap_or_default();
            for &ri in earlier {
                base.apply(regions[ri].parked(true));
            }
            let region = ScrollRegion::build(cfg, &base, &layout)?;
            diagnostics::check_edge_resets(
                &region,
                &cfg.resets,
                config.edge_tolerance,
                layout.viewport.extent(),
            )?;
            for &ri in earlier {
                let shared = diagnostics::overlapping_regions(&regions[ri], &region);
                if !shared.is_empty() {
                    log::warn!(
                        "regions '{}' and '{}' both animate {:?} on {} over overlapping ranges; \
                         the later-starting region wins",
                        regions[ri].id(),
                        region.id(),
                        shared,
                        cfg.target
                    );
                }
            }
            let entry = bindings.entry(cfg.target.clone()).or_default();
            entry.regions.push(regions.len());
            entry.note_channels(region.channels());
            regions.push(region);
        }

        // Ambient loops.
        let mut loops: Vec<AmbientLoop> = Vec::with_capacity(page.loops.len());
        for cfg in &page.loops {
            if !cfg.stagger.is_finite() || cfg.stagger < 0.0 {
                return Err(SetupError::InvalidStagger {
                    target: cfg.target.to_string(),
                    stagger: cfg.stagger,
                });
            }
            for (target, spec) in cfg.expand() {
                let base = base_pose(&target, &format!("loop on {target}"))?;
                let ambient = AmbientLoop::build(target, spec, &base, layout.viewport.extent())?;
                let target = ambient.target().clone();
                let entry = bindings.entry(target.clone()).or_default();
                for &ri in &entry.regions {
                    let shared =
                        diagnostics::overlapping_channels(ambient.animation(), &regions[ri]);
                    if !shared.is_empty() {
                        log::warn!(
                            "loop on {} shares {:?} with region '{}'; the region wins",
                            target,
                            shared,
                            regions[ri].id()
                        );
                    }
                }
                entry.loops.push(loops.len());
                entry.note_channels(
                    Channel::ALL
                        .into_iter()
                        .filter(|c| ambient.animation().touches(*c)),
                );
                loops.push(ambient);
            }
        }

        // Spawners.
        let mut rng = StdRng::seed_from_u64(page.seed);
        let mut spawners: Vec<Spawner> = Vec::with_capacity(page.spawners.len());
        for cfg in page.spawners {
            if !has_scene(&cfg.scene) {
                return Err(SetupError::UnknownScene {
                    context: format!("spawner '{}'", cfg.id),
                    scene: cfg.scene,
                });
            }
            if let AmbientShape::Model { url } = &cfg.template.shape {
                pending.requests.extend(assets.request(url, AssetKind::Model));
            }
            let mut spawner = Spawner::new(cfg, config.default_ambient_cap)?;
            for _ in 0..spawner.initial_count() {
                spawner.spawn(
                    &mut ids,
                    &mut rng,
                    layout.viewport.width,
                    0.0,
                    &mut pending.events,
                );
            }
            spawners.push(spawner);
        }

        log::debug!(
            "page ready: {} scenes, {} placements pending, {} regions, {} loops, {} spawners",
            scenes.len(),
            products.pending().count(),
            regions.len(),
            loops.len(),
            spawners.len()
        );

        Ok(Self {
            config,
            epoch: 0,
            clock: 0.0,
            layout,
            scenes,
            variants,
            assets,
            ids,
            products,
            regions,
            loops,
            spawners,
            switch,
            bindings,
            styles: HashMap::new(),
            rng,
            pending,
            frame: Frame::default(),
            torn_down: false,
        })
    }

    /// Advance the page by `dt` seconds after applying `inputs`.
    pub fn update(&mut self, dt: f32, inputs: Inputs) -> &Frame {
        scheduler::run_tick(self, dt, inputs);
        &self.frame
    }

    /// Place another product after construction. Its model request and placement
    /// events go out with the next frame. Regions and loops only bind to products
    /// configured up front.
    pub fn place_product(&mut self, placement: Placement) -> Result<PlacementHandle, SetupError> {
        if self.torn_down {
            return Err(SetupError::TornDown);
        }
        let variant = check_placement(&placement, &self.products, &self.scenes, &self.variants)?;
        let handle = self.products.place_product(
            placement,
            variant,
            &mut self.ids,
            &mut self.assets,
            &self.variants,
            &mut self.pending.requests,
            &mut self.pending.events,
        )?;
        log::debug!("placed '{}' as {:?}", handle.object, handle.id);
        Ok(handle)
    }

    /// Handle of a placed object, configured or placed at runtime.
    pub fn placement_handle(&self, object: &str) -> Option<&PlacementHandle> {
        self.products.handle(object)
    }

    /// Bound instance behind `handle`; `None` while its model is pending.
    pub fn placement(&self, handle: &PlacementHandle) -> Option<&ProductInstance> {
        self.products.instance_by_id(handle.id)
    }

    /// Stop spawners, drop ambient objects and freeze the page. Later updates return
    /// empty frames. Returns the despawn events plus a final `TornDown`; a second call
    /// returns nothing.
    pub fn teardown(&mut self) -> Vec<PageEvent> {
        if self.torn_down {
            return Vec::new();
        }
        let mut events = Vec::new();
        for spawner in &mut self.spawners {
            events.extend(spawner.live_ids().map(|id| PageEvent::AmbientDespawned {
                scene: spawner.scene().to_string(),
                id,
                reason: DespawnReason::Teardown,
            }));
            spawner.clear();
        }
        log::debug!("page torn down ({} ambient objects dropped)", events.len());
        events.push(PageEvent::TornDown);
        self.spawners.clear();
        self.pending = Pending::default();
        self.torn_down = true;
        events
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Seconds of page time elapsed.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn scroll(&self) -> f32 {
        self.layout.scroll
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn scene(&self, id: &str) -> Option<&SceneContext> {
        self.scenes.iter().find(|s| s.id() == id)
    }

    pub fn region(&self, id: &str) -> Option<&ScrollRegion> {
        self.regions.iter().find(|r| r.id() == id)
    }

    pub fn regions(&self) -> &[ScrollRegion] {
        &self.regions
    }

    pub fn spawner(&self, id: &str) -> Option<&Spawner> {
        self.spawners.iter().find(|s| s.id() == id)
    }

    pub fn instance(&self, object: &str) -> Option<&ProductInstance> {
        self.products.instance(object)
    }

    pub fn variants(&self) -> &VariantTable {
        &self.variants
    }

    /// Current variant cursor, if the page has a variant switch.
    pub fn variant_index(&self) -> Option<usize> {
        self.switch.as_ref().map(VariantController::index)
    }

    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }
}

//! One page tick: inputs, then time, then composition.

use showcase_animation::{Channel, ChannelValues, Color, Extent, Pose};
use showcase_scene::{AssetKind, AssetState, ModelAsset};
use std::sync::Arc;

use crate::config::TargetRef;
use crate::inputs::{Command, Inputs};
use crate::outputs::{DomEffect, Edge, Frame, ObjectState, PageEvent, RegionEdge, SceneFrame};
use crate::region::{RegionState, ScrollRegion};
use crate::variant::Direction;
use crate::Page;

/// Run one tick of `page`, leaving the result in `page.frame`.
pub fn run_tick(page: &mut Page, dt: f32, inputs: Inputs) {
    let dt = if dt.is_finite() && dt >= 0.0 {
        dt
    } else {
        log::warn!("ignoring invalid frame delta {dt}");
        0.0
    };
    page.epoch = page.epoch.wrapping_add(1);
    page.frame.clear();
    page.frame.epoch = page.epoch;
    page.frame.dt = dt;
    if page.torn_down {
        return;
    }
    page.frame.requests.append(&mut page.pending.requests);
    page.frame.events.append(&mut page.pending.events);
    page.frame.dom.append(&mut page.pending.dom);

    apply_inputs(page, inputs);
    advance_time(page, dt);
    compose(page);

    let cap = page.config.max_events_per_tick;
    if page.frame.events.len() > cap {
        log::warn!(
            "tick {}: {} events exceed cap {}; dropping the rest",
            page.epoch,
            page.frame.events.len(),
            cap
        );
        page.frame.events.truncate(cap);
    }
}

fn apply_inputs(page: &mut Page, inputs: Inputs) {
    let Inputs {
        scroll,
        resize,
        layout,
        commands,
    } = inputs;

    let mut directions = Vec::new();
    for command in commands {
        match command {
            Command::NextVariant => directions.push(Direction::Next),
            Command::PreviousVariant => directions.push(Direction::Previous),
            Command::AssetLoaded { url, asset } => asset_loaded(page, &url, asset),
            Command::AssetFailed { url, reason } => asset_failed(page, &url, &reason),
        }
    }

    let mut relayout = false;
    if let Some(mut next) = layout {
        next.scroll = page.layout.scroll;
        if next.viewport.is_degenerate() {
            log::warn!(
                "layout viewport {}x{} is degenerate; keeping previous viewport",
                next.viewport.width,
                next.viewport.height
            );
            next.viewport = page.layout.viewport;
        } else if resize.is_none() && next.viewport != page.layout.viewport {
            resize_scenes(page, &next.viewport);
        }
        page.layout = next;
        relayout = true;
    }
    if let Some(viewport) = resize {
        if viewport.is_degenerate() {
            log::warn!(
                "ignoring degenerate resize to {}x{}",
                viewport.width,
                viewport.height
            );
        } else {
            resize_scenes(page, &viewport);
            page.layout.viewport = viewport;
            relayout = true;
        }
    }
    if relayout {
        relayout_bindings(page);
    }

    for direction in directions {
        step_variant(page, direction);
    }

    if let Some(offset) = scroll {
        if offset.is_finite() {
            page.layout.scroll = offset;
        } else {
            log::warn!("ignoring non-finite scroll offset {offset}");
        }
    }
    if scroll.is_some() || relayout {
        sync_scroll(page);
    }
}

/// Re-resolve every region and loop against the current layout. Regions on one
/// target are rebuilt in declaration order, each from where the previous one parks.
fn relayout_bindings(page: &mut Page) {
    let extent = page.layout.viewport.extent();
    for (target, bound) in &page.bindings {
        let mut base = match target {
            TargetRef::Object(id) => page.products.base_pose(id).unwrap_or_default(),
            TargetRef::Element(_) => Pose::default(),
        };
        for &ri in &bound.regions {
            let region = &mut page.regions[ri];
            if let Err(err) = region.relayout(&page.layout, &base) {
                log::warn!("{err}; keeping previous offsets");
            }
            base.apply(region.parked(true));
        }
        for &li in &bound.loops {
            if let Err(err) = page.loops[li].relayout(extent) {
                log::warn!("{err}; keeping previous loop");
            }
        }
    }
}

fn resize_scenes(page: &mut Page, viewport: &showcase_scene::Viewport) {
    for scene in &mut page.scenes {
        if let Err(err) = scene.resize(viewport) {
            log::warn!("{err}; keeping previous render target");
        }
    }
}

fn asset_loaded(page: &mut Page, url: &str, asset: showcase_scene::AssetPayload) {
    let Some(state) = page.assets.resolve(url, asset).cloned() else {
        log::debug!("asset '{url}' was not requested or already settled");
        return;
    };
    match state {
        AssetState::Ready { kind, model } => {
            log::info!("asset ready: {url}");
            page.frame.events.push(PageEvent::AssetReady {
                url: url.to_string(),
                kind,
            });
            match (kind, model) {
                (AssetKind::Model, Some(model)) => model_ready(page, url, model),
                (AssetKind::EnvironmentMap, _) => {
                    for scene in &mut page.scenes {
                        scene.environment_ready(url);
                    }
                }
                _ => {}
            }
        }
        AssetState::Failed { kind, reason } => unavailable(page, url, kind, &reason),
        AssetState::Requested { .. } => {}
    }
}

fn asset_failed(page: &mut Page, url: &str, reason: &str) {
    let kind = match page.assets.fail(url, reason) {
        Some(AssetState::Failed { kind, .. }) => *kind,
        _ => {
            log::debug!("failure for '{url}' ignored; not pending");
            return;
        }
    };
    unavailable(page, url, kind, reason);
}

fn unavailable(page: &mut Page, url: &str, kind: AssetKind, reason: &str) {
    log::warn!("asset unavailable: {url} ({reason})");
    page.frame.events.push(PageEvent::AssetUnavailable {
        url: url.to_string(),
        kind,
        reason: reason.to_string(),
    });
    match kind {
        AssetKind::Model => {
            let placed = page.products.model_failed(url, reason);
            start_object_loops(page, &placed);
            for spawner in &mut page.spawners {
                spawner.model_failed(url, &mut page.frame.events);
            }
        }
        AssetKind::Texture => page.products.texture_failed(url),
        AssetKind::EnvironmentMap => {
            for scene in &mut page.scenes {
                scene.environment_unavailable(url);
            }
        }
    }
}

fn model_ready(page: &mut Page, url: &str, model: Arc<ModelAsset>) {
    let placed = page.products.model_ready(
        url,
        &model,
        &page.assets,
        &page.variants,
        &mut page.frame.events,
    );
    if let Some(switch) = &page.switch {
        if placed.iter().any(|o| o == switch.target()) {
            page.products
                .apply_variant(switch.target(), switch.index(), &page.variants, &page.assets);
        }
    }
    start_object_loops(page, &placed);
}

/// Object loops run from the moment their product appears.
fn start_object_loops(page: &mut Page, objects: &[String]) {
    let now = page.clock;
    for object in objects {
        let key = TargetRef::Object(object.clone());
        if let Some(bound) = page.bindings.get(&key) {
            for &li in &bound.loops {
                page.loops[li].start(now);
            }
        }
    }
}

fn step_variant(page: &mut Page, direction: Direction) {
    let Some(switch) = page.switch.as_mut() else {
        log::debug!("variant command ignored; page has no variant switch");
        return;
    };
    let index = switch.step(direction, page.clock);
    page.products
        .apply_variant(switch.target(), index, &page.variants, &page.assets);
    if let Some(variant) = page.variants.get(index) {
        page.frame.dom.extend(switch.dom_effects(variant));
        page.frame.events.push(PageEvent::VariantChanged {
            index,
            variant: variant.id.clone(),
        });
    }
}

/// Feed the current scroll offset to every region and dispatch the edges crossed, in
/// crossing order per region.
fn sync_scroll(page: &mut Page) {
    let Page {
        regions,
        frame,
        layout,
        ..
    } = page;
    let viewport = layout.viewport.extent();
    for region in regions.iter_mut() {
        for &edge in region.scroll_to(layout.scroll) {
            dispatch_edge(region, edge, viewport, frame);
        }
    }
}

fn dispatch_edge(region: &mut ScrollRegion, edge: Edge, viewport: Extent, frame: &mut Frame) {
    region.apply_edge(edge);
    log::debug!(
        "region '{}': {:?} at progress {:.4}",
        region.id(),
        edge,
        region.progress()
    );
    frame.events.push(PageEvent::RegionEdge(RegionEdge {
        region: region.id().to_string(),
        edge,
        progress: region.progress(),
    }));
    frame.dom.extend(
        region
            .effects(edge)
            .iter()
            .map(|fx| {
                DomEffect::style(fx.selector.clone(), fx.property.clone(), fx.value_for(viewport))
            }),
    );
}

fn advance_time(page: &mut Page, dt: f32) {
    page.clock += dt;
    let snap = page.config.scrub_snap;
    for region in &mut page.regions {
        region.advance(dt, snap);
    }
    let Page {
        spawners,
        ids,
        rng,
        layout,
        frame,
        clock,
        ..
    } = page;
    for spawner in spawners.iter_mut() {
        spawner.tick(dt, *clock, ids, rng, layout.viewport.width, &mut frame.events);
    }
}

/// Rest pose, then loop values, then region values. Regions write last so they own
/// every channel they animate.
fn target_pose(page: &Page, target: &TargetRef, base: Pose) -> Pose {
    let mut pose = base;
    if let Some(bound) = page.bindings.get(target) {
        for &li in &bound.loops {
            pose.apply(&page.loops[li].sample(page.clock));
        }
        pose.apply(&region_values(page, &bound.regions));
    }
    pose
}

/// Values of the regions bound to one target, walked in scroll order. A region not
/// yet entered only fills channels no earlier region has written.
fn region_values(page: &Page, bound: &[usize]) -> ChannelValues {
    let mut ordered: Vec<&ScrollRegion> = bound.iter().map(|&ri| &page.regions[ri]).collect();
    ordered.sort_by(|a, b| a.range().start().total_cmp(&b.range().start()));
    let mut out = ChannelValues::new();
    for region in ordered {
        let entered = region.state() != RegionState::BeforeStart;
        for (channel, value) in region.values().iter() {
            if entered || !out.contains(channel) {
                out.set(channel, value);
            }
        }
    }
    out
}

fn add_offsets(pose: &mut Pose, offsets: &ChannelValues) {
    for (channel, delta) in offsets.iter() {
        pose.set(channel, pose.get(channel) + delta);
    }
}

fn compose(page: &mut Page) {
    let now = page.clock;
    let jitter = match page.switch.as_mut() {
        Some(switch) => switch
            .jitter_offsets(now)
            .map(|offsets| (switch.target().to_string(), offsets)),
        None => None,
    };

    let view: &Page = page;
    let mut scenes = Vec::with_capacity(view.scenes.len());
    for scene in &view.scenes {
        let objects = view
            .products
            .instances_in(scene.id())
            .map(|inst| {
                let mut pose =
                    target_pose(view, &TargetRef::Object(inst.object.clone()), inst.base);
                if let Some((target, offsets)) = &jitter {
                    if *target == inst.object {
                        add_offsets(&mut pose, offsets);
                    }
                }
                ObjectState {
                    id: inst.object.clone(),
                    pose,
                    materials: inst.meshes.clone(),
                    state: inst.state.clone(),
                }
            })
            .collect();
        let ambient = view
            .spawners
            .iter()
            .filter(|s| s.scene() == scene.id())
            .flat_map(|s| s.states(now))
            .collect();
        scenes.push(SceneFrame {
            scene: scene.id().to_string(),
            canvas: scene.config.canvas.clone(),
            camera: scene.camera,
            render_target: scene.render_target,
            tone_mapping: scene.config.tone_mapping,
            exposure: scene.config.exposure,
            environment: scene.environment.clone(),
            objects,
            ambient,
        });
    }
    let mut styles = Vec::new();
    for (target, bound) in &view.bindings {
        if let TargetRef::Element(selector) = target {
            let pose = target_pose(view, target, Pose::default());
            element_styles(selector, &pose, &bound.channels, &mut styles);
        }
    }
    page.frame.scenes = scenes;
    for effect in styles {
        if let DomEffect::SetStyle {
            selector,
            property,
            value,
        } = &effect
        {
            let key = (selector.clone(), property.clone());
            if page.styles.get(&key) == Some(value) {
                continue;
            }
            page.styles.insert(key, value.clone());
        }
        page.frame.dom.push(effect);
    }
}

/// CSS for an element pose, limited to the property groups its animations touch.
fn element_styles(selector: &str, pose: &Pose, channels: &[Channel], out: &mut Vec<DomEffect>) {
    if channels.iter().any(|c| c.is_transform()) {
        out.push(DomEffect::style(
            selector,
            "transform",
            format!(
                "translate({}px, {}px) rotate({}deg) scale({}, {})",
                pose.position[0],
                pose.position[1],
                pose.rotation[2].to_degrees(),
                pose.scale[0],
                pose.scale[1]
            ),
        ));
    }
    if channels.contains(&Channel::Opacity) {
        out.push(DomEffect::style(
            selector,
            "opacity",
            pose.opacity.to_string(),
        ));
    }
    if channels
        .iter()
        .any(|c| matches!(c, Channel::ColorR | Channel::ColorG | Channel::ColorB))
    {
        out.push(DomEffect::style(
            selector,
            "background-color",
            Color(pose.color).to_hex(),
        ));
    }
}

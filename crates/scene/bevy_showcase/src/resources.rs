use bevy::prelude::*;
use hashbrown::HashMap;
use showcase_orchestrator::{Command, DomEffect, Inputs, Page, PageEvent};
use showcase_scene::AmbientId;

/// The running page. Insert it once the config and layout are known:
/// `app.insert_resource(ShowcasePage(Page::new(config, layout)?))`.
#[derive(Resource)]
pub struct ShowcasePage(pub Page);

/// Inputs staged for the next tick (scroll offset, resize, re-measured layout).
/// Drained every frame.
#[derive(Resource, Default)]
pub struct PendingInputs(pub Inputs);

/// Object id -> entity, rebuilt each frame by walking under `ShowcaseSceneRoot`s.
#[derive(Resource, Default)]
pub struct BindingIndex {
    pub map: HashMap<String, Entity>,
}

/// Live ambient objects and the entities standing in for them.
#[derive(Resource, Default)]
pub struct AmbientEntities {
    pub map: HashMap<AmbientId, Entity>,
}

/// Host interaction forwarded to the page (button clicks, asset completions).
#[derive(Event, Debug, Clone)]
pub struct ShowcaseCommand(pub Command);

/// Lifecycle/edge/asset notification raised by the page during a tick.
#[derive(Event, Debug, Clone)]
pub struct ShowcasePageEvent(pub PageEvent);

/// Document mutation the host UI layer should apply.
#[derive(Event, Debug, Clone)]
pub struct ShowcaseDomEffect(pub DomEffect);

/// Request to tear the page down; handled before the next tick.
#[derive(Event, Debug, Clone, Default)]
pub struct ShowcaseTeardown;

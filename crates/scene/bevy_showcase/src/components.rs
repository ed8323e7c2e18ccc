use bevy::prelude::*;

/// Marker for the entity that stands in for one showcase scene (one canvas).
/// Products are bound among its descendants and ambient objects are spawned under it.
#[derive(Component, Debug, Clone)]
pub struct ShowcaseSceneRoot {
    pub scene: String,
}

impl ShowcaseSceneRoot {
    pub fn new(scene: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
        }
    }
}

/// Optional per-entity override of the object id it binds to.
/// Without it the entity's `Name` is used.
#[derive(Component, Debug, Clone)]
pub struct ShowcaseBindingHint {
    pub object: String,
}

/// An entity spawned for a live ambient object (bubble, cloud).
#[derive(Component, Debug, Clone)]
pub struct ShowcaseAmbient {
    pub id: showcase_scene::AmbientId,
    pub spawner: String,
}

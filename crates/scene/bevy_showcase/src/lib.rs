use bevy::prelude::*;

pub mod components;
pub mod resources;
pub mod systems;

pub use components::{ShowcaseAmbient, ShowcaseBindingHint, ShowcaseSceneRoot};
pub use resources::{
    AmbientEntities, BindingIndex, PendingInputs, ShowcaseCommand, ShowcaseDomEffect,
    ShowcasePage, ShowcasePageEvent, ShowcaseTeardown,
};

/// Drives entities under `ShowcaseSceneRoot`s from a `ShowcasePage` resource.
/// Systems stay idle until the page resource is inserted.
pub struct ShowcasePlugin;

impl Plugin for ShowcasePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PendingInputs::default())
            .insert_resource(BindingIndex::default())
            .insert_resource(AmbientEntities::default())
            .add_event::<ShowcaseCommand>()
            .add_event::<ShowcaseTeardown>()
            .add_event::<ShowcasePageEvent>()
            .add_event::<ShowcaseDomEffect>()
            .add_systems(
                Update,
                (
                    systems::build_binding_index_system,
                    systems::collect_commands_system,
                    systems::teardown_system,
                    systems::tick_page_system,
                    systems::apply_frame_system,
                )
                    .chain()
                    .run_if(resource_exists::<ShowcasePage>),
            );
    }
}

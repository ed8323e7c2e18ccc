use bevy::prelude::*;
use hashbrown::{HashMap, HashSet};
use showcase_animation::Pose;

use crate::components::{ShowcaseAmbient, ShowcaseBindingHint, ShowcaseSceneRoot};
use crate::resources::{
    AmbientEntities, BindingIndex, PendingInputs, ShowcaseCommand, ShowcaseDomEffect,
    ShowcasePage, ShowcasePageEvent, ShowcaseTeardown,
};

/// Pose rotation is Euler XYZ in radians.
pub fn pose_to_transform(pose: &Pose) -> Transform {
    Transform {
        translation: Vec3::from_array(pose.position),
        rotation: Quat::from_euler(
            EulerRot::XYZ,
            pose.rotation[0],
            pose.rotation[1],
            pose.rotation[2],
        ),
        scale: Vec3::from_array(pose.scale),
    }
}

/// Walks descendants under each ShowcaseSceneRoot and maps object ids (hint or Name)
/// to entities.
pub fn build_binding_index_system(
    roots: Query<Entity, With<ShowcaseSceneRoot>>,
    children: Query<&Children>,
    names: Query<(Option<&Name>, Option<&ShowcaseBindingHint>), Without<ShowcaseAmbient>>,
    mut index: ResMut<BindingIndex>,
) {
    fn walk(
        e: Entity,
        map: &mut HashMap<String, Entity>,
        names: &Query<(Option<&Name>, Option<&ShowcaseBindingHint>), Without<ShowcaseAmbient>>,
        children: &Query<&Children>,
    ) {
        if let Ok((name, hint)) = names.get(e) {
            let object = match (hint, name) {
                (Some(h), _) => Some(h.object.clone()),
                (None, Some(n)) => Some(n.as_str().to_string()),
                (None, None) => None,
            };
            if let Some(object) = object {
                map.insert(object, e);
            }
        }
        if let Ok(cs) = children.get(e) {
            for &c in cs.iter() {
                walk(c, map, names, children);
            }
        }
    }

    let mut map = HashMap::new();
    for root in roots.iter() {
        if let Ok(cs) = children.get(root) {
            for &c in cs.iter() {
                walk(c, &mut map, &names, &children);
            }
        }
    }
    index.map = map;
}

pub fn collect_commands_system(
    mut commands: EventReader<ShowcaseCommand>,
    mut pending: ResMut<PendingInputs>,
) {
    pending
        .0
        .commands
        .extend(commands.read().map(|c| c.0.clone()));
}

pub fn teardown_system(
    mut requests: EventReader<ShowcaseTeardown>,
    mut page: ResMut<ShowcasePage>,
    mut out: EventWriter<ShowcasePageEvent>,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();
    out.send_batch(page.0.teardown().into_iter().map(ShowcasePageEvent));
}

/// Advance the page by the frame delta with everything staged since the last frame.
pub fn tick_page_system(
    time: Res<Time>,
    mut page: ResMut<ShowcasePage>,
    mut pending: ResMut<PendingInputs>,
    mut page_events: EventWriter<ShowcasePageEvent>,
    mut dom: EventWriter<ShowcaseDomEffect>,
) {
    let inputs = std::mem::take(&mut pending.0);
    let frame = page.0.update(time.delta_seconds(), inputs);
    page_events.send_batch(frame.events.iter().cloned().map(ShowcasePageEvent));
    dom.send_batch(frame.dom.iter().cloned().map(ShowcaseDomEffect));
}

/// Write composed poses to bound entities and keep one entity per live ambient object.
pub fn apply_frame_system(
    mut commands: Commands,
    page: Res<ShowcasePage>,
    index: Res<BindingIndex>,
    roots: Query<(Entity, &ShowcaseSceneRoot)>,
    mut transforms: Query<&mut Transform>,
    mut ambient: ResMut<AmbientEntities>,
) {
    let frame = page.0.frame();
    let mut live = HashSet::new();
    for scene in &frame.scenes {
        for object in &scene.objects {
            if let Some(&entity) = index.map.get(&object.id) {
                if let Ok(mut tf) = transforms.get_mut(entity) {
                    *tf = pose_to_transform(&object.pose);
                }
            }
        }

        let root = roots
            .iter()
            .find(|(_, r)| r.scene == scene.scene)
            .map(|(e, _)| e);
        for state in &scene.ambient {
            live.insert(state.id);
            let transform = pose_to_transform(&state.pose);
            match ambient.map.get(&state.id) {
                Some(&entity) => {
                    if let Ok(mut tf) = transforms.get_mut(entity) {
                        *tf = transform;
                    }
                }
                None => {
                    let Some(root) = root else { continue };
                    let entity = commands
                        .spawn((
                            SpatialBundle::from_transform(transform),
                            ShowcaseAmbient {
                                id: state.id,
                                spawner: state.spawner.clone(),
                            },
                        ))
                        .set_parent(root)
                        .id();
                    ambient.map.insert(state.id, entity);
                }
            }
        }
    }

    ambient.map.retain(|id, entity| {
        if live.contains(id) {
            true
        } else {
            commands.entity(*entity).despawn_recursive();
            false
        }
    });
}

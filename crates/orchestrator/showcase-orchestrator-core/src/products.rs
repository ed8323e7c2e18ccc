//! Product placements waiting on, and bound to, the shared model asset.

use showcase_animation::Pose;
use showcase_scene::{
    AssetCache, AssetKind, AssetRequest, AssetState, BindError, IdAllocator, IdError,
    MaterialBinder, ModelAsset, Placement, PlacementId, ProductInstance, VariantTable,
};

use crate::outputs::PageEvent;

/// Handle returned by [`Products::place_product`]. The instance behind it is
/// populated once the model resolves (or fails).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementHandle {
    pub id: PlacementId,
    pub object: String,
    pub model: String,
}

#[derive(Clone, Debug)]
struct Slot {
    handle: PlacementHandle,
    placement: Placement,
    variant: usize,
    instance: Option<ProductInstance>,
}

#[derive(Debug, Default)]
pub struct Products {
    binder: MaterialBinder,
    slots: Vec<Slot>,
}

impl Products {
    pub fn new(binder: MaterialBinder) -> Self {
        Self {
            binder,
            slots: Vec::new(),
        }
    }

    pub fn binder(&self) -> &MaterialBinder {
        &self.binder
    }

    /// Register a placement and ask for its model. If the model already settled the
    /// instance is bound (or falls back to a placeholder) immediately.
    pub fn place_product(
        &mut self,
        placement: Placement,
        variant: usize,
        ids: &mut IdAllocator,
        cache: &mut AssetCache,
        variants: &VariantTable,
        requests: &mut Vec<AssetRequest>,
        events: &mut Vec<PageEvent>,
    ) -> Result<PlacementHandle, IdError> {
        let handle = PlacementHandle {
            id: ids.alloc_placement()?,
            object: placement.id.clone(),
            model: placement.model.clone(),
        };
        requests.extend(cache.request(&placement.model, AssetKind::Model));
        self.slots.push(Slot {
            handle: handle.clone(),
            placement,
            variant,
            instance: None,
        });
        match cache.state(&handle.model) {
            Some(AssetState::Ready { model: Some(model), .. }) => {
                let model = model.clone();
                self.model_ready(&handle.model, &model, cache, variants, events);
            }
            Some(AssetState::Failed { reason, .. }) => {
                let reason = reason.clone();
                self.model_failed(&handle.model, &reason);
            }
            _ => {}
        }
        Ok(handle)
    }

    /// Bind every pending placement of `url`. Returns the object ids bound.
    pub fn model_ready(
        &mut self,
        url: &str,
        model: &ModelAsset,
        cache: &AssetCache,
        variants: &VariantTable,
        events: &mut Vec<PageEvent>,
    ) -> Vec<String> {
        let mut bound = Vec::new();
        for slot in self
            .slots
            .iter_mut()
            .filter(|s| s.instance.is_none() && s.handle.model == url)
        {
            let Some(variant) = variants.get(slot.variant) else {
                continue;
            };
            let texture_ok = !cache.is_failed(&variant.label_texture);
            let instance = match self.binder.bind(
                slot.handle.id,
                &slot.placement,
                model,
                slot.variant,
                variant,
                texture_ok,
            ) {
                Ok(instance) => instance,
                Err(BindError::MissingLabelMesh { object, mesh }) => {
                    log::warn!("object '{object}': no label mesh '{mesh}'; binding metal only");
                    events.push(PageEvent::LabelMeshMissing { object, mesh });
                    self.binder
                        .bind_metal_only(slot.handle.id, &slot.placement, model, slot.variant)
                }
                Err(err) => {
                    log::warn!("{err}");
                    continue;
                }
            };
            events.push(PageEvent::ProductPlaced {
                object: instance.object.clone(),
                scene: instance.scene.clone(),
            });
            bound.push(instance.object.clone());
            slot.instance = Some(instance);
        }
        bound
    }

    /// Resolve every pending placement of `url` to a placeholder.
    pub fn model_failed(&mut self, url: &str, reason: &str) -> Vec<String> {
        let mut bound = Vec::new();
        for slot in self
            .slots
            .iter_mut()
            .filter(|s| s.instance.is_none() && s.handle.model == url)
        {
            slot.instance = Some(MaterialBinder::placeholder(
                slot.handle.id,
                &slot.placement,
                slot.variant,
                reason,
            ));
            bound.push(slot.placement.id.clone());
        }
        bound
    }

    pub fn texture_failed(&mut self, url: &str) {
        for instance in self.slots.iter_mut().filter_map(|s| s.instance.as_mut()) {
            MaterialBinder::clear_texture(instance, url);
        }
    }

    /// Show `variant` on `object`. A pending placement just remembers it; returns
    /// whether a bound instance changed.
    pub fn apply_variant(
        &mut self,
        object: &str,
        index: usize,
        variants: &VariantTable,
        cache: &AssetCache,
    ) -> bool {
        let Some(variant) = variants.get(index) else {
            return false;
        };
        let texture_ok = !cache.is_failed(&variant.label_texture);
        let Some(slot) = self.slots.iter_mut().find(|s| s.placement.id == object) else {
            return false;
        };
        slot.variant = index;
        match slot.instance.as_mut() {
            Some(instance) => self
                .binder
                .apply_variant(instance, index, variant, texture_ok),
            None => false,
        }
    }

    pub fn contains(&self, object: &str) -> bool {
        self.slots.iter().any(|s| s.placement.id == object)
    }

    pub fn placement(&self, object: &str) -> Option<&Placement> {
        self.slots
            .iter()
            .find(|s| s.placement.id == object)
            .map(|s| &s.placement)
    }

    /// Rest pose of `object`, known before its model loads.
    pub fn base_pose(&self, object: &str) -> Option<Pose> {
        self.placement(object).map(MaterialBinder::base_pose)
    }

    pub fn instance(&self, object: &str) -> Option<&ProductInstance> {
        self.slots
            .iter()
            .find(|s| s.placement.id == object)
            .and_then(|s| s.instance.as_ref())
    }

    /// Bound instances in `scene`, in placement order.
    pub fn instances_in<'a>(&'a self, scene: &'a str) -> impl Iterator<Item = &'a ProductInstance> + 'a {
        self.slots
            .iter()
            .filter_map(|s| s.instance.as_ref())
            .filter(move |i| i.scene == scene)
    }

    pub fn handle(&self, object: &str) -> Option<&PlacementHandle> {
        self.slots
            .iter()
            .find(|s| s.placement.id == object)
            .map(|s| &s.handle)
    }

    /// Instance behind `id`; `None` while its model is pending.
    pub fn instance_by_id(&self, id: PlacementId) -> Option<&ProductInstance> {
        self.slots
            .iter()
            .find(|s| s.handle.id == id)
            .and_then(|s| s.instance.as_ref())
    }

    pub fn pending(&self) -> impl Iterator<Item = &PlacementHandle> + '_ {
        self.slots
            .iter()
            .filter(|s| s.instance.is_none())
            .map(|s| &s.handle)
    }
}

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{WaveError, WaveResult};
use crate::render::element::{ElementConfig, GroupKey, Transition, TransitionPlan};
use crate::render::{Backend, BackendKind};

/// Scene-graph object. `id` is stable for the lifetime of its slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub id: u64,
    /// Bumped every time the slot is replaced.
    pub revision: u32,
    pub element: ElementConfig,
    pub animation: Option<Transition>,
}

/// Immediate-mode canvas scene.
///
/// Every group owns an arena addressed by element index. Re-emitting a group
/// replaces the object in each existing slot and appends new slots, so later
/// updates keep targeting the same object.
#[derive(Debug)]
pub struct CanvasBackend {
    width: f64,
    height: f64,
    groups: IndexMap<GroupKey, Vec<SceneObject>>,
    next_id: u64,
    attached: bool,
}

impl CanvasBackend {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            groups: IndexMap::new(),
            next_id: 1,
            attached: true,
        }
    }

    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Simulates the canvas element going away.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    #[must_use]
    pub fn objects(&self, key: &GroupKey) -> &[SceneObject] {
        self.groups.get(key).map_or(&[], Vec::as_slice)
    }

    /// Every object in paint order.
    pub fn scene(&self) -> impl Iterator<Item = &SceneObject> {
        self.groups.values().flatten()
    }
}

impl Backend for CanvasBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Canvas
    }

    fn emit(
        &mut self,
        key: &GroupKey,
        elements: Vec<ElementConfig>,
        plan: TransitionPlan,
    ) -> WaveResult<()> {
        if !self.attached {
            return Err(WaveError::Backend(format!(
                "canvas detached while drawing `{key}`"
            )));
        }

        let arena = self.groups.entry(key.clone()).or_default();
        arena.truncate(elements.len());
        let mut appended = 0_usize;
        for (index, element) in elements.into_iter().enumerate() {
            if let Some(slot) = arena.get_mut(index) {
                slot.element = element;
                slot.revision += 1;
                slot.animation = plan.update;
            } else {
                arena.push(SceneObject {
                    id: self.next_id,
                    revision: 0,
                    element,
                    animation: plan.enter,
                });
                self.next_id += 1;
                appended += 1;
            }
        }

        trace!(group = %key, objects = arena.len(), appended, "canvas replace");
        Ok(())
    }

    fn remove_layer(&mut self, layer: &str) -> WaveResult<()> {
        self.groups.retain(|key, _| key.layer != layer);
        Ok(())
    }

    fn elements(&self) -> Vec<(&GroupKey, &ElementConfig)> {
        self.groups
            .iter()
            .flat_map(|(key, arena)| arena.iter().map(move |object| (key, &object.element)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::element::{Geometry, ShapeKind};

    fn rect(x: f64) -> ElementConfig {
        ElementConfig::new(
            "bar",
            ShapeKind::Rect,
            Geometry::Rect {
                x,
                y: 0.0,
                width: 1.0,
                height: 1.0,
                rx: 0.0,
            },
        )
    }

    #[test]
    fn replacement_keeps_object_identity() {
        let mut canvas = CanvasBackend::new(10.0, 10.0);
        let key = GroupKey::new("l", "bar");
        canvas
            .emit(&key, vec![rect(0.0), rect(1.0)], TransitionPlan::instant())
            .expect("first");
        let ids: Vec<u64> = canvas.objects(&key).iter().map(|o| o.id).collect();

        canvas
            .emit(&key, vec![rect(5.0), rect(6.0), rect(7.0)], TransitionPlan::instant())
            .expect("second");
        let objects = canvas.objects(&key);
        assert_eq!(objects[0].id, ids[0]);
        assert_eq!(objects[1].id, ids[1]);
        assert_eq!(objects[0].revision, 1);
        assert_eq!(objects[2].revision, 0);
        assert_eq!(objects[0].element, rect(5.0));
    }

    #[test]
    fn remove_layer_drops_its_groups_only() {
        let mut canvas = CanvasBackend::new(10.0, 10.0);
        canvas
            .emit(&GroupKey::new("a", "bar"), vec![rect(0.0)], TransitionPlan::instant())
            .expect("a");
        canvas
            .emit(&GroupKey::new("b", "bar"), vec![rect(0.0)], TransitionPlan::instant())
            .expect("b");
        canvas.remove_layer("a").expect("remove");
        assert_eq!(canvas.elements().len(), 1);
        assert_eq!(canvas.elements()[0].0.layer, "b");
    }
}

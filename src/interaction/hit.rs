use std::collections::HashMap;

use crate::render::{Backend, ElementConfig, ElementSource, GroupKey, ShapeKind};

/// Element under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct HitTarget {
    pub key: GroupKey,
    /// Position of the element inside its group.
    pub index: usize,
    pub kind: ShapeKind,
    pub source: ElementSource,
}

/// Topmost element with a data source containing `(x, y)`.
///
/// Elements are tested in reverse paint order, so the last drawn wins.
/// Elements without a source (axes, labels) never capture the pointer.
#[must_use]
pub fn hit_test(backend: &dyn Backend, x: f64, y: f64, tolerance: f64) -> Option<HitTarget> {
    let elements = backend.elements();
    let mut counts: HashMap<&GroupKey, usize> = HashMap::new();
    let indices: Vec<usize> = elements
        .iter()
        .map(|(key, _)| {
            let count = counts.entry(*key).or_insert(0);
            *count += 1;
            *count - 1
        })
        .collect();

    elements
        .iter()
        .zip(indices)
        .rev()
        .find_map(|(&(key, element), index)| target(key, element, index, x, y, tolerance))
}

fn target(
    key: &GroupKey,
    element: &ElementConfig,
    index: usize,
    x: f64,
    y: f64,
    tolerance: f64,
) -> Option<HitTarget> {
    let source = element.source.as_ref()?;
    element.geometry.contains(x, y, tolerance).then(|| HitTarget {
        key: key.clone(),
        index,
        kind: element.kind,
        source: source.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Geometry, SvgBackend, TransitionPlan};

    fn circle(layer: &str, cx: f64) -> ElementConfig {
        ElementConfig::new("circle", ShapeKind::Circle, Geometry::Circle { cx, cy: 10.0, r: 5.0 })
            .with_source(Some(ElementSource {
                layer_id: layer.to_owned(),
                element_type: "circle".to_owned(),
                ..ElementSource::default()
            }))
    }

    #[test]
    fn last_painted_element_wins() {
        let mut backend = SvgBackend::new(100.0, 100.0);
        backend
            .emit(
                &GroupKey::new("below", "circle"),
                vec![circle("below", 0.0), circle("below", 10.0)],
                TransitionPlan::instant(),
            )
            .expect("emit");
        backend
            .emit(
                &GroupKey::new("above", "circle"),
                vec![circle("above", 12.0)],
                TransitionPlan::instant(),
            )
            .expect("emit");

        let hit = hit_test(&backend, 11.0, 10.0, 0.0).expect("hit");
        assert_eq!(hit.key.layer, "above");
        assert_eq!(hit.index, 0);
        let hit = hit_test(&backend, 1.0, 10.0, 0.0).expect("hit");
        assert_eq!((hit.key.layer.as_str(), hit.index), ("below", 0));
        assert!(hit_test(&backend, 50.0, 50.0, 0.0).is_none());
    }

    #[test]
    fn unsourced_elements_are_transparent() {
        let mut backend = SvgBackend::new(100.0, 100.0);
        let label = ElementConfig::new(
            "circle",
            ShapeKind::Circle,
            Geometry::Circle { cx: 0.0, cy: 10.0, r: 5.0 },
        );
        backend
            .emit(&GroupKey::new("axis", "circle"), vec![label], TransitionPlan::instant())
            .expect("emit");
        assert!(hit_test(&backend, 0.0, 10.0, 0.0).is_none());
    }
}

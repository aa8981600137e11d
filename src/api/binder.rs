use indexmap::IndexMap;
use tracing::debug;

use crate::core::{GeoAxis, GeoAxisScale, Rect, Scale, ScaleSpec};
use crate::error::{WaveError, WaveResult};
use crate::layer::{AxisSlot, CoordinateFamily, Layer, ScaleSlot, region_linear_scale};
use crate::render::Backend;

use super::Wave;

/// An axis layer and the data layers sharing its coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub axis: String,
    pub layers: Vec<String>,
}

/// Axis slot a data layer's scale feeds. Cartesian layers on the minor axis
/// feed `scaleYR` with their own `scaleY`.
fn shared_slot(family: CoordinateFamily, slot: ScaleSlot, axis: AxisSlot) -> Option<ScaleSlot> {
    match (family, slot) {
        (CoordinateFamily::Cartesian, ScaleSlot::X) => Some(ScaleSlot::X),
        (CoordinateFamily::Cartesian, ScaleSlot::Y) if axis == AxisSlot::Minor => {
            Some(ScaleSlot::YR)
        }
        (CoordinateFamily::Cartesian, ScaleSlot::Y) => Some(ScaleSlot::Y),
        (CoordinateFamily::Cartesian, ScaleSlot::YR) => Some(ScaleSlot::YR),
        (CoordinateFamily::Polar, ScaleSlot::Angle) => Some(ScaleSlot::Angle),
        (CoordinateFamily::Polar, ScaleSlot::Radius) => Some(ScaleSlot::Radius),
        (CoordinateFamily::Geographic, ScaleSlot::Position) => Some(ScaleSlot::Position),
        _ => None,
    }
}

fn union_labels(first: &[String], second: &[String]) -> Vec<String> {
    let mut labels = first.to_vec();
    for label in second {
        if !labels.contains(label) {
            labels.push(label.clone());
        }
    }
    labels
}

fn union_extent(first: (f64, f64), second: (f64, f64)) -> (f64, f64) {
    (
        first.0.min(first.1).min(second.0.min(second.1)),
        first.0.max(first.1).max(second.0.max(second.1)),
    )
}

/// Merges the scales contributed to one slot.
///
/// Continuous domains are unioned, discrete domains keep first-appearance
/// order and projections grow to cover every extent. The first scale decides
/// the kind and range; contributions of another kind are skipped.
#[must_use]
pub fn merge_scales(scales: &[Scale]) -> Option<Scale> {
    let (first, rest) = scales.split_first()?;
    let mut merged = first.clone();
    for scale in rest {
        match (&mut merged, scale) {
            (Scale::Linear(target), Scale::Linear(other)) => {
                let domain = union_extent(target.domain(), other.domain());
                target.set_domain(domain);
            }
            (Scale::Band(target), other @ (Scale::Band(_) | Scale::Point(_))) => {
                let labels = union_labels(target.domain(), other.labels());
                target.set_domain(labels);
            }
            (Scale::Point(target), other @ (Scale::Band(_) | Scale::Point(_))) => {
                let labels = union_labels(target.domain(), other.labels());
                target.set_domain(labels);
            }
            (Scale::Geographic(target), Scale::Geographic(other)) => {
                let (lon, lat) = target.domain();
                let (other_lon, other_lat) = other.domain();
                target.set_domain(union_extent(lon, other_lon), union_extent(lat, other_lat));
            }
            (target, other) => {
                debug!(
                    merged = ?target.kind(),
                    skipped = ?other.kind(),
                    "incompatible scale contribution skipped"
                );
            }
        }
    }
    Some(merged)
}

/// Re-spans merged cartesian linear scales over the axis region and applies
/// the axis spec's fixed domain and nice settings.
fn fit_to_axis(
    family: CoordinateFamily,
    slot: ScaleSlot,
    scale: Scale,
    region: Rect,
    spec: &ScaleSpec,
) -> Scale {
    match (family, scale) {
        (CoordinateFamily::Cartesian, Scale::Linear(linear)) => Scale::Linear(
            spec.apply_linear(region_linear_scale(slot, linear.domain(), region)),
        ),
        (_, scale) => scale,
    }
}

impl<B: Backend> Wave<B> {
    /// Shares the coordinates of axis layer `axis` with `layers`.
    ///
    /// Replaces any earlier binding of the same axis and recomputes it at
    /// once; every later `set_data` recomputes it again.
    pub fn bind_coordinate(&mut self, axis: &str, layers: &[&str]) -> WaveResult<()> {
        let family = self
            .layer(axis)
            .ok_or_else(|| WaveError::LayerNotFound(axis.to_owned()))?
            .coordinate()
            .ok_or_else(|| WaveError::Unsupported(format!("layer `{axis}` is not an axis")))?;
        if let Some(missing) = layers.iter().find(|id| self.position(id).is_none()) {
            return Err(WaveError::LayerNotFound((*missing).to_owned()));
        }
        self.bindings.retain(|binding| binding.axis != axis);
        self.bindings.push(Binding {
            axis: axis.to_owned(),
            layers: layers.iter().map(|id| (*id).to_owned()).collect(),
        });
        debug!(axis, family = ?family, layers = layers.len(), "coordinates bound");
        self.rebind()
    }

    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub(super) fn rebind(&mut self) -> WaveResult<()> {
        let bindings = self.bindings.clone();
        for binding in &bindings {
            self.apply_binding(binding)?;
        }
        Ok(())
    }

    /// Gathers every contributed scale onto the axis, then hands the merged
    /// set back to each data layer.
    fn apply_binding(&mut self, binding: &Binding) -> WaveResult<()> {
        let Some(axis) = self.layer(&binding.axis) else {
            return Ok(());
        };
        let Some(family) = axis.coordinate() else {
            return Ok(());
        };
        let region = axis.base().region();

        let mut gathered: IndexMap<ScaleSlot, Vec<Scale>> = IndexMap::new();
        for (slot, scale) in axis.base().derived_scales() {
            gathered.entry(*slot).or_default().push(scale.clone());
        }
        for id in &binding.layers {
            let Some(layer) = self.layer(id) else {
                continue;
            };
            let axis_slot = layer.base().options().axis;
            for (slot, scale) in layer.base().derived_scales() {
                if let Some(shared) = shared_slot(family, *slot, axis_slot) {
                    gathered.entry(shared).or_default().push(scale.clone());
                }
            }
        }

        let merged: IndexMap<ScaleSlot, Scale> = gathered
            .into_iter()
            .filter_map(|(slot, scales)| {
                let spec = axis.base().scale_spec(slot);
                merge_scales(&scales).map(|scale| (slot, fit_to_axis(family, slot, scale, region, &spec)))
            })
            .collect();

        self.guarded(&binding.axis, "bind", |layer, _| {
            for (slot, scale) in &merged {
                layer.base_mut().assign_scale(*slot, scale.clone());
            }
            Ok(())
        })?;
        for id in &binding.layers {
            self.guarded(id, "bind", |layer, _| {
                redistribute(layer, family, &merged);
                Ok(())
            })?;
        }
        debug!(axis = %binding.axis, slots = merged.len(), "coordinates redistributed");
        Ok(())
    }
}

fn redistribute(layer: &mut dyn Layer, family: CoordinateFamily, merged: &IndexMap<ScaleSlot, Scale>) {
    let axis_slot = layer.base().options().axis;
    let own: Vec<ScaleSlot> = layer.base().derived_scales().keys().copied().collect();
    for slot in own {
        let Some(scale) = shared_slot(family, slot, axis_slot).and_then(|shared| merged.get(&shared))
        else {
            continue;
        };
        layer.base_mut().assign_scale(slot, scale.clone());
    }
    if family != CoordinateFamily::Geographic {
        return;
    }
    if let Some(projection) = merged.get(&ScaleSlot::Position).and_then(Scale::as_geographic) {
        let projection = *projection;
        layer.base_mut().assign_scale(
            ScaleSlot::X,
            Scale::GeoAxis(GeoAxisScale::new(projection, GeoAxis::Longitude)),
        );
        layer.base_mut().assign_scale(
            ScaleSlot::Y,
            Scale::GeoAxis(GeoAxisScale::new(projection, GeoAxis::Latitude)),
        );
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use serde_json::json;

    use super::*;
    use crate::api::WaveConfig;
    use crate::core::{BandScale, GeoScale, LinearScale, Viewport};
    use crate::layer::{
        AuxiliaryOptions, AxisOptions, LayerKind, LayerOptions, RectOptions, ScatterOptions,
    };
    use crate::render::SvgBackend;

    #[test]
    fn linear_domains_union_and_labels_keep_order() {
        let merged = merge_scales(&[
            Scale::Linear(LinearScale::new((0.0, 30.0), (100.0, 0.0))),
            Scale::Linear(LinearScale::new((-5.0, 20.0), (50.0, 0.0))),
        ])
        .expect("merged");
        assert_eq!(merged.as_linear().expect("linear").domain(), (-5.0, 30.0));
        assert_eq!(merged.range(), (100.0, 0.0));

        let merged = merge_scales(&[
            Scale::Band(BandScale::new(vec!["a".into(), "b".into()], (0.0, 10.0))),
            Scale::Band(BandScale::new(vec!["c".into(), "a".into()], (0.0, 10.0))),
        ])
        .expect("merged");
        assert_eq!(merged.labels(), ["a", "b", "c"]);
        assert!(merge_scales(&[]).is_none());
    }

    #[test]
    fn projections_cover_every_extent() {
        let merged = merge_scales(&[
            Scale::Geographic(GeoScale::new((0.0, 10.0), (0.0, 10.0), (0.0, 1.0), (0.0, 1.0))),
            Scale::Geographic(GeoScale::new((-20.0, 5.0), (5.0, 40.0), (0.0, 1.0), (0.0, 1.0))),
        ])
        .expect("merged");
        let (lon, lat) = merged.as_geographic().expect("geo").domain();
        assert_eq!(lon, (-20.0, 10.0));
        assert_eq!(lat, (0.0, 40.0));
    }

    #[test]
    fn shared_y_covers_bars_and_thresholds() {
        let mut wave = Wave::new(
            SvgBackend::new(400.0, 300.0),
            WaveConfig::new(Viewport::new(400, 300)),
        )
        .expect("wave");
        wave.create_layer(LayerKind::Axis(AxisOptions::new(LayerOptions::new("axis"))))
            .expect("axis");
        wave.create_layer(LayerKind::Rect(RectOptions::new(LayerOptions::new("bars"))))
            .expect("bars");
        wave.create_layer(LayerKind::Auxiliary(AuxiliaryOptions::new(LayerOptions::new(
            "limit",
        ))))
        .expect("limit");
        wave.set_data_value("bars", &json!([["k", "v"], ["a", 10], ["b", 20]]))
            .expect("bars data");
        wave.set_data_value("limit", &json!([["name", "value"], ["max", 45]]))
            .expect("limit data");
        wave.bind_coordinate("axis", &["bars", "limit"]).expect("bind");

        let shared = |id: &str| {
            wave.layer(id)
                .and_then(|layer| layer.base().scale(ScaleSlot::Y))
                .and_then(Scale::as_linear)
                .map(LinearScale::domain)
                .expect("linear y")
        };
        assert_eq!(shared("bars").1, 50.0);
        assert_eq!(shared("bars"), shared("limit"));
        assert_eq!(shared("axis"), shared("bars"));
        let bars_x = wave
            .layer("axis")
            .and_then(|layer| layer.base().scale(ScaleSlot::X))
            .expect("band x");
        assert_eq!(bars_x.labels(), ["a", "b"]);
        assert!(wave.draw_all().is_ok());
    }

    #[test]
    fn minor_axis_layers_feed_the_right_scale() {
        let mut wave = Wave::new(
            SvgBackend::new(400.0, 300.0),
            WaveConfig::new(Viewport::new(400, 300)),
        )
        .expect("wave");
        wave.create_layer(LayerKind::Axis(AxisOptions::new(LayerOptions::new("axis"))))
            .expect("axis");
        wave.create_layer(LayerKind::Scatter(ScatterOptions::new(
            LayerOptions::new("dots").with_axis(AxisSlot::Minor),
        )))
        .expect("dots");
        wave.set_data_value("dots", &json!([["x", "y"], [1, 500], [2, 900]]))
            .expect("dots data");
        wave.bind_coordinate("axis", &["dots"]).expect("bind");

        let axis = wave.layer("axis").expect("axis");
        let right = axis.base().scale(ScaleSlot::YR).expect("right axis");
        assert!(axis.base().scale(ScaleSlot::Y).is_none());
        let dots = wave.layer("dots").expect("dots");
        assert_eq!(dots.base().scale(ScaleSlot::Y), Some(right));
        let (start, end) = right.range();
        let main = wave.context().region("main").expect("main");
        assert_relative_eq!(start, main.bottom(), epsilon = 1e-9);
        assert_relative_eq!(end, main.top(), epsilon = 1e-9);
    }

    #[test]
    fn binding_requires_an_axis_layer() {
        let mut wave = Wave::new(
            SvgBackend::new(400.0, 300.0),
            WaveConfig::new(Viewport::new(400, 300)),
        )
        .expect("wave");
        wave.create_layer(LayerKind::Rect(RectOptions::new(LayerOptions::new("bars"))))
            .expect("bars");
        assert!(matches!(
            wave.bind_coordinate("bars", &[]),
            Err(WaveError::Unsupported(_))
        ));
        assert!(matches!(
            wave.bind_coordinate("axis", &["bars"]),
            Err(WaveError::LayerNotFound(_))
        ));
    }
}

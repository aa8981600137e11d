use std::f64::consts::TAU;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::WaveContext;
use crate::core::{BandBoundary, BandScale, LinearScale, Scale, SelectMode, Selection, Table};
use crate::error::{WaveError, WaveResult};
use crate::layer::{
    Layer, LayerBase, LayerData, LayerOptions, LayerType, LegendEntry, PointStyle, ScaleSlot,
    dimension_labels, row_source, series_columns,
};
use crate::render::path::polar_point;
use crate::render::{Attr, Backend, ShapeAttrs, ShapeKind, ShapeStyle};
use crate::render::primitives;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarOptions {
    #[serde(flatten)]
    pub common: LayerOptions,
    #[serde(default)]
    pub mode: SelectMode,
}

impl RadarOptions {
    #[must_use]
    pub fn new(common: LayerOptions) -> Self {
        Self {
            common,
            mode: SelectMode::Group,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RadarStyle {
    pub polygon: ShapeAttrs,
    pub point: PointStyle,
}

impl Default for RadarStyle {
    fn default() -> Self {
        Self {
            polygon: ShapeAttrs {
                fill_opacity: Some(Attr::Scalar(0.4)),
                stroke_width: Some(Attr::Scalar(2.0)),
                ..ShapeAttrs::default()
            },
            point: PointStyle::default(),
        }
    }
}

/// One polygon per series over dimensions spread around the circle.
#[derive(Debug)]
pub struct RadarLayer {
    base: LayerBase,
    options: RadarOptions,
    table: Table,
    selection: Option<Selection>,
}

impl RadarLayer {
    pub fn new(options: RadarOptions, context: Arc<WaveContext>) -> WaveResult<Self> {
        if options.mode == SelectMode::Interval {
            return Err(WaveError::Unsupported(
                "radar layers plot group, stack or sum selections".to_owned(),
            ));
        }
        Ok(Self {
            base: LayerBase::new(options.common.clone(), context)?,
            options,
            table: Table::default(),
            selection: None,
        })
    }

    fn vertices(&self) -> Vec<Vec<(f64, f64)>> {
        let (Some(selection), Some(angle), Some(radius)) = (
            &self.selection,
            self.base.scale(ScaleSlot::Angle),
            self.base.scale(ScaleSlot::Radius).and_then(Scale::as_linear),
        ) else {
            return Vec::new();
        };
        let (cx, cy) = self.base.region().center();
        selection
            .spans()
            .into_iter()
            .map(|spans| {
                spans
                    .into_iter()
                    .enumerate()
                    .filter_map(|(row, (_, end))| {
                        let label = self.table.row(row)?.first()?;
                        let theta = angle.map(label)?;
                        Some(polar_point(cx, cy, radius.scale(end), theta))
                    })
                    .collect()
            })
            .collect()
    }
}

impl Layer for RadarLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Radar
    }

    fn set_data(&mut self, data: LayerData) -> WaveResult<()> {
        let table = data.table()?;
        self.base.store_data(data);
        self.base.clear_scales();
        self.selection = None;
        self.table = table;
        if self.table.headers().len() < 2 {
            return Ok(());
        }

        let labels = dimension_labels(&self.table)?;
        let selection = self
            .table
            .select(&series_columns(&self.table), self.options.mode)?;
        let region = self.base.region();
        let max_radius = region.width().min(region.height()).max(0.0) / 2.0;

        let angle = self.base.scale_spec(ScaleSlot::Angle).apply_band(
            BandScale::new(labels, (0.0, TAU)).with_boundary(BandBoundary::Start),
        );
        let (_, max) = selection.range();
        let radius = self
            .base
            .scale_spec(ScaleSlot::Radius)
            .apply_linear(LinearScale::new((0.0, max.max(0.0)), (0.0, max_radius)));
        debug!(layer = %self.base.id(), series = selection.data().len(), "radar data set");
        self.base.install_scale(ScaleSlot::Angle, Scale::Band(angle));
        self.base.install_scale(ScaleSlot::Radius, Scale::Linear(radius));
        self.selection = Some(selection);
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn Backend) -> WaveResult<()> {
        let style: RadarStyle = self.base.typed_style()?;
        let polygons = self.vertices();
        let headers: Vec<String> = self
            .selection
            .as_ref()
            .map(|selection| selection.headers().into_iter().map(str::to_owned).collect())
            .unwrap_or_default();
        let colors = self.base.palette(polygons.len().max(1));
        let id = self.base.id();

        let polygon_colors: Vec<_> = (0..polygons.len())
            .map(|series| colors[series % colors.len()])
            .collect();
        let polygon_sources = headers
            .iter()
            .map(|header| row_source(id, ShapeKind::Polygon, &self.table, 0, header, None))
            .collect();
        let mut polygon_attrs = ShapeAttrs {
            fill: Some(Attr::PerElement(polygon_colors.clone())),
            stroke: Some(Attr::PerElement(polygon_colors)),
            ..ShapeAttrs::default()
        };
        polygon_attrs.merge(&style.polygon);
        let polygon = self
            .base
            .common("polygon", ShapeKind::Polygon)
            .with_attrs(polygon_attrs)
            .with_sources(polygon_sources);

        let mut centers = Vec::new();
        let mut point_colors = Vec::new();
        let mut point_sources = Vec::new();
        if style.point.enabled {
            let values = self.selection.as_ref().map(Selection::spans).unwrap_or_default();
            for (series, points) in polygons.iter().enumerate() {
                for (row, &center) in points.iter().enumerate() {
                    centers.push(center);
                    point_colors.push(colors[series % colors.len()]);
                    point_sources.push(row_source(
                        id,
                        ShapeKind::Circle,
                        &self.table,
                        row,
                        headers.get(series).map_or("", String::as_str),
                        values.get(series).and_then(|spans| spans.get(row)).map(|span| span.1),
                    ));
                }
            }
        }
        let mut point_attrs = ShapeAttrs {
            fill: Some(Attr::PerElement(point_colors)),
            ..ShapeAttrs::default()
        };
        point_attrs.merge(&style.point.circle);
        let points = self
            .base
            .common("circle", ShapeKind::Circle)
            .with_attrs(point_attrs)
            .with_defaults(ShapeStyle::default())
            .with_sources(point_sources);

        let mut target = self.base.target(backend);
        primitives::draw_polygon(&mut target, &polygon, &polygons)?;
        primitives::draw_circle(
            &mut target,
            &points,
            &centers,
            Some(&Attr::Scalar(style.point.size)),
        )
    }

    fn legend_entries(&self) -> Vec<LegendEntry> {
        let Some(selection) = &self.selection else {
            return Vec::new();
        };
        let headers = selection.headers();
        headers
            .iter()
            .zip(self.base.palette(headers.len()))
            .map(|(label, color)| LegendEntry {
                label: (*label).to_owned(),
                color,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use serde_json::json;

    use super::*;
    use crate::api::context::test_context;
    use crate::render::{GroupKey, SvgBackend};

    #[test]
    fn first_dimension_points_straight_up() {
        let mut layer = RadarLayer::new(RadarOptions::new(LayerOptions::new("radar")), test_context())
            .expect("layer");
        layer
            .set_data(
                LayerData::from_value(&json!([
                    ["dim", "a", "b"],
                    ["speed", 10, 5],
                    ["power", 5, 10],
                    ["range", 10, 10],
                    ["cost", 0, 5]
                ]))
                .expect("data"),
            )
            .expect("set data");
        let polygons = layer.vertices();
        assert_eq!(polygons.len(), 2);
        // centre (100, 50), radius 50 for the maximum
        let (x, y) = polygons[0][0];
        assert_relative_eq!(x, 100.0, epsilon = 1e-9);
        assert_relative_eq!(y, 0.0, epsilon = 1e-9);
        let (x, y) = polygons[0][1];
        assert_relative_eq!(x, 125.0, epsilon = 1e-9);
        assert_relative_eq!(y, 50.0, epsilon = 1e-9);

        layer
            .set_style(&json!({"point": {"enabled": true}}))
            .expect("style");
        let mut backend = SvgBackend::new(200.0, 100.0);
        layer.draw(&mut backend).expect("draw");
        assert_eq!(backend.nodes(&GroupKey::new("radar", "polygon")).len(), 2);
        assert_eq!(backend.nodes(&GroupKey::new("radar", "circle")).len(), 8);
    }
}

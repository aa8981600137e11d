use std::sync::Arc;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::WaveContext;
use crate::core::{Cell, LinearScale, Scale, Table};
use crate::error::{WaveError, WaveResult};
use crate::layer::{
    LabelStyle, Layer, LayerBase, LayerData, LayerOptions, LayerType, LegendEntry, ScaleSlot,
    row_source,
};
use crate::render::primitives::{self, TextAttrs, TextSpec};
use crate::render::{Attr, Backend, ShapeAttrs, ShapeKind, ShapeStyle};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterOptions {
    #[serde(flatten)]
    pub common: LayerOptions,
}

impl ScatterOptions {
    #[must_use]
    pub fn new(common: LayerOptions) -> Self {
        Self { common }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScatterStyle {
    pub circle: ShapeAttrs,
    /// Radius range for the optional size column.
    pub size_range: [f64; 2],
    pub text: LabelStyle,
}

impl Default for ScatterStyle {
    fn default() -> Self {
        Self {
            circle: ShapeAttrs {
                fill_opacity: Some(Attr::Scalar(0.7)),
                ..ShapeAttrs::default()
            },
            size_range: [4.0, 12.0],
            text: LabelStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ScatterPoint {
    row: usize,
    category: String,
    x: f64,
    y: f64,
    size: Option<f64>,
}

/// Bubble and scatter plots.
///
/// Columns are `x, y[, size]`, or `category, x, y[, size]` when the first
/// column is not numeric.
#[derive(Debug)]
pub struct ScatterLayer {
    base: LayerBase,
    table: Table,
    points: Vec<ScatterPoint>,
    categories: Vec<String>,
}

impl ScatterLayer {
    pub fn new(options: ScatterOptions, context: Arc<WaveContext>) -> WaveResult<Self> {
        Ok(Self {
            base: LayerBase::new(options.common, context)?,
            table: Table::default(),
            points: Vec::new(),
            categories: Vec::new(),
        })
    }

    fn read_points(table: &Table) -> WaveResult<Vec<ScatterPoint>> {
        let categorized = table.rows().iter().any(|row| {
            row.first()
                .is_some_and(|cell| !cell.is_null() && cell.as_number().is_none())
        });
        let first = usize::from(categorized);
        if table.headers().len() < first + 2 {
            return Err(WaveError::InvalidData(format!(
                "scatter data needs x and y columns, got {:?}",
                table.headers()
            )));
        }

        Ok(table
            .rows()
            .iter()
            .enumerate()
            .filter_map(|(row, cells)| {
                let x = cells[first].as_number()?;
                let y = cells[first + 1].as_number()?;
                Some(ScatterPoint {
                    row,
                    category: if categorized {
                        cells[0].to_string()
                    } else {
                        String::new()
                    },
                    x,
                    y,
                    size: cells.get(first + 2).and_then(Cell::as_number),
                })
            })
            .collect())
    }

    fn size_domain(&self) -> Option<(f64, f64)> {
        let sizes = self.points.iter().filter_map(|point| point.size);
        let min = sizes.clone().map(OrderedFloat).min()?;
        let max = sizes.map(OrderedFloat).max()?;
        Some((min.0, max.0))
    }
}

fn extent(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let min = values.clone().map(OrderedFloat).min();
    let max = values.map(OrderedFloat).max();
    match (min, max) {
        (Some(min), Some(max)) => (min.0, max.0),
        _ => (0.0, 0.0),
    }
}

impl Layer for ScatterLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Scatter
    }

    fn set_data(&mut self, data: LayerData) -> WaveResult<()> {
        let table = data.table()?;
        self.base.store_data(data);
        self.base.clear_scales();
        self.points.clear();
        self.categories.clear();
        if table.headers().is_empty() {
            self.table = table;
            return Ok(());
        }
        self.points = Self::read_points(&table)?;
        self.table = table;
        for point in &self.points {
            if !point.category.is_empty() && !self.categories.contains(&point.category) {
                self.categories.push(point.category.clone());
            }
        }

        let region = self.base.region();
        let x = self.base.scale_spec(ScaleSlot::X).apply_linear(LinearScale::new(
            extent(self.points.iter().map(|point| point.x)),
            (region.left(), region.right()),
        ));
        let y = self.base.scale_spec(ScaleSlot::Y).apply_linear(LinearScale::new(
            extent(self.points.iter().map(|point| point.y)),
            (region.bottom(), region.top()),
        ));
        debug!(layer = %self.base.id(), points = self.points.len(), "scatter data set");
        self.base.install_scale(ScaleSlot::X, Scale::Linear(x));
        self.base.install_scale(ScaleSlot::Y, Scale::Linear(y));
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn Backend) -> WaveResult<()> {
        let style: ScatterStyle = self.base.typed_style()?;
        let (Some(x), Some(y)) = (
            self.base.scale(ScaleSlot::X).and_then(Scale::as_linear),
            self.base.scale(ScaleSlot::Y).and_then(Scale::as_linear),
        ) else {
            return Ok(());
        };
        let [min_radius, max_radius] = style.size_range;
        let radius = self
            .size_domain()
            .map(|domain| LinearScale::new(domain, (min_radius, max_radius)));
        let colors = self.base.palette(self.categories.len().max(1));
        let id = self.base.id();

        let mut centers = Vec::with_capacity(self.points.len());
        let mut radii = Vec::with_capacity(self.points.len());
        let mut fills = Vec::with_capacity(self.points.len());
        let mut sources = Vec::with_capacity(self.points.len());
        let mut labels = Vec::new();
        for point in &self.points {
            let center = (x.scale(point.x), y.scale(point.y));
            let r = match (&radius, point.size) {
                (Some(scale), Some(size)) => scale.scale(size),
                _ => min_radius,
            };
            let series = self
                .categories
                .iter()
                .position(|category| *category == point.category)
                .unwrap_or(0);
            if style.text.enabled {
                labels.push(TextSpec::new(
                    point.category.clone(),
                    (center.0, center.1 - r - style.text.offset),
                ));
            }
            centers.push(center);
            radii.push(r);
            fills.push(colors[series % colors.len()]);
            sources.push(row_source(
                id,
                ShapeKind::Circle,
                &self.table,
                point.row,
                &point.category,
                point.size.or(Some(point.y)),
            ));
        }

        let mut attrs = ShapeAttrs {
            fill: Some(Attr::PerElement(fills)),
            ..ShapeAttrs::default()
        };
        attrs.merge(&style.circle);
        let circles = self
            .base
            .common("circle", ShapeKind::Circle)
            .with_attrs(attrs)
            .with_sources(sources);
        let text = self
            .base
            .common("text", ShapeKind::Text)
            .with_defaults(ShapeStyle::filled(
                style.text.fill.unwrap_or(self.base.theme().text),
            ));
        let text_attrs = TextAttrs {
            font_size: style.text.font_size.map(Attr::Scalar),
            anchor: None,
        };

        let mut target = self.base.target(backend);
        primitives::draw_circle(&mut target, &circles, &centers, Some(&Attr::PerElement(radii)))?;
        primitives::draw_text(&mut target, &text, &labels, &text_attrs)
    }

    fn legend_entries(&self) -> Vec<LegendEntry> {
        self.categories
            .iter()
            .zip(self.base.palette(self.categories.len()))
            .map(|(label, color)| LegendEntry {
                label: label.clone(),
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
    use crate::render::{Geometry, GroupKey, SvgBackend};

    fn radii(backend: &SvgBackend) -> Vec<f64> {
        backend
            .nodes(&GroupKey::new("dots", "circle"))
            .iter()
            .filter_map(|node| match node.element.geometry {
                Geometry::Circle { r, .. } => Some(r),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn size_column_maps_onto_size_range() {
        let mut layer = ScatterLayer::new(ScatterOptions::new(LayerOptions::new("dots")), test_context())
            .expect("layer");
        layer
            .set_data(
                LayerData::from_value(&json!([
                    ["kind", "x", "y", "n"],
                    ["a", 0, 0, 1],
                    ["b", 10, 5, 3],
                    ["a", 5, 10, 2]
                ]))
                .expect("data"),
            )
            .expect("set data");
        let mut backend = SvgBackend::new(200.0, 100.0);
        layer.draw(&mut backend).expect("draw");

        let radii = radii(&backend);
        assert_eq!(radii.len(), 3);
        assert_relative_eq!(radii[0], 4.0, epsilon = 1e-9);
        assert_relative_eq!(radii[1], 12.0, epsilon = 1e-9);
        assert_relative_eq!(radii[2], 8.0, epsilon = 1e-9);
        assert_eq!(layer.legend_entries().len(), 2);
    }

    #[test]
    fn numeric_first_column_is_x() {
        let mut layer = ScatterLayer::new(ScatterOptions::new(LayerOptions::new("dots")), test_context())
            .expect("layer");
        layer
            .set_data(LayerData::from_value(&json!([["x", "y"], [1, 2], [3, 4]])).expect("data"))
            .expect("set data");
        let x = layer.base().scale(ScaleSlot::X).and_then(Scale::as_linear).expect("x");
        assert_eq!(x.domain(), (1.0, 3.0));
        assert!(layer.legend_entries().is_empty());
    }

    #[test]
    fn single_column_is_rejected() {
        let mut layer = ScatterLayer::new(ScatterOptions::new(LayerOptions::new("dots")), test_context())
            .expect("layer");
        let result = layer.set_data(LayerData::from_value(&json!([["x"], [1]])).expect("data"));
        assert!(matches!(result, Err(WaveError::InvalidData(_))));
    }
}

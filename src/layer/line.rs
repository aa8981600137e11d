use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::WaveContext;
use crate::core::{LinearScale, PointScale, Scale, SelectMode, Selection, Table};
use crate::error::{WaveError, WaveResult};
use crate::layer::{
    LabelStyle, Layer, LayerBase, LayerData, LayerOptions, LayerType, LegendEntry, PointStyle,
    ScaleSlot, dimension_labels, format_value, row_source, series_columns,
};
use crate::render::primitives::{self, AreaSpec, TextAttrs, TextSpec};
use crate::render::{Attr, Backend, Color, CurveKind, ShapeAttrs, ShapeKind, ShapeStyle};

/// What a missing value does to its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineFallback {
    /// Split the line around the gap.
    #[default]
    Break,
    /// Join the neighbours across the gap.
    Continue,
    /// Plot the value as zero.
    Zero,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineOptions {
    #[serde(flatten)]
    pub common: LayerOptions,
    #[serde(default)]
    pub mode: SelectMode,
    #[serde(default)]
    pub fallback: LineFallback,
}

impl LineOptions {
    #[must_use]
    pub fn new(common: LayerOptions) -> Self {
        Self {
            common,
            mode: SelectMode::Group,
            fallback: LineFallback::Break,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SelectMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: LineFallback) -> Self {
        self.fallback = fallback;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AreaStyle {
    pub enabled: bool,
    #[serde(flatten)]
    pub shape: ShapeAttrs,
}

impl Default for AreaStyle {
    fn default() -> Self {
        Self {
            enabled: false,
            shape: ShapeAttrs {
                fill_opacity: Some(Attr::Scalar(0.3)),
                ..ShapeAttrs::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineStyle {
    pub curve: CurveKind,
    pub line: ShapeAttrs,
    pub area: AreaStyle,
    pub point: PointStyle,
    pub text: LabelStyle,
}

/// Plotted vertex: pixel position, area baseline and the raw value.
#[derive(Debug, Clone, Copy)]
struct Vertex {
    row: usize,
    x: f64,
    y: f64,
    lower: f64,
    value: Option<f64>,
}

/// Line charts over a categorical x axis, optionally stacked and filled.
#[derive(Debug)]
pub struct LineLayer {
    base: LayerBase,
    options: LineOptions,
    table: Table,
    selection: Option<Selection>,
}

impl LineLayer {
    pub fn new(options: LineOptions, context: Arc<WaveContext>) -> WaveResult<Self> {
        if options.mode == SelectMode::Interval {
            return Err(WaveError::Unsupported(
                "line layers plot group, stack or sum selections".to_owned(),
            ));
        }
        Ok(Self {
            base: LayerBase::new(options.common.clone(), context)?,
            options,
            table: Table::default(),
            selection: None,
        })
    }

    /// Vertex runs per series; a series yields several runs when broken.
    fn segments(&self, x: &Scale, y: &LinearScale) -> Vec<(usize, Vec<Vertex>)> {
        let Some(selection) = &self.selection else {
            return Vec::new();
        };
        let baseline = y.scale(y.domain().0.max(0.0).min(y.domain().1));
        let offset = x.center_offset();
        let mut runs = Vec::new();

        for (series, spans) in selection.spans().into_iter().enumerate() {
            let raw = &selection.data()[series].values;
            let mut current = Vec::new();
            for (row, (start, end)) in spans.into_iter().enumerate() {
                let Some(px) = self
                    .table
                    .row(row)
                    .and_then(|cells| cells.first())
                    .and_then(|label| x.map(label))
                else {
                    continue;
                };
                let value = raw[row];
                if value.is_none() && self.options.fallback != LineFallback::Zero {
                    if self.options.fallback == LineFallback::Break && !current.is_empty() {
                        runs.push((series, std::mem::take(&mut current)));
                    }
                    continue;
                }
                let lower = if selection.mode() == SelectMode::Stack {
                    y.scale(start)
                } else {
                    baseline
                };
                current.push(Vertex {
                    row,
                    x: px + offset,
                    y: y.scale(end),
                    lower,
                    value: Some(value.unwrap_or(0.0)),
                });
            }
            if !current.is_empty() {
                runs.push((series, current));
            }
        }
        runs
    }
}

impl Layer for LineLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Line
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
        let x = self
            .base
            .scale_spec(ScaleSlot::X)
            .apply_point(PointScale::new(labels, (region.left(), region.right())));
        let y = self.base.scale_spec(ScaleSlot::Y).apply_linear(LinearScale::new(
            selection.range(),
            (region.bottom(), region.top()),
        ));

        debug!(layer = %self.base.id(), series = selection.data().len(), "line data set");
        self.base.install_scale(ScaleSlot::X, Scale::Point(x));
        self.base.install_scale(ScaleSlot::Y, Scale::Linear(y));
        self.selection = Some(selection);
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn Backend) -> WaveResult<()> {
        let style: LineStyle = self.base.typed_style()?;
        let id = self.base.id().to_owned();
        let (Some(x), Some(y)) = (
            self.base.scale(ScaleSlot::X),
            self.base.scale(ScaleSlot::Y).and_then(Scale::as_linear),
        ) else {
            return Ok(());
        };
        let runs = self.segments(x, y);
        let headers: Vec<String> = self
            .selection
            .as_ref()
            .map(|selection| selection.headers().into_iter().map(str::to_owned).collect())
            .unwrap_or_default();
        let colors = self.base.palette(headers.len().max(1));
        let color_of = |series: usize| colors[series % colors.len()];

        let mut curves = Vec::new();
        let mut areas = Vec::new();
        let mut run_colors = Vec::new();
        let mut run_sources = Vec::new();
        let mut centers = Vec::new();
        let mut point_colors = Vec::new();
        let mut point_sources = Vec::new();
        let mut labels = Vec::new();

        for (series, run) in &runs {
            let category = headers.get(*series).map_or("", String::as_str);
            let upper: Vec<(f64, f64)> = run.iter().map(|v| (v.x, v.y)).collect();
            curves.push(upper.clone());
            areas.push(AreaSpec {
                lower: run.iter().map(|v| (v.x, v.lower)).collect(),
                upper,
            });
            run_colors.push(color_of(*series));
            run_sources.push(row_source(
                &id,
                ShapeKind::Curve,
                &self.table,
                run[0].row,
                category,
                None,
            ));
            for vertex in run {
                centers.push((vertex.x, vertex.y));
                point_colors.push(color_of(*series));
                point_sources.push(row_source(
                    &id,
                    ShapeKind::Circle,
                    &self.table,
                    vertex.row,
                    category,
                    vertex.value,
                ));
                if style.text.enabled {
                    labels.push(TextSpec::new(
                        vertex.value.map(format_value).unwrap_or_default(),
                        (vertex.x, vertex.y - style.text.offset),
                    ));
                }
            }
        }

        let mut line_attrs = ShapeAttrs {
            stroke: Some(Attr::PerElement(run_colors.clone())),
            ..ShapeAttrs::default()
        };
        line_attrs.merge(&style.line);
        let line = self
            .base
            .common("curve", ShapeKind::Curve)
            .with_attrs(line_attrs)
            .with_defaults(ShapeStyle {
                stroke_width: 2.0,
                ..ShapeStyle::default()
            })
            .with_sources(run_sources.clone());

        let mut area_attrs = ShapeAttrs {
            fill: Some(Attr::PerElement(run_colors)),
            ..ShapeAttrs::default()
        };
        area_attrs.merge(&style.area.shape);
        let area = self
            .base
            .common("area", ShapeKind::Area)
            .with_attrs(area_attrs)
            .with_sources(run_sources);

        let mut point_attrs = ShapeAttrs {
            fill: Some(Attr::PerElement(point_colors)),
            ..ShapeAttrs::default()
        };
        point_attrs.merge(&style.point.circle);
        let points = self
            .base
            .common("circle", ShapeKind::Circle)
            .with_attrs(point_attrs)
            .with_sources(point_sources);

        let text_fill: Color = style.text.fill.unwrap_or(self.base.theme().text);
        let text = self
            .base
            .common("text", ShapeKind::Text)
            .with_defaults(ShapeStyle::filled(text_fill));
        let text_attrs = TextAttrs {
            font_size: style.text.font_size.map(Attr::Scalar),
            anchor: None,
        };

        let shown_areas = if style.area.enabled { areas } else { Vec::new() };
        let shown_points = if style.point.enabled { centers } else { Vec::new() };

        let mut target = self.base.target(backend);
        primitives::draw_area(&mut target, &area, &shown_areas, style.curve)?;
        primitives::draw_curve(&mut target, &line, &curves, style.curve)?;
        primitives::draw_circle(
            &mut target,
            &points,
            &shown_points,
            Some(&Attr::Scalar(style.point.size)),
        )?;
        primitives::draw_text(&mut target, &text, &labels, &text_attrs)
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
    use crate::render::{GroupKey, PathCommand, SvgBackend};

    fn layer(options: LineOptions, data: serde_json::Value) -> LineLayer {
        let mut layer = LineLayer::new(options, test_context()).expect("layer");
        layer
            .set_data(LayerData::from_value(&data).expect("data"))
            .expect("set data");
        layer
    }

    #[test]
    fn points_sit_on_category_positions() {
        let mut line = layer(
            LineOptions::new(LayerOptions::new("trend")),
            json!([["m", "v"], ["a", 0], ["b", 5], ["c", 10]]),
        );
        line.set_style(&json!({"point": {"enabled": true}}))
            .expect("style");
        let mut backend = SvgBackend::new(200.0, 100.0);
        line.draw(&mut backend).expect("draw");

        let circles = backend.nodes(&GroupKey::new("trend", "circle"));
        assert_eq!(circles.len(), 3);
        let bounds = circles[1].element.geometry.bounds().expect("bounds");
        assert_relative_eq!((bounds.0 + bounds.2) / 2.0, 100.0, epsilon = 1e-9);
        assert_relative_eq!((bounds.1 + bounds.3) / 2.0, 50.0, epsilon = 1e-9);
        assert_eq!(backend.nodes(&GroupKey::new("trend", "curve")).len(), 1);
        assert!(backend.nodes(&GroupKey::new("trend", "area")).is_empty());
    }

    #[test]
    fn gaps_break_the_line_by_default() {
        let data = json!([["m", "v"], ["a", 1], ["b", null], ["c", 3], ["d", 4]]);
        let mut broken = layer(LineOptions::new(LayerOptions::new("l")), data.clone());
        let mut backend = SvgBackend::new(200.0, 100.0);
        broken.draw(&mut backend).expect("draw");
        assert_eq!(backend.nodes(&GroupKey::new("l", "curve")).len(), 2);

        let mut joined = layer(
            LineOptions::new(LayerOptions::new("l")).with_fallback(LineFallback::Continue),
            data,
        );
        let mut backend = SvgBackend::new(200.0, 100.0);
        joined.draw(&mut backend).expect("draw");
        let curves = backend.nodes(&GroupKey::new("l", "curve"));
        assert_eq!(curves.len(), 1);
        let crate::render::Geometry::Path(path) = &curves[0].element.geometry else {
            panic!("expected path");
        };
        let vertices = path
            .commands()
            .iter()
            .filter(|command| matches!(command, PathCommand::MoveTo(..) | PathCommand::LineTo(..)))
            .count();
        assert_eq!(vertices, 3);
    }

    #[test]
    fn stacked_areas_rest_on_the_previous_series() {
        let mut line = layer(
            LineOptions::new(LayerOptions::new("s")).with_mode(SelectMode::Stack),
            json!([["m", "a", "b"], ["x", 10, 20], ["y", 15, 5]]),
        );
        line.set_style(&json!({"area": {"enabled": true}}))
            .expect("style");
        let y = *line.base().scale(ScaleSlot::Y).and_then(Scale::as_linear).expect("y");
        assert_eq!(y.domain(), (0.0, 30.0));

        let mut backend = SvgBackend::new(200.0, 100.0);
        line.draw(&mut backend).expect("draw");
        let areas = backend.nodes(&GroupKey::new("s", "area"));
        assert_eq!(areas.len(), 2);
        let runs = line.segments(line.base().scale(ScaleSlot::X).expect("x"), &y);
        let top_of_a = runs[0].1[0].y;
        let bottom_of_b = runs[1].1[0].lower;
        assert_relative_eq!(top_of_a, bottom_of_b, epsilon = 1e-9);
    }

    #[test]
    fn interval_mode_is_rejected() {
        let options = LineOptions::new(LayerOptions::new("l")).with_mode(SelectMode::Interval);
        assert!(matches!(
            LineLayer::new(options, test_context()),
            Err(WaveError::Unsupported(_))
        ));
    }
}

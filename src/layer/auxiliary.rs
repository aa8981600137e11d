use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::WaveContext;
use crate::core::{ColumnSelector, LinearScale, Scale, Table};
use crate::error::WaveResult;
use crate::layer::{
    LabelStyle, Layer, LayerBase, LayerData, LayerOptions, LayerType, ScaleSlot,
    dimension_labels, row_source,
};
use crate::render::primitives::{self, TextAttrs, TextSpec};
use crate::render::{Attr, Backend, ShapeAttrs, ShapeKind, ShapeStyle, TextAnchor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Lines across the plot at a Y value.
    #[default]
    Horizontal,
    /// Lines down the plot at an X value.
    Vertical,
}

impl Direction {
    #[must_use]
    pub fn slot(self) -> ScaleSlot {
        match self {
            Self::Horizontal => ScaleSlot::Y,
            Self::Vertical => ScaleSlot::X,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryOptions {
    #[serde(flatten)]
    pub common: LayerOptions,
    #[serde(default, rename = "type")]
    pub direction: Direction,
}

impl AuxiliaryOptions {
    #[must_use]
    pub fn new(common: LayerOptions) -> Self {
        Self {
            common,
            direction: Direction::Horizontal,
        }
    }

    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuxiliaryStyle {
    pub line: ShapeAttrs,
    pub text: LabelStyle,
}

impl Default for AuxiliaryStyle {
    fn default() -> Self {
        Self {
            line: ShapeAttrs::default(),
            text: LabelStyle {
                enabled: true,
                ..LabelStyle::default()
            },
        }
    }
}

/// Threshold and reference lines over `[label, value]` rows.
#[derive(Debug)]
pub struct AuxiliaryLayer {
    base: LayerBase,
    options: AuxiliaryOptions,
    table: Table,
    lines: Vec<(String, f64)>,
}

impl AuxiliaryLayer {
    pub fn new(options: AuxiliaryOptions, context: Arc<WaveContext>) -> WaveResult<Self> {
        Ok(Self {
            base: LayerBase::new(options.common.clone(), context)?,
            options,
            table: Table::default(),
            lines: Vec::new(),
        })
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.options.direction
    }

    /// Pixel segment of every line on the current scale.
    fn segments(&self) -> Vec<[(f64, f64); 2]> {
        let Some(scale) = self
            .base
            .scale(self.options.direction.slot())
            .and_then(Scale::as_linear)
        else {
            return Vec::new();
        };
        let region = self.base.region();
        self.lines
            .iter()
            .map(|&(_, value)| {
                let at = scale.scale(value);
                match self.options.direction {
                    Direction::Horizontal => [(region.left(), at), (region.right(), at)],
                    Direction::Vertical => [(at, region.top()), (at, region.bottom())],
                }
            })
            .collect()
    }
}

impl Layer for AuxiliaryLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Auxiliary
    }

    fn set_data(&mut self, data: LayerData) -> WaveResult<()> {
        let table = data.table()?;
        self.base.store_data(data);
        self.base.clear_scales();
        self.lines.clear();
        self.table = table;
        if self.table.headers().len() < 2 {
            return Ok(());
        }

        let labels = dimension_labels(&self.table)?;
        let values = self.table.column(&ColumnSelector::Index(1))?;
        self.lines = labels
            .into_iter()
            .zip(values)
            .filter_map(|(label, value)| Some((label, value.as_number()?)))
            .collect();

        let min = self.lines.iter().map(|line| line.1).fold(f64::INFINITY, f64::min);
        let max = self
            .lines
            .iter()
            .map(|line| line.1)
            .fold(f64::NEG_INFINITY, f64::max);
        let domain = if min.is_finite() { (min, max) } else { (0.0, 0.0) };
        let region = self.base.region();
        let slot = self.options.direction.slot();
        let range = match self.options.direction {
            Direction::Horizontal => (region.bottom(), region.top()),
            Direction::Vertical => (region.left(), region.right()),
        };
        let scale = self
            .base
            .scale_spec(slot)
            .apply_linear(LinearScale::new(domain, range));
        debug!(layer = %self.base.id(), lines = self.lines.len(), "auxiliary data set");
        self.base.install_scale(slot, Scale::Linear(scale));
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn Backend) -> WaveResult<()> {
        let style: AuxiliaryStyle = self.base.typed_style()?;
        let segments = self.segments();
        let colors = self.base.palette(self.lines.len().max(1));
        let id = self.base.id();

        let sources = self
            .lines
            .iter()
            .enumerate()
            .map(|(row, (label, value))| {
                row_source(id, ShapeKind::Line, &self.table, row, label, Some(*value))
            })
            .collect();
        let mut line_attrs = ShapeAttrs {
            stroke: Some(Attr::PerElement(
                (0..self.lines.len()).map(|index| colors[index % colors.len()]).collect(),
            )),
            ..ShapeAttrs::default()
        };
        line_attrs.merge(&style.line);
        let line = self
            .base
            .common("line", ShapeKind::Line)
            .with_attrs(line_attrs)
            .with_defaults(ShapeStyle::stroked(self.base.theme().axis, 1.0))
            .with_sources(sources);

        let font_size = style.text.font_size.unwrap_or(self.base.theme().font_size);
        let (labels, anchor) = if style.text.enabled {
            let labels = self
                .lines
                .iter()
                .zip(&segments)
                .map(|((label, _), &[start, end])| match self.options.direction {
                    Direction::Horizontal => {
                        TextSpec::new(label.clone(), (end.0, end.1 - style.text.offset))
                    }
                    Direction::Vertical => TextSpec::new(
                        label.clone(),
                        (start.0 + style.text.offset, start.1 + font_size),
                    ),
                })
                .collect();
            let anchor = match self.options.direction {
                Direction::Horizontal => TextAnchor::End,
                Direction::Vertical => TextAnchor::Start,
            };
            (labels, anchor)
        } else {
            (Vec::new(), TextAnchor::Start)
        };
        let text = self
            .base
            .common("text", ShapeKind::Text)
            .with_defaults(ShapeStyle::filled(
                style.text.fill.unwrap_or(self.base.theme().text),
            ));
        let text_attrs = TextAttrs {
            font_size: Some(Attr::Scalar(font_size)),
            anchor: Some(Attr::Scalar(anchor)),
        };

        let mut target = self.base.target(backend);
        primitives::draw_line(&mut target, &line, &segments)?;
        primitives::draw_text(&mut target, &text, &labels, &text_attrs)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use serde_json::json;

    use super::*;
    use crate::api::context::test_context;
    use crate::render::{GroupKey, SvgBackend};

    fn data() -> LayerData {
        LayerData::from_value(&json!([["name", "value"], ["target", 20], ["floor", 5]]))
            .expect("data")
    }

    #[test]
    fn horizontal_lines_span_the_region() {
        let mut layer =
            AuxiliaryLayer::new(AuxiliaryOptions::new(LayerOptions::new("aux")), test_context())
                .expect("layer");
        layer.set_data(data()).expect("set data");
        layer.base_mut().assign_scale(
            ScaleSlot::Y,
            Scale::Linear(LinearScale::new((0.0, 40.0), (100.0, 0.0))),
        );
        let segments = layer.segments();
        assert_eq!(segments.len(), 2);
        assert_relative_eq!(segments[0][0].1, 50.0, epsilon = 1e-9);
        assert_relative_eq!(segments[0][1].0, 200.0, epsilon = 1e-9);

        let mut backend = SvgBackend::new(200.0, 100.0);
        layer.draw(&mut backend).expect("draw");
        assert_eq!(backend.nodes(&GroupKey::new("aux", "line")).len(), 2);
        assert_eq!(backend.nodes(&GroupKey::new("aux", "text")).len(), 2);
    }

    #[test]
    fn vertical_lines_contribute_an_x_scale() {
        let options = AuxiliaryOptions::new(LayerOptions::new("aux"))
            .with_direction(Direction::Vertical);
        let mut layer = AuxiliaryLayer::new(options, test_context()).expect("layer");
        layer.set_data(data()).expect("set data");
        let x = layer.base().scale(ScaleSlot::X).and_then(Scale::as_linear).expect("x");
        assert_eq!(x.domain(), (5.0, 20.0));
        assert!(layer.base().scale(ScaleSlot::Y).is_none());
        assert_relative_eq!(layer.segments()[1][0].0, 0.0, epsilon = 1e-9);
    }
}

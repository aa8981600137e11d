use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::WaveContext;
use crate::error::WaveResult;
use crate::layer::{
    Layer, LayerBase, LayerData, LayerOptions, LayerType, estimate_text_width,
};
use crate::render::primitives::{self, RectOrigin, RectSpec, TextAttrs, TextSpec};
use crate::render::{
    Attr, Backend, Color, ElementSource, ShapeAttrs, ShapeKind, ShapeStyle, TextAnchor,
};

/// One legend item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendOptions {
    #[serde(flatten)]
    pub common: LayerOptions,
}

impl LegendOptions {
    #[must_use]
    pub fn new(common: LayerOptions) -> Self {
        Self { common }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegendStyle {
    pub align: TextAnchor,
    pub shape_size: f64,
    /// Space between a swatch and its label.
    pub gap: f64,
    /// Space between items.
    pub spacing: f64,
    pub font_size: Option<f64>,
    pub shape: ShapeAttrs,
    pub text: ShapeAttrs,
}

impl Default for LegendStyle {
    fn default() -> Self {
        Self {
            align: TextAnchor::Middle,
            shape_size: 10.0,
            gap: 5.0,
            spacing: 15.0,
            font_size: None,
            shape: ShapeAttrs::default(),
            text: ShapeAttrs::default(),
        }
    }
}

/// Horizontal legend of colour swatches and labels.
///
/// Entries come from the layer's own data or from a bound data layer.
#[derive(Debug)]
pub struct LegendLayer {
    base: LayerBase,
    entries: Vec<LegendEntry>,
}

impl LegendLayer {
    pub fn new(options: LegendOptions, context: Arc<WaveContext>) -> WaveResult<Self> {
        Ok(Self {
            base: LayerBase::new(options.common, context)?,
            entries: Vec::new(),
        })
    }

    #[must_use]
    pub fn entries(&self) -> &[LegendEntry] {
        &self.entries
    }

    /// Swatch rectangles and label anchors for the current entries.
    fn place(&self, style: &LegendStyle, font_size: f64) -> (Vec<RectSpec>, Vec<TextSpec>) {
        let region = self.base.region();
        let widths: Vec<f64> = self
            .entries
            .iter()
            .map(|entry| {
                style.shape_size + style.gap + estimate_text_width(&entry.label, font_size)
            })
            .collect();
        let total = widths.iter().sum::<f64>()
            + style.spacing * widths.len().saturating_sub(1) as f64;
        let mut x = match style.align {
            TextAnchor::Start => region.left(),
            TextAnchor::Middle => region.center().0 - total / 2.0,
            TextAnchor::End => region.right() - total,
        };
        let middle = region.center().1;

        let mut swatches = Vec::with_capacity(self.entries.len());
        let mut labels = Vec::with_capacity(self.entries.len());
        for (entry, width) in self.entries.iter().zip(widths) {
            swatches.push(RectSpec {
                x,
                y: middle - style.shape_size / 2.0,
                width: style.shape_size,
                height: style.shape_size,
            });
            labels.push(TextSpec::new(
                entry.label.clone(),
                (x + style.shape_size + style.gap, middle + font_size / 3.0),
            ));
            x += width + style.spacing;
        }
        (swatches, labels)
    }
}

impl Layer for LegendLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Legend
    }

    fn set_data(&mut self, data: LayerData) -> WaveResult<()> {
        let labels = match &data {
            LayerData::Labels(labels) => labels.clone(),
            LayerData::Table(table) => table.headers().iter().skip(1).cloned().collect(),
            LayerData::Text(text) => vec![text.clone()],
            LayerData::Empty => Vec::new(),
        };
        let colors = self.base.palette(labels.len());
        self.entries = labels
            .into_iter()
            .zip(colors)
            .map(|(label, color)| LegendEntry { label, color })
            .collect();
        self.base.store_data(data);
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn Backend) -> WaveResult<()> {
        let style: LegendStyle = self.base.typed_style()?;
        let font_size = style.font_size.unwrap_or(self.base.theme().font_size);
        let (swatches, labels) = self.place(&style, font_size);
        let sources = self
            .entries
            .iter()
            .map(|entry| ElementSource {
                layer_id: self.base.id().to_owned(),
                element_type: ShapeKind::Rect.as_str().to_owned(),
                category: entry.label.clone(),
                ..ElementSource::default()
            })
            .collect();

        let mut shape_attrs = ShapeAttrs {
            fill: Some(Attr::PerElement(
                self.entries.iter().map(|entry| entry.color).collect(),
            )),
            ..ShapeAttrs::default()
        };
        shape_attrs.merge(&style.shape);
        let shape = self
            .base
            .common("rect", ShapeKind::Rect)
            .with_attrs(shape_attrs)
            .with_sources(sources);
        let text = self
            .base
            .common("text", ShapeKind::Text)
            .with_attrs(style.text.clone())
            .with_defaults(ShapeStyle::filled(self.base.theme().text));
        let text_attrs = TextAttrs {
            font_size: Some(Attr::Scalar(font_size)),
            anchor: Some(Attr::Scalar(TextAnchor::Start)),
        };

        let mut target = self.base.target(backend);
        primitives::draw_rect(&mut target, &shape, &swatches, None, RectOrigin::Center)?;
        primitives::draw_text(&mut target, &text, &labels, &text_attrs)
    }

    fn set_legend_entries(&mut self, entries: Vec<LegendEntry>) -> WaveResult<()> {
        debug!(layer = %self.base.id(), entries = entries.len(), "legend bound");
        self.entries = entries;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use serde_json::json;

    use super::*;
    use crate::api::context::test_context;

    fn legend() -> LegendLayer {
        let options = LegendOptions::new(LayerOptions::new("legend").with_layout("legend"));
        LegendLayer::new(options, test_context()).expect("layer")
    }

    #[test]
    fn items_are_centred_as_a_block() {
        let mut layer = legend();
        layer
            .set_data(LayerData::from_value(&json!(["ab", "cd"])).expect("labels"))
            .expect("set data");
        let style = LegendStyle::default();
        let (swatches, labels) = layer.place(&style, 10.0);
        // each item: 10 + 5 + 2 * 6 = 27, plus 15 between
        let total = 27.0 * 2.0 + 15.0;
        assert_relative_eq!(swatches[0].x, 100.0 - total / 2.0, epsilon = 1e-9);
        assert_relative_eq!(swatches[1].x, 100.0 - total / 2.0 + 42.0, epsilon = 1e-9);
        assert_relative_eq!(labels[0].position.0, swatches[0].x + 15.0, epsilon = 1e-9);
    }

    #[test]
    fn bound_entries_replace_data_entries() {
        let mut layer = legend();
        layer
            .set_data(LayerData::from_value(&json!([["k", "a", "b"], ["x", 1, 2]])).expect("table"))
            .expect("set data");
        assert_eq!(layer.entries().len(), 2);
        layer
            .set_legend_entries(vec![LegendEntry {
                label: "only".to_owned(),
                color: Color::BLACK,
            }])
            .expect("bind");
        assert_eq!(layer.entries()[0].label, "only");
    }
}

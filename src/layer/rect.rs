use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::WaveContext;
use crate::core::{BandScale, LinearScale, Scale, SelectMode, Selection, Table};
use crate::error::{WaveError, WaveResult};
use crate::layer::{
    LabelStyle, Layer, LayerBase, LayerData, LayerOptions, LayerType, LegendEntry, ScaleSlot,
    dimension_labels, format_value, row_source, series_columns,
};
use crate::render::primitives::{self, RectOrigin, RectSpec, TextAttrs, TextSpec};
use crate::render::{Attr, Backend, ShapeAttrs, ShapeKind, ShapeStyle, TextAnchor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RectVariant {
    /// Vertical bars on a horizontal band axis.
    #[default]
    Column,
    /// Horizontal bars on a vertical band axis.
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectOptions {
    #[serde(flatten)]
    pub common: LayerOptions,
    #[serde(default)]
    pub mode: SelectMode,
    #[serde(default, rename = "type")]
    pub variant: RectVariant,
}

impl RectOptions {
    #[must_use]
    pub fn new(common: LayerOptions) -> Self {
        Self {
            common,
            mode: SelectMode::Group,
            variant: RectVariant::Column,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SelectMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_variant(mut self, variant: RectVariant) -> Self {
        self.variant = variant;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RectStyle {
    pub rect: ShapeAttrs,
    pub corner_radius: Option<Attr<f64>>,
    pub text: LabelStyle,
}

/// Column and bar charts under group, stack, sum or interval selection.
#[derive(Debug)]
pub struct RectLayer {
    base: LayerBase,
    options: RectOptions,
    table: Table,
    selection: Option<Selection>,
}

impl RectLayer {
    pub fn new(options: RectOptions, context: Arc<WaveContext>) -> WaveResult<Self> {
        Ok(Self {
            base: LayerBase::new(options.common.clone(), context)?,
            options,
            table: Table::default(),
            selection: None,
        })
    }

    #[must_use]
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    fn slots(&self) -> (ScaleSlot, ScaleSlot) {
        match self.options.variant {
            RectVariant::Column => (ScaleSlot::X, ScaleSlot::Y),
            RectVariant::Bar => (ScaleSlot::Y, ScaleSlot::X),
        }
    }

    fn series_headers(&self, selection: &Selection) -> Vec<String> {
        match selection.mode() {
            SelectMode::Interval => vec![selection.headers().join("-")],
            _ => selection.headers().into_iter().map(str::to_owned).collect(),
        }
    }
}

impl Layer for RectLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Rect
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
        let (band_range, value_range) = match self.options.variant {
            RectVariant::Column => (
                (region.left(), region.right()),
                (region.bottom(), region.top()),
            ),
            RectVariant::Bar => (
                (region.top(), region.bottom()),
                (region.left(), region.right()),
            ),
        };
        let (band_slot, value_slot) = self.slots();
        let band = self
            .base
            .scale_spec(band_slot)
            .apply_band(BandScale::new(labels, band_range).with_padding_inner(0.2));
        let value = self
            .base
            .scale_spec(value_slot)
            .apply_linear(LinearScale::new(selection.range(), value_range));

        debug!(
            layer = %self.base.id(),
            rows = selection.row_count(),
            domain = ?value.domain(),
            "rect data set"
        );
        self.base.install_scale(band_slot, Scale::Band(band));
        self.base.install_scale(value_slot, Scale::Linear(value));
        self.selection = Some(selection);
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn Backend) -> WaveResult<()> {
        let style: RectStyle = self.base.typed_style()?;
        let id = self.base.id().to_owned();
        let mut rects = Vec::new();
        let mut sources = Vec::new();
        let mut fills = Vec::new();
        let mut labels = Vec::new();

        if let Some(selection) = &self.selection {
            let (band_slot, value_slot) = self.slots();
            let Some(band) = self.base.scale(band_slot) else {
                return Err(WaveError::InvalidData(format!(
                    "layer `{id}` lost its band scale"
                )));
            };
            let Some(value) = self.base.scale(value_slot).and_then(Scale::as_linear) else {
                return Err(WaveError::InvalidData(format!(
                    "layer `{id}` needs a linear value scale"
                )));
            };

            let spans = selection.spans();
            let headers = self.series_headers(selection);
            let colors = self.base.palette(spans.len());
            let grouped = selection.mode() == SelectMode::Group;
            let bandwidth = band.bandwidth().unwrap_or(0.0);
            let slot_width = if grouped && !spans.is_empty() {
                bandwidth / spans.len() as f64
            } else {
                bandwidth
            };
            let font_size = style
                .text
                .font_size
                .unwrap_or(self.base.theme().font_size);

            for (series, column) in spans.iter().enumerate() {
                for (row, &(start, end)) in column.iter().enumerate() {
                    let Some(label) = self.table.row(row).and_then(|cells| cells.first()) else {
                        continue;
                    };
                    let Some(position) = band.map(label) else {
                        continue;
                    };
                    let offset = if grouped {
                        slot_width * series as f64
                    } else {
                        0.0
                    };
                    let (v0, v1) = (value.scale(start), value.scale(end));
                    let spec = match self.options.variant {
                        RectVariant::Column => RectSpec {
                            x: position + offset,
                            y: v0,
                            width: slot_width,
                            height: v1 - v0,
                        },
                        RectVariant::Bar => RectSpec {
                            x: v0,
                            y: position + offset,
                            width: v1 - v0,
                            height: slot_width,
                        },
                    };
                    let raw = selection.data().get(series).and_then(|c| c.values[row]);
                    let shown = match selection.mode() {
                        SelectMode::Interval | SelectMode::Stack => Some(end - start),
                        _ => raw,
                    };
                    if style.text.enabled {
                        let (anchor_point, anchor) = match self.options.variant {
                            RectVariant::Column => (
                                (spec.x + spec.width / 2.0, v1.min(v0) - style.text.offset),
                                TextAnchor::Middle,
                            ),
                            RectVariant::Bar => (
                                (
                                    v1.max(v0) + style.text.offset,
                                    spec.y + spec.height / 2.0 + font_size / 3.0,
                                ),
                                TextAnchor::Start,
                            ),
                        };
                        labels.push((
                            TextSpec::new(shown.map(format_value).unwrap_or_default(), anchor_point),
                            anchor,
                        ));
                    }
                    rects.push(spec);
                    fills.push(colors[series % colors.len().max(1)]);
                    sources.push(row_source(
                        &id,
                        ShapeKind::Rect,
                        &self.table,
                        row,
                        &headers[series.min(headers.len().saturating_sub(1))],
                        shown,
                    ));
                }
            }
        }

        let mut attrs = ShapeAttrs {
            fill: Some(Attr::PerElement(fills)),
            ..ShapeAttrs::default()
        };
        attrs.merge(&style.rect);
        let origin = match self.options.variant {
            RectVariant::Column => RectOrigin::Bottom,
            RectVariant::Bar => RectOrigin::Left,
        };
        let common = self
            .base
            .common("rect", ShapeKind::Rect)
            .with_attrs(attrs)
            .with_defaults(ShapeStyle {
                stroke_width: 0.0,
                ..ShapeStyle::default()
            })
            .with_sources(sources);

        let text_fill = style.text.fill.unwrap_or(self.base.theme().text);
        let text_common = self
            .base
            .common("text", ShapeKind::Text)
            .with_defaults(ShapeStyle::filled(text_fill));
        let (texts, anchors): (Vec<TextSpec>, Vec<TextAnchor>) = labels.into_iter().unzip();
        let text_attrs = TextAttrs {
            font_size: style.text.font_size.map(Attr::Scalar),
            anchor: Some(Attr::PerElement(anchors)),
        };

        let mut target = self.base.target(backend);
        primitives::draw_rect(&mut target, &common, &rects, style.corner_radius.as_ref(), origin)?;
        primitives::draw_text(&mut target, &text_common, &texts, &text_attrs)
    }

    fn legend_entries(&self) -> Vec<LegendEntry> {
        let Some(selection) = &self.selection else {
            return Vec::new();
        };
        let headers = self.series_headers(selection);
        let colors = self.base.palette(headers.len());
        headers
            .into_iter()
            .zip(colors)
            .map(|(label, color)| LegendEntry { label, color })
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

    fn stacked() -> RectLayer {
        let options = RectOptions::new(LayerOptions::new("bars")).with_mode(SelectMode::Stack);
        let mut layer = RectLayer::new(options, test_context()).expect("layer");
        let data = LayerData::from_value(&json!([["yr", "a", "b"], ["2020", 10, 20], ["2021", 15, 5]]))
            .expect("table");
        layer.set_data(data).expect("set data");
        layer
    }

    #[test]
    fn record_data_keeps_the_first_key_as_dimension() {
        let mut layer =
            RectLayer::new(RectOptions::new(LayerOptions::new("bars")), test_context()).expect("layer");
        let data = LayerData::from_value(&json!([{"yr": "2020", "a": 10}, {"yr": "2021", "a": 15}]))
            .expect("records");
        layer.set_data(data).expect("set data");
        let band = layer.base().scale(ScaleSlot::X).expect("band");
        assert_eq!(band.labels(), ["2020", "2021"]);
    }

    #[test]
    fn stack_domain_covers_row_totals() {
        let layer = stacked();
        let y = layer.base().scale(ScaleSlot::Y).and_then(Scale::as_linear).expect("y");
        assert_eq!(y.domain(), (0.0, 30.0));
        assert_eq!(y.range(), (100.0, 0.0));
    }

    #[test]
    fn stacked_segments_share_the_band() {
        let mut layer = stacked();
        let mut backend = SvgBackend::new(200.0, 100.0);
        layer.draw(&mut backend).expect("draw");

        let nodes = backend.nodes(&GroupKey::new("bars", "rect"));
        assert_eq!(nodes.len(), 4);
        let Geometry::Rect { x: x0, y: y0, height: h0, .. } = nodes[0].element.geometry else {
            panic!("expected rect");
        };
        let Geometry::Rect { x: x2, y: y2, height: h2, .. } = nodes[2].element.geometry else {
            panic!("expected rect");
        };
        // series b of 2020 sits on top of series a
        assert_relative_eq!(x0, x2, epsilon = 1e-9);
        assert_relative_eq!(y0, y2 + h2, epsilon = 1e-9);
        assert_relative_eq!(h0, 100.0 / 3.0, epsilon = 1e-9);
        let source = nodes[2].element.source.as_ref().expect("source");
        assert_eq!(source.category, "b");
        assert_eq!(source.value, Some(20.0));
    }

    #[test]
    fn grouped_columns_split_the_band() {
        let options = RectOptions::new(LayerOptions::new("bars"));
        let mut layer = RectLayer::new(options, test_context()).expect("layer");
        layer
            .set_data(LayerData::from_value(&json!([["k", "a", "b"], ["x", 1, 2]])).expect("table"))
            .expect("set data");
        let mut backend = SvgBackend::new(200.0, 100.0);
        layer.draw(&mut backend).expect("draw");

        let nodes = backend.nodes(&GroupKey::new("bars", "rect"));
        let widths: Vec<f64> = nodes
            .iter()
            .filter_map(|node| match node.element.geometry {
                Geometry::Rect { width, .. } => Some(width),
                _ => None,
            })
            .collect();
        // one band of 200 * 0.8, split in two
        assert_eq!(widths.len(), 2);
        assert_relative_eq!(widths[0], 80.0, epsilon = 1e-9);
        assert_eq!(layer.legend_entries().len(), 2);
    }

    #[test]
    fn unknown_columns_fail_without_drawing() {
        let options = RectOptions::new(LayerOptions::new("bars")).with_mode(SelectMode::Interval);
        let mut layer = RectLayer::new(options, test_context()).expect("layer");
        let result = layer.set_data(
            LayerData::from_value(&json!([["k", "a", "b", "c"], ["x", 1, 2, 3]])).expect("table"),
        );
        assert!(matches!(result, Err(WaveError::InvalidData(_))));
        assert!(layer.selection().is_none());
    }
}

use std::f64::consts::TAU;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::WaveContext;
use crate::core::{LinearScale, Scale, Table};
use crate::error::{WaveError, WaveResult};
use crate::layer::{
    LabelStyle, Layer, LayerBase, LayerData, LayerOptions, LayerType, LegendEntry, ScaleSlot,
    row_source,
};
use crate::render::path::polar_point;
use crate::render::primitives::{self, ArcSpec, RibbonSpec, TextAttrs, TextSpec};
use crate::render::{Attr, Backend, ElementSource, ShapeAttrs, ShapeKind, ShapeStyle};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordOptions {
    #[serde(flatten)]
    pub common: LayerOptions,
}

impl ChordOptions {
    #[must_use]
    pub fn new(common: LayerOptions) -> Self {
        Self { common }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChordStyle {
    pub arc: ShapeAttrs,
    pub ribbon: ShapeAttrs,
    /// Gap between node arcs, in radians.
    pub pad_angle: f64,
    /// Arc thickness as a fraction of the outer radius.
    pub thickness: f64,
    pub text: LabelStyle,
}

impl Default for ChordStyle {
    fn default() -> Self {
        Self {
            arc: ShapeAttrs::default(),
            ribbon: ShapeAttrs {
                fill_opacity: Some(Attr::Scalar(0.6)),
                ..ShapeAttrs::default()
            },
            pad_angle: 0.04,
            thickness: 0.08,
            text: LabelStyle {
                enabled: true,
                ..LabelStyle::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Link {
    row: usize,
    source: usize,
    target: usize,
    value: f64,
}

/// Node arcs plus angular spans of every link end.
#[derive(Debug, Default, PartialEq)]
struct ChordGeometry {
    nodes: Vec<(f64, f64)>,
    ribbons: Vec<((f64, f64), (f64, f64))>,
}

/// Chord diagram over `[source, target, value]` rows.
#[derive(Debug)]
pub struct ChordLayer {
    base: LayerBase,
    table: Table,
    nodes: IndexMap<String, f64>,
    links: Vec<Link>,
}

impl ChordLayer {
    pub fn new(options: ChordOptions, context: Arc<WaveContext>) -> WaveResult<Self> {
        Ok(Self {
            base: LayerBase::new(options.common, context)?,
            table: Table::default(),
            nodes: IndexMap::new(),
            links: Vec::new(),
        })
    }

    fn outer_radius(&self) -> f64 {
        let region = self.base.region();
        region.width().min(region.height()).max(0.0) / 2.0
    }

    /// Lays nodes around the circle, then hands out consecutive sub-spans
    /// of each node to its links in row order.
    fn geometry(&self, pad_angle: f64) -> ChordGeometry {
        let Some(angle) = self.base.scale(ScaleSlot::Angle).and_then(Scale::as_linear) else {
            return ChordGeometry::default();
        };
        let per_unit = angle.scale(1.0) - angle.scale(0.0);
        let mut cursor = 0.0;
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for total in self.nodes.values() {
            let span = total * per_unit;
            nodes.push((cursor, cursor + span));
            cursor += span + pad_angle;
        }

        let mut fill: Vec<f64> = nodes.iter().map(|node| node.0).collect();
        let mut take = |node: usize, value: f64| {
            let start = fill[node];
            fill[node] += value * per_unit;
            (start, fill[node])
        };
        let ribbons = self
            .links
            .iter()
            .map(|link| {
                let source = take(link.source, link.value);
                let target = take(link.target, link.value);
                (source, target)
            })
            .collect();
        ChordGeometry { nodes, ribbons }
    }
}

impl Layer for ChordLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Chord
    }

    fn set_data(&mut self, data: LayerData) -> WaveResult<()> {
        let table = data.table()?;
        self.base.store_data(data);
        self.base.clear_scales();
        self.nodes.clear();
        self.links.clear();
        self.table = table;
        if self.table.headers().is_empty() {
            return Ok(());
        }
        if self.table.headers().len() < 3 {
            return Err(WaveError::InvalidData(
                "chord data needs source, target and value columns".to_owned(),
            ));
        }

        for (row, cells) in self.table.rows().iter().enumerate() {
            let Some(value) = cells[2].as_number().filter(|value| *value > 0.0) else {
                continue;
            };
            let mut index_of = |name: String| {
                let entry = self.nodes.entry(name);
                let index = entry.index();
                *entry.or_insert(0.0) += value;
                index
            };
            let source = index_of(cells[0].to_string());
            let target = index_of(cells[1].to_string());
            self.links.push(Link {
                row,
                source,
                target,
                value,
            });
        }

        let style: ChordStyle = self.base.typed_style()?;
        let total: f64 = self.nodes.values().sum();
        let available = (TAU - style.pad_angle * self.nodes.len() as f64).max(0.0);
        let angle = self
            .base
            .scale_spec(ScaleSlot::Angle)
            .apply_linear(LinearScale::new((0.0, total), (0.0, available)));
        debug!(
            layer = %self.base.id(),
            nodes = self.nodes.len(),
            links = self.links.len(),
            "chord data set"
        );
        self.base.install_scale(ScaleSlot::Angle, Scale::Linear(angle));
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn Backend) -> WaveResult<()> {
        let style: ChordStyle = self.base.typed_style()?;
        let geometry = self.geometry(style.pad_angle);
        let center = self.base.region().center();
        let outer = self.outer_radius();
        let inner = outer * (1.0 - style.thickness.clamp(0.0, 1.0));
        let colors = self.base.palette(self.nodes.len().max(1));
        let id = self.base.id();

        let arcs: Vec<ArcSpec> = geometry
            .nodes
            .iter()
            .map(|&(start_angle, end_angle)| ArcSpec {
                center,
                inner_radius: inner,
                outer_radius: outer,
                start_angle,
                end_angle,
            })
            .collect();
        let arc_sources = self
            .nodes
            .iter()
            .map(|(name, total)| ElementSource {
                layer_id: id.to_owned(),
                element_type: ShapeKind::Arc.as_str().to_owned(),
                dimension: name.clone(),
                category: name.clone(),
                value: Some(*total),
                row: Vec::new(),
            })
            .collect();
        let mut arc_attrs = ShapeAttrs {
            fill: Some(Attr::PerElement(colors.clone())),
            ..ShapeAttrs::default()
        };
        arc_attrs.merge(&style.arc);
        let arc = self
            .base
            .common("arc", ShapeKind::Arc)
            .with_attrs(arc_attrs)
            .with_sources(arc_sources);

        let ribbons: Vec<RibbonSpec> = geometry
            .ribbons
            .iter()
            .map(|&(source, target)| RibbonSpec::Chord {
                center,
                radius: inner,
                source,
                target,
            })
            .collect();
        let ribbon_sources = self
            .links
            .iter()
            .map(|link| {
                let category = self
                    .nodes
                    .get_index(link.source)
                    .map_or("", |(name, _)| name.as_str());
                row_source(id, ShapeKind::Ribbon, &self.table, link.row, category, Some(link.value))
            })
            .collect();
        let mut ribbon_attrs = ShapeAttrs {
            fill: Some(Attr::PerElement(
                self.links
                    .iter()
                    .map(|link| colors[link.source % colors.len()])
                    .collect(),
            )),
            ..ShapeAttrs::default()
        };
        ribbon_attrs.merge(&style.ribbon);
        let ribbon = self
            .base
            .common("ribbon", ShapeKind::Ribbon)
            .with_attrs(ribbon_attrs)
            .with_sources(ribbon_sources);

        let font_size = style.text.font_size.unwrap_or(self.base.theme().font_size);
        let labels: Vec<TextSpec> = if style.text.enabled {
            self.nodes
                .keys()
                .zip(&geometry.nodes)
                .map(|(name, &(start, end))| {
                    let reach = outer + style.text.offset + font_size / 2.0;
                    let (x, y) = polar_point(center.0, center.1, reach, (start + end) / 2.0);
                    TextSpec::new(name.clone(), (x, y + font_size / 3.0))
                })
                .collect()
        } else {
            Vec::new()
        };
        let text = self
            .base
            .common("text", ShapeKind::Text)
            .with_defaults(ShapeStyle::filled(
                style.text.fill.unwrap_or(self.base.theme().text),
            ));
        let text_attrs = TextAttrs {
            font_size: Some(Attr::Scalar(font_size)),
            anchor: None,
        };

        let mut target = self.base.target(backend);
        primitives::draw_ribbon(&mut target, &ribbon, &ribbons)?;
        primitives::draw_arc(&mut target, &arc, &arcs)?;
        primitives::draw_text(&mut target, &text, &labels, &text_attrs)
    }

    fn legend_entries(&self) -> Vec<LegendEntry> {
        self.nodes
            .keys()
            .zip(self.base.palette(self.nodes.len()))
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
    use crate::render::{GroupKey, SvgBackend};

    fn layer() -> ChordLayer {
        let mut layer = ChordLayer::new(ChordOptions::new(LayerOptions::new("chord")), test_context())
            .expect("layer");
        layer
            .set_style(&json!({"padAngle": 0.0}))
            .expect("style");
        layer
            .set_data(
                LayerData::from_value(&json!([
                    ["from", "to", "value"],
                    ["a", "b", 2],
                    ["b", "c", 1],
                    ["c", "a", 1]
                ]))
                .expect("data"),
            )
            .expect("set data");
        layer
    }

    #[test]
    fn node_spans_follow_total_flow() {
        let layer = layer();
        let geometry = layer.geometry(0.0);
        // totals: a 3, b 3, c 2 over 8
        assert_eq!(geometry.nodes.len(), 3);
        assert_relative_eq!(geometry.nodes[0].1, TAU * 3.0 / 8.0, epsilon = 1e-12);
        assert_relative_eq!(geometry.nodes[2].1, TAU, epsilon = 1e-12);
        // first link takes the start of both its nodes
        let (source, target) = geometry.ribbons[0];
        assert_relative_eq!(source.0, 0.0, epsilon = 1e-9);
        assert_relative_eq!(target.0, geometry.nodes[1].0, epsilon = 1e-12);
        // the last link fills node `a` up to its end
        assert_relative_eq!(geometry.ribbons[2].1.1, geometry.nodes[0].1, epsilon = 1e-12);
    }

    #[test]
    fn draws_arcs_ribbons_and_labels() {
        let mut layer = layer();
        let mut backend = SvgBackend::new(200.0, 100.0);
        layer.draw(&mut backend).expect("draw");
        assert_eq!(backend.nodes(&GroupKey::new("chord", "arc")).len(), 3);
        assert_eq!(backend.nodes(&GroupKey::new("chord", "ribbon")).len(), 3);
        assert_eq!(backend.nodes(&GroupKey::new("chord", "text")).len(), 3);
        assert_eq!(layer.legend_entries()[2].label, "c");
    }
}

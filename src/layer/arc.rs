use std::f64::consts::TAU;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::WaveContext;
use crate::core::{ColumnSelector, LinearScale, Scale, Table};
use crate::error::WaveResult;
use crate::layer::{
    LabelStyle, Layer, LayerBase, LayerData, LayerOptions, LayerType, LegendEntry, ScaleSlot,
    dimension_labels, row_source,
};
use crate::render::path::polar_point;
use crate::render::primitives::{self, ArcSpec, TextAttrs, TextSpec};
use crate::render::{Attr, Backend, Color, ShapeAttrs, ShapeKind, ShapeStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcVariant {
    /// Angles proportional to values.
    #[default]
    Pie,
    /// A pie with a hole.
    Donut,
    /// Equal angles, radius proportional to values.
    Rose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcOptions {
    #[serde(flatten)]
    pub common: LayerOptions,
    #[serde(default, rename = "type")]
    pub variant: ArcVariant,
}

impl ArcOptions {
    #[must_use]
    pub fn new(common: LayerOptions) -> Self {
        Self {
            common,
            variant: ArcVariant::Pie,
        }
    }

    #[must_use]
    pub fn with_variant(mut self, variant: ArcVariant) -> Self {
        self.variant = variant;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArcStyle {
    pub arc: ShapeAttrs,
    /// Fraction of the outer radius.
    pub inner_radius: f64,
    /// Fraction of half the shorter region side.
    pub outer_radius: f64,
    /// Gap between neighbouring slices, in radians.
    pub pad_angle: f64,
    pub text: LabelStyle,
}

impl Default for ArcStyle {
    fn default() -> Self {
        Self {
            arc: ShapeAttrs {
                stroke: Some(Attr::Scalar(Color::WHITE)),
                ..ShapeAttrs::default()
            },
            inner_radius: 0.0,
            outer_radius: 1.0,
            pad_angle: 0.0,
            text: LabelStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Slice {
    row: usize,
    label: String,
    value: f64,
}

/// Pie, donut and rose charts over `[label, value]` rows.
#[derive(Debug)]
pub struct ArcLayer {
    base: LayerBase,
    options: ArcOptions,
    table: Table,
    slices: Vec<Slice>,
}

impl ArcLayer {
    pub fn new(options: ArcOptions, context: Arc<WaveContext>) -> WaveResult<Self> {
        Ok(Self {
            base: LayerBase::new(options.common.clone(), context)?,
            options,
            table: Table::default(),
            slices: Vec::new(),
        })
    }

    fn max_radius(&self) -> f64 {
        let region = self.base.region();
        region.width().min(region.height()).max(0.0) / 2.0
    }

    /// `(start, end, inner, outer)` per slice in chart angles.
    fn sectors(&self, style: &ArcStyle) -> Vec<(f64, f64, f64, f64)> {
        let outer = self.max_radius() * style.outer_radius;
        let inner = outer * style.inner_radius;
        let count = self.slices.len();
        if count == 0 {
            return Vec::new();
        }
        let pad = style.pad_angle.max(0.0);

        match self.options.variant {
            ArcVariant::Pie | ArcVariant::Donut => {
                let Some(angle) = self.base.scale(ScaleSlot::Angle).and_then(Scale::as_linear)
                else {
                    return Vec::new();
                };
                let mut running = 0.0;
                self.slices
                    .iter()
                    .map(|slice| {
                        let start = angle.scale(running);
                        running += slice.value.max(0.0);
                        let end = angle.scale(running);
                        let padding = pad.min((end - start) / 2.0);
                        (start + padding / 2.0, end - padding / 2.0, inner, outer)
                    })
                    .collect()
            }
            ArcVariant::Rose => {
                let step = TAU / count as f64;
                let radius = self.base.scale(ScaleSlot::Radius).and_then(Scale::as_linear);
                self.slices
                    .iter()
                    .enumerate()
                    .map(|(index, slice)| {
                        let start = step * index as f64;
                        let reach = radius.map_or(outer, |scale| scale.scale(slice.value));
                        let padding = pad.min(step / 2.0);
                        (start + padding / 2.0, start + step - padding / 2.0, inner, reach)
                    })
                    .collect()
            }
        }
    }
}

impl Layer for ArcLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Arc
    }

    fn set_data(&mut self, data: LayerData) -> WaveResult<()> {
        let table = data.table()?;
        self.base.store_data(data);
        self.base.clear_scales();
        self.slices.clear();
        self.table = table;
        if self.table.headers().len() < 2 {
            return Ok(());
        }

        let labels = dimension_labels(&self.table)?;
        let values = self.table.column(&ColumnSelector::Index(1))?;
        self.slices = labels
            .into_iter()
            .zip(values)
            .enumerate()
            .map(|(row, (label, value))| Slice {
                row,
                label,
                value: value.as_number().unwrap_or(0.0),
            })
            .collect();

        let total: f64 = self.slices.iter().map(|slice| slice.value.max(0.0)).sum();
        let angle = self
            .base
            .scale_spec(ScaleSlot::Angle)
            .apply_linear(LinearScale::new((0.0, total), (0.0, TAU)));
        self.base.install_scale(ScaleSlot::Angle, Scale::Linear(angle));

        if self.options.variant == ArcVariant::Rose {
            let style: ArcStyle = self.base.typed_style()?;
            let outer = self.max_radius() * style.outer_radius;
            let max = self
                .slices
                .iter()
                .map(|slice| slice.value)
                .fold(0.0_f64, f64::max);
            let radius = self
                .base
                .scale_spec(ScaleSlot::Radius)
                .apply_linear(LinearScale::new((0.0, max), (outer * style.inner_radius, outer)));
            self.base.install_scale(ScaleSlot::Radius, Scale::Linear(radius));
        }
        debug!(layer = %self.base.id(), slices = self.slices.len(), total, "arc data set");
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn Backend) -> WaveResult<()> {
        let style: ArcStyle = self.base.typed_style()?;
        let center = self.base.region().center();
        let sectors = self.sectors(&style);
        let colors = self.base.palette(self.slices.len().max(1));
        let id = self.base.id();

        let arcs: Vec<ArcSpec> = sectors
            .iter()
            .map(|&(start_angle, end_angle, inner_radius, outer_radius)| ArcSpec {
                center,
                inner_radius,
                outer_radius,
                start_angle,
                end_angle,
            })
            .collect();
        let sources = self
            .slices
            .iter()
            .map(|slice| {
                row_source(
                    id,
                    ShapeKind::Arc,
                    &self.table,
                    slice.row,
                    &slice.label,
                    Some(slice.value),
                )
            })
            .collect();
        let labels: Vec<TextSpec> = if style.text.enabled {
            sectors
                .iter()
                .zip(&self.slices)
                .map(|(&(start, end, inner, outer), slice)| {
                    let middle = (start + end) / 2.0;
                    let at = polar_point(center.0, center.1, (inner + outer) / 2.0, middle);
                    TextSpec::new(slice.label.clone(), at)
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut attrs = ShapeAttrs {
            fill: Some(Attr::PerElement(colors)),
            ..ShapeAttrs::default()
        };
        attrs.merge(&style.arc);
        let arc = self
            .base
            .common("arc", ShapeKind::Arc)
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
        primitives::draw_arc(&mut target, &arc, &arcs)?;
        primitives::draw_text(&mut target, &text, &labels, &text_attrs)
    }

    fn legend_entries(&self) -> Vec<LegendEntry> {
        self.slices
            .iter()
            .zip(self.base.palette(self.slices.len()))
            .map(|(slice, color)| LegendEntry {
                label: slice.label.clone(),
                color,
            })
            .collect()
    }
}

//! Layers: stateful rendering units for one visual element family.
//!
//! A layer owns its scales, a merged style document and its animation
//! options. `set_data` derives scales from the data, `draw` converts domain
//! values into primitive calls. Cross-layer sharing goes through the
//! coordinate binder, never through one layer holding another.

mod arc;
mod auxiliary;
mod axis;
mod base;
mod chord;
pub mod event;
mod kind;
mod legend;
mod line;
mod odline;
mod radar;
mod rect;
mod scatter;
mod text;

pub use arc::{ArcLayer, ArcOptions, ArcStyle, ArcVariant};
pub use auxiliary::{AuxiliaryLayer, AuxiliaryOptions, AuxiliaryStyle, Direction};
pub use axis::{AxisLayer, AxisOptions, AxisStyle, CoordinateFamily, region_linear_scale};
pub use base::{
    AxisSlot, LayerBase, LayerData, LayerOptions, LayerScales, ScaleOverrides, ScaleSlot,
    merge_json,
};
pub use chord::{ChordLayer, ChordOptions, ChordStyle};
pub use event::{EventBus, LayerEvent, PointerAction};
pub use kind::{LayerDefaults, LayerKind, LayerType};
pub use legend::{LegendEntry, LegendLayer, LegendOptions, LegendStyle};
pub use line::{LineLayer, LineOptions, LineStyle};
pub use odline::{OdLineLayer, OdLineOptions, OdLineStyle};
pub use radar::{RadarLayer, RadarOptions, RadarStyle};
pub use rect::{RectLayer, RectOptions, RectStyle, RectVariant};
pub use scatter::{ScatterLayer, ScatterOptions, ScatterStyle};
pub use text::{TextLayer, TextOptions, TextStyle};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Cell, ColumnSelector, Table};
use crate::error::{WaveError, WaveResult};
use crate::render::{Backend, Color, ElementSource, ShapeAttrs, ShapeKind};

/// Lifecycle every layer implements.
pub trait Layer {
    fn base(&self) -> &LayerBase;

    fn base_mut(&mut self) -> &mut LayerBase;

    fn layer_type(&self) -> LayerType;

    fn id(&self) -> &str {
        self.base().id()
    }

    /// Ingests data and derives this layer's own scales.
    fn set_data(&mut self, data: LayerData) -> WaveResult<()>;

    fn set_style(&mut self, delta: &Value) -> WaveResult<()> {
        self.base_mut().merge_style(delta)
    }

    fn draw(&mut self, backend: &mut dyn Backend) -> WaveResult<()>;

    /// Coordinate family of an axis layer; `None` for data layers.
    fn coordinate(&self) -> Option<CoordinateFamily> {
        None
    }

    /// Series shown by a bound legend.
    fn legend_entries(&self) -> Vec<LegendEntry> {
        Vec::new()
    }

    fn set_legend_entries(&mut self, _entries: Vec<LegendEntry>) -> WaveResult<()> {
        Err(WaveError::Unsupported(format!(
            "layer `{}` does not display legend entries",
            self.id()
        )))
    }

    /// Releases backend resources. Idempotent.
    fn destroy(&mut self, backend: &mut dyn Backend) -> WaveResult<()> {
        self.base_mut().release(backend).map(|_| ())
    }
}

/// Value label rendered next to elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelStyle {
    pub enabled: bool,
    pub font_size: Option<f64>,
    pub offset: f64,
    pub fill: Option<Color>,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            enabled: false,
            font_size: None,
            offset: 5.0,
            fill: None,
        }
    }
}

/// Point markers drawn on top of lines and polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PointStyle {
    pub enabled: bool,
    pub size: f64,
    pub circle: ShapeAttrs,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            enabled: false,
            size: 3.0,
            circle: ShapeAttrs::default(),
        }
    }
}

/// Data columns after the first one, which holds the dimension labels.
pub(crate) fn series_columns(table: &Table) -> Vec<ColumnSelector> {
    (1..table.headers().len()).map(ColumnSelector::Index).collect()
}

/// Dimension labels in row order, empty for an empty table.
pub(crate) fn dimension_labels(table: &Table) -> WaveResult<Vec<String>> {
    if table.headers().is_empty() {
        return Ok(Vec::new());
    }
    table.labels(&ColumnSelector::Index(0))
}

pub(crate) fn row_source(
    layer_id: &str,
    kind: ShapeKind,
    table: &Table,
    row: usize,
    category: &str,
    value: Option<f64>,
) -> ElementSource {
    let cells = table.row(row).map(<[Cell]>::to_vec).unwrap_or_default();
    ElementSource {
        layer_id: layer_id.to_owned(),
        element_type: kind.as_str().to_owned(),
        dimension: cells.first().map(Cell::to_string).unwrap_or_default(),
        category: category.to_owned(),
        value,
        row: cells,
    }
}

/// Label text for a plotted value: integers plain, fractions to two places.
#[must_use]
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        let text = format!("{value:.2}");
        text.trim_end_matches('0').trim_end_matches('.').to_owned()
    }
}

/// Rough text width used for layout without a font backend.
pub(crate) fn estimate_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * 0.6
}

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::api::WaveContext;
use crate::core::{NiceOptions, ScaleSpec};
use crate::error::WaveResult;
use crate::layer::{
    ArcLayer, ArcOptions, ArcVariant, AuxiliaryLayer, AuxiliaryOptions, AxisLayer, AxisOptions,
    ChordLayer, ChordOptions, Direction, Layer, LayerOptions, LegendLayer, LegendOptions,
    LineLayer, LineOptions, OdLineLayer, OdLineOptions, RadarLayer, RadarOptions, RectLayer,
    RectOptions, RectVariant, ScaleOverrides, ScaleSlot, ScatterLayer, ScatterOptions, TextLayer,
    TextOptions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Rect,
    Line,
    Scatter,
    Arc,
    Radar,
    Axis,
    Auxiliary,
    Text,
    Legend,
    Odline,
    Chord,
}

impl LayerType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Line => "line",
            Self::Scatter => "scatter",
            Self::Arc => "arc",
            Self::Radar => "radar",
            Self::Axis => "axis",
            Self::Auxiliary => "auxiliary",
            Self::Text => "text",
            Self::Legend => "legend",
            Self::Odline => "odline",
            Self::Chord => "chord",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of layer types, each carrying only its own options.
///
/// Serialized as `{"type": "rect", "options": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options", rename_all = "lowercase")]
pub enum LayerKind {
    Rect(RectOptions),
    Line(LineOptions),
    Scatter(ScatterOptions),
    Arc(ArcOptions),
    Radar(RadarOptions),
    Axis(AxisOptions),
    Auxiliary(AuxiliaryOptions),
    Text(TextOptions),
    Legend(LegendOptions),
    Odline(OdLineOptions),
    Chord(ChordOptions),
}

/// Scale and style presets a layer type starts from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerDefaults {
    pub scales: ScaleOverrides,
    pub style: Value,
}

impl LayerDefaults {
    fn with_scale(mut self, slot: ScaleSlot, spec: ScaleSpec) -> Self {
        self.scales.insert(slot, spec);
        self
    }

    fn with_style(mut self, style: Value) -> Self {
        self.style = style;
        self
    }
}

fn nice_zero() -> ScaleSpec {
    ScaleSpec {
        nice: Some(NiceOptions::new(5, true)),
        ..ScaleSpec::default()
    }
}

fn nice() -> ScaleSpec {
    ScaleSpec {
        nice: Some(NiceOptions::new(5, false)),
        ..ScaleSpec::default()
    }
}

impl LayerKind {
    #[must_use]
    pub fn common(&self) -> &LayerOptions {
        match self {
            Self::Rect(options) => &options.common,
            Self::Line(options) => &options.common,
            Self::Scatter(options) => &options.common,
            Self::Arc(options) => &options.common,
            Self::Radar(options) => &options.common,
            Self::Axis(options) => &options.common,
            Self::Auxiliary(options) => &options.common,
            Self::Text(options) => &options.common,
            Self::Legend(options) => &options.common,
            Self::Odline(options) => &options.common,
            Self::Chord(options) => &options.common,
        }
    }

    #[must_use]
    pub fn layer_type(&self) -> LayerType {
        match self {
            Self::Rect(_) => LayerType::Rect,
            Self::Line(_) => LayerType::Line,
            Self::Scatter(_) => LayerType::Scatter,
            Self::Arc(_) => LayerType::Arc,
            Self::Radar(_) => LayerType::Radar,
            Self::Axis(_) => LayerType::Axis,
            Self::Auxiliary(_) => LayerType::Auxiliary,
            Self::Text(_) => LayerType::Text,
            Self::Legend(_) => LayerType::Legend,
            Self::Odline(_) => LayerType::Odline,
            Self::Chord(_) => LayerType::Chord,
        }
    }

    /// Per-type scale and style presets, applied before user overrides.
    #[must_use]
    pub fn defaults(&self) -> LayerDefaults {
        let base = LayerDefaults::default();
        match self {
            Self::Rect(options) => match options.variant {
                RectVariant::Column => base.with_scale(ScaleSlot::Y, nice_zero()),
                RectVariant::Bar => base.with_scale(ScaleSlot::X, nice_zero()),
            },
            Self::Line(_) => base.with_scale(ScaleSlot::Y, nice_zero()),
            Self::Scatter(_) => base
                .with_scale(ScaleSlot::X, nice())
                .with_scale(ScaleSlot::Y, nice()),
            Self::Arc(options) => match options.variant {
                ArcVariant::Pie => base,
                ArcVariant::Donut => base.with_style(json!({"innerRadius": 0.5})),
                ArcVariant::Rose => base
                    .with_scale(ScaleSlot::Radius, nice_zero())
                    .with_style(json!({"innerRadius": 0.1})),
            },
            Self::Radar(_) => base.with_scale(ScaleSlot::Radius, nice_zero()),
            Self::Auxiliary(options) => match options.direction {
                Direction::Horizontal => base.with_scale(ScaleSlot::Y, nice_zero()),
                Direction::Vertical => base.with_scale(ScaleSlot::X, nice_zero()),
            },
            Self::Text(_) => base.with_style(json!({"text": {"fontSize": 16}})),
            Self::Axis(_) | Self::Legend(_) | Self::Odline(_) | Self::Chord(_) => base,
        }
    }

    /// Instantiates the layer bound to its layout region.
    pub fn build(self, context: Arc<WaveContext>) -> WaveResult<Box<dyn Layer>> {
        Ok(match self {
            Self::Rect(options) => Box::new(RectLayer::new(options, context)?),
            Self::Line(options) => Box::new(LineLayer::new(options, context)?),
            Self::Scatter(options) => Box::new(ScatterLayer::new(options, context)?),
            Self::Arc(options) => Box::new(ArcLayer::new(options, context)?),
            Self::Radar(options) => Box::new(RadarLayer::new(options, context)?),
            Self::Axis(options) => Box::new(AxisLayer::new(options, context)?),
            Self::Auxiliary(options) => Box::new(AuxiliaryLayer::new(options, context)?),
            Self::Text(options) => Box::new(TextLayer::new(options, context)?),
            Self::Legend(options) => Box::new(LegendLayer::new(options, context)?),
            Self::Odline(options) => Box::new(OdLineLayer::new(options, context)?),
            Self::Chord(options) => Box::new(ChordLayer::new(options, context)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SelectMode;

    #[test]
    fn kinds_are_adjacently_tagged() {
        let kind: LayerKind = serde_json::from_value(json!({
            "type": "rect",
            "options": {"id": "bars", "mode": "stack", "type": "bar"}
        }))
        .expect("rect kind");
        let LayerKind::Rect(options) = &kind else {
            panic!("expected rect, got {kind:?}");
        };
        assert_eq!(options.common.id, "bars");
        assert_eq!(options.common.layout, "main");
        assert_eq!(options.mode, SelectMode::Stack);
        assert_eq!(options.variant, RectVariant::Bar);
        assert_eq!(kind.layer_type(), LayerType::Rect);
    }

    #[test]
    fn bar_defaults_nice_the_horizontal_axis() {
        let kind = LayerKind::Rect(
            RectOptions::new(LayerOptions::new("bars")).with_variant(RectVariant::Bar),
        );
        let defaults = kind.defaults();
        assert!(defaults.scales[&ScaleSlot::X].nice.is_some_and(|nice| nice.zero));
        assert!(!defaults.scales.contains_key(&ScaleSlot::Y));
    }

    #[test]
    fn unknown_type_is_a_schema_error() {
        let result: Result<LayerKind, _> =
            serde_json::from_value(json!({"type": "heatmap", "options": {"id": "h"}}));
        assert!(result.is_err());
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::WaveResult;
use crate::interaction::TooltipMode;
use crate::layer::{LayerData, LayerKind, LayerType, ScaleOverrides};
use crate::render::{AnimationOptions, Backend};

use super::Wave;

/// Declarative description of one layer, as produced by a schema translator.
///
/// `{type, options, data, scale, style, animation, tooltip}`. Only `type`
/// and `options.id` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSchema {
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    pub options: Value,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub scale: ScaleOverrides,
    #[serde(default)]
    pub style: Value,
    #[serde(default)]
    pub animation: AnimationOptions,
    #[serde(default)]
    pub tooltip: Option<TooltipMode>,
}

/// A schema resolved into typed layer inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerConfiguration {
    pub kind: LayerKind,
    pub scale: ScaleOverrides,
    pub style: Value,
    pub data: LayerData,
    pub animation: AnimationOptions,
}

impl LayerSchema {
    pub fn from_json_str(input: &str) -> WaveResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// The closed layer variant carrying the type-specific options.
    pub fn kind(&self) -> WaveResult<LayerKind> {
        Ok(serde_json::from_value(json!({
            "type": self.layer_type,
            "options": self.options,
        }))?)
    }

    /// Resolves the type-specific options and the raw data.
    pub fn configure(&self) -> WaveResult<LayerConfiguration> {
        Ok(LayerConfiguration {
            kind: self.kind()?,
            scale: self.scale.clone(),
            style: self.style.clone(),
            data: LayerData::from_value(&self.data)?,
            animation: self.animation,
        })
    }
}

impl<B: Backend> Wave<B> {
    /// Creates a layer from a schema and feeds it style, scale overrides,
    /// animation and data. Returns the layer id.
    ///
    /// Option errors fail the call; data and style errors are contained like
    /// any other layer failure.
    pub fn apply_schema(&mut self, schema: &LayerSchema) -> WaveResult<String> {
        let kind = schema.kind()?;
        let id = kind.common().id.clone();
        self.create_layer(kind)?;
        self.guarded(&id, "configure", |layer, _| {
            layer.base_mut().set_scale_specs(schema.scale.clone());
            layer.base_mut().set_animation(schema.animation);
            Ok(())
        })?;
        self.set_style(&id, &schema.style)?;
        if let Some(mode) = schema.tooltip {
            self.tooltip.set_mode(mode);
        }
        self.set_data_value(&id, &schema.data)?;
        debug!(layer = %id, layer_type = %schema.layer_type, "schema applied");
        Ok(id)
    }

    /// Applies schemas in order; returns the created ids.
    pub fn apply_schemas(&mut self, schemas: &[LayerSchema]) -> WaveResult<Vec<String>> {
        schemas.iter().map(|schema| self.apply_schema(schema)).collect()
    }
}

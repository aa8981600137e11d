use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{Span, debug};

use crate::api::WaveContext;
use crate::core::{Rect, Scale, ScaleSpec, Table};
use crate::error::{WaveError, WaveResult};
use crate::layer::event::{EventBus, LayerEvent};
use crate::render::primitives::{DrawCommon, DrawTarget};
use crate::render::{AnimationOptions, Backend, Color, Mapping, ShapeKind, Theme};

/// Named scale slot of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleSlot {
    #[serde(rename = "scaleX")]
    X,
    #[serde(rename = "scaleY")]
    Y,
    /// Secondary Y axis for layers bound to the minor axis.
    #[serde(rename = "scaleYR")]
    YR,
    #[serde(rename = "scaleAngle")]
    Angle,
    #[serde(rename = "scaleRadius")]
    Radius,
    #[serde(rename = "scalePosition")]
    Position,
}

pub type LayerScales = IndexMap<ScaleSlot, Scale>;
pub type ScaleOverrides = IndexMap<ScaleSlot, ScaleSpec>;

/// Which shared vertical axis a cartesian layer binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSlot {
    #[default]
    Main,
    Minor,
}

/// Options every layer accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerOptions {
    pub id: String,
    /// Region the layer draws into.
    #[serde(default = "default_layout")]
    pub layout: String,
    #[serde(default)]
    pub axis: AxisSlot,
}

fn default_layout() -> String {
    "main".to_owned()
}

impl LayerOptions {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            layout: default_layout(),
            axis: AxisSlot::Main,
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = layout.into();
        self
    }

    #[must_use]
    pub fn with_axis(mut self, axis: AxisSlot) -> Self {
        self.axis = axis;
        self
    }
}

/// Raw input handed to `set_data`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LayerData {
    #[default]
    Empty,
    Table(Table),
    Text(String),
    Labels(Vec<String>),
}

impl LayerData {
    /// Reads the `data` key of a layer schema.
    pub fn from_value(value: &Value) -> WaveResult<Self> {
        match value {
            Value::Null => Ok(Self::Empty),
            Value::String(text) => Ok(Self::Text(text.clone())),
            Value::Array(items) => match items.first() {
                None => Ok(Self::Table(Table::default())),
                Some(Value::Array(_)) => Table::from_json(value).map(Self::Table),
                Some(Value::Object(_)) => Table::from_records(value).map(Self::Table),
                Some(Value::String(_)) => items
                    .iter()
                    .map(|item| {
                        item.as_str().map(str::to_owned).ok_or_else(|| {
                            WaveError::InvalidData("label lists must only hold strings".to_owned())
                        })
                    })
                    .collect::<WaveResult<Vec<String>>>()
                    .map(Self::Labels),
                Some(other) => Err(WaveError::InvalidData(format!(
                    "unsupported data item `{other}`"
                ))),
            },
            other => Err(WaveError::InvalidData(format!(
                "layer data must be an array or a string, got `{other}`"
            ))),
        }
    }

    /// The table, or an empty one for `Empty`.
    pub fn table(&self) -> WaveResult<Table> {
        match self {
            Self::Table(table) => Ok(table.clone()),
            Self::Empty => Ok(Table::default()),
            Self::Text(_) | Self::Labels(_) => Err(WaveError::InvalidData(
                "layer expects tabular data".to_owned(),
            )),
        }
    }
}

impl From<Table> for LayerData {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

impl From<&str> for LayerData {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// State shared by every layer: region, style document, scales, hooks,
/// events and lifecycle flags.
pub struct LayerBase {
    options: LayerOptions,
    region: Rect,
    context: Arc<WaveContext>,
    style: Value,
    animation: AnimationOptions,
    scale_specs: ScaleOverrides,
    derived: LayerScales,
    scales: LayerScales,
    data: LayerData,
    mappings: HashMap<ShapeKind, Mapping>,
    events: EventBus,
    destroyed: bool,
}

impl LayerBase {
    pub fn new(options: LayerOptions, context: Arc<WaveContext>) -> WaveResult<Self> {
        let region = context.region(&options.layout)?;
        Ok(Self {
            options,
            region,
            context,
            style: Value::Object(Map::new()),
            animation: AnimationOptions::default(),
            scale_specs: ScaleOverrides::new(),
            derived: LayerScales::new(),
            scales: LayerScales::new(),
            data: LayerData::Empty,
            mappings: HashMap::new(),
            events: EventBus::default(),
            destroyed: false,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.options.id
    }

    #[must_use]
    pub fn options(&self) -> &LayerOptions {
        &self.options
    }

    #[must_use]
    pub fn region(&self) -> Rect {
        self.region
    }

    #[must_use]
    pub fn context(&self) -> &WaveContext {
        &self.context
    }

    #[must_use]
    pub fn theme(&self) -> &Theme {
        self.context.theme()
    }

    /// Child span of the chart span, entered around lifecycle operations.
    #[must_use]
    pub fn span(&self, operation: &'static str) -> Span {
        tracing::debug_span!(parent: self.context.span(), "layer", id = %self.options.id, operation)
    }

    #[must_use]
    pub fn palette(&self, count: usize) -> Vec<Color> {
        let palette = self.context.theme().palette(count);
        if palette.len() < count {
            // a theme whose colours all failed to parse
            return Theme::default().palette(count);
        }
        palette
    }

    #[must_use]
    pub fn style_value(&self) -> &Value {
        &self.style
    }

    /// Deep-merges `delta` into the style document. Unknown keys are kept.
    pub fn merge_style(&mut self, delta: &Value) -> WaveResult<()> {
        match delta {
            Value::Null => Ok(()),
            Value::Object(_) => {
                merge_json(&mut self.style, delta);
                debug!(layer = %self.options.id, "style merged");
                Ok(())
            }
            other => Err(WaveError::InvalidData(format!(
                "style delta must be an object, got `{other}`"
            ))),
        }
    }

    /// Typed view of the style document. Missing keys take their defaults.
    pub fn typed_style<T: DeserializeOwned>(&self) -> WaveResult<T> {
        Ok(serde_json::from_value(self.style.clone())?)
    }

    #[must_use]
    pub fn animation(&self) -> AnimationOptions {
        self.animation
    }

    pub fn set_animation(&mut self, animation: AnimationOptions) {
        self.animation = animation;
    }

    #[must_use]
    pub fn scale_spec(&self, slot: ScaleSlot) -> ScaleSpec {
        self.scale_specs.get(&slot).cloned().unwrap_or_default()
    }

    /// Overlays scale specs field by field. Unset fields keep their earlier value.
    pub fn set_scale_specs(&mut self, specs: ScaleOverrides) {
        for (slot, mut spec) in specs {
            if let Some(current) = self.scale_specs.get(&slot) {
                spec.inherit(current);
            }
            self.scale_specs.insert(slot, spec);
        }
    }

    /// Effective scales, possibly shared through the coordinate binder.
    #[must_use]
    pub fn scales(&self) -> &LayerScales {
        &self.scales
    }

    /// Scales derived from this layer's own data.
    #[must_use]
    pub fn derived_scales(&self) -> &LayerScales {
        &self.derived
    }

    #[must_use]
    pub fn scale(&self, slot: ScaleSlot) -> Option<&Scale> {
        self.scales.get(&slot)
    }

    pub fn scale_mut(&mut self, slot: ScaleSlot) -> Option<&mut Scale> {
        self.scales.get_mut(&slot)
    }

    /// Records a data-derived scale and makes it effective.
    pub fn install_scale(&mut self, slot: ScaleSlot, scale: Scale) {
        self.derived.insert(slot, scale.clone());
        self.assign_scale(slot, scale);
    }

    /// Makes `scale` effective. A brushed slot keeps its brushed range.
    pub fn assign_scale(&mut self, slot: ScaleSlot, mut scale: Scale) {
        if let Some(current) = self.scales.get(&slot).filter(|current| current.brushed()) {
            scale.set_range(current.range());
            scale.set_brushed(true);
        }
        self.scales.insert(slot, scale);
    }

    pub fn clear_scales(&mut self) {
        self.derived.clear();
        self.scales.retain(|_, scale| scale.brushed());
    }

    #[must_use]
    pub fn data(&self) -> &LayerData {
        &self.data
    }

    pub fn store_data(&mut self, data: LayerData) {
        self.data = data;
    }

    pub fn set_mapping(&mut self, kind: ShapeKind, mapping: Mapping) {
        self.mappings.insert(kind, mapping);
    }

    #[must_use]
    pub fn mapping(&self, kind: ShapeKind) -> Option<Mapping> {
        self.mappings.get(&kind).cloned()
    }

    /// Draw inputs for `class` with the registered mapping of `kind`.
    #[must_use]
    pub fn common(&self, class: &str, kind: ShapeKind) -> DrawCommon {
        DrawCommon::new(class).with_mapping(self.mapping(kind))
    }

    #[must_use]
    pub fn target<'a>(&'a self, backend: &'a mut dyn Backend) -> DrawTarget<'a> {
        DrawTarget::new(backend, &self.options.id, self.animation.plan())
    }

    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Releases backend resources and fires `destroy`. Later calls are no-ops.
    pub fn release(&mut self, backend: &mut dyn Backend) -> WaveResult<bool> {
        if self.destroyed {
            return Ok(false);
        }
        backend.remove_layer(&self.options.id)?;
        self.destroyed = true;
        self.events
            .fire(&LayerEvent::lifecycle("destroy", &self.options.id));
        debug!(layer = %self.options.id, "layer destroyed");
        Ok(true)
    }
}

impl fmt::Debug for LayerBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerBase")
            .field("options", &self.options)
            .field("region", &self.region)
            .field("style", &self.style)
            .field("scales", &self.scales)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

/// Recursive object merge; non-object values in `delta` replace.
pub fn merge_json(target: &mut Value, delta: &Value) {
    match (target, delta) {
        (Value::Object(target), Value::Object(delta)) => {
            for (key, value) in delta {
                match target.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, delta) => *target = delta.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LinearScale, NiceOptions};
    use serde_json::json;

    #[test]
    fn deep_merge_keeps_siblings_and_unknown_keys() {
        let mut style = json!({"rect": {"fill": "#fff", "opacity": 0.5}, "custom": 1});
        merge_json(&mut style, &json!({"rect": {"opacity": 1}, "other": true}));
        assert_eq!(
            style,
            json!({"rect": {"fill": "#fff", "opacity": 1}, "custom": 1, "other": true})
        );
    }

    #[test]
    fn data_shapes_are_recognized() {
        assert_eq!(LayerData::from_value(&Value::Null).expect("null"), LayerData::Empty);
        assert_eq!(
            LayerData::from_value(&json!("title")).expect("text"),
            LayerData::Text("title".to_owned())
        );
        assert_eq!(
            LayerData::from_value(&json!(["a", "b"])).expect("labels"),
            LayerData::Labels(vec!["a".to_owned(), "b".to_owned()])
        );
        let LayerData::Table(table) =
            LayerData::from_value(&json!([{"k": "x", "v": 1}])).expect("records")
        else {
            panic!("expected table");
        };
        assert_eq!(table.headers(), ["k", "v"]);
        assert!(LayerData::from_value(&json!({"a": 1})).is_err());
    }

    #[test]
    fn domain_override_keeps_preset_nice() {
        let mut base =
            LayerBase::new(LayerOptions::new("bars"), crate::api::context::test_context())
                .expect("base");
        base.set_scale_specs(
            serde_json::from_value(json!({"scaleY": {"nice": {"count": 5, "zero": true}}}))
                .expect("preset"),
        );
        base.set_scale_specs(
            serde_json::from_value(json!({"scaleY": {"domain": [3, 47]}})).expect("override"),
        );

        let spec = base.scale_spec(ScaleSlot::Y);
        assert_eq!(spec.nice, Some(NiceOptions::new(5, true)));
        let scale = spec.apply_linear(LinearScale::new((10.0, 20.0), (100.0, 0.0)));
        assert_eq!(scale.domain(), (0.0, 50.0));
    }

    #[test]
    fn scale_slots_use_schema_names() {
        let specs: ScaleOverrides =
            serde_json::from_value(json!({"scaleY": {"nice": {"zero": true}}})).expect("specs");
        assert!(specs.contains_key(&ScaleSlot::Y));
    }
}

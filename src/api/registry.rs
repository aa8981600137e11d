use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{WaveError, WaveResult};
use crate::layer::{Layer, LayerData, LayerEvent, LayerKind, LegendEntry, ScaleOverrides};
use crate::render::{AnimationOptions, Backend, Mapping, ShapeKind};

use super::{LayerWarning, Wave, WaveState};

impl<B: Backend> Wave<B> {
    /// Instantiates a layer with its type presets and registers it.
    ///
    /// Ids are unique per orchestrator; the layout region must exist.
    pub fn create_layer(&mut self, kind: LayerKind) -> WaveResult<()> {
        let id = kind.common().id.clone();
        if self.position(&id).is_some() {
            return Err(WaveError::InvalidData(format!("duplicate layer id `{id}`")));
        }
        let layer_type = kind.layer_type();
        let defaults = kind.defaults();
        let mut layer = kind.build(Arc::clone(&self.context))?;
        layer.base_mut().set_scale_specs(defaults.scales);
        layer.base_mut().merge_style(&defaults.style)?;
        debug!(layer = %id, layer_type = %layer_type, "layer created");
        self.layers.push(layer);
        Ok(())
    }

    /// Runs `action` on layer `id` inside the error boundary.
    ///
    /// Non-fatal errors are logged, recorded as warnings and turn into
    /// `Ok(None)`. Backend failures and unknown ids are returned.
    pub(super) fn guarded<T>(
        &mut self,
        id: &str,
        operation: &'static str,
        action: impl FnOnce(&mut dyn Layer, &mut dyn Backend) -> WaveResult<T>,
    ) -> WaveResult<Option<T>> {
        let index = self
            .position(id)
            .ok_or_else(|| WaveError::LayerNotFound(id.to_owned()))?;
        let layer = &mut self.layers[index];
        let backend = &mut self.backend;
        let span = layer.base().span(operation);
        let result = span.in_scope(|| action(layer.as_mut(), backend));
        self.contain(id, operation, result)
    }

    fn contain<T>(
        &mut self,
        id: &str,
        operation: &'static str,
        result: WaveResult<T>,
    ) -> WaveResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                warn!(layer = %id, operation, error = %error, "layer operation failed");
                self.state = WaveState::Warning;
                self.warnings.push(LayerWarning {
                    layer: id.to_owned(),
                    operation,
                    error: error.to_string(),
                });
                Ok(None)
            }
        }
    }

    /// Feeds data to a layer, then recomputes every coordinate binding.
    pub fn set_data(&mut self, id: &str, data: LayerData) -> WaveResult<()> {
        self.guarded(id, "set_data", |layer, _| layer.set_data(data))?;
        self.rebind()
    }

    /// Like [`Self::set_data`] for the raw `data` key of a schema.
    pub fn set_data_value(&mut self, id: &str, value: &Value) -> WaveResult<()> {
        self.guarded(id, "set_data", |layer, _| {
            layer.set_data(LayerData::from_value(value)?)
        })?;
        self.rebind()
    }

    pub fn set_style(&mut self, id: &str, delta: &Value) -> WaveResult<()> {
        self.guarded(id, "set_style", |layer, _| layer.set_style(delta))
            .map(|_| ())
    }

    /// Overlays scale specs and re-derives the layer's scales from its data.
    pub fn set_scale(&mut self, id: &str, specs: ScaleOverrides) -> WaveResult<()> {
        self.guarded(id, "set_scale", |layer, _| {
            layer.base_mut().set_scale_specs(specs);
            let data = layer.base().data().clone();
            layer.set_data(data)
        })?;
        self.rebind()
    }

    pub fn set_animation(&mut self, id: &str, animation: AnimationOptions) -> WaveResult<()> {
        self.guarded(id, "set_animation", |layer, _| {
            layer.base_mut().set_animation(animation);
            Ok(())
        })
        .map(|_| ())
    }

    /// Registers a mapping hook for one element type of a layer.
    pub fn set_mapping(&mut self, id: &str, kind: ShapeKind, mapping: Mapping) -> WaveResult<()> {
        self.guarded(id, "set_mapping", |layer, _| {
            layer.base_mut().set_mapping(kind, mapping);
            Ok(())
        })
        .map(|_| ())
    }

    /// Subscribes `handler` to event `name` of a layer.
    pub fn on<F>(&mut self, id: &str, name: &str, handler: F) -> WaveResult<()>
    where
        F: FnMut(&LayerEvent) + 'static,
    {
        self.guarded(id, "on", |layer, _| {
            layer.base_mut().events_mut().on(name, handler);
            Ok(())
        })
        .map(|_| ())
    }

    pub fn draw(&mut self, id: &str) -> WaveResult<()> {
        self.guarded(id, "draw", |layer, backend| layer.draw(backend))
            .map(|_| ())
    }

    /// Draws every layer in creation order. A failing layer does not stop
    /// its siblings; only fatal backend errors abort the pass.
    pub fn draw_all(&mut self) -> WaveResult<()> {
        let ids: Vec<String> = self.layers.iter().map(|layer| layer.id().to_owned()).collect();
        for id in &ids {
            self.draw(id)?;
        }
        debug!(layers = ids.len(), state = ?self.state, "draw pass finished");
        Ok(())
    }

    /// Copies the series of `sources` into legend layer `legend`.
    pub fn bind_legend(&mut self, legend: &str, sources: &[&str]) -> WaveResult<()> {
        let mut entries: Vec<LegendEntry> = Vec::new();
        for source in sources {
            let layer = self
                .layer(source)
                .ok_or_else(|| WaveError::LayerNotFound((*source).to_owned()))?;
            entries.extend(layer.legend_entries());
        }
        self.guarded(legend, "set_legend_entries", |layer, _| {
            layer.set_legend_entries(entries)
        })
        .map(|_| ())
    }

    /// Deregisters a layer and releases its backend resources.
    ///
    /// Unknown or already destroyed ids are a no-op.
    pub fn destroy_layer(&mut self, id: &str) -> WaveResult<()> {
        let Some(index) = self.position(id) else {
            return Ok(());
        };
        let mut layer = self.layers.remove(index);
        for binding in &mut self.bindings {
            binding.layers.retain(|layer| layer != id);
        }
        self.bindings.retain(|binding| binding.axis != id);
        if let Some(brush) = &mut self.brush {
            brush.layers.retain(|layer| layer != id);
        }
        let span = layer.base().span("destroy");
        let result = span.in_scope(|| layer.destroy(&mut self.backend));
        self.contain(id, "destroy", result).map(|_| ())
    }

    /// Destroys every layer, always taking the head of the active list.
    pub fn destroy(&mut self) -> WaveResult<()> {
        while let Some(id) = self.layers.first().map(|layer| layer.id().to_owned()) {
            self.destroy_layer(&id)?;
        }
        self.bindings.clear();
        self.brush = None;
        self.tooltip.hide();
        debug!(wave = %self.context.id(), "wave destroyed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::api::WaveConfig;
    use crate::core::{SelectMode, Viewport};
    use crate::layer::{LayerOptions, RectOptions, TextOptions};
    use crate::render::{GroupKey, NullBackend, SvgBackend};

    fn wave() -> Wave<SvgBackend> {
        Wave::new(SvgBackend::new(400.0, 300.0), WaveConfig::new(Viewport::new(400, 300)))
            .expect("wave")
    }

    fn columns(id: &str) -> LayerKind {
        LayerKind::Rect(RectOptions::new(LayerOptions::new(id)))
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut wave = wave();
        wave.create_layer(columns("bars")).expect("first");
        assert!(matches!(
            wave.create_layer(columns("bars")),
            Err(WaveError::InvalidData(_))
        ));
        assert!(matches!(
            wave.create_layer(LayerKind::Rect(RectOptions::new(
                LayerOptions::new("lost").with_layout("facet3")
            ))),
            Err(WaveError::InvalidData(_))
        ));
        assert_eq!(wave.layer_ids(), ["bars"]);
    }

    #[test]
    fn failing_layer_does_not_stop_siblings() {
        let mut wave = wave();
        wave.create_layer(LayerKind::Rect(
            RectOptions::new(LayerOptions::new("broken")).with_mode(SelectMode::Interval),
        ))
        .expect("broken");
        wave.create_layer(LayerKind::Text(TextOptions::new(
            LayerOptions::new("title").with_layout("title"),
        )))
        .expect("title");

        wave.set_data_value("broken", &json!([["x", "a", "b", "c"], ["q", 1, 2, 3]]))
            .expect("contained");
        wave.set_data("title", LayerData::from("Sales")).expect("title data");
        wave.set_style("title", &json!("not an object")).expect("contained");
        wave.draw_all().expect("draw pass");

        assert_eq!(wave.state(), WaveState::Warning);
        let operations: Vec<_> = wave.warnings().iter().map(|w| w.operation).collect();
        assert_eq!(operations, ["set_data", "set_style"]);
        assert_eq!(wave.backend().nodes(&GroupKey::new("title", "text")).len(), 1);

        wave.clear_warnings();
        assert_eq!(wave.state(), WaveState::Ready);
    }

    #[test]
    fn unknown_layer_is_reported() {
        let mut wave = wave();
        assert!(matches!(wave.draw("ghost"), Err(WaveError::LayerNotFound(_))));
        assert_eq!(wave.state(), WaveState::Ready);
    }

    #[test]
    fn backend_failure_is_fatal() {
        let mut wave = Wave::new(NullBackend::new(), WaveConfig::new(Viewport::new(400, 300)))
            .expect("wave");
        wave.create_layer(LayerKind::Text(TextOptions::new(
            LayerOptions::new("title").with_layout("title"),
        )))
        .expect("title");
        wave.set_data("title", LayerData::from("Sales")).expect("data");
        wave.backend_mut().detach();
        assert!(matches!(wave.draw_all(), Err(WaveError::Backend(_))));
        assert!(wave.warnings().is_empty());
    }

    #[test]
    fn destroy_is_idempotent_and_fires_once() {
        let mut wave = wave();
        wave.create_layer(columns("a")).expect("a");
        wave.create_layer(columns("b")).expect("b");
        let fired = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&fired);
        wave.on("a", "destroy", move |event| log.borrow_mut().push(event.layer_id.clone()))
            .expect("subscribe");

        wave.destroy_layer("a").expect("destroy a");
        wave.destroy_layer("a").expect("destroy a again");
        assert_eq!(wave.layer_ids(), ["b"]);
        assert_eq!(fired.borrow().as_slice(), ["a"]);

        wave.destroy().expect("destroy wave");
        wave.destroy().expect("destroy wave again");
        assert_eq!(wave.layer_count(), 0);
    }
}

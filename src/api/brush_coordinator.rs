use serde_json::Value;
use tracing::debug;

use crate::error::{WaveError, WaveResult};
use crate::interaction::Brush;
use crate::layer::ScaleSlot;
use crate::render::{Backend, BackendKind};

use super::Wave;
use super::wave::BrushBinding;

impl<B: Backend> Wave<B> {
    /// Attaches the brush strip to `layers`, whose X scales it zooms.
    ///
    /// Needs the `brush` layout region and the SVG backend.
    pub fn enable_brush(&mut self, layers: &[&str]) -> WaveResult<()> {
        if self.backend.kind() != BackendKind::Svg {
            return Err(WaveError::Unsupported(format!(
                "brushing needs the svg backend, not {:?}",
                self.backend.kind()
            )));
        }
        if let Some(missing) = layers.iter().find(|id| self.position(id).is_none()) {
            return Err(WaveError::LayerNotFound((*missing).to_owned()));
        }
        let strip = self.context.region("brush")?;
        let main = self.context.region("main")?;
        self.brush = Some(BrushBinding {
            brush: Brush::new(strip, main),
            layers: layers.iter().map(|id| (*id).to_owned()).collect(),
        });
        debug!(layers = layers.len(), "brush enabled");
        Ok(())
    }

    #[must_use]
    pub fn brush_state(&self) -> Option<&Brush> {
        self.brush.as_ref().map(|binding| &binding.brush)
    }

    /// Applies a strip selection `[x0, x1]` to the bound layers and redraws
    /// them. An empty selection restores the unzoomed ranges.
    ///
    /// Only scale ranges change; stored data is replayed untouched.
    pub fn brush(&mut self, x0: f64, x1: f64) -> WaveResult<Option<(f64, f64)>> {
        let Some(binding) = &mut self.brush else {
            return Err(WaveError::Unsupported("brush is not enabled".to_owned()));
        };
        let range = binding.brush.select(x0, x1);
        let layers = binding.layers.clone();

        for id in &layers {
            self.guarded(id, "brush", |layer, _| {
                if let Some(scale) = layer.base_mut().scale_mut(ScaleSlot::X) {
                    match range {
                        Some(range) => {
                            scale.set_range(range);
                            scale.set_brushed(true);
                        }
                        None => scale.set_brushed(false),
                    }
                }
                Ok(())
            })?;
        }
        for id in &layers {
            self.guarded(id, "set_data", |layer, _| {
                let data = layer.base().data().clone();
                layer.set_data(data)?;
                layer.set_style(&Value::Null)
            })?;
        }
        self.rebind()?;
        for id in &layers {
            self.draw(id)?;
        }
        debug!(x0, x1, range = ?range, "brush applied");
        Ok(range)
    }

    /// Starts a drag on the brush strip.
    pub fn brush_start(&mut self, x: f64) {
        self.interaction.begin_brush(x);
    }

    /// Ends a drag; applies the dragged span when a drag was in progress.
    pub fn brush_end(&mut self, x: f64) -> WaveResult<Option<(f64, f64)>> {
        match self.interaction.end_brush(x) {
            Some((x0, x1)) => self.brush(x0, x1),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use serde_json::json;

    use super::*;
    use crate::api::WaveConfig;
    use crate::core::{LayoutPreset, Padding, Scale, Viewport};
    use crate::layer::{LayerKind, LayerOptions, ScatterOptions};
    use crate::render::{CanvasBackend, SvgBackend};

    fn config() -> WaveConfig {
        WaveConfig::new(Viewport::new(400, 300))
            .with_padding(Padding::new(20.0, 0.0, 20.0, 0.0))
            .with_layout(LayoutPreset::StandardWithBrush)
    }

    fn x_range<Bk: Backend>(wave: &Wave<Bk>) -> (f64, f64) {
        wave.layer("dots")
            .and_then(|layer| layer.base().scale(ScaleSlot::X))
            .map(Scale::range)
            .expect("x scale")
    }

    #[test]
    fn half_selection_doubles_the_span() {
        let mut wave = Wave::new(SvgBackend::new(400.0, 300.0), config()).expect("wave");
        wave.create_layer(LayerKind::Scatter(ScatterOptions::new(LayerOptions::new("dots"))))
            .expect("dots");
        wave.set_data_value("dots", &json!([["x", "y"], [0, 1], [10, 2]]))
            .expect("data");
        wave.enable_brush(&["dots"]).expect("brush");
        let before = x_range(&wave);

        wave.brush_start(0.0);
        let range = wave.brush_end(200.0).expect("brush").expect("range");
        let after = x_range(&wave);
        assert_eq!(after, range);
        assert_relative_eq!(after.1 - after.0, 2.0 * (before.1 - before.0), epsilon = 1e-9);
        assert!(wave.layer("dots").and_then(|l| l.base().scale(ScaleSlot::X)).expect("x").brushed());

        // new data keeps the zoom
        wave.set_data_value("dots", &json!([["x", "y"], [0, 1], [20, 2]]))
            .expect("data");
        assert_eq!(x_range(&wave), range);

        wave.brush(50.0, 50.0).expect("reset");
        assert_eq!(x_range(&wave), before);
    }

    #[test]
    fn canvas_backend_cannot_brush() {
        let mut wave = Wave::new(CanvasBackend::new(400.0, 300.0), config()).expect("wave");
        assert!(matches!(wave.enable_brush(&[]), Err(WaveError::Unsupported(_))));
        assert!(matches!(wave.brush(0.0, 10.0), Err(WaveError::Unsupported(_))));
    }
}

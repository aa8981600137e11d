use std::sync::Arc;

use tracing::debug;

use crate::error::WaveResult;
use crate::interaction::{InteractionState, TooltipController};
use crate::render::Backend;

use super::{Wave, WaveConfig, WaveContext, WaveState};

impl<B: Backend> Wave<B> {
    /// Validates the viewport, computes layout regions and takes the backend.
    pub fn new(backend: B, config: WaveConfig) -> WaveResult<Self> {
        let context = Arc::new(WaveContext::from_config(&config)?);
        let viewport = context.viewport();
        let tooltip = TooltipController::new(
            config.tooltip,
            (f64::from(viewport.width), f64::from(viewport.height)),
        )
        .with_font_size(context.theme().font_size);
        debug!(
            wave = %context.id(),
            backend = ?backend.kind(),
            regions = context.regions().len(),
            "wave created"
        );
        Ok(Self {
            backend,
            context,
            layers: Vec::new(),
            state: WaveState::Ready,
            warnings: Vec::new(),
            bindings: Vec::new(),
            brush: None,
            interaction: InteractionState::default(),
            tooltip,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Viewport;
    use crate::error::WaveError;
    use crate::render::NullBackend;

    #[test]
    fn zero_sized_viewport_is_rejected() {
        let result = Wave::new(
            NullBackend::new(),
            WaveConfig::new(Viewport::new(0, 300)),
        );
        assert!(matches!(result, Err(WaveError::InvalidViewport { .. })));
    }

    #[test]
    fn new_wave_is_ready_and_empty() {
        let wave = Wave::new(NullBackend::new(), WaveConfig::new(Viewport::new(400, 300)))
            .expect("wave");
        assert_eq!(wave.state(), WaveState::Ready);
        assert_eq!(wave.layer_count(), 0);
        assert!(wave.context().regions().contains_key("main"));
    }
}

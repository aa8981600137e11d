use std::sync::Arc;

use serde::Serialize;

use crate::interaction::{Brush, InteractionState, TooltipController, TooltipMode};
use crate::layer::Layer;
use crate::render::Backend;

use super::WaveContext;
use super::binder::Binding;

/// Health of the orchestrator after contained layer failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveState {
    #[default]
    Ready,
    /// At least one layer operation failed and was contained.
    Warning,
}

/// A contained layer failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerWarning {
    pub layer: String,
    pub operation: &'static str,
    pub error: String,
}

/// Brush strip state and the layers whose X scales it drives.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct BrushBinding {
    pub(super) brush: Brush,
    pub(super) layers: Vec<String>,
}

/// Top-level orchestrator consumed by host applications.
///
/// `Wave` owns the backend, the layer registry, coordinate bindings, the
/// brush and the tooltip. Every layer call goes through the registry error
/// boundary.
pub struct Wave<B: Backend> {
    pub(super) backend: B,
    pub(super) context: Arc<WaveContext>,
    pub(super) layers: Vec<Box<dyn Layer>>,
    pub(super) state: WaveState,
    pub(super) warnings: Vec<LayerWarning>,
    pub(super) bindings: Vec<Binding>,
    pub(super) brush: Option<BrushBinding>,
    pub(super) interaction: InteractionState,
    pub(super) tooltip: TooltipController,
}

impl<B: Backend> Wave<B> {
    #[must_use]
    pub fn context(&self) -> &Arc<WaveContext> {
        &self.context
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[must_use]
    pub fn into_backend(self) -> B {
        self.backend
    }

    #[must_use]
    pub fn state(&self) -> WaveState {
        self.state
    }

    #[must_use]
    pub fn warnings(&self) -> &[LayerWarning] {
        &self.warnings
    }

    /// Drops recorded warnings and returns to `Ready`.
    pub fn clear_warnings(&mut self) {
        self.warnings.clear();
        self.state = WaveState::Ready;
    }

    #[must_use]
    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    #[must_use]
    pub fn tooltip(&self) -> &TooltipController {
        &self.tooltip
    }

    pub fn set_tooltip_mode(&mut self, mode: TooltipMode) {
        self.tooltip.set_mode(mode);
    }

    /// Active layer ids in creation order.
    #[must_use]
    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.id()).collect()
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&dyn Layer> {
        self.layers
            .iter()
            .find(|layer| layer.id() == id)
            .map(|layer| layer.as_ref())
    }

    pub fn layer_mut(&mut self, id: &str) -> Option<&mut dyn Layer> {
        match self.layers.iter_mut().find(|layer| layer.id() == id) {
            Some(layer) => Some(layer.as_mut()),
            None => None,
        }
    }

    pub(super) fn position(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id() == id)
    }
}

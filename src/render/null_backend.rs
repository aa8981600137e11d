use crate::error::{WaveError, WaveResult};
use crate::render::element::{ElementConfig, GroupKey, TransitionPlan};
use crate::render::{Backend, BackendKind};

/// Headless backend used by tests and server-side layout.
///
/// It keeps nothing but counters, and still validates element geometry so
/// tests catch NaN pixels before a real backend sees them.
#[derive(Debug, Default)]
pub struct NullBackend {
    pub emit_count: usize,
    pub last_element_count: usize,
    pub removed_layers: Vec<String>,
    detached: bool,
}

impl NullBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detach(&mut self) {
        self.detached = true;
    }
}

impl Backend for NullBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Null
    }

    fn emit(
        &mut self,
        key: &GroupKey,
        elements: Vec<ElementConfig>,
        _plan: TransitionPlan,
    ) -> WaveResult<()> {
        if self.detached {
            return Err(WaveError::Backend(format!("root detached while drawing `{key}`")));
        }
        for element in &elements {
            element.validate()?;
        }
        self.emit_count += 1;
        self.last_element_count = elements.len();
        Ok(())
    }

    fn remove_layer(&mut self, layer: &str) -> WaveResult<()> {
        self.removed_layers.push(layer.to_owned());
        Ok(())
    }

    fn elements(&self) -> Vec<(&GroupKey, &ElementConfig)> {
        Vec::new()
    }
}

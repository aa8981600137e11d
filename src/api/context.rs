use tracing::{Span, debug_span};

use crate::core::{LayoutContext, Rect, Regions, Viewport};
use crate::error::{WaveError, WaveResult};
use crate::render::Theme;

use super::WaveConfig;

/// Explicit context handed to every layer at construction.
///
/// Holds what would otherwise be process globals: computed layout regions,
/// theme palette and the `wave` tracing span of this chart.
#[derive(Debug)]
pub struct WaveContext {
    id: String,
    viewport: Viewport,
    regions: Regions,
    theme: Theme,
    span: Span,
}

impl WaveContext {
    #[must_use]
    pub fn new(id: impl Into<String>, viewport: Viewport, regions: Regions, theme: Theme) -> Self {
        let id = id.into();
        let span = debug_span!("wave", id = %id);
        Self {
            id,
            viewport,
            regions,
            theme,
            span,
        }
    }

    /// Validates the viewport and computes regions with the configured layout.
    pub fn from_config(config: &WaveConfig) -> WaveResult<Self> {
        if !config.viewport.is_valid() {
            return Err(WaveError::InvalidViewport {
                width: config.viewport.width,
                height: config.viewport.height,
            });
        }
        let layout = LayoutContext::new(config.viewport, config.padding);
        let regions = config.layout.compute(&layout);
        Ok(Self::new(
            config.id.clone(),
            config.viewport,
            regions,
            config.theme(),
        ))
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn regions(&self) -> &Regions {
        &self.regions
    }

    pub fn region(&self, name: &str) -> WaveResult<Rect> {
        self.regions
            .get(name)
            .copied()
            .ok_or_else(|| WaveError::InvalidData(format!("unknown layout region `{name}`")))
    }

    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }
}

#[cfg(test)]
pub(crate) fn test_context() -> std::sync::Arc<WaveContext> {
    let mut regions = Regions::new();
    regions.insert("main".to_owned(), Rect::new(0.0, 100.0, 0.0, 200.0));
    regions.insert("title".to_owned(), Rect::new(0.0, 20.0, 0.0, 200.0));
    regions.insert("legend".to_owned(), Rect::new(0.0, 20.0, 0.0, 200.0));
    std::sync::Arc::new(WaveContext::new(
        "test",
        Viewport::new(200, 100),
        regions,
        Theme::default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_regions_are_reported() {
        let context = test_context();
        assert_eq!(context.region("main").expect("main").width(), 200.0);
        assert!(matches!(
            context.region("facet9"),
            Err(WaveError::InvalidData(_))
        ));
    }

    #[test]
    fn invalid_viewport_is_rejected() {
        let config = WaveConfig::default().with_viewport(Viewport::new(0, 10));
        assert!(matches!(
            WaveContext::from_config(&config),
            Err(WaveError::InvalidViewport { width: 0, height: 10 })
        ));
    }
}

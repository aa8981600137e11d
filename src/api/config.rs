use serde::{Deserialize, Serialize};

use crate::core::{LayoutPreset, Padding, Viewport};
use crate::error::{WaveError, WaveResult};
use crate::interaction::TooltipMode;
use crate::render::Theme;

/// Orchestrator bootstrap configuration.
///
/// Serializable so hosts can keep chart setup next to their layer schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaveConfig {
    pub id: String,
    pub viewport: Viewport,
    /// `[top, right, bottom, left]`.
    pub padding: Padding,
    /// Ordered CSS colours; empty means the built-in theme.
    pub theme: Vec<String>,
    pub layout: LayoutPreset,
    pub tooltip: TooltipMode,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            id: "wave".to_owned(),
            viewport: Viewport::default(),
            padding: Padding::default(),
            theme: Vec::new(),
            layout: LayoutPreset::Standard,
            tooltip: TooltipMode::Single,
        }
    }
}

impl WaveConfig {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    #[must_use]
    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    #[must_use]
    pub fn with_theme<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.theme = colors.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutPreset) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_tooltip(mut self, tooltip: TooltipMode) -> Self {
        self.tooltip = tooltip;
        self
    }

    /// Resolved theme. Unparseable colours are dropped with a warning.
    #[must_use]
    pub fn theme(&self) -> Theme {
        if self.theme.is_empty() {
            return Theme::default();
        }
        let colors: Vec<&str> = self.theme.iter().map(String::as_str).collect();
        Theme::from_css(&colors)
    }

    pub fn to_json_pretty(&self) -> WaveResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| WaveError::InvalidData(format!("failed to serialize config: {e}")))
    }

    pub fn from_json_str(input: &str) -> WaveResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| WaveError::InvalidData(format!("failed to parse config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = WaveConfig::from_json_str(
            r#"{"viewport": {"width": 800, "height": 300}, "padding": [10, 20, 30, 40],
                "layout": {"type": "facet", "rows": 2, "cols": 2}}"#,
        )
        .expect("config");
        assert_eq!(config.viewport, Viewport::new(800, 300));
        assert_eq!(config.padding, Padding::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(config.layout, LayoutPreset::Facet { rows: 2, cols: 2 });
        assert_eq!(config.tooltip, TooltipMode::Single);
        assert_eq!(config.id, "wave");
    }

    #[test]
    fn empty_theme_uses_builtin_colors() {
        assert_eq!(WaveConfig::default().theme(), Theme::default());
        let theme = WaveConfig::default().with_theme(["#ff0000", "nope"]).theme();
        assert_eq!(theme.colors.len(), 1);
    }

    #[test]
    fn config_survives_json() {
        let config = WaveConfig::new(Viewport::new(320, 240)).with_id("sales");
        let text = config.to_json_pretty().expect("serialize");
        assert_eq!(WaveConfig::from_json_str(&text).expect("parse"), config);
    }
}

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::render::color::{Color, lch_palette};

/// Ordered theme colors plus neutral colors used by axes and text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub colors: Vec<Color>,
    pub text: Color,
    pub axis: Color,
    pub font_size: f64,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            colors: [
                (0.184, 0.306, 0.663),
                (0.365, 0.639, 0.894),
                (0.463, 0.792, 0.639),
                (0.969, 0.741, 0.298),
                (0.914, 0.392, 0.337),
            ]
            .into_iter()
            .map(|(r, g, b)| Color::rgb(r, g, b))
            .collect(),
            text: Color::rgb(0.8, 0.8, 0.8),
            axis: Color::rgba(1.0, 1.0, 1.0, 0.45),
            font_size: 12.0,
        }
    }
}

impl Theme {
    #[must_use]
    pub fn from_css(colors: &[&str]) -> Self {
        let colors = colors
            .iter()
            .filter_map(|css| match Color::parse(css) {
                Ok(color) => Some(color),
                Err(err) => {
                    warn!(color = *css, error = %err, "dropping theme color");
                    None
                }
            })
            .collect();
        Self {
            colors,
            ..Self::default()
        }
    }

    /// `count` colors interpolated in LCH space across the theme stops.
    #[must_use]
    pub fn palette(&self, count: usize) -> Vec<Color> {
        lch_palette(&self.colors, count)
    }
}

#[cfg(test)]
mod tests {
    use super::Theme;

    #[test]
    fn palette_is_derived_not_indexed() {
        let theme = Theme::from_css(&["#000000", "#ffffff"]);
        let palette = theme.palette(3);
        assert_eq!(palette.len(), 3);
        assert_eq!(palette[0].to_css(), "#000000");
        assert_eq!(palette[2].to_css(), "#ffffff");
        // middle of the L axis, not either stop
        assert_ne!(palette[1].to_css(), "#000000");
        assert_ne!(palette[1].to_css(), "#ffffff");
    }

    #[test]
    fn invalid_theme_colors_are_skipped() {
        let theme = Theme::from_css(&["#123456", "not-a-color"]);
        assert_eq!(theme.colors.len(), 1);
        assert_eq!(theme.palette(2).len(), 2);
    }
}

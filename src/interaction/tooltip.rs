use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::layer::format_value;
use crate::render::{Color, ElementConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipMode {
    /// The hovered element's own fields.
    #[default]
    Single,
    /// Every element sharing the hovered element's dimension.
    Group,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipItem {
    pub label: String,
    pub value: String,
    pub color: Option<Color>,
}

impl TooltipItem {
    fn from_element(element: &ElementConfig) -> Option<Self> {
        let source = element.source.as_ref()?;
        let value = match source.value {
            Some(value) => format_value(value),
            None => source
                .row
                .iter()
                .skip(1)
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        };
        Some(Self {
            label: source.category.clone(),
            value,
            color: element.style.fill.or(element.style.stroke),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipContent {
    pub title: String,
    pub items: Vec<TooltipItem>,
}

impl TooltipContent {
    /// Rough box size for placement: widest line by line count.
    #[must_use]
    pub fn estimated_size(&self, font_size: f64) -> (f64, f64) {
        let padding = font_size;
        let widest = self
            .items
            .iter()
            .map(|item| item.label.chars().count() + item.value.chars().count() + 2)
            .chain(std::iter::once(self.title.chars().count()))
            .max()
            .unwrap_or(0);
        let lines = self.items.len() + 1;
        (
            widest as f64 * font_size * 0.6 + padding,
            lines as f64 * font_size * 1.5 + padding,
        )
    }
}

/// Top-left corner of the tooltip box in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TooltipPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipUpdate {
    pub content: TooltipContent,
    pub position: TooltipPosition,
    /// `false` when the content equals what is already shown.
    pub rerendered: bool,
}

/// Builds tooltip content and keeps it inside the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipController {
    mode: TooltipMode,
    viewport: (f64, f64),
    offset: f64,
    font_size: f64,
    shown: Option<TooltipContent>,
    render_count: usize,
}

impl TooltipController {
    #[must_use]
    pub fn new(mode: TooltipMode, viewport: (f64, f64)) -> Self {
        Self {
            mode,
            viewport,
            offset: 10.0,
            font_size: 12.0,
            shown: None,
            render_count: 0,
        }
    }

    #[must_use]
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    #[must_use]
    pub fn mode(&self) -> TooltipMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TooltipMode) {
        self.mode = mode;
    }

    /// How many times content was actually re-rendered.
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.render_count
    }

    #[must_use]
    pub fn shown(&self) -> Option<&TooltipContent> {
        self.shown.as_ref()
    }

    /// Content for `hovered`. In group mode `backup` is searched for elements
    /// sharing the hovered dimension, whatever their element type.
    #[must_use]
    pub fn content(&self, hovered: &ElementConfig, backup: &[&ElementConfig]) -> TooltipContent {
        let dimension = hovered
            .source
            .as_ref()
            .map(|source| source.dimension.clone())
            .unwrap_or_default();
        let items = match self.mode {
            TooltipMode::Single => TooltipItem::from_element(hovered).into_iter().collect(),
            TooltipMode::Group => backup
                .iter()
                .filter(|element| {
                    element
                        .source
                        .as_ref()
                        .is_some_and(|source| source.dimension == dimension)
                })
                .filter_map(|element| TooltipItem::from_element(element))
                .collect(),
        };
        TooltipContent {
            title: dimension,
            items,
        }
    }

    /// Places the box beside the cursor, flipping left or up at the viewport edge.
    #[must_use]
    pub fn position(&self, cursor: (f64, f64), size: (f64, f64)) -> TooltipPosition {
        let (width, height) = size;
        let mut x = cursor.0 + self.offset;
        if x + width > self.viewport.0 {
            x = cursor.0 - self.offset - width;
        }
        let mut y = cursor.1 + self.offset;
        if y + height > self.viewport.1 {
            y = cursor.1 - self.offset - height;
        }
        TooltipPosition { x, y }
    }

    pub fn show(
        &mut self,
        hovered: &ElementConfig,
        backup: &[&ElementConfig],
        cursor: (f64, f64),
    ) -> TooltipUpdate {
        let content = self.content(hovered, backup);
        let position = self.position(cursor, content.estimated_size(self.font_size));
        let rerendered = self.shown.as_ref() != Some(&content);
        if rerendered {
            self.render_count += 1;
            self.shown = Some(content.clone());
            trace!(items = content.items.len(), "tooltip rendered");
        }
        TooltipUpdate {
            content,
            position,
            rerendered,
        }
    }

    pub fn hide(&mut self) {
        self.shown = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Cell;
    use crate::render::{ElementSource, Geometry, ShapeKind, ShapeStyle};

    fn element(kind: ShapeKind, dimension: &str, category: &str, value: f64) -> ElementConfig {
        ElementConfig::new(kind.as_str(), kind, Geometry::Circle { cx: 0.0, cy: 0.0, r: 1.0 })
            .with_style(ShapeStyle::filled(Color::BLACK))
            .with_source(Some(ElementSource {
                layer_id: "layer".to_owned(),
                element_type: kind.as_str().to_owned(),
                dimension: dimension.to_owned(),
                category: category.to_owned(),
                value: Some(value),
                row: vec![Cell::from(dimension)],
            }))
    }

    #[test]
    fn group_mode_collects_siblings_across_types() {
        let rect = element(ShapeKind::Rect, "2020", "a", 10.0);
        let circle = element(ShapeKind::Circle, "2020", "b", 2.5);
        let other = element(ShapeKind::Rect, "2021", "a", 15.0);
        let backup = [&rect, &circle, &other];

        let controller = TooltipController::new(TooltipMode::Group, (200.0, 100.0));
        let content = controller.content(&rect, &backup);
        assert_eq!(content.title, "2020");
        let values: Vec<_> = content.items.iter().map(|item| item.value.as_str()).collect();
        assert_eq!(values, ["10", "2.5"]);

        let single = TooltipController::new(TooltipMode::Single, (200.0, 100.0));
        assert_eq!(single.content(&rect, &backup).items.len(), 1);
    }

    #[test]
    fn identical_content_is_not_rerendered() {
        let rect = element(ShapeKind::Rect, "2020", "a", 10.0);
        let mut controller = TooltipController::new(TooltipMode::Single, (200.0, 100.0));
        assert!(controller.show(&rect, &[], (10.0, 10.0)).rerendered);
        let update = controller.show(&rect, &[], (12.0, 10.0));
        assert!(!update.rerendered);
        assert_eq!(update.position.x, 22.0);
        assert_eq!(controller.render_count(), 1);
        controller.hide();
        assert!(controller.show(&rect, &[], (12.0, 10.0)).rerendered);
    }

    #[test]
    fn box_flips_at_the_viewport_edge() {
        let controller = TooltipController::new(TooltipMode::Single, (200.0, 100.0));
        let position = controller.position((190.0, 95.0), (50.0, 30.0));
        assert_eq!(position.x, 130.0);
        assert_eq!(position.y, 55.0);
        let position = controller.position((10.0, 10.0), (50.0, 30.0));
        assert_eq!(position.x, 20.0);
        assert_eq!(position.y, 20.0);
    }
}

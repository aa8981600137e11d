use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{Padding, Rect, Viewport};

/// Named regions in insertion order.
pub type Regions = IndexMap<String, Rect>;

/// Fraction of the container height reserved for the brush strip.
pub const BRUSH_HEIGHT_RATIO: f64 = 0.1;
/// Gutter between facet cells as a fraction of the cell size.
pub const FACET_GUTTER_RATIO: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutContext {
    pub container_width: f64,
    pub container_height: f64,
    pub padding: Padding,
}

impl LayoutContext {
    #[must_use]
    pub fn new(viewport: Viewport, padding: Padding) -> Self {
        Self {
            container_width: f64::from(viewport.width),
            container_height: f64::from(viewport.height),
            padding,
        }
    }
}

/// Built-in layout functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LayoutPreset {
    #[default]
    Standard,
    StandardWithBrush,
    Facet { rows: usize, cols: usize },
}

impl LayoutPreset {
    #[must_use]
    pub fn compute(self, context: &LayoutContext) -> Regions {
        match self {
            Self::Standard => standard(context, false),
            Self::StandardWithBrush => standard(context, true),
            Self::Facet { rows, cols } => facet(context, rows, cols),
        }
    }
}

/// Title and legend band on top, main plot padded on every side, axis strips
/// in the padding, optional brush strip at the bottom.
#[must_use]
pub fn standard(context: &LayoutContext, has_brush: bool) -> Regions {
    let width = context.container_width.max(0.0);
    let height = context.container_height.max(0.0);
    let padding = context.padding;

    let brush_height = if has_brush {
        height * BRUSH_HEIGHT_RATIO
    } else {
        0.0
    };
    let plot_bottom = height - brush_height;
    let left = padding.left.min(width);
    let right = (width - padding.right).max(left);
    let top = padding.top.min(plot_bottom);
    let bottom = (plot_bottom - padding.bottom).max(top);

    let mut regions = Regions::new();
    regions.insert("title".to_owned(), Rect::new(0.0, top / 2.0, left, right));
    regions.insert("legend".to_owned(), Rect::new(top / 2.0, top, left, right));
    regions.insert("main".to_owned(), Rect::new(top, bottom, left, right));
    regions.insert(
        "axisX".to_owned(),
        Rect::new(bottom, plot_bottom.max(bottom), left, right),
    );
    regions.insert("axisY".to_owned(), Rect::new(top, bottom, 0.0, left));
    regions.insert("axisYR".to_owned(), Rect::new(top, bottom, right, width));
    if has_brush {
        regions.insert("brush".to_owned(), Rect::new(plot_bottom, height, left, right));
    }
    regions
}

/// Standard layout with the main region split into a `rows x cols` grid.
///
/// Cells are named `facet{row * cols + col}` in row-major order.
#[must_use]
pub fn facet(context: &LayoutContext, rows: usize, cols: usize) -> Regions {
    let mut regions = standard(context, false);
    let Some(main) = regions.get("main").copied() else {
        return regions;
    };
    if rows == 0 || cols == 0 {
        return regions;
    }

    let cell_width = main.width() / (cols as f64 + (cols - 1) as f64 * FACET_GUTTER_RATIO);
    let cell_height = main.height() / (rows as f64 + (rows - 1) as f64 * FACET_GUTTER_RATIO);
    let gutter_x = cell_width * FACET_GUTTER_RATIO;
    let gutter_y = cell_height * FACET_GUTTER_RATIO;

    for row in 0..rows {
        for col in 0..cols {
            let left = main.left() + col as f64 * (cell_width + gutter_x);
            let top = main.top() + row as f64 * (cell_height + gutter_y);
            regions.insert(
                format!("facet{}", row * cols + col),
                Rect::from_size(left, top, cell_width, cell_height),
            );
        }
    }
    regions
}

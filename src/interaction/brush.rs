use crate::core::Rect;

/// Horizontal range brush over a strip below the main plot.
///
/// A selection `[x0, x1]` inside the strip zooms the bound X scales so the
/// selected share of the strip fills the main region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    strip: Rect,
    main: Rect,
    selection: Option<(f64, f64)>,
}

impl Brush {
    #[must_use]
    pub fn new(strip: Rect, main: Rect) -> Self {
        Self {
            strip,
            main,
            selection: None,
        }
    }

    #[must_use]
    pub fn strip(&self) -> Rect {
        self.strip
    }

    #[must_use]
    pub fn selection(&self) -> Option<(f64, f64)> {
        self.selection
    }

    /// Orders and clamps a drag span to the strip. `None` for an empty span.
    fn normalize(&self, x0: f64, x1: f64) -> Option<(f64, f64)> {
        let low = x0.min(x1).clamp(self.strip.left(), self.strip.right());
        let high = x0.max(x1).clamp(self.strip.left(), self.strip.right());
        (high - low > f64::EPSILON).then_some((low, high))
    }

    /// `strip width / selection width`, `None` for an empty selection.
    #[must_use]
    pub fn zoom_factor(&self, x0: f64, x1: f64) -> Option<f64> {
        let (low, high) = self.normalize(x0, x1)?;
        Some(self.strip.width() / (high - low))
    }

    /// Pixel range the bound scales take for a selection.
    ///
    /// The selection's left edge lands on the main region's left edge.
    #[must_use]
    pub fn brushed_range(&self, x0: f64, x1: f64) -> Option<(f64, f64)> {
        let (low, _) = self.normalize(x0, x1)?;
        let zoom = self.zoom_factor(x0, x1)?;
        let ratio = self.main.width() / self.strip.width().max(f64::EPSILON);
        let start = self.main.left() - (low - self.strip.left()) * zoom * ratio;
        Some((start, start + self.main.width() * zoom))
    }

    /// Records a selection; an empty span clears it. Returns the new range.
    pub fn select(&mut self, x0: f64, x1: f64) -> Option<(f64, f64)> {
        self.selection = self.normalize(x0, x1);
        self.brushed_range(x0, x1)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn brush() -> Brush {
        Brush::new(
            Rect::new(90.0, 100.0, 0.0, 200.0),
            Rect::new(0.0, 80.0, 0.0, 200.0),
        )
    }

    #[test]
    fn half_selection_doubles_the_range() {
        let brush = brush();
        assert_relative_eq!(brush.zoom_factor(0.0, 100.0).expect("zoom"), 2.0, epsilon = 1e-9);
        let (start, end) = brush.brushed_range(100.0, 0.0).expect("range");
        assert_relative_eq!(start, 0.0, epsilon = 1e-9);
        assert_relative_eq!(end, 400.0, epsilon = 1e-9);
    }

    #[test]
    fn selection_anchor_lands_on_the_left_edge() {
        let (start, end) = brush().brushed_range(100.0, 200.0).expect("range");
        assert_relative_eq!(start, -200.0, epsilon = 1e-9);
        assert_relative_eq!(end, 200.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_selection_resets() {
        let mut brush = brush();
        assert!(brush.select(50.0, 150.0).is_some());
        assert!(brush.select(70.0, 70.0).is_none());
        assert_eq!(brush.selection(), None);
    }
}

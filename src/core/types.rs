use serde::{Deserialize, Serialize};

/// Container size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(600, 400)
    }
}

/// Outer padding around the main plot, serialized as `[top, right, bottom, left]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    #[must_use]
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }
}

impl Default for Padding {
    fn default() -> Self {
        Self::new(60.0, 50.0, 50.0, 50.0)
    }
}

impl From<[f64; 4]> for Padding {
    fn from([top, right, bottom, left]: [f64; 4]) -> Self {
        Self::new(top, right, bottom, left)
    }
}

impl From<Padding> for [f64; 4] {
    fn from(padding: Padding) -> Self {
        [padding.top, padding.right, padding.bottom, padding.left]
    }
}

/// Named rectangular layout region.
///
/// `width` and `height` are always derived from the edges; every mutation goes
/// through [`Rect::set_edges`] so they cannot drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    top: f64,
    bottom: f64,
    left: f64,
    right: f64,
    width: f64,
    height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
            width: right - left,
            height: bottom - top,
        }
    }

    #[must_use]
    pub fn from_size(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::new(top, top + height, left, left + width)
    }

    pub fn set_edges(&mut self, top: f64, bottom: f64, left: f64, right: f64) {
        *self = Self::new(top, bottom, left, right);
    }

    #[must_use]
    pub fn top(&self) -> f64 {
        self.top
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    #[must_use]
    pub fn left(&self) -> f64 {
        self.left
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.right
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            self.left + self.width / 2.0,
            self.top + self.height / 2.0,
        )
    }

    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::{Padding, Rect};

    #[test]
    fn rect_derives_size_from_edges() {
        let mut rect = Rect::new(10.0, 110.0, 20.0, 220.0);
        assert_eq!(rect.width(), 200.0);
        assert_eq!(rect.height(), 100.0);

        rect.set_edges(0.0, 50.0, 0.0, 40.0);
        assert_eq!(rect.width(), 40.0);
        assert_eq!(rect.height(), 50.0);
    }

    #[test]
    fn padding_round_trips_through_array_form() {
        let padding: Padding = serde_json::from_str("[1, 2, 3, 4]").expect("padding");
        assert_eq!(padding, Padding::new(1.0, 2.0, 3.0, 4.0));
        let json = serde_json::to_string(&padding).expect("serialize");
        assert_eq!(json, "[1.0,2.0,3.0,4.0]");
    }
}

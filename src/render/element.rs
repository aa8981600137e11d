use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::Cell;
use crate::error::{WaveError, WaveResult};
use crate::render::color::Color;
use crate::render::path::PathData;

/// Primitive family an element was produced by. Also the suffix of the
/// element events (`click-rect`, `mouseover-arc`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Arc,
    Rect,
    Circle,
    Curve,
    Area,
    Polygon,
    Text,
    Path,
    Ribbon,
    Line,
}

impl ShapeKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Arc => "arc",
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Curve => "curve",
            Self::Area => "area",
            Self::Polygon => "polygon",
            Self::Text => "text",
            Self::Path => "path",
            Self::Ribbon => "ribbon",
            Self::Line => "line",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    #[default]
    Middle,
    End,
}

impl TextAnchor {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// Pixel-space geometry, identical for every backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Geometry {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Path(PathData),
    Text {
        x: f64,
        y: f64,
        text: String,
        font_size: f64,
        anchor: TextAnchor,
        rotation: f64,
    },
}

impl Geometry {
    /// Path string for path geometry, `None` for the basic shapes.
    #[must_use]
    pub fn path_string(&self) -> Option<String> {
        match self {
            Self::Path(path) => Some(path.to_svg()),
            _ => None,
        }
    }

    /// Axis-aligned bounds `(left, top, right, bottom)`.
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        match self {
            Self::Rect {
                x,
                y,
                width,
                height,
                ..
            } => Some((
                x.min(x + width),
                y.min(y + height),
                x.max(x + width),
                y.max(y + height),
            )),
            Self::Circle { cx, cy, r } => Some((cx - r, cy - r, cx + r, cy + r)),
            Self::Line { x1, y1, x2, y2 } => {
                Some((x1.min(*x2), y1.min(*y2), x1.max(*x2), y1.max(*y2)))
            }
            Self::Path(path) => path.bounds(),
            Self::Text {
                x,
                y,
                text,
                font_size,
                anchor,
                ..
            } => {
                let width = text.chars().count() as f64 * font_size * 0.6;
                let left = match anchor {
                    TextAnchor::Start => *x,
                    TextAnchor::Middle => x - width / 2.0,
                    TextAnchor::End => x - width,
                };
                Some((left, y - font_size, left + width, *y))
            }
        }
    }

    /// Hit test used for pointer events. Paths use their bounding box.
    #[must_use]
    pub fn contains(&self, px: f64, py: f64, tolerance: f64) -> bool {
        match self {
            Self::Circle { cx, cy, r } => (px - cx).hypot(py - cy) <= r + tolerance,
            Self::Line { x1, y1, x2, y2 } => {
                distance_to_segment((px, py), (*x1, *y1), (*x2, *y2)) <= tolerance.max(1.0)
            }
            _ => self.bounds().is_some_and(|(left, top, right, bottom)| {
                px >= left - tolerance
                    && px <= right + tolerance
                    && py >= top - tolerance
                    && py <= bottom + tolerance
            }),
        }
    }

    fn numbers(&self) -> Vec<f64> {
        match self {
            Self::Rect {
                x,
                y,
                width,
                height,
                rx,
            } => vec![*x, *y, *width, *height, *rx],
            Self::Circle { cx, cy, r } => vec![*cx, *cy, *r],
            Self::Line { x1, y1, x2, y2 } => vec![*x1, *y1, *x2, *y2],
            Self::Path(path) => path
                .bounds()
                .map(|(a, b, c, d)| vec![a, b, c, d])
                .unwrap_or_default(),
            Self::Text {
                x,
                y,
                font_size,
                rotation,
                ..
            } => vec![*x, *y, *font_size, *rotation],
        }
    }
}

fn distance_to_segment(point: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return (point.0 - a.0).hypot(point.1 - a.1);
    }
    let t = (((point.0 - a.0) * dx + (point.1 - a.1) * dy) / length_sq).clamp(0.0, 1.0);
    (point.0 - (a.0 + t * dx)).hypot(point.1 - (a.1 + t * dy))
}

/// Fully resolved paint attributes of one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeStyle {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub opacity: f64,
    pub fill_opacity: f64,
    pub stroke_opacity: f64,
    pub stroke_width: f64,
    pub mask: Option<String>,
    pub filter: Option<String>,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            opacity: 1.0,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
            stroke_width: 1.0,
            mask: None,
            filter: None,
        }
    }
}

impl ShapeStyle {
    #[must_use]
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn stroked(color: Color, width: f64) -> Self {
        Self {
            stroke: Some(color),
            stroke_width: width,
            ..Self::default()
        }
    }
}

/// Data an element was drawn from. Carried into events and tooltips.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ElementSource {
    pub layer_id: String,
    pub element_type: String,
    /// Dimension label (category axis value) shared by sibling elements.
    pub dimension: String,
    /// Series or column the value belongs to.
    pub category: String,
    pub value: Option<f64>,
    pub row: Vec<Cell>,
}

/// One element ready for emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementConfig {
    pub class: String,
    pub kind: ShapeKind,
    pub geometry: Geometry,
    pub style: ShapeStyle,
    pub transform_origin: Option<(f64, f64)>,
    pub source: Option<ElementSource>,
}

impl ElementConfig {
    #[must_use]
    pub fn new(class: impl Into<String>, kind: ShapeKind, geometry: Geometry) -> Self {
        Self {
            class: class.into(),
            kind,
            geometry,
            style: ShapeStyle::default(),
            transform_origin: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: Option<ElementSource>) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_transform_origin(mut self, origin: (f64, f64)) -> Self {
        self.transform_origin = Some(origin);
        self
    }

    pub fn validate(&self) -> WaveResult<()> {
        if self.geometry.numbers().iter().any(|value| !value.is_finite()) {
            return Err(WaveError::InvalidData(format!(
                "element `{}` has non-finite geometry",
                self.class
            )));
        }
        for color in [self.style.fill, self.style.stroke].into_iter().flatten() {
            color.validate()?;
        }
        Ok(())
    }
}

/// Per-element rewrite applied right before emission.
pub type Mapping = Arc<dyn Fn(ElementConfig) -> ElementConfig + Send + Sync>;

/// Builds a [`Mapping`] from a closure.
pub fn mapping<F>(function: F) -> Mapping
where
    F: Fn(ElementConfig) -> ElementConfig + Send + Sync + 'static,
{
    Arc::new(function)
}

/// Declared timing of a backend-native transition, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transition {
    pub duration: u32,
    pub delay: u32,
}

/// Transitions applied to entering and updated elements of one emission.
/// `None` means the attributes are set instantly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TransitionPlan {
    pub enter: Option<Transition>,
    pub update: Option<Transition>,
}

impl TransitionPlan {
    /// Snaps every element, superseding any running transition.
    #[must_use]
    pub fn instant() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionOptions {
    pub enabled: bool,
    pub duration: u32,
    pub delay: u32,
}

impl Default for TransitionOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            duration: 2000,
            delay: 0,
        }
    }
}

impl TransitionOptions {
    #[must_use]
    pub fn transition(self) -> Option<Transition> {
        (self.enabled && self.duration > 0).then_some(Transition {
            duration: self.duration,
            delay: self.delay,
        })
    }
}

/// `animation` key of a layer schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationOptions {
    pub enter: TransitionOptions,
    pub update: TransitionOptions,
}

impl AnimationOptions {
    #[must_use]
    pub fn plan(self) -> TransitionPlan {
        TransitionPlan {
            enter: self.enter.transition(),
            update: self.update.transition(),
        }
    }
}

/// Address of one element group: owning layer plus class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    pub layer: String,
    pub class: String,
}

impl GroupKey {
    #[must_use]
    pub fn new(layer: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            class: class.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.layer, self.class)
    }
}

//! Draw primitives.
//!
//! Every primitive resolves its per-element configuration in a pure step
//! (`resolve_*`) and then hands the list to the backend in one emission.
//! Geometry is synthesized before dispatch, so SVG and canvas receive the same
//! numbers.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::WaveResult;
use crate::render::attr::{Attr, ShapeAttrs, get_attr};
use crate::render::color::Color;
use crate::render::element::{
    ElementConfig, ElementSource, Geometry, GroupKey, Mapping, ShapeKind, ShapeStyle, TextAnchor,
    TransitionPlan,
};
use crate::render::path::{self, CurveKind, PathData};
use crate::render::Backend;

/// Emission target: backend, owning layer and the transitions of this pass.
pub struct DrawTarget<'a> {
    pub backend: &'a mut dyn Backend,
    pub layer: &'a str,
    pub plan: TransitionPlan,
}

impl<'a> DrawTarget<'a> {
    #[must_use]
    pub fn new(backend: &'a mut dyn Backend, layer: &'a str, plan: TransitionPlan) -> Self {
        Self {
            backend,
            layer,
            plan,
        }
    }

    /// Emits resolved elements as the group `class`.
    pub fn emit(&mut self, class: &str, elements: Vec<ElementConfig>) -> WaveResult<()> {
        trace!(layer = self.layer, class, count = elements.len(), "emit");
        let key = GroupKey::new(self.layer, class);
        self.backend.emit(&key, elements, self.plan)
    }
}

/// Inputs shared by every primitive.
#[derive(Clone, Default)]
pub struct DrawCommon {
    pub class: String,
    pub attrs: ShapeAttrs,
    pub defaults: ShapeStyle,
    pub sources: Vec<ElementSource>,
    pub mapping: Option<Mapping>,
}

impl DrawCommon {
    #[must_use]
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attrs(mut self, attrs: ShapeAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: ShapeStyle) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn with_sources(mut self, sources: Vec<ElementSource>) -> Self {
        self.sources = sources;
        self
    }

    #[must_use]
    pub fn with_mapping(mut self, mapping: Option<Mapping>) -> Self {
        self.mapping = mapping;
        self
    }

    fn finish(
        &self,
        index: usize,
        kind: ShapeKind,
        geometry: Geometry,
        origin: Option<(f64, f64)>,
    ) -> ElementConfig {
        let mut element = ElementConfig::new(self.class.clone(), kind, geometry)
            .with_style(self.attrs.resolve(index, &self.defaults))
            .with_source(self.sources.get(index).cloned());
        element.transform_origin = origin;
        match &self.mapping {
            Some(mapping) => mapping(element),
            None => element,
        }
    }
}

impl std::fmt::Debug for DrawCommon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawCommon")
            .field("class", &self.class)
            .field("attrs", &self.attrs)
            .field("sources", &self.sources.len())
            .field("mapping", &self.mapping.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectSpec {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where a rect scales from when animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RectOrigin {
    /// Bottom edge centre, for columns.
    #[default]
    Bottom,
    /// Left edge centre, for bars.
    Left,
    Center,
}

#[must_use]
pub fn resolve_rects(
    common: &DrawCommon,
    rects: &[RectSpec],
    rx: Option<&Attr<f64>>,
    origin: RectOrigin,
) -> Vec<ElementConfig> {
    rects
        .iter()
        .enumerate()
        .map(|(index, rect)| {
            // negative sizes flip the rect instead of vanishing
            let x = rect.x.min(rect.x + rect.width);
            let y = rect.y.min(rect.y + rect.height);
            let width = rect.width.abs();
            let height = rect.height.abs();
            let transform_origin = match origin {
                RectOrigin::Bottom => (x + width / 2.0, y + height),
                RectOrigin::Left => (x, y + height / 2.0),
                RectOrigin::Center => (x + width / 2.0, y + height / 2.0),
            };
            common.finish(
                index,
                ShapeKind::Rect,
                Geometry::Rect {
                    x,
                    y,
                    width,
                    height,
                    rx: get_attr(rx, index, 0.0),
                },
                Some(transform_origin),
            )
        })
        .collect()
}

pub fn draw_rect(
    target: &mut DrawTarget<'_>,
    common: &DrawCommon,
    rects: &[RectSpec],
    rx: Option<&Attr<f64>>,
    origin: RectOrigin,
) -> WaveResult<()> {
    target.emit(&common.class, resolve_rects(common, rects, rx, origin))
}

#[must_use]
pub fn resolve_circles(
    common: &DrawCommon,
    centers: &[(f64, f64)],
    radius: Option<&Attr<f64>>,
) -> Vec<ElementConfig> {
    centers
        .iter()
        .enumerate()
        .map(|(index, &(cx, cy))| {
            let r = get_attr(radius, index, 4.0).max(0.0);
            common.finish(
                index,
                ShapeKind::Circle,
                Geometry::Circle { cx, cy, r },
                Some((cx, cy)),
            )
        })
        .collect()
}

pub fn draw_circle(
    target: &mut DrawTarget<'_>,
    common: &DrawCommon,
    centers: &[(f64, f64)],
    radius: Option<&Attr<f64>>,
) -> WaveResult<()> {
    target.emit(&common.class, resolve_circles(common, centers, radius))
}

/// One annular sector. Angles are chart angles: 0 at 12 o'clock, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcSpec {
    pub center: (f64, f64),
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

#[must_use]
pub fn resolve_arcs(common: &DrawCommon, arcs: &[ArcSpec]) -> Vec<ElementConfig> {
    arcs.iter()
        .enumerate()
        .map(|(index, arc)| {
            let geometry = path::arc_sector(
                arc.center,
                arc.inner_radius,
                arc.outer_radius,
                arc.start_angle,
                arc.end_angle,
            );
            common.finish(
                index,
                ShapeKind::Arc,
                Geometry::Path(geometry),
                Some(arc.center),
            )
        })
        .collect()
}

pub fn draw_arc(
    target: &mut DrawTarget<'_>,
    common: &DrawCommon,
    arcs: &[ArcSpec],
) -> WaveResult<()> {
    target.emit(&common.class, resolve_arcs(common, arcs))
}

/// One polyline per series.
#[must_use]
pub fn resolve_curves(
    common: &DrawCommon,
    series: &[Vec<(f64, f64)>],
    curve: CurveKind,
) -> Vec<ElementConfig> {
    series
        .iter()
        .enumerate()
        .map(|(index, points)| {
            common.finish(
                index,
                ShapeKind::Curve,
                Geometry::Path(path::curve(points, curve)),
                None,
            )
        })
        .collect()
}

pub fn draw_curve(
    target: &mut DrawTarget<'_>,
    common: &DrawCommon,
    series: &[Vec<(f64, f64)>],
    curve: CurveKind,
) -> WaveResult<()> {
    target.emit(&common.class, resolve_curves(common, series, curve))
}

/// Band between an upper and a lower line per series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AreaSpec {
    pub upper: Vec<(f64, f64)>,
    pub lower: Vec<(f64, f64)>,
}

#[must_use]
pub fn resolve_areas(
    common: &DrawCommon,
    areas: &[AreaSpec],
    curve: CurveKind,
) -> Vec<ElementConfig> {
    areas
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            common.finish(
                index,
                ShapeKind::Area,
                Geometry::Path(path::area(&spec.upper, &spec.lower, curve)),
                None,
            )
        })
        .collect()
}

pub fn draw_area(
    target: &mut DrawTarget<'_>,
    common: &DrawCommon,
    areas: &[AreaSpec],
    curve: CurveKind,
) -> WaveResult<()> {
    target.emit(&common.class, resolve_areas(common, areas, curve))
}

/// Closed polygons; the transform origin is the vertex centroid.
#[must_use]
pub fn resolve_polygons(common: &DrawCommon, polygons: &[Vec<(f64, f64)>]) -> Vec<ElementConfig> {
    polygons
        .iter()
        .enumerate()
        .map(|(index, points)| {
            let origin = (!points.is_empty()).then(|| {
                let count = points.len() as f64;
                let (sx, sy) = points
                    .iter()
                    .fold((0.0, 0.0), |(ax, ay), &(x, y)| (ax + x, ay + y));
                (sx / count, sy / count)
            });
            common.finish(
                index,
                ShapeKind::Polygon,
                Geometry::Path(path::polyline(points, true)),
                origin,
            )
        })
        .collect()
}

pub fn draw_polygon(
    target: &mut DrawTarget<'_>,
    common: &DrawCommon,
    polygons: &[Vec<(f64, f64)>],
) -> WaveResult<()> {
    target.emit(&common.class, resolve_polygons(common, polygons))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpec {
    pub text: String,
    pub position: (f64, f64),
    #[serde(default)]
    pub rotation: f64,
}

impl TextSpec {
    #[must_use]
    pub fn new(text: impl Into<String>, position: (f64, f64)) -> Self {
        Self {
            text: text.into(),
            position,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextAttrs {
    pub font_size: Option<Attr<f64>>,
    pub anchor: Option<Attr<TextAnchor>>,
}

#[must_use]
pub fn resolve_texts(
    common: &DrawCommon,
    texts: &[TextSpec],
    attrs: &TextAttrs,
) -> Vec<ElementConfig> {
    texts
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let (x, y) = spec.position;
            common.finish(
                index,
                ShapeKind::Text,
                Geometry::Text {
                    x,
                    y,
                    text: spec.text.clone(),
                    font_size: get_attr(attrs.font_size.as_ref(), index, 12.0),
                    anchor: get_attr(attrs.anchor.as_ref(), index, TextAnchor::Middle),
                    rotation: spec.rotation,
                },
                Some((x, y)),
            )
        })
        .collect()
}

pub fn draw_text(
    target: &mut DrawTarget<'_>,
    common: &DrawCommon,
    texts: &[TextSpec],
    attrs: &TextAttrs,
) -> WaveResult<()> {
    target.emit(&common.class, resolve_texts(common, texts, attrs))
}

/// Arbitrary precomputed paths.
#[must_use]
pub fn resolve_paths(common: &DrawCommon, paths: &[PathData]) -> Vec<ElementConfig> {
    paths
        .iter()
        .enumerate()
        .map(|(index, data)| {
            common.finish(index, ShapeKind::Path, Geometry::Path(data.clone()), None)
        })
        .collect()
}

pub fn draw_path(
    target: &mut DrawTarget<'_>,
    common: &DrawCommon,
    paths: &[PathData],
) -> WaveResult<()> {
    target.emit(&common.class, resolve_paths(common, paths))
}

/// Ribbon between two spans, either on a circle (chord) or across two columns
/// (flow link).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RibbonSpec {
    Chord {
        center: (f64, f64),
        radius: f64,
        source: (f64, f64),
        target: (f64, f64),
    },
    Link {
        x0: f64,
        source: (f64, f64),
        x1: f64,
        target: (f64, f64),
    },
}

#[must_use]
pub fn resolve_ribbons(common: &DrawCommon, ribbons: &[RibbonSpec]) -> Vec<ElementConfig> {
    ribbons
        .iter()
        .enumerate()
        .map(|(index, ribbon)| {
            let (geometry, origin) = match *ribbon {
                RibbonSpec::Chord {
                    center,
                    radius,
                    source,
                    target,
                } => (path::chord_ribbon(center, radius, source, target), Some(center)),
                RibbonSpec::Link {
                    x0,
                    source,
                    x1,
                    target,
                } => (path::link_ribbon(x0, source, x1, target), None),
            };
            common.finish(index, ShapeKind::Ribbon, Geometry::Path(geometry), origin)
        })
        .collect()
}

pub fn draw_ribbon(
    target: &mut DrawTarget<'_>,
    common: &DrawCommon,
    ribbons: &[RibbonSpec],
) -> WaveResult<()> {
    target.emit(&common.class, resolve_ribbons(common, ribbons))
}

/// Straight segments `[(x1, y1), (x2, y2)]`.
#[must_use]
pub fn resolve_lines(common: &DrawCommon, lines: &[[(f64, f64); 2]]) -> Vec<ElementConfig> {
    lines
        .iter()
        .enumerate()
        .map(|(index, &[(x1, y1), (x2, y2)])| {
            common.finish(
                index,
                ShapeKind::Line,
                Geometry::Line { x1, y1, x2, y2 },
                Some((x1, y1)),
            )
        })
        .collect()
}

pub fn draw_line(
    target: &mut DrawTarget<'_>,
    common: &DrawCommon,
    lines: &[[(f64, f64); 2]],
) -> WaveResult<()> {
    target.emit(&common.class, resolve_lines(common, lines))
}

/// Fill defaults for filled shapes drawn in `color`.
#[must_use]
pub fn fill_defaults(color: Color) -> ShapeStyle {
    ShapeStyle {
        stroke_width: 0.0,
        ..ShapeStyle::filled(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::element::mapping;

    #[test]
    fn rect_resolution_normalizes_negative_height() {
        let common = DrawCommon::new("rect");
        let elements = resolve_rects(
            &common,
            &[RectSpec {
                x: 10.0,
                y: 100.0,
                width: 20.0,
                height: -40.0,
            }],
            None,
            RectOrigin::Bottom,
        );
        assert_eq!(
            elements[0].geometry,
            Geometry::Rect {
                x: 10.0,
                y: 60.0,
                width: 20.0,
                height: 40.0,
                rx: 0.0
            }
        );
        assert_eq!(elements[0].transform_origin, Some((20.0, 100.0)));
    }

    #[test]
    fn mapping_rewrites_after_resolution() {
        let red = Color::rgb(1.0, 0.0, 0.0);
        let common = DrawCommon::new("circle")
            .with_defaults(fill_defaults(Color::BLACK))
            .with_mapping(Some(mapping(move |mut element: ElementConfig| {
                if matches!(element.geometry, Geometry::Circle { cx, .. } if cx > 5.0) {
                    element.style.fill = Some(red);
                }
                element
            })));
        let elements = resolve_circles(&common, &[(0.0, 0.0), (10.0, 0.0)], None);
        assert_eq!(elements[0].style.fill, Some(Color::BLACK));
        assert_eq!(elements[1].style.fill, Some(red));
    }

    #[test]
    fn per_element_radius_and_scalar_fill() {
        let common = DrawCommon::new("circle").with_attrs(ShapeAttrs {
            fill: Some(Attr::Scalar(Color::WHITE)),
            ..ShapeAttrs::default()
        });
        let radius = Attr::PerElement(vec![2.0, 6.0]);
        let elements = resolve_circles(&common, &[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)], Some(&radius));
        let radii: Vec<f64> = elements
            .iter()
            .map(|element| match element.geometry {
                Geometry::Circle { r, .. } => r,
                _ => f64::NAN,
            })
            .collect();
        assert_eq!(radii, vec![2.0, 6.0, 4.0]);
        assert!(elements.iter().all(|e| e.style.fill == Some(Color::WHITE)));
    }
}

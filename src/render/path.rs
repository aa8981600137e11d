//! Pixel-space path geometry shared by every backend.
//!
//! Shapes are synthesized once into a [`PathData`] command list. The SVG
//! backend serializes it with [`PathData::to_svg`]; the canvas backend keeps
//! the command list and replays it. Both see the same numbers.

use std::f64::consts::{PI, TAU};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCommand {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadTo(f64, f64, f64, f64),
    CubicTo(f64, f64, f64, f64, f64, f64),
    /// Circular arc around `(cx, cy)` from `start` to `end` radians in screen
    /// orientation (0 at 3 o'clock, positive clockwise).
    Arc {
        cx: f64,
        cy: f64,
        radius: f64,
        start: f64,
        end: f64,
    },
    Close,
}

/// Curve interpolation for line and area primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    #[default]
    Linear,
    /// Horizontal step centred between points.
    Step,
    /// Catmull-Rom spline through every point.
    Curve,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathData {
    commands: SmallVec<[PathCommand; 8]>,
}

impl PathData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::MoveTo(x, y));
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::LineTo(x, y));
        self
    }

    pub fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::QuadTo(cx, cy, x, y));
        self
    }

    pub fn cubic_to(&mut self, c1: (f64, f64), c2: (f64, f64), to: (f64, f64)) -> &mut Self {
        self.commands
            .push(PathCommand::CubicTo(c1.0, c1.1, c2.0, c2.1, to.0, to.1));
        self
    }

    pub fn arc(&mut self, cx: f64, cy: f64, radius: f64, start: f64, end: f64) -> &mut Self {
        self.commands.push(PathCommand::Arc {
            cx,
            cy,
            radius,
            start,
            end,
        });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.commands.push(PathCommand::Close);
        self
    }

    /// SVG path `d` string. Arcs must start at the current point.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(x, y) => push(&mut out, 'M', &[x, y]),
                PathCommand::LineTo(x, y) => push(&mut out, 'L', &[x, y]),
                PathCommand::QuadTo(cx, cy, x, y) => push(&mut out, 'Q', &[cx, cy, x, y]),
                PathCommand::CubicTo(a, b, c, d, x, y) => push(&mut out, 'C', &[a, b, c, d, x, y]),
                PathCommand::Arc {
                    cx,
                    cy,
                    radius,
                    start,
                    end,
                } => push_arc(&mut out, cx, cy, radius, start, end),
                PathCommand::Close => out.push('Z'),
            }
        }
        out
    }

    /// Axis-aligned bounds of every vertex and control point.
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points: Vec<(f64, f64)> = Vec::new();
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(x, y) | PathCommand::LineTo(x, y) => points.push((x, y)),
                PathCommand::QuadTo(cx, cy, x, y) => points.extend([(cx, cy), (x, y)]),
                PathCommand::CubicTo(a, b, c, d, x, y) => points.extend([(a, b), (c, d), (x, y)]),
                PathCommand::Arc {
                    cx,
                    cy,
                    radius,
                    start,
                    end,
                } => {
                    let steps = 16;
                    points.extend((0..=steps).map(|i| {
                        let angle = start + (end - start) * f64::from(i) / f64::from(steps);
                        (cx + radius * angle.cos(), cy + radius * angle.sin())
                    }));
                }
                PathCommand::Close => {}
            }
        }
        let first = *points.first()?;
        Some(points.iter().fold(
            (first.0, first.1, first.0, first.1),
            |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        ))
    }
}

/// Numbers are written with at most three decimals so output is stable.
pub(crate) fn format_number(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let text = format!("{rounded:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_owned()
}

fn push(out: &mut String, op: char, values: &[f64]) {
    out.push(op);
    let joined: Vec<String> = values.iter().map(|v| format_number(*v)).collect();
    out.push_str(&joined.join(","));
}

fn push_arc(out: &mut String, cx: f64, cy: f64, radius: f64, start: f64, end: f64) {
    let sweep = end - start;
    if radius <= 0.0 || sweep == 0.0 {
        return;
    }
    // SVG cannot draw a full circle in one arc command.
    if sweep.abs() >= TAU - 1e-9 {
        let middle = start + sweep / 2.0;
        push_arc(out, cx, cy, radius, start, middle);
        push_arc(out, cx, cy, radius, middle, end);
        return;
    }
    let large = u8::from(sweep.abs() > PI);
    let clockwise = u8::from(sweep > 0.0);
    let r = format_number(radius);
    let _ = write!(
        out,
        "A{r},{r},0,{large},{clockwise},{},{}",
        format_number(cx + radius * end.cos()),
        format_number(cy + radius * end.sin())
    );
}

/// Converts a 12 o'clock / clockwise chart angle into screen orientation.
#[must_use]
pub fn chart_angle(angle: f64) -> f64 {
    angle - PI / 2.0
}

/// Point at `radius` along a chart angle (0 at 12 o'clock, clockwise).
#[must_use]
pub fn polar_point(cx: f64, cy: f64, radius: f64, angle: f64) -> (f64, f64) {
    (cx + radius * angle.sin(), cy - radius * angle.cos())
}

/// Annular sector between chart angles `start` and `end`.
#[must_use]
pub fn arc_sector(
    center: (f64, f64),
    inner_radius: f64,
    outer_radius: f64,
    start: f64,
    end: f64,
) -> PathData {
    let (cx, cy) = center;
    let mut path = PathData::new();
    if outer_radius <= 0.0 || start == end {
        return path;
    }
    let (sx, sy) = polar_point(cx, cy, outer_radius, start);
    path.move_to(sx, sy)
        .arc(cx, cy, outer_radius, chart_angle(start), chart_angle(end));
    if inner_radius > 0.0 {
        let (ex, ey) = polar_point(cx, cy, inner_radius, end);
        path.line_to(ex, ey)
            .arc(cx, cy, inner_radius, chart_angle(end), chart_angle(start));
    } else {
        path.line_to(cx, cy);
    }
    path.close();
    path
}

#[must_use]
pub fn polyline(points: &[(f64, f64)], closed: bool) -> PathData {
    let mut path = PathData::new();
    for (index, &(x, y)) in points.iter().enumerate() {
        if index == 0 {
            path.move_to(x, y);
        } else {
            path.line_to(x, y);
        }
    }
    if closed && points.len() > 2 {
        path.close();
    }
    path
}

/// Open curve through `points`.
#[must_use]
pub fn curve(points: &[(f64, f64)], kind: CurveKind) -> PathData {
    let mut path = PathData::new();
    let Some(&(x, y)) = points.first() else {
        return path;
    };
    path.move_to(x, y);
    append_curve(&mut path, points, kind);
    path
}

/// Closed band between an upper and a lower point list of equal length.
#[must_use]
pub fn area(upper: &[(f64, f64)], lower: &[(f64, f64)], kind: CurveKind) -> PathData {
    let mut path = curve(upper, kind);
    if path.is_empty() {
        return path;
    }
    let reversed: Vec<(f64, f64)> = lower.iter().rev().copied().collect();
    if let Some(&(x, y)) = reversed.first() {
        path.line_to(x, y);
        append_curve(&mut path, &reversed, kind);
    }
    path.close();
    path
}

fn append_curve(path: &mut PathData, points: &[(f64, f64)], kind: CurveKind) {
    match kind {
        CurveKind::Linear => {
            for &(x, y) in points.iter().skip(1) {
                path.line_to(x, y);
            }
        }
        CurveKind::Step => {
            for pair in points.windows(2) {
                let (x0, _) = pair[0];
                let (x1, y1) = pair[1];
                let middle = (x0 + x1) / 2.0;
                path.line_to(middle, pair[0].1).line_to(middle, y1).line_to(x1, y1);
            }
        }
        CurveKind::Curve => {
            for index in 0..points.len().saturating_sub(1) {
                let p0 = points[index.saturating_sub(1)];
                let p1 = points[index];
                let p2 = points[index + 1];
                let p3 = points[(index + 2).min(points.len() - 1)];
                let c1 = (p1.0 + (p2.0 - p0.0) / 6.0, p1.1 + (p2.1 - p0.1) / 6.0);
                let c2 = (p2.0 - (p3.0 - p1.0) / 6.0, p2.1 - (p3.1 - p1.1) / 6.0);
                path.cubic_to(c1, c2, p2);
            }
        }
    }
}

/// Chord ribbon between two arcs of the same circle, bent through the centre.
#[must_use]
pub fn chord_ribbon(
    center: (f64, f64),
    radius: f64,
    source: (f64, f64),
    target: (f64, f64),
) -> PathData {
    let (cx, cy) = center;
    let mut path = PathData::new();
    let (sx, sy) = polar_point(cx, cy, radius, source.0);
    let (tx, ty) = polar_point(cx, cy, radius, target.0);
    path.move_to(sx, sy)
        .arc(cx, cy, radius, chart_angle(source.0), chart_angle(source.1))
        .quad_to(cx, cy, tx, ty)
        .arc(cx, cy, radius, chart_angle(target.0), chart_angle(target.1))
        .quad_to(cx, cy, sx, sy)
        .close();
    path
}

/// Horizontal flow ribbon joining a vertical span at `x0` to one at `x1`.
#[must_use]
pub fn link_ribbon(x0: f64, source: (f64, f64), x1: f64, target: (f64, f64)) -> PathData {
    let middle = (x0 + x1) / 2.0;
    let mut path = PathData::new();
    path.move_to(x0, source.0)
        .cubic_to((middle, source.0), (middle, target.0), (x1, target.0))
        .line_to(x1, target.1)
        .cubic_to((middle, target.1), (middle, source.1), (x0, source.1))
        .close();
    path
}

/// Quadratic arc from `from` to `to`, bent sideways by `bend` times the distance.
#[must_use]
pub fn bent_line(from: (f64, f64), to: (f64, f64), bend: f64) -> PathData {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let control = (
        (from.0 + to.0) / 2.0 - dy * bend,
        (from.1 + to.1) / 2.0 + dx * bend,
    );
    let mut path = PathData::new();
    path.move_to(from.0, from.1)
        .quad_to(control.0, control.1, to.0, to.1);
    path
}

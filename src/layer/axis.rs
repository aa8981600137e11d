use std::f64::consts::TAU;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::WaveContext;
use crate::core::{
    Cell, GeoAxis, GeoAxisScale, LinearScale, Rect, Scale, ScaleDomain, Tick,
};
use crate::error::WaveResult;
use crate::layer::{
    Layer, LayerBase, LayerData, LayerOptions, LayerType, ScaleSlot, estimate_text_width,
    format_value,
};
use crate::render::path::polar_point;
use crate::render::primitives::{self, DrawTarget, TextAttrs, TextSpec};
use crate::render::{Attr, Backend, ShapeAttrs, ShapeKind, ShapeStyle, TextAnchor};

/// Coordinate system an axis layer draws and the binder reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateFamily {
    Cartesian,
    Polar,
    Geographic,
}

impl CoordinateFamily {
    /// Reads the family from a coordinate identifier such as `polar` or
    /// `geographic-mercator`. Anything unrecognised is cartesian.
    #[must_use]
    pub fn detect(coordinate: &str) -> Self {
        let coordinate = coordinate.to_ascii_lowercase();
        if coordinate.contains("polar") {
            Self::Polar
        } else if coordinate.contains("geo") {
            Self::Geographic
        } else {
            Self::Cartesian
        }
    }

    /// Scale slots layers of this family contribute to the binder.
    #[must_use]
    pub fn slots(self) -> &'static [ScaleSlot] {
        match self {
            Self::Cartesian => &[ScaleSlot::X, ScaleSlot::Y, ScaleSlot::YR],
            Self::Polar => &[ScaleSlot::Angle, ScaleSlot::Radius],
            Self::Geographic => &[ScaleSlot::Position],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisOptions {
    #[serde(flatten)]
    pub common: LayerOptions,
    /// Coordinate identifier, matched by substring.
    #[serde(default = "default_coordinate", rename = "type")]
    pub coordinate: String,
}

fn default_coordinate() -> String {
    "cartesian".to_owned()
}

impl AxisOptions {
    #[must_use]
    pub fn new(common: LayerOptions) -> Self {
        Self {
            common,
            coordinate: default_coordinate(),
        }
    }

    #[must_use]
    pub fn with_coordinate(mut self, coordinate: impl Into<String>) -> Self {
        self.coordinate = coordinate.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AxisStyle {
    pub tick_count: usize,
    pub tick_size: f64,
    /// Gap between a tick and its label.
    pub label_offset: f64,
    pub font_size: Option<f64>,
    /// Cartesian grid lines across the plot.
    pub grid: bool,
    pub line: ShapeAttrs,
    pub grid_line: ShapeAttrs,
    pub text: ShapeAttrs,
}

impl Default for AxisStyle {
    fn default() -> Self {
        Self {
            tick_count: 5,
            tick_size: 6.0,
            label_offset: 4.0,
            font_size: None,
            grid: false,
            line: ShapeAttrs::default(),
            grid_line: ShapeAttrs {
                stroke_opacity: Some(Attr::Scalar(0.3)),
                ..ShapeAttrs::default()
            },
            text: ShapeAttrs::default(),
        }
    }
}

/// Line, tick and label geometry of one axis side.
#[derive(Debug, Default, PartialEq)]
struct AxisParts {
    domain: Vec<[(f64, f64); 2]>,
    ticks: Vec<[(f64, f64); 2]>,
    grid: Vec<[(f64, f64); 2]>,
    rings: Vec<(f64, f64)>,
    ring_radii: Vec<f64>,
    labels: Vec<TextSpec>,
    anchor: TextAnchor,
}

/// Axes of a coordinate family, sharing scales with the data layers bound to it.
#[derive(Debug)]
pub struct AxisLayer {
    base: LayerBase,
    family: CoordinateFamily,
}

impl AxisLayer {
    pub fn new(options: AxisOptions, context: Arc<WaveContext>) -> WaveResult<Self> {
        let family = CoordinateFamily::detect(&options.coordinate);
        Ok(Self {
            base: LayerBase::new(options.common, context)?,
            family,
        })
    }

    #[must_use]
    pub fn family(&self) -> CoordinateFamily {
        self.family
    }

    fn max_radius(&self) -> f64 {
        let region = self.base.region();
        region.width().min(region.height()).max(0.0) / 2.0
    }

    /// Scales given directly through scale specs with an explicit domain.
    fn scales_from_specs(&self) -> Vec<(ScaleSlot, Scale)> {
        let region = self.base.region();
        self.family
            .slots()
            .iter()
            .filter_map(|&slot| {
                let spec = self.base.scale_spec(slot);
                let domain = spec.domain.clone()?;
                let range = match slot {
                    ScaleSlot::X => (region.left(), region.right()),
                    ScaleSlot::Y | ScaleSlot::YR => (region.bottom(), region.top()),
                    ScaleSlot::Angle => (0.0, TAU),
                    ScaleSlot::Radius => (0.0, self.max_radius()),
                    ScaleSlot::Position => {
                        let ScaleDomain::Geographic(_) = domain else {
                            return None;
                        };
                        return Some((slot, spec.build_in(region)));
                    }
                };
                let mut scale = spec.build();
                if spec.range.is_none() {
                    scale.set_range(range);
                }
                Some((slot, scale))
            })
            .collect()
    }

    fn cartesian_parts(&self, slot: ScaleSlot, style: &AxisStyle, font_size: f64) -> AxisParts {
        let region = self.base.region();
        let Some(scale) = self.base.scale(slot) else {
            return AxisParts::default();
        };
        let inside = |position: f64, low: f64, high: f64| {
            position >= low.min(high) - 1e-6 && position <= low.max(high) + 1e-6
        };
        let ticks = scale.ticks(style.tick_count);
        let mut parts = AxisParts::default();

        match slot {
            ScaleSlot::X => {
                let y = region.bottom();
                parts.domain.push([(region.left(), y), (region.right(), y)]);
                parts.anchor = TextAnchor::Middle;
                let visible: Vec<&Tick> = ticks
                    .iter()
                    .filter(|tick| inside(tick.position, region.left(), region.right()))
                    .collect();
                let mut last_edge = f64::NEG_INFINITY;
                for tick in visible {
                    let x = tick.position;
                    parts.ticks.push([(x, y), (x, y + style.tick_size)]);
                    if style.grid {
                        parts.grid.push([(x, region.top()), (x, y)]);
                    }
                    // drop labels that would overlap the previous one
                    let half = estimate_text_width(&tick.label, font_size) / 2.0;
                    if x - half < last_edge {
                        continue;
                    }
                    last_edge = x + half;
                    parts.labels.push(TextSpec::new(
                        tick.label.clone(),
                        (x, y + style.tick_size + style.label_offset + font_size),
                    ));
                }
            }
            ScaleSlot::Y | ScaleSlot::YR => {
                let (x, direction, anchor) = if slot == ScaleSlot::Y {
                    (region.left(), -1.0, TextAnchor::End)
                } else {
                    (region.right(), 1.0, TextAnchor::Start)
                };
                parts.domain.push([(x, region.top()), (x, region.bottom())]);
                parts.anchor = anchor;
                for tick in ticks
                    .iter()
                    .filter(|tick| inside(tick.position, region.top(), region.bottom()))
                {
                    let y = tick.position;
                    parts.ticks.push([(x, y), (x + direction * style.tick_size, y)]);
                    if style.grid && slot == ScaleSlot::Y {
                        parts.grid.push([(region.left(), y), (region.right(), y)]);
                    }
                    parts.labels.push(TextSpec::new(
                        tick.label.clone(),
                        (
                            x + direction * (style.tick_size + style.label_offset),
                            y + font_size / 3.0,
                        ),
                    ));
                }
            }
            _ => {}
        }
        parts
    }

    /// Spokes per angle label plus one ring per radius tick.
    fn polar_parts(&self, style: &AxisStyle, font_size: f64) -> (AxisParts, AxisParts) {
        let (cx, cy) = self.base.region().center();
        let max_radius = self.max_radius();
        let mut angle_parts = AxisParts {
            anchor: TextAnchor::Middle,
            ..AxisParts::default()
        };
        if let Some(angle) = self.base.scale(ScaleSlot::Angle) {
            for label in angle.labels() {
                let Some(theta) = angle.map(&Cell::from(label.as_str())) else {
                    continue;
                };
                angle_parts
                    .domain
                    .push([(cx, cy), polar_point(cx, cy, max_radius, theta)]);
                let reach = max_radius + style.label_offset + font_size / 2.0;
                let (x, y) = polar_point(cx, cy, reach, theta);
                angle_parts
                    .labels
                    .push(TextSpec::new(label.clone(), (x, y + font_size / 3.0)));
            }
        }

        let mut radius_parts = AxisParts {
            anchor: TextAnchor::Start,
            ..AxisParts::default()
        };
        if let Some(radius) = self.base.scale(ScaleSlot::Radius).and_then(Scale::as_linear) {
            for value in radius.ticks(style.tick_count) {
                let r = radius.scale(value);
                if r <= 0.0 {
                    continue;
                }
                radius_parts.rings.push((cx, cy));
                radius_parts.ring_radii.push(r);
                radius_parts.labels.push(TextSpec::new(
                    format_value(value),
                    (cx + style.label_offset, cy - r + font_size / 3.0),
                ));
            }
        }
        (angle_parts, radius_parts)
    }

    /// Graticule lines at longitude and latitude ticks.
    fn geographic_parts(&self, style: &AxisStyle, font_size: f64) -> (AxisParts, AxisParts) {
        let mut longitude_parts = AxisParts {
            anchor: TextAnchor::Middle,
            ..AxisParts::default()
        };
        let mut latitude_parts = AxisParts {
            anchor: TextAnchor::End,
            ..AxisParts::default()
        };
        let Some(projection) = self.base.scale(ScaleSlot::Position).and_then(Scale::as_geographic)
        else {
            return (longitude_parts, latitude_parts);
        };
        let ((lon0, lon1), (lat0, lat1)) = projection.domain();
        let (lat_low, lat_high) = (lat0.min(lat1), lat0.max(lat1));
        let (lon_low, lon_high) = (lon0.min(lon1), lon0.max(lon1));

        for tick in Scale::GeoAxis(GeoAxisScale::new(*projection, GeoAxis::Longitude))
            .ticks(style.tick_count)
        {
            let top = projection.project(lon_low, lat_high).1;
            let bottom = projection.project(lon_low, lat_low).1;
            longitude_parts
                .grid
                .push([(tick.position, top), (tick.position, bottom)]);
            longitude_parts.labels.push(TextSpec::new(
                tick.label,
                (tick.position, bottom + style.label_offset + font_size),
            ));
        }
        for tick in Scale::GeoAxis(GeoAxisScale::new(*projection, GeoAxis::Latitude))
            .ticks(style.tick_count)
        {
            let left = projection.project(lon_low, lat_low).0;
            let right = projection.project(lon_high, lat_low).0;
            latitude_parts
                .grid
                .push([(left, tick.position), (right, tick.position)]);
            latitude_parts.labels.push(TextSpec::new(
                tick.label,
                (left - style.label_offset, tick.position + font_size / 3.0),
            ));
        }
        (longitude_parts, latitude_parts)
    }

    fn emit_parts(
        &self,
        target: &mut DrawTarget<'_>,
        prefix: &str,
        parts: &AxisParts,
        style: &AxisStyle,
        font_size: f64,
    ) -> WaveResult<()> {
        let theme = self.base.theme();
        let line_defaults = ShapeStyle::stroked(theme.axis, 1.0);
        let line = |class: &str, attrs: &ShapeAttrs| {
            self.base
                .common(&format!("{prefix}-{class}"), ShapeKind::Line)
                .with_attrs(attrs.clone())
                .with_defaults(line_defaults.clone())
        };

        let mut grid_attrs = style.line.clone();
        grid_attrs.merge(&style.grid_line);
        primitives::draw_line(target, &line("domain", &style.line), &parts.domain)?;
        primitives::draw_line(target, &line("tick", &style.line), &parts.ticks)?;
        primitives::draw_line(target, &line("grid", &grid_attrs), &parts.grid)?;

        if !parts.rings.is_empty() {
            let rings = self
                .base
                .common(&format!("{prefix}-ring"), ShapeKind::Circle)
                .with_attrs(grid_attrs)
                .with_defaults(line_defaults.clone());
            primitives::draw_circle(
                target,
                &rings,
                &parts.rings,
                Some(&Attr::PerElement(parts.ring_radii.clone())),
            )?;
        }

        let text = self
            .base
            .common(&format!("{prefix}-label"), ShapeKind::Text)
            .with_attrs(style.text.clone())
            .with_defaults(ShapeStyle::filled(theme.text));
        let attrs = TextAttrs {
            font_size: Some(Attr::Scalar(font_size)),
            anchor: Some(Attr::Scalar(parts.anchor)),
        };
        primitives::draw_text(target, &text, &parts.labels, &attrs)
    }

    #[cfg(test)]
    fn region(&self) -> Rect {
        self.base.region()
    }
}

impl Layer for AxisLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Axis
    }

    fn set_data(&mut self, data: LayerData) -> WaveResult<()> {
        self.base.store_data(data);
        self.base.clear_scales();
        for (slot, scale) in self.scales_from_specs() {
            self.base.install_scale(slot, scale);
        }
        debug!(
            layer = %self.base.id(),
            family = ?self.family,
            scales = self.base.scales().len(),
            "axis data set"
        );
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn Backend) -> WaveResult<()> {
        let style: AxisStyle = self.base.typed_style()?;
        let font_size = style.font_size.unwrap_or(self.base.theme().font_size);
        let sides: Vec<(&str, AxisParts)> = match self.family {
            CoordinateFamily::Cartesian => vec![
                ("axisX", self.cartesian_parts(ScaleSlot::X, &style, font_size)),
                ("axisY", self.cartesian_parts(ScaleSlot::Y, &style, font_size)),
                ("axisYR", self.cartesian_parts(ScaleSlot::YR, &style, font_size)),
            ],
            CoordinateFamily::Polar => {
                let (angle, radius) = self.polar_parts(&style, font_size);
                vec![("axisAngle", angle), ("axisRadius", radius)]
            }
            CoordinateFamily::Geographic => {
                let (longitude, latitude) = self.geographic_parts(&style, font_size);
                vec![("axisX", longitude), ("axisY", latitude)]
            }
        };

        let mut target = self.base.target(backend);
        for (prefix, parts) in &sides {
            self.emit_parts(&mut target, prefix, parts, &style, font_size)?;
        }
        Ok(())
    }

    fn coordinate(&self) -> Option<CoordinateFamily> {
        Some(self.family)
    }
}

/// Linear scale spanning `domain` along the given axis side of `region`.
#[must_use]
pub fn region_linear_scale(slot: ScaleSlot, domain: (f64, f64), region: Rect) -> LinearScale {
    match slot {
        ScaleSlot::X => LinearScale::new(domain, (region.left(), region.right())),
        _ => LinearScale::new(domain, (region.bottom(), region.top())),
    }
}

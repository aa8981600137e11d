use cairo::{Context, Format, ImageSurface};
use pango::FontDescription;

use crate::error::{WaveError, WaveResult};
use crate::render::element::{Geometry, ShapeStyle, TextAnchor};
use crate::render::path::{PathCommand, PathData};
use crate::render::{CanvasBackend, Color};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CairoPaintStats {
    pub shapes_painted: usize,
    pub texts_painted: usize,
}

/// Rasterizes a [`CanvasBackend`] scene with Cairo, Pango and PangoCairo.
///
/// Paints either into its own image surface or onto an external context
/// handed over by a host draw callback.
#[derive(Debug)]
pub struct CairoScenePainter {
    surface: ImageSurface,
    clear_color: Color,
    last_stats: CairoPaintStats,
}

impl CairoScenePainter {
    pub fn new(width: i32, height: i32) -> WaveResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(WaveError::InvalidData(
                "cairo surface size must be > 0".to_owned(),
            ));
        }

        let surface = ImageSurface::create(Format::ARgb32, width, height)
            .map_err(|err| map_backend_error("failed to create cairo surface", err))?;
        Ok(Self {
            surface,
            clear_color: Color::WHITE,
            last_stats: CairoPaintStats::default(),
        })
    }

    #[must_use]
    pub fn surface(&self) -> &ImageSurface {
        &self.surface
    }

    pub fn set_clear_color(&mut self, color: Color) -> WaveResult<()> {
        color.validate()?;
        self.clear_color = color;
        Ok(())
    }

    #[must_use]
    pub fn last_stats(&self) -> CairoPaintStats {
        self.last_stats
    }

    pub fn paint(&mut self, scene: &CanvasBackend) -> WaveResult<()> {
        let context = Context::new(&self.surface)
            .map_err(|err| map_backend_error("failed to create cairo context", err))?;
        self.paint_on_context(&context, scene)
    }

    pub fn paint_on_context(&mut self, context: &Context, scene: &CanvasBackend) -> WaveResult<()> {
        apply_color(context, self.clear_color, 1.0);
        context
            .paint()
            .map_err(|err| map_backend_error("failed to clear surface", err))?;

        let mut stats = CairoPaintStats::default();
        for object in scene.scene() {
            let element = &object.element;
            element.validate()?;
            match &element.geometry {
                Geometry::Text {
                    x,
                    y,
                    text,
                    font_size,
                    anchor,
                    rotation,
                } => {
                    paint_text(context, &element.style, (*x, *y), text, *font_size, *anchor, *rotation)?;
                    stats.texts_painted += 1;
                }
                geometry => {
                    context.new_path();
                    append_geometry(context, geometry);
                    fill_and_stroke(context, &element.style)?;
                    stats.shapes_painted += 1;
                }
            }
        }

        self.last_stats = stats;
        Ok(())
    }
}

fn append_geometry(context: &Context, geometry: &Geometry) {
    match geometry {
        Geometry::Rect {
            x,
            y,
            width,
            height,
            ..
        } => context.rectangle(*x, *y, *width, *height),
        Geometry::Circle { cx, cy, r } => {
            context.new_sub_path();
            context.arc(*cx, *cy, *r, 0.0, std::f64::consts::TAU);
        }
        Geometry::Line { x1, y1, x2, y2 } => {
            context.move_to(*x1, *y1);
            context.line_to(*x2, *y2);
        }
        Geometry::Path(path) => append_path(context, path),
        Geometry::Text { .. } => {}
    }
}

fn append_path(context: &Context, path: &PathData) {
    let mut current = (0.0, 0.0);
    for command in path.commands() {
        match *command {
            PathCommand::MoveTo(x, y) => {
                context.move_to(x, y);
                current = (x, y);
            }
            PathCommand::LineTo(x, y) => {
                context.line_to(x, y);
                current = (x, y);
            }
            PathCommand::QuadTo(cx, cy, x, y) => {
                // cairo only has cubics
                let c1 = (
                    current.0 + 2.0 / 3.0 * (cx - current.0),
                    current.1 + 2.0 / 3.0 * (cy - current.1),
                );
                let c2 = (x + 2.0 / 3.0 * (cx - x), y + 2.0 / 3.0 * (cy - y));
                context.curve_to(c1.0, c1.1, c2.0, c2.1, x, y);
                current = (x, y);
            }
            PathCommand::CubicTo(a, b, c, d, x, y) => {
                context.curve_to(a, b, c, d, x, y);
                current = (x, y);
            }
            PathCommand::Arc {
                cx,
                cy,
                radius,
                start,
                end,
            } => {
                if end >= start {
                    context.arc(cx, cy, radius, start, end);
                } else {
                    context.arc_negative(cx, cy, radius, start, end);
                }
                current = (cx + radius * end.cos(), cy + radius * end.sin());
            }
            PathCommand::Close => context.close_path(),
        }
    }
}

fn fill_and_stroke(context: &Context, style: &ShapeStyle) -> WaveResult<()> {
    if let Some(fill) = style.fill {
        apply_color(context, fill, style.opacity * style.fill_opacity);
        context
            .fill_preserve()
            .map_err(|err| map_backend_error("failed to fill shape", err))?;
    }
    if let Some(stroke) = style.stroke.filter(|_| style.stroke_width > 0.0) {
        apply_color(context, stroke, style.opacity * style.stroke_opacity);
        context.set_line_width(style.stroke_width);
        context
            .stroke_preserve()
            .map_err(|err| map_backend_error("failed to stroke shape", err))?;
    }
    context.new_path();
    Ok(())
}

fn paint_text(
    context: &Context,
    style: &ShapeStyle,
    position: (f64, f64),
    text: &str,
    font_size: f64,
    anchor: TextAnchor,
    rotation: f64,
) -> WaveResult<()> {
    let layout = pangocairo::functions::create_layout(context);
    let font_description = FontDescription::from_string(&format!("Sans {font_size}px"));
    layout.set_font_description(Some(&font_description));
    layout.set_text(text);

    let (text_width, text_height) = layout.pixel_size();
    let dx = match anchor {
        TextAnchor::Start => 0.0,
        TextAnchor::Middle => -f64::from(text_width) / 2.0,
        TextAnchor::End => -f64::from(text_width),
    };

    context
        .save()
        .map_err(|err| map_backend_error("failed to save cairo state", err))?;
    context.translate(position.0, position.1);
    context.rotate(rotation.to_radians());
    apply_color(context, style.fill.unwrap_or(Color::BLACK), style.opacity * style.fill_opacity);
    // SVG text sits on its baseline; pango lays out from the top
    context.move_to(dx, -f64::from(text_height) * 0.8);
    pangocairo::functions::show_layout(context, &layout);
    context
        .restore()
        .map_err(|err| map_backend_error("failed to restore cairo state", err))
}

fn apply_color(context: &Context, color: Color, opacity: f64) {
    context.set_source_rgba(color.red, color.green, color.blue, color.alpha * opacity);
}

fn map_backend_error(prefix: &str, err: cairo::Error) -> WaveError {
    WaveError::Backend(format!("{prefix}: {err}"))
}

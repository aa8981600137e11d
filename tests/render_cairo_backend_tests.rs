#![cfg(feature = "cairo-backend")]

use cairo::{Context, Format, ImageSurface};
use serde_json::json;
use wave_chart::WaveError;
use wave_chart::api::{Wave, WaveConfig};
use wave_chart::core::Viewport;
use wave_chart::layer::{LayerKind, LayerOptions, RectOptions, TextOptions};
use wave_chart::render::{CairoScenePainter, CanvasBackend, GroupKey};

fn scene(width: u32, height: u32) -> CanvasBackend {
    let config = WaveConfig::new(Viewport::new(width, height));
    let mut wave = Wave::new(
        CanvasBackend::new(f64::from(width), f64::from(height)),
        config,
    )
    .expect("wave init");
    wave.create_layer(LayerKind::Rect(RectOptions::new(LayerOptions::new("bars"))))
        .expect("bars");
    wave.create_layer(LayerKind::Text(TextOptions::new(
        LayerOptions::new("title").with_layout("title"),
    )))
    .expect("title");
    wave.set_data_value("bars", &json!([["k", "v"], ["a", 3], ["b", 7], ["c", 5]]))
        .expect("bars data");
    wave.set_data_value("title", &json!("Quarterly volume"))
        .expect("title data");
    wave.draw_all().expect("draw");
    wave.into_backend()
}

#[test]
fn cairo_painter_rejects_invalid_surface_size() {
    let err = CairoScenePainter::new(0, 480).expect_err("invalid width must fail");
    assert!(matches!(err, WaveError::InvalidData(_)));
}

#[test]
fn cairo_painter_rasterizes_shapes_and_text() {
    let scene = scene(640, 360);
    assert_eq!(scene.objects(&GroupKey::new("bars", "rect")).len(), 3);

    let mut painter = CairoScenePainter::new(640, 360).expect("painter");
    painter.paint(&scene).expect("paint");
    let stats = painter.last_stats();

    assert!(stats.shapes_painted >= 3);
    assert!(stats.texts_painted >= 1);
    assert_eq!(
        stats.shapes_painted + stats.texts_painted,
        scene.scene().count()
    );
}

#[test]
fn cairo_painter_can_draw_on_external_context() {
    let scene = scene(480, 320);
    let surface = ImageSurface::create(Format::ARgb32, 480, 320).expect("surface");
    let context = Context::new(&surface).expect("context");

    let mut painter = CairoScenePainter::new(480, 320).expect("painter");
    painter
        .paint_on_context(&context, &scene)
        .expect("paint on external context");
    assert!(painter.last_stats().shapes_painted >= 3);
}

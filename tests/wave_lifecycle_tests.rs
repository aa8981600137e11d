use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use serde_json::json;
use wave_chart::api::{LayerSchema, Wave, WaveConfig, WaveState};
use wave_chart::core::{LayoutPreset, Padding, Scale, SelectMode, Viewport};
use wave_chart::layer::{
    AuxiliaryOptions, AxisOptions, LayerData, LayerKind, LayerOptions, RectOptions, ScaleSlot,
};
use wave_chart::render::{GroupKey, NullBackend, SvgBackend};
use wave_chart::WaveError;

fn svg_wave(config: WaveConfig) -> Wave<SvgBackend> {
    let viewport = config.viewport;
    Wave::new(
        SvgBackend::new(f64::from(viewport.width), f64::from(viewport.height)),
        config,
    )
    .expect("wave init")
}

fn linear_domain(wave: &Wave<SvgBackend>, id: &str, slot: ScaleSlot) -> (f64, f64) {
    wave.layer(id)
        .and_then(|layer| layer.base().scale(slot))
        .and_then(Scale::as_linear)
        .map(|scale| scale.domain())
        .expect("linear scale")
}

#[test]
fn stacked_columns_cover_the_row_total() {
    let mut wave = svg_wave(WaveConfig::new(Viewport::new(600, 400)));
    let schema: LayerSchema = serde_json::from_value(json!({
        "type": "rect",
        "options": {"id": "sales", "mode": "stack"},
        "data": [["yr", "a", "b"], ["2020", 10, 20], ["2021", 15, 5]],
        "scale": {"scaleY": {}}
    }))
    .expect("schema");
    wave.apply_schema(&schema).expect("apply");

    assert_eq!(linear_domain(&wave, "sales", ScaleSlot::Y), (0.0, 30.0));
    let selection = wave
        .layer("sales")
        .expect("layer")
        .base()
        .data()
        .table()
        .expect("table")
        .select(&["a".into(), "b".into()], SelectMode::Stack)
        .expect("selection");
    assert_eq!(selection.range(), (0.0, 30.0));
}

#[test]
fn shared_axis_spans_bars_and_threshold() {
    let mut wave = svg_wave(WaveConfig::new(Viewport::new(600, 400)));
    wave.create_layer(LayerKind::Axis(AxisOptions::new(LayerOptions::new("axis"))))
        .expect("axis");
    wave.create_layer(LayerKind::Rect(RectOptions::new(LayerOptions::new("bars"))))
        .expect("bars");
    wave.create_layer(LayerKind::Auxiliary(AuxiliaryOptions::new(LayerOptions::new(
        "target",
    ))))
    .expect("target");
    wave.bind_coordinate("axis", &["bars", "target"]).expect("bind");

    wave.set_data_value("bars", &json!([["q", "v"], ["q1", 12], ["q2", 18]]))
        .expect("bars data");
    wave.set_data_value("target", &json!([["name", "value"], ["goal", 75]]))
        .expect("target data");
    wave.draw_all().expect("draw");

    let bars = linear_domain(&wave, "bars", ScaleSlot::Y);
    assert_eq!(bars, linear_domain(&wave, "target", ScaleSlot::Y));
    assert_eq!(bars, linear_domain(&wave, "axis", ScaleSlot::Y));
    assert!(bars.1 >= 75.0);
    assert!(!wave
        .backend()
        .nodes(&GroupKey::new("axis", "axisY-label"))
        .is_empty());
}

#[test]
fn brushing_half_the_strip_doubles_the_range() {
    let config = WaveConfig::new(Viewport::new(500, 300))
        .with_padding(Padding::new(30.0, 25.0, 30.0, 25.0))
        .with_layout(LayoutPreset::StandardWithBrush);
    let mut wave = svg_wave(config);
    wave.create_layer(LayerKind::Rect(RectOptions::new(LayerOptions::new("bars"))))
        .expect("bars");
    wave.set_data_value(
        "bars",
        &json!([["m", "v"], ["jan", 3], ["feb", 4], ["mar", 5], ["apr", 6]]),
    )
    .expect("data");
    wave.enable_brush(&["bars"]).expect("brush");
    wave.draw_all().expect("draw");

    let strip = wave.context().region("brush").expect("strip");
    let range_of = |wave: &Wave<SvgBackend>| {
        wave.layer("bars")
            .and_then(|layer| layer.base().scale(ScaleSlot::X))
            .map(Scale::range)
            .expect("x range")
    };
    let before = range_of(&wave);
    let mid = strip.left() + strip.width() / 2.0;
    wave.brush(mid, strip.right()).expect("brush").expect("range");
    let after = range_of(&wave);

    assert_relative_eq!(after.1 - after.0, 2.0 * (before.1 - before.0), epsilon = 1e-9);
    // the second half slides onto the main region
    assert_relative_eq!(after.1, before.1, epsilon = 1e-9);
    let table = wave.layer("bars").expect("bars").base().data().table().expect("table");
    assert_eq!(table.len(), 4);
}

#[test]
fn contained_failures_leave_siblings_drawn() {
    let mut wave = svg_wave(WaveConfig::new(Viewport::new(600, 400)));
    wave.create_layer(LayerKind::Rect(RectOptions::new(LayerOptions::new("good"))))
        .expect("good");
    wave.create_layer(LayerKind::Rect(RectOptions::new(LayerOptions::new("bad"))))
        .expect("bad");
    wave.set_data_value("good", &json!([["k", "v"], ["a", 1], ["b", 2]]))
        .expect("good data");
    wave.set_data("bad", LayerData::from("not a table"))
        .expect("contained");
    wave.draw_all().expect("draw pass");

    assert_eq!(wave.state(), WaveState::Warning);
    let failed: Vec<_> = wave
        .warnings()
        .iter()
        .map(|warning| (warning.layer.as_str(), warning.operation))
        .collect();
    assert_eq!(failed, [("bad", "set_data")]);
    assert_eq!(wave.backend().nodes(&GroupKey::new("good", "rect")).len(), 2);
}

#[test]
fn detached_backend_is_fatal() {
    let mut wave = Wave::new(NullBackend::new(), WaveConfig::new(Viewport::new(600, 400)))
        .expect("wave");
    wave.create_layer(LayerKind::Rect(RectOptions::new(LayerOptions::new("bars"))))
        .expect("bars");
    wave.set_data_value("bars", &json!([["k", "v"], ["a", 1]]))
        .expect("data");
    wave.backend_mut().detach();

    let err = wave.draw_all().expect_err("detached backend must fail");
    assert!(err.is_fatal());
    assert!(matches!(err, WaveError::Backend(_)));
    assert_eq!(wave.state(), WaveState::Ready);
}

#[test]
fn destroy_twice_is_harmless() {
    let mut wave = svg_wave(WaveConfig::new(Viewport::new(600, 400)));
    let destroyed = Rc::new(RefCell::new(0));
    for id in ["a", "b", "c"] {
        wave.create_layer(LayerKind::Rect(RectOptions::new(LayerOptions::new(id))))
            .expect("layer");
        wave.set_data_value(id, &json!([["k", "v"], ["x", 1]])).expect("data");
        let counter = Rc::clone(&destroyed);
        wave.on(id, "destroy", move |_| *counter.borrow_mut() += 1)
            .expect("subscribe");
    }
    wave.draw_all().expect("draw");

    wave.destroy_layer("b").expect("destroy b");
    wave.destroy_layer("b").expect("destroy b again");
    assert_eq!(wave.layer_ids(), ["a", "c"]);
    assert!(wave.backend().nodes(&GroupKey::new("b", "rect")).is_empty());

    wave.destroy().expect("destroy");
    wave.destroy().expect("destroy again");
    assert_eq!(wave.layer_count(), 0);
    assert_eq!(*destroyed.borrow(), 3);
    assert_eq!(wave.backend().group_count(), 0);
}

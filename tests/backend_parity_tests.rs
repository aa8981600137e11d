use serde_json::json;
use wave_chart::api::{LayerSchema, Wave, WaveConfig, WaveState};
use wave_chart::core::Viewport;
use wave_chart::render::{Backend, CanvasBackend, ElementConfig, GroupKey, SvgBackend};

fn schemas() -> Vec<LayerSchema> {
    let raw = json!([
        {
            "type": "axis",
            "options": {"id": "axis"}
        },
        {
            "type": "rect",
            "options": {"id": "bars", "mode": "group"},
            "data": [["yr", "a", "b"], ["2019", 4, 9], ["2020", 10, 20], ["2021", 15, 5]],
            "style": {"text": {"enabled": true}}
        },
        {
            "type": "line",
            "options": {"id": "trend"},
            "data": [["yr", "a"], ["2019", 6], ["2020", 12], ["2021", 8]],
            "style": {"curve": "curve", "area": {"enabled": true}, "point": {"enabled": true}}
        },
        {
            "type": "arc",
            "options": {"id": "share", "type": "donut"},
            "data": [["kind", "value"], ["alpha", 3], ["beta", 5], ["gamma", 2]]
        },
        {
            "type": "scatter",
            "options": {"id": "dots"},
            "data": [["x", "y"], [1, 4], [2, 8], [5, 3]]
        }
    ]);
    serde_json::from_value(raw).expect("schemas")
}

fn render<B: Backend>(backend: B) -> Wave<B> {
    let mut wave = Wave::new(backend, WaveConfig::new(Viewport::new(640, 420))).expect("wave");
    wave.apply_schemas(&schemas()).expect("apply");
    wave.bind_coordinate("axis", &["bars", "trend"]).expect("bind");
    wave.draw_all().expect("draw");
    assert_eq!(wave.state(), WaveState::Ready, "{:?}", wave.warnings());
    wave
}

fn flatten(elements: Vec<(&GroupKey, &ElementConfig)>) -> Vec<(GroupKey, ElementConfig)> {
    elements
        .into_iter()
        .map(|(key, element)| (key.clone(), element.clone()))
        .collect()
}

#[test]
fn svg_and_canvas_receive_identical_elements() {
    let svg = render(SvgBackend::new(640.0, 420.0));
    let canvas = render(CanvasBackend::new(640.0, 420.0));

    let svg_elements = flatten(svg.backend().elements());
    let canvas_elements = flatten(canvas.backend().elements());
    assert!(!svg_elements.is_empty());
    assert_eq!(svg_elements.len(), canvas_elements.len());
    for (left, right) in svg_elements.iter().zip(&canvas_elements) {
        assert_eq!(left, right);
    }
}

#[test]
fn redraw_keeps_canvas_object_ids() {
    let mut canvas = render(CanvasBackend::new(640.0, 420.0));
    let key = GroupKey::new("bars", "rect");
    let before: Vec<u64> = canvas.backend().objects(&key).iter().map(|object| object.id).collect();
    assert_eq!(before.len(), 6);

    canvas
        .set_data_value("bars", &json!([["yr", "a", "b"], ["2019", 1, 2], ["2020", 3, 4], ["2021", 5, 6]]))
        .expect("data");
    canvas.draw("bars").expect("redraw");
    let after: Vec<(u64, u32)> = canvas
        .backend()
        .objects(&key)
        .iter()
        .map(|object| (object.id, object.revision))
        .collect();
    assert_eq!(after.iter().map(|(id, _)| *id).collect::<Vec<_>>(), before);
    assert!(after.iter().all(|(_, revision)| *revision >= 1));
}

#[test]
fn svg_document_lists_every_group() {
    let svg = render(SvgBackend::new(640.0, 420.0));
    let document = svg.backend().to_svg_string();
    assert!(document.starts_with("<svg"));
    for layer in ["bars", "trend", "share", "dots"] {
        assert!(document.contains(layer), "missing `{layer}`");
    }
}

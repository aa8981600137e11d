use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;
use wave_chart::api::{Wave, WaveConfig};
use wave_chart::core::{BandScale, Cell, ColumnSelector, LinearScale, SelectMode, Table, Viewport};
use wave_chart::layer::{LayerKind, LayerOptions, RectOptions};
use wave_chart::render::NullBackend;

fn bench_linear_scale_round_trip(c: &mut Criterion) {
    let scale = LinearScale::new((0.0, 10_000.0), (1_080.0, 0.0));

    c.bench_function("linear_scale_round_trip", |b| {
        b.iter(|| {
            let px = scale.scale(black_box(4_321.123));
            let _ = scale.invert(px);
        })
    });
}

fn bench_stack_selection_10k(c: &mut Criterion) {
    let mut rows = vec![vec![
        Cell::from("key"),
        Cell::from("a"),
        Cell::from("b"),
        Cell::from("c"),
    ]];
    rows.extend((0..10_000).map(|i| {
        let t = f64::from(i);
        vec![
            Cell::from(format!("k{i}")),
            Cell::from(t * 0.5),
            Cell::from(100.0 - t * 0.01),
            Cell::from(if i % 2 == 0 { 3.0 } else { -3.0 }),
        ]
    }));
    let table = Table::new(rows).expect("valid generated table");
    let columns: [ColumnSelector; 3] = ["a".into(), "b".into(), "c".into()];

    c.bench_function("stack_selection_10k", |b| {
        b.iter(|| {
            let selection = table
                .select(black_box(&columns), SelectMode::Stack)
                .expect("selection should succeed");
            let _ = selection.range();
        })
    });
}

fn bench_band_positions_1k(c: &mut Criterion) {
    let labels: Vec<String> = (0..1_000).map(|i| format!("c{i}")).collect();
    let scale = BandScale::new(labels, (0.0, 1_920.0)).with_padding_inner(0.2);

    c.bench_function("band_positions_1k", |b| {
        b.iter(|| {
            let total: f64 = (0..1_000).map(|index| scale.position_at(index)).sum();
            black_box(total);
        })
    });
}

fn bench_rect_layer_draw_2k(c: &mut Criterion) {
    let config = WaveConfig::new(Viewport::new(1600, 900));
    let mut wave = Wave::new(NullBackend::new(), config).expect("wave init");
    wave.create_layer(LayerKind::Rect(
        RectOptions::new(LayerOptions::new("bars")).with_mode(SelectMode::Stack),
    ))
    .expect("bars");

    let mut data = vec![json!(["k", "a", "b"])];
    data.extend((0..2_000).map(|i| json!([format!("k{i}"), i % 97, i % 13])));
    wave.set_data_value("bars", &json!(data)).expect("data");

    c.bench_function("rect_layer_draw_2k", |b| {
        b.iter(|| {
            wave.draw(black_box("bars")).expect("draw should succeed");
        })
    });
}

criterion_group!(
    benches,
    bench_linear_scale_round_trip,
    bench_stack_selection_10k,
    bench_band_positions_1k,
    bench_rect_layer_draw_2k
);
criterion_main!(benches);

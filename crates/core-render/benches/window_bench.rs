use core_config::CoverageRule;
use core_render::estimator::estimate_row_height;
use core_render::viewport::{WindowInput, compute_window};
use core_model::RowExtent;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_compute_window(c: &mut Criterion) {
    let mut input = WindowInput {
        scroll_top: 0.0,
        viewport_height: Some(800.0),
        row_height: 21.5,
        total_length: Some(1_000_000),
        current: 0..0,
        rows_per_page: 25,
        buffer_rows: 10,
        coverage: CoverageRule::Strict,
    };
    c.bench_function("compute_window_sweep", |b| {
        b.iter(|| {
            for step in 0..1_000u32 {
                input.scroll_top = f64::from(step) * 37.0;
                black_box(compute_window(black_box(&input)));
            }
        })
    });
}

fn bench_estimate(c: &mut Criterion) {
    let rows: Vec<RowExtent> = (0..500)
        .map(|i| RowExtent::new(i as f64 * 20.0, i as f64 * 20.0 + 20.0))
        .collect();
    c.bench_function("estimate_row_height_500", |b| {
        b.iter(|| black_box(estimate_row_height(black_box(&rows))))
    });
}

criterion_group!(benches, bench_compute_window, bench_estimate);
criterion_main!(benches);

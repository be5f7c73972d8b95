//! Benchmarks for nearest-cell search and series extraction.
//!
//! Run with: cargo bench --package point-forecast
//! Or: cargo bench --package point-forecast --bench locator_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use point_forecast::{
    extract_series, locate_great_circle, locate_per_axis, nearest_index, Grid, QueryPoint,
    RasterShape,
};
use test_utils::{create_regular_axis, create_time_series_raster, dwd};

fn dwd_grid() -> Grid {
    // Roughly the cropped DWD domain over central Europe.
    let lats = create_regular_axis(55.0, -0.0625, dwd::LAT_COUNT);
    let lons = create_regular_axis(3.0, 0.0625, dwd::LON_COUNT);
    Grid::new("uv_and_pt", lats, lons).expect("non-empty axes")
}

// =============================================================================
// AXIS SEARCH BENCHMARKS
// =============================================================================

fn bench_nearest_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_index");

    for size in [100usize, 425, 700, 5000] {
        let axis = create_regular_axis(0.0, 0.1, size);
        let target = size as f64 * 0.05;
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &axis, |b, axis| {
            b.iter(|| nearest_index(black_box(axis), black_box(target)))
        });
    }

    group.finish();
}

// =============================================================================
// GRID SEARCH BENCHMARKS
// =============================================================================

fn bench_locate(c: &mut Criterion) {
    let mut group = c.benchmark_group("locate");
    let grid = dwd_grid();
    let berlin = QueryPoint::new(52.52, 13.40);

    group.bench_function("per_axis_dwd", |b| {
        b.iter(|| locate_per_axis(black_box(&grid), black_box(berlin)))
    });

    group.throughput(Throughput::Elements(grid.len() as u64));
    group.bench_function("great_circle_dwd", |b| {
        b.iter(|| locate_great_circle(black_box(&grid), black_box(berlin)))
    });

    group.finish();
}

// =============================================================================
// SERIES EXTRACTION BENCHMARKS
// =============================================================================

fn bench_extract_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_series");

    let shape = RasterShape::new(dwd::LAT_COUNT, dwd::LON_COUNT, dwd::TIME_STEPS);
    let data = create_time_series_raster(shape.rows, shape.cols, shape.time_steps);

    group.throughput(Throughput::Elements(shape.time_steps as u64));
    group.bench_function("dwd_center_cell", |b| {
        b.iter(|| extract_series(black_box(&data), black_box(212), black_box(350), &shape))
    });
    group.bench_function("dwd_last_cell", |b| {
        b.iter(|| extract_series(black_box(&data), black_box(424), black_box(699), &shape))
    });

    group.finish();
}

criterion_group!(benches, bench_nearest_index, bench_locate, bench_extract_series);
criterion_main!(benches);

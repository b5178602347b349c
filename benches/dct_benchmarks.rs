//! DCT pipeline benchmarks
//!
//! Benchmarks for block quantization and whole-plane localization

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use ndarray::Array2;

use dct_forensics::analysis::dct::{BlockTransform, QuantMatrix};
use dct_forensics::analysis::localization::RegionAnomalyDetector;

fn textured_plane(height: usize, width: usize) -> Array2<f64> {
    Array2::from_shape_fn((height, width), |(i, j)| {
        128.0 + 60.0 * ((i as f64 * 0.31).sin() * (j as f64 * 0.17).cos())
    })
}

fn bench_block_quantize(c: &mut Criterion) {
    let transform = BlockTransform::new(8, QuantMatrix::default()).unwrap();
    let plane = textured_plane(8, 8);

    c.bench_function("quantize_8x8", |b| {
        b.iter(|| transform.quantize(black_box(plane.view())).unwrap())
    });
}

fn bench_localization(c: &mut Criterion) {
    let detector = RegionAnomalyDetector::new(64, 8, QuantMatrix::default(), 0.25).unwrap();
    let plane = textured_plane(256, 256);

    c.bench_function("localize_256x256", |b| {
        b.iter(|| detector.detect(black_box(&plane)).unwrap())
    });
}

criterion_group!(benches, bench_block_quantize, bench_localization);
criterion_main!(benches);

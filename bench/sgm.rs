use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};

use sgm_rs::prelude::*;

fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
    let mut state = seed;
    GrayImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        Luma([(state >> 16) as u8])
    })
}

fn sgm_bench(c: &mut Criterion) {
    // Build a pair with a constant disparity of 8
    let left = noise(320, 240, 42);
    let right = GrayImage::from_fn(320, 240, |x, y| *left.get_pixel((x + 8).min(319), y));

    let mut group = c.benchmark_group("sgm 320x240 d32");
    group.sample_size(10);

    for cost_function in [CostFunction::Census, CostFunction::Sad, CostFunction::Shd] {
        let sgm = Sgm::new(SgmConfig {
            cost_function,
            max_disparity: 32,
            ..Default::default()
        })
        .unwrap();

        group.bench_function(format!("{:?}", cost_function), |b| {
            b.iter(|| sgm.compute(black_box(&left), black_box(&right)))
        });
    }

    let sgm = Sgm::new(SgmConfig {
        max_disparity: 32,
        directions: Directions::Eight,
        consistency: Consistency::DualVolume,
        uniqueness: true,
        interpolate: true,
        ..Default::default()
    })
    .unwrap();
    group.bench_function("Census 8 directions lr2", |b| {
        b.iter(|| sgm.compute(black_box(&left), black_box(&right)))
    });

    group.finish();
}

criterion_group!(benches, sgm_bench);
criterion_main!(benches);

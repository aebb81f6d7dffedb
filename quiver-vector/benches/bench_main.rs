/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

use quiver_vector::{
    grid_points, quantize_loss, quantize_with_interval, stats::center_and_stats_euclidean,
};

const DIMS: [usize; 3] = [128, 384, 1024];

fn make_vector(dim: usize, rng: &mut StdRng) -> Vec<f32> {
    let dist = Normal::<f32>::new(0.0, 1.0).unwrap();
    (0..dim).map(|_| dist.sample(rng)).collect()
}

fn benchmark_stats(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xa6e2407cb9318d5f);
    let mut group = c.benchmark_group("center-and-stats");

    for dim in DIMS {
        let vector = make_vector(dim, &mut rng);
        let centroid = make_vector(dim, &mut rng);

        group.bench_function(format!("euclidean/{}", dim), |b| {
            b.iter_batched_ref(
                || vector.clone(),
                |v| center_and_stats_euclidean(v, &centroid),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn benchmark_quantize(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0x5b87f1d3046ce92a);
    let mut group = c.benchmark_group("quantize");

    for dim in DIMS {
        let mut vector = make_vector(dim, &mut rng);
        let centroid = vec![0.0f32; dim];
        let stats = center_and_stats_euclidean(&mut vector, &centroid);
        let mut codes = vec![0u8; dim];

        for bits in [4u8, 8u8] {
            let points = 1u32 << bits;
            // A plausible interval: one standard deviation around the mean.
            let std = stats.variance.sqrt();
            let (lower, upper) = (stats.mean - std, stats.mean + std);

            group.bench_function(format!("with-interval/{}bit/{}", bits, dim), |b| {
                b.iter(|| quantize_with_interval(&vector, &mut codes, lower, upper, bits))
            });

            group.bench_function(format!("loss/{}bit/{}", bits, dim), |b| {
                b.iter(|| {
                    quantize_loss(
                        &vector,
                        &mut codes,
                        lower,
                        upper,
                        points,
                        stats.norm_squared,
                        0.1,
                    )
                })
            });

            quantize_with_interval(&vector, &mut codes, lower, upper, bits);
            group.bench_function(format!("grid-points/{}bit/{}", bits, dim), |b| {
                b.iter(|| grid_points(&vector, &codes, points))
            });
        }
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_secs(2))
        .measurement_time(Duration::from_secs(5));
    targets = benchmark_stats, benchmark_quantize,
);
criterion_main!(benches);

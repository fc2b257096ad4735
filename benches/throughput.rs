//! Throughput benchmarks for Rivulet pipelines.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rivulet::execution::{InlinePool, ThreadPool};
use rivulet::{NumericPipeline, Pipeline};
use std::hint::black_box;
use std::sync::Arc;

const SIZES: [u64; 3] = [1_000, 100_000, 1_000_000];

fn bench_map_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_filter");

    for size in SIZES.iter() {
        group.throughput(Throughput::Elements(*size));
        group.bench_with_input(BenchmarkId::new("sequential", size), size, |b, &size| {
            b.iter(|| {
                NumericPipeline::range(0, size)
                    .map(|n| n.wrapping_mul(31))
                    .filter(|n| n % 3 == 0)
                    .count()
                    .unwrap()
            });
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), size, |b, &size| {
            let pool = Arc::new(ThreadPool::default());
            b.iter(|| {
                NumericPipeline::range(0, size)
                    .parallel_with(pool.clone())
                    .map(|n| n.wrapping_mul(31))
                    .filter(|n| n % 3 == 0)
                    .count()
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("sum");

    for size in SIZES.iter() {
        group.throughput(Throughput::Elements(*size));
        group.bench_with_input(BenchmarkId::new("sequential", size), size, |b, &size| {
            b.iter(|| black_box(NumericPipeline::range(0, size).sum().unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), size, |b, &size| {
            b.iter(|| black_box(NumericPipeline::range(0, size).parallel().sum().unwrap()));
        });
    }

    group.finish();
}

fn bench_sorted(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted");

    for size in [1_000usize, 100_000].iter() {
        let data: Vec<u64> = (0..*size as u64)
            .map(|n| n.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 17)
            .collect();
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("sequential", size), &data, |b, data| {
            b.iter(|| Pipeline::from_slice(data).sorted().to_vec().unwrap());
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), &data, |b, data| {
            b.iter(|| {
                Pipeline::from_slice(data)
                    .parallel()
                    .sorted()
                    .to_vec()
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_lane_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("lane_overhead");

    for lanes in [1usize, 4, 16].iter() {
        group.throughput(Throughput::Elements(10_000));
        group.bench_with_input(BenchmarkId::from_parameter(lanes), lanes, |b, &lanes| {
            let pool = Arc::new(InlinePool::new(lanes));
            b.iter(|| {
                black_box(
                    NumericPipeline::range(0u64, 10_000)
                        .parallel_with(pool.clone())
                        .sum()
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_short_circuit(c: &mut Criterion) {
    c.bench_function("iterate_limit_find", |b| {
        b.iter(|| {
            rivulet::iterate(1u64, |n| n + 1)
                .filter(|n| n % 997 == 0)
                .limit(10)
                .to_vec()
                .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_map_filter,
    bench_sum,
    bench_sorted,
    bench_lane_overhead,
    bench_short_circuit,
);
criterion_main!(benches);

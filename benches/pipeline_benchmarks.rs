use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use stageweld::prelude::*;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn numbers(pp: &Pipeline, size: u64) -> Conduit<u64> {
    generate(pp, move |w| async move {
        for k in 0..size {
            if !w.write(k).await {
                return;
            }
        }
    })
}

async fn sum_all(pp: &Pipeline, input: Conduit<u64>) -> u64 {
    let reader = pp.clone();
    let total = collect(pp, async move {
        let mut sum = 0u64;
        while let Some(v) = read(&reader, &input).await {
            sum = sum.wrapping_add(v);
        }
        sum
    });
    total.recv().await.unwrap()
}

fn bench_transform_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_pool");
    let rt = runtime();
    let size = 10_000u64;
    group.throughput(Throughput::Elements(size));

    for workers in [1usize, 4, 16].iter() {
        group.bench_with_input(BenchmarkId::new("workers", workers), workers, |b, &workers| {
            b.iter(|| {
                rt.block_on(async {
                    let pp = Pipeline::new();
                    let mapped = transform(&pp, workers, numbers(&pp, size), |x| async move {
                        black_box(x * 2)
                    });
                    black_box(sum_all(&pp, mapped).await);
                    pp.shutdown().await;
                })
            });
        });
    }

    group.finish();
}

fn bench_buffer_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_size");
    let rt = runtime();
    let size = 10_000u64;
    group.throughput(Throughput::Elements(size));

    for buffer in [1usize, 16, 256].iter() {
        group.bench_with_input(BenchmarkId::new("capacity", buffer), buffer, |b, &buffer| {
            b.iter(|| {
                rt.block_on(async {
                    let pp = Pipeline::builder().buffer_size(buffer).build();
                    black_box(sum_all(&pp, numbers(&pp, size)).await);
                    pp.shutdown().await;
                })
            });
        });
    }

    group.finish();
}

fn bench_fan_in(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_in");
    let rt = runtime();

    for inputs in [2u64, 8, 32].iter() {
        let per_input = 10_000 / inputs;
        group.throughput(Throughput::Elements(per_input * inputs));

        group.bench_with_input(BenchmarkId::new("inputs", inputs), inputs, |b, &inputs| {
            b.iter(|| {
                rt.block_on(async {
                    let pp = Pipeline::builder().buffer_size(16).build();
                    let sources = (0..inputs).map(|_| numbers(&pp, per_input)).collect();
                    black_box(sum_all(&pp, fan_in(&pp, sources)).await);
                    pp.shutdown().await;
                })
            });
        });
    }

    group.finish();
}

fn bench_shutdown(c: &mut Criterion) {
    let rt = runtime();

    c.bench_function("shutdown_64_blocked_workers", |b| {
        b.iter(|| {
            rt.block_on(async {
                let pp = Pipeline::new();
                let (_writer, idle) = conduit::<u64>(1);
                let _done = process(&pp, 64, idle, |v| async move {
                    black_box(v);
                });
                pp.shutdown().await;
            })
        });
    });
}

criterion_group!(
    benches,
    bench_transform_pool,
    bench_buffer_size,
    bench_fan_in,
    bench_shutdown
);
criterion_main!(benches);

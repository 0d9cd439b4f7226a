use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pipesieve_core::{MemorySink, SieveConfig, SieveDriver};
use std::sync::Arc;

fn bench_drive(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("drive");

    for limit in [35u32, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            b.iter(|| {
                runtime.block_on(async {
                    let sink = Arc::new(MemorySink::new());
                    let driver =
                        SieveDriver::with_tokio(SieveConfig::new(black_box(limit)), sink).unwrap();
                    driver.drive().await.unwrap()
                })
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_drive);
criterion_main!(benches);

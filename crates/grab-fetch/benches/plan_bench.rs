use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use grab_fetch::Plan;
use grab_fetch::core::plan;

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");

    // 1MB, 100MB and 4GB
    for file_size in [1024 * 1024, 100 * 1024 * 1024, 4 * 1024 * 1024 * 1024] {
        for chunk_size in [64 * 1024, 1024 * 1024, 8 * 1024 * 1024] {
            group.throughput(Throughput::Bytes(file_size));
            group.bench_with_input(
                BenchmarkId::new("file_size", format!("{file_size}_chunk_{chunk_size}")),
                &(file_size, chunk_size),
                |b, &(file_size, chunk_size)| {
                    b.iter(|| black_box(plan(black_box(file_size), black_box(chunk_size))));
                },
            );
        }
    }

    group.finish();
}

fn bench_range_headers(c: &mut Criterion) {
    let Ok(Plan::Ranges(ranges)) = plan(1024 * 1024 * 1024, 1024 * 1024) else {
        return;
    };

    c.bench_function("range_headers_1024", |b| {
        b.iter(|| {
            for range in &ranges {
                black_box(range.header_value());
            }
        });
    });
}

criterion_group!(benches, bench_plan, bench_range_headers);
criterion_main!(benches);

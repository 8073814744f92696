use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use marginalia_engine::group_overlaps;
mod common;

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");

    for size in [10, 100, 1000] {
        let suggestions = common::generate_suggestions(size);
        group.bench_with_input(BenchmarkId::new("group_overlaps", size), &suggestions, |b, s| {
            b.iter(|| std::hint::black_box(group_overlaps(s.clone())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_grouping);
criterion_main!(benches);

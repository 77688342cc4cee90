use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use dev_utils::get_example_scenario;
use raptor::Journey;

fn search_benchmark(c: &mut Criterion) {
    let (feed, start, _departure_time, _end, config) = get_example_scenario();
    c.bench_function("search", |b| {
        b.iter(|| raptor::search(black_box(&feed), black_box(start), black_box(config)))
    });
}

fn reconstruct_benchmark(c: &mut Criterion) {
    let (feed, start, departure_time, end, config) = get_example_scenario();
    let store = raptor::search(&feed, start, config);
    c.bench_function("reconstruct", |b| {
        b.iter(|| Journey::reconstruct(black_box(&feed), black_box(&store), black_box(end), black_box(departure_time)))
    });
}

criterion_group!(benches, search_benchmark, reconstruct_benchmark);
criterion_main!(benches);

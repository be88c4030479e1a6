use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use esr_processor::{
    config::RatingConfig,
    model::{engine::RatingEngine, structures::rater_kind::RaterKind},
    utils::test_utils::generate_random_stream
};

pub fn criterion_benchmark(c: &mut Criterion) {
    let rows = generate_random_stream(500, 42);

    let mut group = c.benchmark_group("replay_500_games");
    for kind in [RaterKind::Pairwise, RaterKind::RankBased] {
        let engine = RatingEngine::new(RatingConfig {
            rater_model: kind,
            ..RatingConfig::default()
        })
        .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(kind), &rows, |b, rows| {
            b.iter(|| engine.process(rows).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

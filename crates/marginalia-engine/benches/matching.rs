use criterion::{Criterion, criterion_group, criterion_main};
use marginalia_engine::{Document, Matcher, Proposal, SuggestionEngine};
mod common;

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");
    group.sample_size(20);

    let live = common::generate_suggestions(200);
    let matcher = Matcher::default();

    group.bench_function("fingerprint_hit", |b| {
        let probe = Proposal::literal("phrase number 150 of the draft", "rewritten phrase 150");
        b.iter(|| std::hint::black_box(matcher.find_match(&probe, &live)));
    });

    group.bench_function("full_ladder_miss", |b| {
        let probe = Proposal::literal("an entirely unrelated sentence", "something else");
        b.iter(|| std::hint::black_box(matcher.find_match(&probe, &live)));
    });

    group.bench_function("reconcile_recreate", |b| {
        let doc = Document::from_text(&common::generate_manuscript(50));
        let external = common::generate_proposals(25);
        b.iter(|| {
            let mut engine = SuggestionEngine::new(doc.clone());
            std::hint::black_box(engine.reconcile(&external));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_matching);
criterion_main!(benches);

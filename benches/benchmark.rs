// Performance benchmarks for graph construction and analysis
use cograph_analysis::{detect, score, CommunityAlgorithm, CommunityParams, EdgeAlgorithm, EdgeParams};
use cograph_core::{
    BuildConfig, CooccurrenceBuilder, CooccurrenceConfig, EntityGraphBuilder, EntityGraphConfig, Graph, Identity,
    NoProgress, PairStrategy, TaggedRecord,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;

/// Records with Zipf-like tag popularity drawn from `vocabulary` tags.
fn generate_records(count: usize, vocabulary: usize, seed: u64) -> Vec<TaggedRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let n = rng.random_range(2..8);
            let tags: Vec<String> = (0..n)
                .map(|_| {
                    let r: f64 = rng.random();
                    let t = ((vocabulary as f64).powf(r) - 1.0) as usize;
                    format!("tag{}", t.min(vocabulary - 1))
                })
                .collect();
            TaggedRecord::new(format!("rec{}", i), tags)
        })
        .collect()
}

fn tag_graph(records: &[TaggedRecord]) -> Graph {
    BuildConfig::default()
        .build(records, &Identity, &NoProgress)
        .expect("build")
        .graph
}

fn benchmark_accumulator(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulator");

    for size in [1_000, 10_000, 100_000].iter() {
        let records = generate_records(*size, 2_000, 1);
        group.bench_with_input(BenchmarkId::new("add_build", size), &records, |b, records| {
            b.iter(|| {
                let mut builder = CooccurrenceBuilder::new(CooccurrenceConfig::default()).unwrap();
                for record in records {
                    builder.add(&record.tags, None);
                }
                black_box(builder.build());
            });
        });
    }

    group.finish();
}

fn benchmark_entity_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("entity_graph");
    let records = generate_records(5_000, 500, 2);

    group.bench_function("exact", |b| {
        let builder = EntityGraphBuilder::new(EntityGraphConfig::exact()).unwrap();
        b.iter(|| black_box(builder.build(&records).unwrap()));
    });

    group.bench_function("bounded_sampled", |b| {
        let builder = EntityGraphBuilder::new(EntityGraphConfig {
            max_tag_degree: Some(50),
            counter_capacity: Some(20_000),
            strategy: PairStrategy::Bounded,
            ..EntityGraphConfig::default()
        })
        .unwrap();
        b.iter(|| black_box(builder.build(&records).unwrap()));
    });

    group.finish();
}

fn benchmark_communities(c: &mut Criterion) {
    let mut group = c.benchmark_group("communities");
    let graph = tag_graph(&generate_records(20_000, 1_000, 3));
    let params = CommunityParams {
        k: Some(3),
        ..CommunityParams::default()
    };

    for algorithm in [
        CommunityAlgorithm::Louvain,
        CommunityAlgorithm::GreedyModularity,
        CommunityAlgorithm::LabelPropagation,
    ] {
        group.bench_function(algorithm.as_str(), |b| {
            b.iter(|| black_box(detect(&graph, algorithm, &params).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_edge_scores(c: &mut Criterion) {
    let mut group = c.benchmark_group("edge_scores");
    let graph = tag_graph(&generate_records(20_000, 1_000, 4));
    let subset: Vec<&str> = graph.points.iter().take(150).map(|p| p.id.as_str()).collect();

    for algorithm in EdgeAlgorithm::ALL {
        group.bench_function(algorithm.as_str(), |b| {
            b.iter(|| black_box(score(&graph, &subset, algorithm, Some(20), &EdgeParams::default()).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_accumulator,
    benchmark_entity_graph,
    benchmark_communities,
    benchmark_edge_scores
);
criterion_main!(benches);

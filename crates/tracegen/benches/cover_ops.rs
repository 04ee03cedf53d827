//! Path Cover Benchmarks
//!
//! Benchmarks for graph loading, arborescence construction, and greedy cover
//! on synthetic layered state graphs.
//!
//! Run with: `cargo bench --bench cover_ops`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tracegen::{
    cover_paths, Arborescence, GreedyLongestFirst, LoadOptions, RootPolicy, StateGraph, TargetSet,
};

const SNAPSHOT: &str = r#"{"txnStatus": {"n": {"t1": "OK"}}, "allDurableTs": {"n": 0}, "stableTs": {"n": -1}, "oldestTs": {"n": -1}}"#;

/// `layers` layers of `width` states; every state links to `fanout` states of the next layer.
fn generate_layered_graph(layers: usize, width: usize, fanout: usize) -> (String, String) {
    let mut states = String::from("{\"states\": [\n");
    states.push_str(&format!("{{\"fp\": 0, \"val\": {SNAPSHOT}}}"));
    for layer in 0..layers {
        for i in 0..width {
            let fp = 1 + layer * width + i;
            states.push_str(&format!(",\n{{\"fp\": {fp}, \"val\": {SNAPSHOT}}}"));
        }
    }
    states.push_str("\n]}");

    let mut edges = Vec::new();
    for i in 0..width {
        edges.push((0, 1 + i));
    }
    for layer in 0..layers.saturating_sub(1) {
        for i in 0..width {
            let from = 1 + layer * width + i;
            for j in 0..fanout {
                let to = 1 + (layer + 1) * width + (i + j) % width;
                edges.push((from, to));
            }
        }
    }
    let edges = edges
        .iter()
        .map(|(from, to)| {
            format!(
                "{{\"from\": {from}, \"to\": {to}, \"act\": \"TransactionWrite\", \"params\": {{\"tid\": \"t1\", \"k\": \"k{to}\", \"v\": \"t1\"}}}}"
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    (states, format!("{{\"edges\": [\n{edges}\n]}}"))
}

fn sizes() -> Vec<(&'static str, StateGraph)> {
    [("small_5x4", 5, 4), ("medium_20x20", 20, 20), ("large_50x40", 50, 40)]
        .into_iter()
        .map(|(name, layers, width)| {
            let (states, edges) = generate_layered_graph(layers, width, 3);
            let graph = StateGraph::from_json(&states, &edges, &LoadOptions::new()).unwrap();
            (name, graph)
        })
        .collect()
}

fn bench_graph_loading(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_loading");

    for (name, layers, width) in [("small_5x4", 5, 4), ("medium_20x20", 20, 20)] {
        let docs = generate_layered_graph(layers, width, 3);
        group.bench_with_input(BenchmarkId::from_parameter(name), &docs, |bench, docs| {
            bench.iter(|| {
                let graph =
                    StateGraph::from_json(black_box(&docs.0), black_box(&docs.1), &LoadOptions::new())
                        .unwrap();
                black_box(graph);
            });
        });
    }

    group.finish();
}

fn bench_arborescence(c: &mut Criterion) {
    let mut group = c.benchmark_group("arborescence");

    for (name, graph) in sizes() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &graph, |bench, g| {
            bench.iter(|| {
                let tree = Arborescence::compute(black_box(g), RootPolicy::UniqueSource).unwrap();
                black_box(tree);
            });
        });
    }

    group.finish();
}

fn bench_greedy_cover(c: &mut Criterion) {
    let mut group = c.benchmark_group("greedy_cover");

    for (name, graph) in sizes() {
        let tree = Arborescence::compute(&graph, RootPolicy::UniqueSource).unwrap();
        let targets = TargetSet::all_states(&graph);
        group.bench_with_input(BenchmarkId::from_parameter(name), &tree, |bench, tree| {
            bench.iter(|| {
                let cover =
                    cover_paths(&graph, black_box(tree), &targets, 1.0, &GreedyLongestFirst)
                        .unwrap();
                black_box(cover);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_graph_loading,
    bench_arborescence,
    bench_greedy_cover
);
criterion_main!(benches);

//! Criterion benchmarks for graph kernels
//!
//! Compares traversal directions and kernel variants on the same inputs:
//! - BFS: adaptive vs push-only vs level-synchronous
//! - Connected components: with and without dominant-component skipping
//! - PageRank: pull vs push

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use frontier_graph::{
    bfs_levels, bfs_with_config, connected_components_with_config, pagerank_pull, pagerank_push,
    BfsConfig, ComponentsConfig, CsrGraph, DirectionPolicy, NodeId,
};
use std::hint::black_box;

/// Generate scale-free graph (Barabási-Albert model approximation)
fn generate_scale_free_graph(num_nodes: usize, edges_per_node: usize) -> Vec<(NodeId, NodeId)> {
    let mut edges = Vec::new();
    let mut rng_state = 12345_u64; // Simple LCG for reproducibility

    for node in 0..num_nodes {
        for _ in 0..edges_per_node {
            rng_state = rng_state.wrapping_mul(1103515245).wrapping_add(12345);
            let target = (rng_state % num_nodes as u64) as u32;

            if target != node as u32 {
                edges.push((NodeId(node as u32), NodeId(target)));
            }
        }
    }

    edges
}

fn build(size: usize, edges_per_node: usize) -> CsrGraph {
    let edges = generate_scale_free_graph(size, edges_per_node);
    CsrGraph::with_num_nodes(size, &edges).unwrap()
}

/// Benchmark: CSR graph construction from edge list
fn bench_csr_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("csr_construction");

    for size in [1_000, 10_000, 100_000].iter() {
        let edges = generate_scale_free_graph(*size, 8);

        group.bench_with_input(BenchmarkId::new("with_num_nodes", size), &edges, |b, edges| {
            b.iter(|| {
                let graph = CsrGraph::with_num_nodes(*size, black_box(edges)).unwrap();
                black_box(graph);
            });
        });
    }

    group.finish();
}

/// Benchmark: BFS direction policies
fn bench_bfs(c: &mut Criterion) {
    let mut group = c.benchmark_group("bfs");

    for size in [10_000, 100_000].iter() {
        let graph = build(*size, 8);

        for (name, policy) in [
            ("adaptive", DirectionPolicy::default()),
            ("push_only", DirectionPolicy::AlwaysPush),
            ("edge_budget", DirectionPolicy::EdgeBudget(20)),
        ] {
            let config = BfsConfig::with_policy(policy);
            group.bench_with_input(BenchmarkId::new(name, size), &graph, |b, graph| {
                b.iter(|| {
                    let parents = bfs_with_config(black_box(graph), NodeId(0), &config).unwrap();
                    black_box(parents);
                });
            });
        }

        group.bench_with_input(BenchmarkId::new("levels", size), &graph, |b, graph| {
            b.iter(|| {
                let levels = bfs_levels(black_box(graph), NodeId(0)).unwrap();
                black_box(levels);
            });
        });
    }

    group.finish();
}

/// Benchmark: Afforest connected components
fn bench_connected_components(c: &mut Criterion) {
    let mut group = c.benchmark_group("connected_components");

    for size in [10_000, 100_000].iter() {
        let graph = build(*size, 4);

        for (name, skip) in [("skip_dominant", true), ("full_finalize", false)] {
            let config = ComponentsConfig::default().with_skip_dominant(skip);
            group.bench_with_input(BenchmarkId::new(name, size), &graph, |b, graph| {
                b.iter(|| {
                    let labels = connected_components_with_config(black_box(graph), &config);
                    black_box(labels);
                });
            });
        }
    }

    group.finish();
}

/// Benchmark: PageRank pull vs push
fn bench_pagerank(c: &mut Criterion) {
    let mut group = c.benchmark_group("pagerank");

    for size in [10_000, 100_000].iter() {
        let graph = build(*size, 8);

        group.bench_with_input(BenchmarkId::new("pull_20", size), &graph, |b, graph| {
            b.iter(|| {
                let scores = pagerank_pull(black_box(graph), 20, 0.0).unwrap();
                black_box(scores);
            });
        });

        group.bench_with_input(BenchmarkId::new("push_20", size), &graph, |b, graph| {
            b.iter(|| {
                let scores = pagerank_push(black_box(graph), 20).unwrap();
                black_box(scores);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_csr_construction,
    bench_bfs,
    bench_connected_components,
    bench_pagerank
);
criterion_main!(benches);

//! `PageRank` by power iteration, in pull and push form
//!
//! Based on Page et al. (1999) "The `PageRank` Citation Ranking: Bringing Order to the Web"
//!
//! ```text
//! PR(u) = (1-d)/N + d * Σ(PR(v) / outdegree(v))   for v → u
//! ```
//!
//! Vertices without out-edges contribute nothing; their mass is not
//! redistributed, so scores sum to 1.0 only on graphs without dead ends.

use crate::error::GraphError;
use crate::frontier::{
    edge_map, vertex_map, AtomicF32, DirectionPolicy, EdgeMapConfig, EdgeOp, Output, VertexSubset,
};
use crate::storage::{vertex_id, GraphView};
use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use tracing::{debug, info, info_span};

/// Damping factor for `PageRank` (Google standard)
pub const DAMPING_FACTOR: f32 = 0.85;

/// Configuration for the `*_with_config` `PageRank` kernels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    /// Damping factor in `[0, 1)`
    pub damping: f32,
    /// Iteration cap
    pub max_iterations: usize,
    /// Stop once an iteration's L1 score change drops below this
    pub epsilon: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: DAMPING_FACTOR,
            max_iterations: 20,
            epsilon: 0.0,
        }
    }
}

impl PageRankConfig {
    /// Same config with a different damping factor
    #[must_use]
    pub const fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    /// Same config with a different iteration cap
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Same config with a different convergence threshold
    #[must_use]
    pub const fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Check the parameters
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfig`] for damping outside `[0, 1)` or a
    /// negative or NaN epsilon.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.damping) {
            return Err(GraphError::InvalidConfig(format!(
                "damping must be in [0, 1), got {}",
                self.damping
            ))
            .into());
        }
        if self.epsilon.is_nan() || self.epsilon < 0.0 {
            return Err(GraphError::InvalidConfig(format!(
                "epsilon must be non-negative, got {}",
                self.epsilon
            ))
            .into());
        }
        Ok(())
    }
}

/// Scores plus convergence information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRankResult {
    /// Score per vertex
    pub scores: Vec<f32>,
    /// Iterations performed
    pub iterations: usize,
    /// L1 change of the last iteration (0.0 if none ran)
    pub error: f64,
}

impl PageRankResult {
    fn empty() -> Self {
        Self {
            scores: Vec::new(),
            iterations: 0,
            error: 0.0,
        }
    }
}

#[inline]
#[allow(clippy::cast_precision_loss)] // Degrees far below 2^24
fn contribution<G: GraphView>(graph: &G, v: u32, score: f32) -> f32 {
    match graph.out_degree(v) {
        0 => 0.0,
        degree => score / degree as f32,
    }
}

fn l1_change(current: &[f32], previous: &[f32]) -> f64 {
    current
        .par_iter()
        .zip(previous)
        .map(|(&a, &b)| f64::from((a - b).abs()))
        .sum()
}

/// Pull `PageRank` (the default kernel)
///
/// # Arguments
///
/// * `graph` - Any [`GraphView`] backend
/// * `max_iterations` - Iteration cap
/// * `epsilon` - L1 convergence threshold (`0.0` runs every iteration)
///
/// # Errors
///
/// Returns [`GraphError::InvalidConfig`] for a negative or NaN epsilon.
///
/// # Example
///
/// ```
/// use frontier_graph::{pagerank_pull, CsrGraph, NodeId};
///
/// let graph = CsrGraph::from_edge_list(&[
///     (NodeId(0), NodeId(1)),
///     (NodeId(1), NodeId(2)),
///     (NodeId(2), NodeId(0)),
/// ])
/// .unwrap();
///
/// let scores = pagerank_pull(&graph, 20, 1e-6).unwrap();
/// assert_eq!(scores.len(), 3);
/// assert!((scores.iter().sum::<f32>() - 1.0).abs() < 1e-5);
/// ```
pub fn pagerank_pull<G: GraphView>(
    graph: &G,
    max_iterations: usize,
    epsilon: f64,
) -> Result<Vec<f32>> {
    let config = PageRankConfig::default()
        .with_max_iterations(max_iterations)
        .with_epsilon(epsilon);
    pagerank_pull_with_config(graph, &config).map(|result| result.scores)
}

/// Pull `PageRank` with an explicit configuration
///
/// Each iteration gathers the previous iteration's contributions over
/// in-neighbors into fresh scores, measures the L1 change, then refreshes
/// the contributions. Every vertex is the sole writer of its own score, so
/// no atomics are involved.
///
/// # Errors
///
/// Returns [`GraphError::InvalidConfig`] if the configuration is invalid.
#[allow(clippy::cast_precision_loss)] // Graphs >16M nodes unlikely
pub fn pagerank_pull_with_config<G: GraphView>(
    graph: &G,
    config: &PageRankConfig,
) -> Result<PageRankResult> {
    config.validate()?;
    let n = graph.vertex_count();
    if n == 0 {
        return Ok(PageRankResult::empty());
    }

    let _span = info_span!("pagerank_pull", vertices = n).entered();

    let damping = config.damping;
    let base = (1.0 - damping) / n as f32;
    let mut scores = vec![1.0 / n as f32; n];
    let mut contrib: Vec<f32> = scores
        .par_iter()
        .enumerate()
        .map(|(idx, &score)| contribution(graph, vertex_id(idx), score))
        .collect();

    let mut iterations = 0;
    let mut error = 0.0;
    while iterations < config.max_iterations {
        let next: Vec<f32> = (0..n)
            .into_par_iter()
            .map(|idx| {
                let incoming: f32 = graph
                    .in_neighbors(vertex_id(idx))
                    .iter()
                    .map(|&u| contrib[u as usize])
                    .sum();
                base + damping * incoming
            })
            .collect();

        error = l1_change(&next, &scores);
        scores = next;
        contrib
            .par_iter_mut()
            .zip(scores.par_iter())
            .enumerate()
            .for_each(|(idx, (slot, &score))| *slot = contribution(graph, vertex_id(idx), score));

        iterations += 1;
        debug!(iteration = iterations, error, "pagerank_pull iteration");
        if error < config.epsilon {
            break;
        }
    }

    info!(iterations, error, "pagerank_pull complete");
    Ok(PageRankResult {
        scores,
        iterations,
        error,
    })
}

/// Scatter of source contributions into destination accumulators
struct Scatter<'a> {
    contrib: &'a [f32],
    accum: &'a [AtomicF32],
}

impl EdgeOp for Scatter<'_> {
    fn apply(&self, src: u32, dst: u32) -> bool {
        self.apply_atomic(src, dst)
    }

    fn apply_atomic(&self, src: u32, dst: u32) -> bool {
        self.accum[dst as usize].fetch_add(self.contrib[src as usize], Ordering::Relaxed);
        false
    }
}

/// Push `PageRank`
///
/// # Errors
///
/// Never fails with the default damping; the `Result` mirrors
/// [`pagerank_pull`].
pub fn pagerank_push<G: GraphView>(graph: &G, max_iterations: usize) -> Result<Vec<f32>> {
    let config = PageRankConfig::default().with_max_iterations(max_iterations);
    pagerank_push_with_config(graph, &config).map(|result| result.scores)
}

/// Push `PageRank` with an explicit configuration
///
/// Every vertex with out-edges scatters `score / out_degree` into its
/// out-neighbors' accumulators with an atomic float add (concurrent sources
/// share destinations). A vertex map then applies the damping formula and
/// resets each accumulator for the next iteration.
///
/// # Errors
///
/// Returns [`GraphError::InvalidConfig`] if the configuration is invalid.
#[allow(clippy::cast_precision_loss)] // Graphs >16M nodes unlikely
pub fn pagerank_push_with_config<G: GraphView>(
    graph: &G,
    config: &PageRankConfig,
) -> Result<PageRankResult> {
    config.validate()?;
    let n = graph.vertex_count();
    if n == 0 {
        return Ok(PageRankResult::empty());
    }

    let _span = info_span!("pagerank_push", vertices = n).entered();

    let damping = config.damping;
    let base = (1.0 - damping) / n as f32;
    let init = 1.0 / n as f32;
    let scores: Vec<AtomicF32> = (0..n).into_par_iter().map(|_| AtomicF32::new(init)).collect();
    let accum: Vec<AtomicF32> = (0..n).into_par_iter().map(|_| AtomicF32::default()).collect();

    let sources = VertexSubset::from_unique(
        (0..n)
            .into_par_iter()
            .map(vertex_id)
            .filter(|&v| graph.out_degree(v) > 0)
            .collect(),
        n,
    );
    let everyone = VertexSubset::full(n);
    let scatter_config =
        EdgeMapConfig::with_policy(DirectionPolicy::AlwaysPush).with_output(Output::Discard);

    let mut iterations = 0;
    let mut error = 0.0;
    while iterations < config.max_iterations {
        let previous: Vec<f32> = scores.par_iter().map(|s| s.load(Ordering::Relaxed)).collect();
        let contrib: Vec<f32> = previous
            .par_iter()
            .enumerate()
            .map(|(idx, &score)| contribution(graph, vertex_id(idx), score))
            .collect();

        let op = Scatter {
            contrib: &contrib,
            accum: &accum,
        };
        edge_map(graph, &sources, &op, &scatter_config);

        vertex_map(&everyone, |v| {
            let incoming = accum[v as usize].swap(0.0, Ordering::Relaxed);
            scores[v as usize].store(base + damping * incoming, Ordering::Relaxed);
        });

        let current: Vec<f32> = scores.par_iter().map(|s| s.load(Ordering::Relaxed)).collect();
        error = l1_change(&current, &previous);

        iterations += 1;
        debug!(iteration = iterations, error, "pagerank_push iteration");
        if error < config.epsilon {
            break;
        }
    }

    info!(iterations, error, "pagerank_push complete");
    Ok(PageRankResult {
        scores: scores.into_iter().map(AtomicF32::into_inner).collect(),
        iterations,
        error,
    })
}

/// Highest-scoring vertex and its score, smallest id on ties
///
/// # Example
///
/// ```
/// use frontier_graph::top_score;
///
/// assert_eq!(top_score(&[0.1, 0.4, 0.4, 0.1]), Some((1, 0.4)));
/// assert_eq!(top_score(&[]), None);
/// ```
#[must_use]
pub fn top_score(scores: &[f32]) -> Option<(u32, f32)> {
    scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1).then(b.0.cmp(&a.0)))
        .map(|(idx, &score)| (vertex_id(idx), score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CsrGraph, NodeId};

    fn scenario() -> CsrGraph {
        CsrGraph::with_num_nodes(
            5,
            &[
                (NodeId(0), NodeId(1)),
                (NodeId(1), NodeId(2)),
                (NodeId(2), NodeId(0)),
                (NodeId(3), NodeId(4)),
            ],
        )
        .unwrap()
    }

    /// Ring 0 → 1 → … → n-1 → 0 with chords i → i+3
    fn ring_with_chords(n: u32) -> CsrGraph {
        let mut edges = Vec::new();
        for i in 0..n {
            edges.push((NodeId(i), NodeId((i + 1) % n)));
            if i % 2 == 0 {
                edges.push((NodeId(i), NodeId((i + 3) % n)));
            }
        }
        CsrGraph::from_edge_list(&edges).unwrap()
    }

    #[test]
    fn test_pagerank_scenario_ranking() {
        let scores = pagerank_pull(&scenario(), 20, 0.0).unwrap();

        for v in 0..3 {
            assert!((scores[v] - 0.2).abs() < 1e-5);
            assert!(scores[v] > scores[3]);
            assert!(scores[v] > scores[4]);
        }
        assert!((scores[3] - 0.03).abs() < 1e-6);
        assert!((scores[4] - 0.0555).abs() < 1e-5);
    }

    #[test]
    fn test_pagerank_conserves_mass_without_dead_ends() {
        let graph = ring_with_chords(30);
        let scores = pagerank_pull(&graph, 100, 1e-9).unwrap();
        assert!((scores.iter().sum::<f32>() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_push_matches_pull() {
        let graph = ring_with_chords(64);
        let pull = pagerank_pull(&graph, 15, 0.0).unwrap();
        let push = pagerank_push(&graph, 15).unwrap();

        for (a, b) in pull.iter().zip(&push) {
            assert!((a - b).abs() < 1e-5, "pull {a} vs push {b}");
        }
    }

    #[test]
    fn test_push_scenario_matches_pull() {
        let pull = pagerank_pull(&scenario(), 20, 0.0).unwrap();
        let push = pagerank_push(&scenario(), 20).unwrap();
        for (a, b) in pull.iter().zip(&push) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_epsilon_stops_early() {
        let config = PageRankConfig::default()
            .with_max_iterations(1000)
            .with_epsilon(1e-4);
        let result = pagerank_pull_with_config(&ring_with_chords(20), &config).unwrap();

        assert!(result.iterations < 1000);
        assert!(result.error < 1e-4);
    }

    #[test]
    fn test_zero_iterations_returns_initial_scores() {
        let config = PageRankConfig::default().with_max_iterations(0);
        let result = pagerank_push_with_config(&scenario(), &config).unwrap();

        assert_eq!(result.iterations, 0);
        assert!(result.scores.iter().all(|&s| (s - 0.2).abs() < f32::EPSILON));
    }

    #[test]
    fn test_isolated_vertices_get_base_score() {
        let graph = CsrGraph::with_num_nodes(4, &[]).unwrap();
        let scores = pagerank_push(&graph, 3).unwrap();
        assert!(scores.iter().all(|&s| (s - 0.15 / 4.0).abs() < 1e-7));
    }

    #[test]
    fn test_empty_graph() {
        let graph = CsrGraph::new();
        assert!(pagerank_pull(&graph, 10, 0.0).unwrap().is_empty());
        assert!(pagerank_push(&graph, 10).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let graph = scenario();
        for config in [
            PageRankConfig::default().with_damping(1.0),
            PageRankConfig::default().with_damping(-0.1),
            PageRankConfig::default().with_epsilon(-1.0),
            PageRankConfig::default().with_epsilon(f64::NAN),
        ] {
            let err = pagerank_pull_with_config(&graph, &config).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<GraphError>(),
                Some(GraphError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_top_score() {
        let scores = pagerank_pull(&scenario(), 20, 0.0).unwrap();
        let (vertex, score) = top_score(&scores).unwrap();
        assert!(vertex < 3);
        assert!((score - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_config_json() {
        let config: PageRankConfig =
            serde_json::from_str(r#"{"max_iterations": 50, "epsilon": 1e-7}"#).unwrap();
        assert_eq!(config.damping, DAMPING_FACTOR);
        assert_eq!(config.max_iterations, 50);
    }
}

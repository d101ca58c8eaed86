//! Direction-optimizing edge map
//!
//! Based on Ligra (Shun & Blelloch, `PPoPP` 2013) and Beamer et al.
//! "Direction-Optimizing Breadth-First Search" (SC 2012).
//!
//! One call advances a frontier by one step:
//!
//! ```text
//! push (sparse frontier)             pull (dense frontier)
//!   for s in frontier (parallel)       for d in 0..n (parallel)
//!     for d in out(s)                    if should_process(d)
//!       if should_process(d)               for s in in(d)
//!         apply_atomic(s, d)                 if s in frontier: apply(s, d)
//!                                            stop once !should_process(d)
//! ```
//!
//! Push may hit the same destination from many sources at once, so it calls
//! the atomic variant. Pull gives each destination a single writer (the task
//! scanning it), so the plain variant suffices.

use super::counters::WorkerCounters;
use super::subset::{word_count, AtomicBitmap, VertexSubset};
use crate::error::GraphError;
use crate::storage::{vertex_id, Direction, GraphView};
use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use tracing::debug;

/// Default pull threshold: frontier holds at least 1/20 of the vertices
pub const DEFAULT_DENSITY: f64 = 0.05;

/// Per-edge operation applied by [`edge_map`]
///
/// Implementations keep their state in atomics: push runs `apply_atomic`
/// concurrently on shared destinations, pull runs `apply` with one writer per
/// destination.
pub trait EdgeOp: Sync {
    /// Whether `dst` still wants updates (e.g. "not yet visited")
    fn should_process(&self, _dst: u32) -> bool {
        true
    }

    /// Update for `src → dst` when only one thread writes `dst`
    ///
    /// Returns `true` if `dst` should join the next frontier.
    fn apply(&self, src: u32, dst: u32) -> bool;

    /// Update for `src → dst` when concurrent writers may target `dst`
    ///
    /// Returns `true` if `dst` should join the next frontier.
    fn apply_atomic(&self, src: u32, dst: u32) -> bool;
}

/// Traversal direction taken by one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDirection {
    /// Sparse, source-driven: frontier members scatter along out-edges
    Push,
    /// Dense, destination-driven: every vertex gathers along in-edges
    Pull,
}

/// How [`edge_map`] picks push or pull for a step
///
/// The switch point is an empirical tuning knob, so it is configuration
/// rather than a constant. Kernels ship their own defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionPolicy {
    /// Pull once `frontier.len() >= fraction * vertex_count`
    Density(f64),
    /// Pull once frontier size plus its out-degree sum exceeds `edge_count / divisor`
    EdgeBudget(usize),
    /// Always push
    AlwaysPush,
    /// Always pull
    AlwaysPull,
}

impl Default for DirectionPolicy {
    fn default() -> Self {
        Self::Density(DEFAULT_DENSITY)
    }
}

impl DirectionPolicy {
    /// Check the policy parameters
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfig`] for a non-positive or non-finite
    /// density fraction, or a zero edge-budget divisor.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Density(fraction) if !(fraction.is_finite() && fraction > 0.0) => {
                Err(GraphError::InvalidConfig(format!(
                    "density fraction must be positive and finite, got {fraction}"
                ))
                .into())
            }
            Self::EdgeBudget(0) => {
                Err(GraphError::InvalidConfig("edge budget divisor must be non-zero".into()).into())
            }
            _ => Ok(()),
        }
    }

    /// Pick the direction for one step over `frontier`
    #[allow(clippy::cast_precision_loss)] // Vertex counts far below 2^52
    pub fn choose<G: GraphView>(&self, graph: &G, frontier: &VertexSubset) -> StepDirection {
        let pull = match *self {
            Self::AlwaysPush => false,
            Self::AlwaysPull => true,
            Self::Density(fraction) => {
                frontier.len() as f64 >= fraction * graph.vertex_count() as f64
            }
            Self::EdgeBudget(divisor) => {
                let out_edges: usize = frontier.par_iter().map(|v| graph.out_degree(v)).sum();
                frontier.len() + out_edges > graph.edge_count() / divisor.max(1)
            }
        };
        if pull {
            StepDirection::Pull
        } else {
            StepDirection::Push
        }
    }
}

/// Whether [`edge_map`] materializes the next frontier
///
/// Kernels that only want the side effects of `apply` (e.g. `PageRank`
/// scatter) request [`Output::Discard`] and get an empty subset back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Output {
    /// Build the next frontier from successful updates
    #[default]
    Collect,
    /// Skip frontier construction
    Discard,
}

/// Per-call configuration for [`edge_map`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeMapConfig {
    /// Push/pull selection
    pub policy: DirectionPolicy,
    /// Next-frontier construction
    pub output: Output,
}

impl EdgeMapConfig {
    /// Config with the given policy, collecting output
    #[must_use]
    pub fn with_policy(policy: DirectionPolicy) -> Self {
        Self {
            policy,
            output: Output::Collect,
        }
    }

    /// Same config with a different output mode
    #[must_use]
    pub const fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }
}

/// What one [`edge_map`] step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepStats {
    /// Direction taken
    pub direction: StepDirection,
    /// Cardinality of the input frontier
    pub frontier_size: usize,
    /// Neighbor entries scanned, reduced from per-worker counters
    pub edges_examined: usize,
    /// Cardinality of the produced frontier (0 when discarded)
    pub next_size: usize,
}

/// Advance `frontier` one step by applying `op` along its edges
///
/// The next frontier holds every destination for which the update returned
/// `true`, each exactly once. An empty frontier yields an empty result
/// without touching the graph.
///
/// # Example
///
/// ```
/// use frontier_graph::frontier::{edge_map, EdgeMapConfig, EdgeOp};
/// use frontier_graph::{CsrGraph, NodeId, VertexSubset};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Reach(Vec<AtomicBool>);
///
/// impl EdgeOp for Reach {
///     fn should_process(&self, d: u32) -> bool {
///         !self.0[d as usize].load(Ordering::Relaxed)
///     }
///     fn apply(&self, _s: u32, d: u32) -> bool {
///         self.0[d as usize].store(true, Ordering::Relaxed);
///         true
///     }
///     fn apply_atomic(&self, _s: u32, d: u32) -> bool {
///         !self.0[d as usize].swap(true, Ordering::AcqRel)
///     }
/// }
///
/// let graph = CsrGraph::from_edge_list(&[(NodeId(0), NodeId(1)), (NodeId(0), NodeId(2))]).unwrap();
/// let op = Reach((0..3).map(|v| AtomicBool::new(v == 0)).collect());
///
/// let (next, stats) = edge_map(&graph, &VertexSubset::single(0, 3), &op, &EdgeMapConfig::default());
/// let mut members = next.to_vec();
/// members.sort_unstable();
/// assert_eq!(members, vec![1, 2]);
/// assert_eq!(stats.frontier_size, 1);
/// ```
pub fn edge_map<G, Op>(
    graph: &G,
    frontier: &VertexSubset,
    op: &Op,
    config: &EdgeMapConfig,
) -> (VertexSubset, StepStats)
where
    G: GraphView,
    Op: EdgeOp,
{
    let n = graph.vertex_count();
    debug_assert_eq!(frontier.universe(), n, "frontier universe must match graph");

    let direction = config.policy.choose(graph, frontier);
    if frontier.is_empty() {
        let stats = StepStats {
            direction,
            frontier_size: 0,
            edges_examined: 0,
            next_size: 0,
        };
        return (VertexSubset::empty(n), stats);
    }

    let counters = WorkerCounters::new();
    let next = match direction {
        StepDirection::Push => push(graph, &frontier.to_sparse(), op, config.output, &counters),
        StepDirection::Pull => pull(graph, &frontier.to_dense(), op, config.output, &counters),
    };

    let stats = StepStats {
        direction,
        frontier_size: frontier.len(),
        edges_examined: counters.reduce(),
        next_size: next.len(),
    };
    debug!(
        direction = ?stats.direction,
        frontier = stats.frontier_size,
        edges = stats.edges_examined,
        next = stats.next_size,
        "edge_map step"
    );
    (next, stats)
}

fn push<G, Op>(
    graph: &G,
    frontier: &VertexSubset,
    op: &Op,
    output: Output,
    counters: &WorkerCounters,
) -> VertexSubset
where
    G: GraphView,
    Op: EdgeOp,
{
    let n = graph.vertex_count();
    let claimed = match output {
        Output::Collect => Some(AtomicBitmap::new(n)),
        Output::Discard => None,
    };
    let claimed = claimed.as_ref();

    let members: Vec<u32> = frontier
        .par_iter()
        .flat_map_iter(|s| {
            let targets = graph.out_neighbors(s);
            counters.add(targets.len());
            targets.iter().copied().filter(move |&d| {
                op.should_process(d)
                    && op.apply_atomic(s, d)
                    && claimed.is_some_and(|bitmap| bitmap.insert(d))
            })
        })
        .collect();

    VertexSubset::from_unique(members, n)
}

fn pull<G, Op>(
    graph: &G,
    frontier: &VertexSubset,
    op: &Op,
    output: Output,
    counters: &WorkerCounters,
) -> VertexSubset
where
    G: GraphView,
    Op: EdgeOp,
{
    let n = graph.vertex_count();

    // One task per 64-vertex word: each destination bit is written by exactly one task
    let words: Vec<u64> = (0..word_count(n))
        .into_par_iter()
        .map(|w| {
            let start = w * 64;
            let end = n.min(start + 64);
            let mut word = 0_u64;
            let mut examined = 0;

            for idx in start..end {
                let d = vertex_id(idx);
                if !op.should_process(d) {
                    continue;
                }
                let mut joined = false;
                examined += graph.scan_neighbors(d, Direction::In, 0, |s| {
                    if frontier.contains(s) && op.apply(s, d) {
                        joined = true;
                        if !op.should_process(d) {
                            return ControlFlow::Break(());
                        }
                    }
                    ControlFlow::Continue(())
                });
                if joined {
                    word |= 1 << (idx - start);
                }
            }

            counters.add(examined);
            word
        })
        .collect();

    match output {
        Output::Collect => VertexSubset::from_bits(words, n),
        Output::Discard => VertexSubset::empty(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CsrGraph, NodeId};
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

    /// First-discovery parent claim (BFS semantics)
    struct Claim {
        parents: Vec<AtomicI32>,
        apply_calls: AtomicUsize,
    }

    impl Claim {
        fn rooted(n: usize, root: u32) -> Self {
            let parents = (0..n)
                .map(|v| AtomicI32::new(if v == root as usize { root as i32 } else { -1 }))
                .collect();
            Self {
                parents,
                apply_calls: AtomicUsize::new(0),
            }
        }
    }

    impl EdgeOp for Claim {
        fn should_process(&self, d: u32) -> bool {
            self.parents[d as usize].load(Ordering::Relaxed) == -1
        }

        fn apply(&self, s: u32, d: u32) -> bool {
            self.apply_calls.fetch_add(1, Ordering::Relaxed);
            self.parents[d as usize].store(s as i32, Ordering::Relaxed);
            true
        }

        fn apply_atomic(&self, s: u32, d: u32) -> bool {
            self.parents[d as usize]
                .compare_exchange(-1, s as i32, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
        }
    }

    /// Counts every update, never joins the frontier twice
    struct Touch(Vec<AtomicUsize>);

    impl EdgeOp for Touch {
        fn apply(&self, _s: u32, d: u32) -> bool {
            self.0[d as usize].fetch_add(1, Ordering::Relaxed);
            true
        }

        fn apply_atomic(&self, s: u32, d: u32) -> bool {
            self.apply(s, d)
        }
    }

    fn fan_in() -> CsrGraph {
        // 0 → 3, 1 → 3, 2 → 3, 3 → 4
        CsrGraph::from_edge_list(&[
            (NodeId(0), NodeId(3)),
            (NodeId(1), NodeId(3)),
            (NodeId(2), NodeId(3)),
            (NodeId(3), NodeId(4)),
        ])
        .unwrap()
    }

    fn sorted(subset: &VertexSubset) -> Vec<u32> {
        let mut members = subset.to_vec();
        members.sort_unstable();
        members
    }

    #[test]
    fn test_push_claims_each_destination_once() {
        let graph = fan_in();
        let frontier = VertexSubset::from_members(vec![0, 1, 2], 5).unwrap();
        let op = Claim::rooted(5, 0);
        op.parents[1].store(1, Ordering::Relaxed);
        op.parents[2].store(2, Ordering::Relaxed);

        let config = EdgeMapConfig::with_policy(DirectionPolicy::AlwaysPush);
        let (next, stats) = edge_map(&graph, &frontier, &op, &config);

        assert_eq!(stats.direction, StepDirection::Push);
        assert_eq!(stats.edges_examined, 3);
        assert_eq!(sorted(&next), vec![3]);
        let parent = op.parents[3].load(Ordering::Relaxed);
        assert!((0..3).contains(&parent));
    }

    #[test]
    fn test_pull_stops_after_first_parent() {
        let graph = fan_in();
        let frontier = VertexSubset::from_members(vec![0, 1, 2], 5).unwrap();
        let op = Claim::rooted(5, 0);
        op.parents[1].store(1, Ordering::Relaxed);
        op.parents[2].store(2, Ordering::Relaxed);

        let config = EdgeMapConfig::with_policy(DirectionPolicy::AlwaysPull);
        let (next, stats) = edge_map(&graph, &frontier, &op, &config);

        assert_eq!(stats.direction, StepDirection::Pull);
        assert!(next.is_dense());
        assert_eq!(sorted(&next), vec![3]);
        // First in-neighbor of 3 is 0 and wins; the scan stops there
        assert_eq!(op.parents[3].load(Ordering::Relaxed), 0);
        assert_eq!(op.apply_calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_push_and_pull_agree_on_next_frontier() {
        let edges: Vec<_> = (0..200_u32)
            .map(|i| (NodeId(i % 50), NodeId((i * 7 + 3) % 200)))
            .collect();
        let graph = CsrGraph::with_num_nodes(200, &edges).unwrap();
        let frontier = VertexSubset::from_members((0..50).step_by(3).collect(), 200).unwrap();

        let (pushed, _) = edge_map(
            &graph,
            &frontier,
            &Claim::rooted(200, 0),
            &EdgeMapConfig::with_policy(DirectionPolicy::AlwaysPush),
        );
        let (pulled, _) = edge_map(
            &graph,
            &frontier,
            &Claim::rooted(200, 0),
            &EdgeMapConfig::with_policy(DirectionPolicy::AlwaysPull),
        );

        assert_eq!(sorted(&pushed), sorted(&pulled));
    }

    #[test]
    fn test_push_dedups_repeated_successes() {
        let graph = fan_in();
        let frontier = VertexSubset::from_members(vec![0, 1, 2], 5).unwrap();
        let op = Touch((0..5).map(|_| AtomicUsize::new(0)).collect());

        let (next, _) = edge_map(
            &graph,
            &frontier,
            &op,
            &EdgeMapConfig::with_policy(DirectionPolicy::AlwaysPush),
        );

        assert_eq!(next.to_vec(), vec![3]);
        assert_eq!(op.0[3].load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_discard_output_keeps_side_effects() {
        let graph = fan_in();
        let op = Touch((0..5).map(|_| AtomicUsize::new(0)).collect());
        let config =
            EdgeMapConfig::with_policy(DirectionPolicy::AlwaysPush).with_output(Output::Discard);

        let (next, stats) = edge_map(&graph, &VertexSubset::full(5), &op, &config);

        assert!(next.is_empty());
        assert_eq!(stats.next_size, 0);
        assert_eq!(stats.edges_examined, 4);
        assert_eq!(op.0[3].load(Ordering::Relaxed), 3);
        assert_eq!(op.0[4].load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_empty_frontier_is_noop() {
        let graph = fan_in();
        let op = Touch((0..5).map(|_| AtomicUsize::new(0)).collect());
        let (next, stats) = edge_map(&graph, &VertexSubset::empty(5), &op, &EdgeMapConfig::default());

        assert!(next.is_empty());
        assert_eq!(stats.edges_examined, 0);
        assert!(op.0.iter().all(|c| c.load(Ordering::Relaxed) == 0));
    }

    #[test]
    fn test_density_policy_threshold() {
        let graph = CsrGraph::with_num_nodes(100, &[]).unwrap();
        let policy = DirectionPolicy::Density(0.05);

        let sparse = VertexSubset::from_members((0..4).collect(), 100).unwrap();
        let dense = VertexSubset::from_members((0..5).collect(), 100).unwrap();

        assert_eq!(policy.choose(&graph, &sparse), StepDirection::Push);
        assert_eq!(policy.choose(&graph, &dense), StepDirection::Pull);
    }

    #[test]
    fn test_edge_budget_policy_counts_out_degrees() {
        let graph = fan_in(); // 4 edges
        let policy = DirectionPolicy::EdgeBudget(2); // pull above 2

        let light = VertexSubset::single(4, 5); // 1 + 0
        let heavy = VertexSubset::from_members(vec![0, 1], 5).unwrap(); // 2 + 2

        assert_eq!(policy.choose(&graph, &light), StepDirection::Push);
        assert_eq!(policy.choose(&graph, &heavy), StepDirection::Pull);
    }

    #[test]
    fn test_policy_validation() {
        assert!(DirectionPolicy::Density(0.05).validate().is_ok());
        assert!(DirectionPolicy::Density(0.0).validate().is_err());
        assert!(DirectionPolicy::Density(f64::NAN).validate().is_err());
        assert!(DirectionPolicy::EdgeBudget(0).validate().is_err());
        assert!(DirectionPolicy::AlwaysPull.validate().is_ok());
    }

    #[test]
    fn test_config_from_json_defaults() {
        let config: EdgeMapConfig = serde_json::from_str(r#"{"output": "discard"}"#).unwrap();
        assert_eq!(config.policy, DirectionPolicy::Density(DEFAULT_DENSITY));
        assert_eq!(config.output, Output::Discard);

        let config: EdgeMapConfig =
            serde_json::from_str(r#"{"policy": {"edge_budget": 20}}"#).unwrap();
        assert_eq!(config.policy, DirectionPolicy::EdgeBudget(20));
    }
}

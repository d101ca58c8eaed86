//! Direction-optimizing breadth-first search
//!
//! Based on Beamer et al. "Direction-Optimizing Breadth-First Search"
//! (SC 2012): sparse rounds push along out-edges, dense rounds pull along
//! in-edges and stop at the first parent found.

use crate::error::GraphError;
use crate::frontier::{
    edge_map, DirectionPolicy, EdgeMapConfig, EdgeOp, VertexSubset, WorkerCounters,
};
use crate::storage::{vertex_id, Direction, GraphView, NodeId};
use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use tracing::{debug, info, info_span};

/// Parent value of a vertex the search never reached
pub const UNVISITED: i32 = -1;

/// Frontier fraction at which [`bfs_levels`] switches to bottom-up sweeps
pub const LEVEL_SWITCH_FRACTION: f64 = 0.002;

/// Configuration for [`bfs_with_config`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BfsConfig {
    /// Push/pull selection per round
    pub policy: DirectionPolicy,
}

impl BfsConfig {
    /// Config with an explicit direction policy
    #[must_use]
    pub const fn with_policy(policy: DirectionPolicy) -> Self {
        Self { policy }
    }
}

#[allow(clippy::cast_possible_wrap)] // Graphs >2B nodes not supported
const fn parent_id(v: u32) -> i32 {
    v as i32
}

/// Claims an unvisited destination for the first source that reaches it
struct ParentClaim<'a> {
    parents: &'a [AtomicI32],
}

impl EdgeOp for ParentClaim<'_> {
    fn should_process(&self, dst: u32) -> bool {
        self.parents[dst as usize].load(Ordering::Relaxed) == UNVISITED
    }

    fn apply(&self, src: u32, dst: u32) -> bool {
        self.parents[dst as usize].store(parent_id(src), Ordering::Relaxed);
        true
    }

    fn apply_atomic(&self, src: u32, dst: u32) -> bool {
        self.parents[dst as usize]
            .compare_exchange(UNVISITED, parent_id(src), Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }
}

fn check_root<G: GraphView>(graph: &G, root: NodeId) -> Result<()> {
    if graph.contains_vertex(root.0) {
        Ok(())
    } else {
        Err(GraphError::out_of_range(root.0, graph.vertex_count()).into())
    }
}

/// Breadth-first search from `root` with the default direction policy
///
/// # Arguments
///
/// * `graph` - Any [`GraphView`] backend
/// * `root` - Start vertex
///
/// # Returns
///
/// Parent array: `root` maps to itself, every reached vertex to the vertex
/// that first discovered it, unreached vertices to [`UNVISITED`] (`-1`).
/// Which of several same-depth parents wins is not deterministic; the depth
/// implied by the chain is.
///
/// # Errors
///
/// Returns [`GraphError::VertexOutOfRange`] if `root` is not a vertex of a
/// non-empty graph. An empty graph yields an empty array for any root.
///
/// # Example
///
/// ```
/// use frontier_graph::{bfs, CsrGraph, NodeId};
///
/// let graph = CsrGraph::with_num_nodes(
///     5,
///     &[
///         (NodeId(0), NodeId(1)),
///         (NodeId(1), NodeId(2)),
///         (NodeId(2), NodeId(0)),
///         (NodeId(3), NodeId(4)),
///     ],
/// )
/// .unwrap();
///
/// assert_eq!(bfs(&graph, NodeId(0)).unwrap(), vec![0, 0, 1, -1, -1]);
/// ```
pub fn bfs<G: GraphView>(graph: &G, root: NodeId) -> Result<Vec<i32>> {
    bfs_with_config(graph, root, &BfsConfig::default())
}

/// Breadth-first search from `root` with an explicit configuration
///
/// # Errors
///
/// Returns [`GraphError::InvalidConfig`] for an invalid policy and
/// [`GraphError::VertexOutOfRange`] for an unknown root.
pub fn bfs_with_config<G: GraphView>(
    graph: &G,
    root: NodeId,
    config: &BfsConfig,
) -> Result<Vec<i32>> {
    config.policy.validate()?;
    let n = graph.vertex_count();
    if n == 0 {
        return Ok(Vec::new());
    }
    check_root(graph, root)?;

    let _span = info_span!("bfs", root = root.0, vertices = n).entered();

    let parents: Vec<AtomicI32> = (0..n)
        .into_par_iter()
        .map(|_| AtomicI32::new(UNVISITED))
        .collect();
    parents[root.0 as usize].store(parent_id(root.0), Ordering::Relaxed);

    let op = ParentClaim { parents: &parents };
    let edge_config = EdgeMapConfig::with_policy(config.policy);

    let mut frontier = VertexSubset::single(root.0, n);
    let mut round = 0_usize;
    let mut reached = 1_usize;
    while !frontier.is_empty() {
        let (next, stats) = edge_map(graph, &frontier, &op, &edge_config);
        debug!(
            round,
            direction = ?stats.direction,
            frontier = stats.frontier_size,
            edges = stats.edges_examined,
            "bfs round"
        );
        reached += stats.next_size;
        frontier = next;
        round += 1;
    }

    info!(rounds = round, reached, "bfs complete");
    Ok(parents.into_iter().map(AtomicI32::into_inner).collect())
}

/// Level-synchronous BFS with the default bottom-up switch point
///
/// # Returns
///
/// Level array: `0` for unreached vertices, `1 + hops` otherwise (the root
/// is `1`).
///
/// # Errors
///
/// Returns [`GraphError::VertexOutOfRange`] for an unknown root.
pub fn bfs_levels<G: GraphView>(graph: &G, root: NodeId) -> Result<Vec<u32>> {
    bfs_levels_with_fraction(graph, root, LEVEL_SWITCH_FRACTION)
}

/// Level-synchronous BFS switching to bottom-up once a round discovers at
/// least `fraction * N` vertices
///
/// The frontier is implicit (`levels[v] == level`), so every round sweeps
/// all vertices. Top-down rounds claim out-neighbors of the current level by
/// compare-and-swap; bottom-up rounds let each unreached vertex scan its
/// in-edges and stop at the first parent on the current level. Discovery
/// counts go through per-worker padded counters, reduced once per round.
///
/// # Errors
///
/// Returns [`GraphError::InvalidConfig`] for a non-positive or non-finite
/// fraction and [`GraphError::VertexOutOfRange`] for an unknown root.
#[allow(clippy::cast_precision_loss)] // Vertex counts far below 2^52
pub fn bfs_levels_with_fraction<G: GraphView>(
    graph: &G,
    root: NodeId,
    fraction: f64,
) -> Result<Vec<u32>> {
    DirectionPolicy::Density(fraction).validate()?;
    let n = graph.vertex_count();
    if n == 0 {
        return Ok(Vec::new());
    }
    check_root(graph, root)?;

    let _span = info_span!("bfs_levels", root = root.0, vertices = n).entered();

    let levels: Vec<AtomicU32> = (0..n).into_par_iter().map(|_| AtomicU32::new(0)).collect();
    levels[root.0 as usize].store(1, Ordering::Relaxed);

    let switch_at = fraction * n as f64;
    let counters = WorkerCounters::new();
    let mut level = 1_u32;
    let mut discovered = 1_usize;
    let mut reached = 1_usize;
    let mut bottom_up = false;

    while discovered > 0 {
        let next = level + 1;
        if bottom_up {
            (0..n).into_par_iter().for_each(|idx| {
                if levels[idx].load(Ordering::Relaxed) != 0 {
                    return;
                }
                graph.scan_neighbors(vertex_id(idx), Direction::In, 0, |u| {
                    if levels[u as usize].load(Ordering::Relaxed) == level {
                        levels[idx].store(next, Ordering::Relaxed);
                        counters.add(1);
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                });
            });
        } else {
            (0..n)
                .into_par_iter()
                .filter(|&idx| levels[idx].load(Ordering::Relaxed) == level)
                .for_each(|idx| {
                    let claimed = graph
                        .out_neighbors(vertex_id(idx))
                        .iter()
                        .filter(|&&d| {
                            levels[d as usize]
                                .compare_exchange(0, next, Ordering::AcqRel, Ordering::Relaxed)
                                .is_ok()
                        })
                        .count();
                    counters.add(claimed);
                });
        }

        discovered = counters.reduce();
        debug!(level, bottom_up, discovered, "bfs_levels round");
        reached += discovered;
        bottom_up = discovered as f64 >= switch_at;
        level = next;
    }

    info!(levels = level - 1, reached, "bfs_levels complete");
    Ok(levels.into_iter().map(AtomicU32::into_inner).collect())
}

/// Hop depth implied by a parent array, `None` for unreached vertices
///
/// Follows each chain up to the self-parented root. Chains that leave the
/// array, hit `-1`, or cycle without reaching a root also yield `None`.
///
/// # Example
///
/// ```
/// use frontier_graph::parent_depths;
///
/// assert_eq!(
///     parent_depths(&[0, 0, 1, -1, -1]),
///     vec![Some(0), Some(1), Some(2), None, None]
/// );
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Depth bounded by vertex count
pub fn parent_depths(parents: &[i32]) -> Vec<Option<u32>> {
    let n = parents.len();
    let mut depths: Vec<Option<u32>> = vec![None; n];
    let mut path = Vec::new();

    for start in 0..n {
        if depths[start].is_some() || parents[start] == UNVISITED {
            continue;
        }

        path.clear();
        let mut v = start;
        let base = loop {
            if let Some(depth) = depths[v] {
                break Some(depth);
            }
            match usize::try_from(parents[v]).ok().filter(|&p| p < n) {
                Some(p) if p == v => {
                    depths[v] = Some(0);
                    break Some(0);
                }
                Some(p) if path.len() < n => {
                    path.push(v);
                    v = p;
                }
                _ => break None,
            }
        };

        for (hops, &u) in path.iter().rev().enumerate() {
            depths[u] = base.map(|depth| depth + hops as u32 + 1);
        }
    }

    depths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{AdjacencyGraph, CsrGraph};

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

    /// 0 → {1..=k}, each i → k+i, so two wide levels
    fn broom(k: u32) -> CsrGraph {
        let mut edges = Vec::new();
        for i in 1..=k {
            edges.push((NodeId(0), NodeId(i)));
            edges.push((NodeId(i), NodeId(k + i)));
        }
        CsrGraph::with_num_nodes(2 * k as usize + 2, &edges).unwrap()
    }

    #[test]
    fn test_bfs_scenario_parents() {
        let graph = scenario();
        assert_eq!(bfs(&graph, NodeId(0)).unwrap(), vec![0, 0, 1, -1, -1]);
    }

    #[test]
    fn test_bfs_root_without_out_edges() {
        let graph = scenario();
        assert_eq!(bfs(&graph, NodeId(4)).unwrap(), vec![-1, -1, -1, -1, 4]);
    }

    #[test]
    fn test_bfs_rejects_unknown_root() {
        let graph = scenario();
        let err = bfs(&graph, NodeId(5)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::VertexOutOfRange { vertex: 5, vertex_count: 5 })
        ));
    }

    #[test]
    fn test_bfs_empty_graph() {
        let graph = CsrGraph::new();
        assert!(bfs(&graph, NodeId(0)).unwrap().is_empty());
        assert!(bfs_levels(&graph, NodeId(0)).unwrap().is_empty());
    }

    #[test]
    fn test_bfs_policies_agree_on_depths() {
        let graph = broom(40);
        let expected = {
            let mut d = vec![Some(1); 82];
            d[0] = Some(0);
            for v in 41..=80 {
                d[v] = Some(2);
            }
            d[81] = None;
            d
        };

        for policy in [
            DirectionPolicy::AlwaysPush,
            DirectionPolicy::AlwaysPull,
            DirectionPolicy::Density(0.05),
            DirectionPolicy::EdgeBudget(20),
        ] {
            let config = BfsConfig::with_policy(policy);
            let parents = bfs_with_config(&graph, NodeId(0), &config).unwrap();
            assert_eq!(parent_depths(&parents), expected, "policy {policy:?}");
        }
    }

    #[test]
    fn test_bfs_invalid_policy() {
        let graph = scenario();
        let config = BfsConfig::with_policy(DirectionPolicy::Density(-1.0));
        let err = bfs_with_config(&graph, NodeId(0), &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bfs_levels_scenario() {
        let graph = scenario();
        assert_eq!(bfs_levels(&graph, NodeId(0)).unwrap(), vec![1, 2, 3, 0, 0]);
        assert_eq!(bfs_levels(&graph, NodeId(3)).unwrap(), vec![0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_bfs_levels_bottom_up_matches_top_down() {
        let graph = broom(50);
        let top_down = bfs_levels_with_fraction(&graph, NodeId(0), 10.0).unwrap();
        let bottom_up = bfs_levels_with_fraction(&graph, NodeId(0), 1e-9).unwrap();

        assert_eq!(top_down, bottom_up);
        assert_eq!(top_down[0], 1);
        assert_eq!(top_down[1], 2);
        assert_eq!(top_down[51], 3);
        assert_eq!(top_down[101], 0);
    }

    #[test]
    fn test_bfs_levels_match_parent_depths() {
        let mut graph = AdjacencyGraph::with_vertices(6);
        for (s, d) in [(0, 1), (1, 2), (0, 3), (3, 2), (2, 4)] {
            graph.add_edge(s, d).unwrap();
        }

        let levels = bfs_levels(&graph, NodeId(0)).unwrap();
        let depths = parent_depths(&bfs(&graph, NodeId(0)).unwrap());

        for (level, depth) in levels.iter().zip(&depths) {
            assert_eq!(depth.map(|d| d + 1).unwrap_or(0), *level);
        }
    }

    #[test]
    fn test_parent_depths_broken_chains() {
        // 1 points at unreached 2; 3 and 4 form a cycle without a root
        let depths = parent_depths(&[0, 2, -1, 4, 3, 9]);
        assert_eq!(depths, vec![Some(0), None, None, None, None, None]);
    }
}

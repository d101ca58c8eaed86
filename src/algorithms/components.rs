//! Weakly connected components (Afforest)
//!
//! Based on Sutton, Ben-Nun & Bader "Optimizing Parallel Graph Connectivity
//! Computation via Subgraph Sampling" (IPDPS 2018).
//!
//! Phases, in order:
//!
//! 1. every vertex is its own component
//! 2. per sampling round `r`: link each vertex with its `r`-th out-neighbor,
//!    then compress
//! 3. sample component labels to find the presumptive giant component
//! 4. finalize: vertices outside the giant link their remaining out-edges
//!    and every in-edge
//! 5. compress once more so each label is its root

use crate::error::GraphError;
use crate::frontier::{vertex_map, VertexSubset};
use crate::storage::{vertex_id, Direction, GraphView};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, info, info_span};

/// Configuration for [`connected_components_with_config`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentsConfig {
    /// Out-edges sampled per vertex before finalization
    pub neighbor_rounds: usize,
    /// Label samples drawn to find the dominant component
    pub num_samples: usize,
    /// Seed for label sampling
    pub seed: u64,
    /// Skip vertices of the dominant component during finalization
    pub skip_dominant: bool,
}

impl Default for ComponentsConfig {
    fn default() -> Self {
        Self {
            neighbor_rounds: 2,
            num_samples: 1024,
            seed: 0,
            skip_dominant: true,
        }
    }
}

impl ComponentsConfig {
    /// Same config with a different number of sampling rounds
    #[must_use]
    pub const fn with_neighbor_rounds(mut self, rounds: usize) -> Self {
        self.neighbor_rounds = rounds;
        self
    }

    /// Same config with a different sampling seed
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Same config with dominant-component skipping toggled
    #[must_use]
    pub const fn with_skip_dominant(mut self, skip: bool) -> Self {
        self.skip_dominant = skip;
        self
    }
}

/// Lock-free union-find forest over vertex identifiers
///
/// `parent(v)` chains always end at a root `r` with `parent(r) == r`, and
/// parents only ever decrease, so concurrent links cannot form cycles.
#[derive(Debug)]
pub struct ComponentForest {
    parents: Vec<AtomicU32>,
}

impl ComponentForest {
    /// Forest of `num_vertices` singleton components
    #[must_use]
    pub fn new(num_vertices: usize) -> Self {
        let parents: Vec<AtomicU32> = (0..num_vertices).map(|_| AtomicU32::new(0)).collect();
        vertex_map(&VertexSubset::full(num_vertices), |v| {
            parents[v as usize].store(v, Ordering::Relaxed);
        });
        Self { parents }
    }

    /// Forest from an existing label array
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexOutOfRange`] if a label is not a vertex.
    pub fn from_labels(labels: Vec<u32>) -> Result<Self> {
        let n = labels.len();
        if let Some(&bad) = labels.iter().find(|&&label| label as usize >= n) {
            return Err(GraphError::out_of_range(bad, n).into());
        }
        Ok(Self {
            parents: labels.into_iter().map(AtomicU32::new).collect(),
        })
    }

    /// Number of vertices
    #[must_use]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Whether the forest has no vertices
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    #[inline]
    fn parent(&self, v: u32) -> u32 {
        self.parents[v as usize].load(Ordering::Acquire)
    }

    /// Root of the tree containing `v`
    #[must_use]
    pub fn find(&self, v: u32) -> u32 {
        let mut current = v;
        loop {
            let parent = self.parent(current);
            if parent == current {
                return current;
            }
            current = parent;
        }
    }

    /// Merge the components of `u` and `v`
    ///
    /// Always hooks the larger root under the smaller one; a failed
    /// compare-and-swap means another thread moved that root, so both sides
    /// are re-read and the attempt repeats.
    pub fn link(&self, u: u32, v: u32) {
        let mut p1 = self.parent(u);
        let mut p2 = self.parent(v);
        while p1 != p2 {
            let (high, low) = if p1 > p2 { (p1, p2) } else { (p2, p1) };
            let p_high = self.parent(high);
            if p_high == low {
                break;
            }
            if p_high == high
                && self.parents[high as usize]
                    .compare_exchange(high, low, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
            {
                break;
            }
            p1 = self.parent(self.parent(high));
            p2 = self.parent(low);
        }
    }

    /// Point every vertex directly at its root
    pub fn compress(&self) {
        vertex_map(&VertexSubset::full(self.len()), |v| {
            let slot = &self.parents[v as usize];
            loop {
                let parent = slot.load(Ordering::Acquire);
                let grandparent = self.parent(parent);
                if parent == grandparent {
                    break;
                }
                slot.store(grandparent, Ordering::Release);
            }
        });
    }

    /// Link every vertex with its `round`-th out-neighbor, if it has one
    pub fn sample_round<G: GraphView>(&self, graph: &G, round: usize) {
        (0..self.len()).into_par_iter().for_each(|idx| {
            let v = vertex_id(idx);
            if let Some(&d) = graph.out_neighbors(v).get(round) {
                self.link(v, d);
            }
        });
    }

    /// Most frequent label among `num_samples` uniformly drawn vertices
    ///
    /// Ties go to the smaller label. Returns `None` for an empty forest or
    /// zero samples.
    #[must_use]
    pub fn most_frequent_label(&self, num_samples: usize, seed: u64) -> Option<u32> {
        let n = self.len();
        if n == 0 || num_samples == 0 {
            return None;
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut counts: HashMap<u32, usize> = HashMap::new();
        for _ in 0..num_samples {
            let label = self.parent(vertex_id(rng.gen_range(0..n)));
            *counts.entry(label).or_default() += 1;
        }

        let (label, count) = counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))?;

        #[allow(clippy::cast_precision_loss)] // Sample counts far below 2^52
        let fraction = count as f64 / num_samples as f64;
        info!(label, fraction, "skipping largest intermediate component");
        Some(label)
    }

    /// Link every edge not covered by sampling
    ///
    /// Vertices whose current label is `dominant` are skipped. Every other
    /// vertex links its out-edges past the first `skip_out` and all of its
    /// in-edges, so edges leaving the dominant component are still seen from
    /// their other endpoint.
    pub fn finalize<G: GraphView>(&self, graph: &G, skip_out: usize, dominant: Option<u32>) {
        (0..self.len()).into_par_iter().for_each(|idx| {
            let v = vertex_id(idx);
            if dominant == Some(self.parent(v)) {
                return;
            }
            let mut link = |u| {
                self.link(v, u);
                ControlFlow::Continue(())
            };
            graph.scan_neighbors(v, Direction::Out, skip_out, &mut link);
            graph.scan_neighbors(v, Direction::In, 0, &mut link);
        });
    }

    /// Snapshot of the current labels
    #[must_use]
    pub fn labels(&self) -> Vec<u32> {
        self.parents
            .iter()
            .map(|p| p.load(Ordering::Relaxed))
            .collect()
    }

    /// Consume the forest, returning the labels
    #[must_use]
    pub fn into_labels(self) -> Vec<u32> {
        self.parents.into_iter().map(AtomicU32::into_inner).collect()
    }
}

/// Weakly connected components with the default configuration
///
/// # Returns
///
/// Label per vertex: two vertices share a label iff they are connected when
/// edge directions are ignored. Each label is the smallest vertex of its
/// component, but callers should rely only on the partition.
///
/// # Example
///
/// ```
/// use frontier_graph::{connected_components, CsrGraph, NodeId};
///
/// let graph = CsrGraph::from_edge_list(&[
///     (NodeId(0), NodeId(1)),
///     (NodeId(1), NodeId(2)),
///     (NodeId(2), NodeId(0)),
///     (NodeId(3), NodeId(4)),
/// ])
/// .unwrap();
///
/// let labels = connected_components(&graph);
/// assert_eq!(labels[0], labels[2]);
/// assert_eq!(labels[3], labels[4]);
/// assert_ne!(labels[0], labels[3]);
/// ```
#[must_use]
pub fn connected_components<G: GraphView>(graph: &G) -> Vec<u32> {
    connected_components_with_config(graph, &ComponentsConfig::default())
}

/// Weakly connected components with an explicit configuration
#[must_use]
pub fn connected_components_with_config<G: GraphView>(
    graph: &G,
    config: &ComponentsConfig,
) -> Vec<u32> {
    let n = graph.vertex_count();
    if n == 0 {
        return Vec::new();
    }

    let _span = info_span!("connected_components", vertices = n).entered();

    let forest = ComponentForest::new(n);
    for round in 0..config.neighbor_rounds {
        forest.sample_round(graph, round);
        forest.compress();
        debug!(round, "sampling round linked");
    }

    let dominant = if config.skip_dominant {
        forest.most_frequent_label(config.num_samples, config.seed)
    } else {
        None
    };
    forest.finalize(graph, config.neighbor_rounds, dominant);
    forest.compress();

    let labels = forest.into_labels();
    let components = labels
        .par_iter()
        .enumerate()
        .filter(|&(v, &label)| v == label as usize)
        .count();
    info!(components, "connected_components complete");
    labels
}

/// Component count and the largest components of a labeling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentStats {
    /// Number of distinct labels
    pub num_components: usize,
    /// Up to `k` `(label, size)` pairs, largest first, ties by label
    pub largest: Vec<(u32, usize)>,
}

/// Summarize a component labeling
///
/// # Example
///
/// ```
/// use frontier_graph::component_stats;
///
/// let stats = component_stats(&[0, 0, 0, 3, 3, 5], 2);
/// assert_eq!(stats.num_components, 3);
/// assert_eq!(stats.largest, vec![(0, 3), (3, 2)]);
/// ```
#[must_use]
pub fn component_stats(labels: &[u32], k: usize) -> ComponentStats {
    let mut sizes: HashMap<u32, usize> = HashMap::new();
    for &label in labels {
        *sizes.entry(label).or_default() += 1;
    }

    let num_components = sizes.len();
    let mut largest: Vec<(u32, usize)> = sizes.into_iter().collect();
    largest.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    largest.truncate(k);

    ComponentStats {
        num_components,
        largest,
    }
}

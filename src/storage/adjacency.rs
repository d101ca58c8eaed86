//! Per-vertex adjacency lists
//!
//! The shape of a mutable, ingest-friendly store: every vertex owns a growable
//! out-list and in-list. Appending an edge is O(1) amortized, which makes this
//! the natural adapter for stores that receive batched edge updates between
//! analytics runs.

use super::{vertex_id, GraphView};
use crate::error::GraphError;
use anyhow::Result;

/// Graph stored as per-vertex out/in adjacency lists
///
/// # Example
///
/// ```
/// use frontier_graph::{AdjacencyGraph, GraphView};
///
/// let mut graph = AdjacencyGraph::with_vertices(3);
/// graph.add_edge(0, 1).unwrap();
/// graph.add_edge(2, 1).unwrap();
///
/// assert_eq!(graph.in_neighbors(1), &[0, 2]);
/// assert!(graph.add_edge(0, 3).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    outgoing: Vec<Vec<u32>>,
    incoming: Vec<Vec<u32>>,
    num_edges: usize,
}

impl AdjacencyGraph {
    /// Create an empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph with `num_vertices` isolated vertices
    #[must_use]
    pub fn with_vertices(num_vertices: usize) -> Self {
        Self {
            outgoing: vec![Vec::new(); num_vertices],
            incoming: vec![Vec::new(); num_vertices],
            num_edges: 0,
        }
    }

    /// Append a new isolated vertex, returning its identifier
    pub fn add_vertex(&mut self) -> u32 {
        let id = vertex_id(self.outgoing.len());
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Append the directed edge `src → dst`
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexOutOfRange`] if either endpoint is unknown.
    pub fn add_edge(&mut self, src: u32, dst: u32) -> Result<()> {
        let n = self.outgoing.len();
        for v in [src, dst] {
            if v as usize >= n {
                return Err(GraphError::out_of_range(v, n).into());
            }
        }

        self.outgoing[src as usize].push(dst);
        self.incoming[dst as usize].push(src);
        self.num_edges += 1;
        Ok(())
    }

    /// Sort every list and drop parallel edges
    pub fn compact(&mut self) {
        for list in self.outgoing.iter_mut().chain(self.incoming.iter_mut()) {
            list.sort_unstable();
            list.dedup();
        }
        self.num_edges = self.outgoing.iter().map(Vec::len).sum();
    }
}

impl GraphView for AdjacencyGraph {
    fn vertex_count(&self) -> usize {
        self.outgoing.len()
    }

    fn out_degree(&self, v: u32) -> usize {
        self.outgoing[v as usize].len()
    }

    fn in_degree(&self, v: u32) -> usize {
        self.incoming[v as usize].len()
    }

    fn out_neighbors(&self, v: u32) -> &[u32] {
        &self.outgoing[v as usize]
    }

    fn in_neighbors(&self, v: u32) -> &[u32] {
        &self.incoming[v as usize]
    }

    fn edge_count(&self) -> usize {
        self.num_edges
    }
}

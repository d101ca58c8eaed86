//! CSR (Compressed Sparse Row) graph snapshot
//!
//! Based on `GraphBLAST` (Yang et al., ACM `ToMS` 2022) sparse layouts. Both
//! directions are materialized so push (out-edges) and pull (in-edges)
//! traversal each get contiguous neighbor slices.
//!
//! # CSR Format
//!
//! ```text
//! Graph: 0 → 1, 0 → 2, 1 → 2
//!
//! Forward CSR:
//!   row_offsets: [0, 2, 3, 3]  // Node 0: edges [0..2), Node 1: [2..3), Node 2: [3..3)
//!   col_indices: [1, 2, 2]
//!
//! Reverse CSR:
//!   rev_row_offsets: [0, 0, 1, 3]
//!   rev_col_indices: [0, 0, 1]
//! ```

use super::GraphView;
use crate::error::GraphError;
use anyhow::Result;

/// Node identifier (zero-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Immutable CSR graph with forward and reverse adjacency
///
/// Optimized for:
/// - O(1) access to outgoing edges (via forward CSR)
/// - O(1) access to incoming edges (via reverse CSR)
/// - Cache-friendly sequential neighbor scans in both traversal directions
///
/// # Example
///
/// ```
/// use frontier_graph::{CsrGraph, NodeId};
///
/// let graph = CsrGraph::from_edge_list(&[(NodeId(0), NodeId(1)), (NodeId(0), NodeId(2))]).unwrap();
///
/// let neighbors = graph.outgoing_neighbors(NodeId(0)).unwrap();
/// assert_eq!(neighbors.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CsrGraph {
    /// Forward CSR: node i's out-edges live in `col_indices[row_offsets[i]..row_offsets[i + 1]]`
    /// Length: `num_nodes` + 1
    row_offsets: Vec<u32>,

    /// Forward CSR: edge targets
    col_indices: Vec<u32>,

    /// Reverse CSR: node i's in-edges live in `rev_col_indices[rev_row_offsets[i]..rev_row_offsets[i + 1]]`
    /// Length: `num_nodes` + 1
    rev_row_offsets: Vec<u32>,

    /// Reverse CSR: edge sources
    rev_col_indices: Vec<u32>,

    num_nodes: usize,
}

impl CsrGraph {
    /// Create new empty graph
    #[must_use]
    pub fn new() -> Self {
        Self {
            row_offsets: vec![0],
            col_indices: Vec::new(),
            rev_row_offsets: vec![0],
            rev_col_indices: Vec::new(),
            num_nodes: 0,
        }
    }

    /// Create graph from edge list, sized to the largest endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint cannot be represented (never for
    /// `u32` identifiers; kept for parity with [`CsrGraph::with_num_nodes`]).
    pub fn from_edge_list(edges: &[(NodeId, NodeId)]) -> Result<Self> {
        let num_nodes = edges
            .iter()
            .flat_map(|(src, dst)| [src.0, dst.0])
            .max()
            .map_or(0, |max_node| max_node as usize + 1);

        Self::with_num_nodes(num_nodes, edges)
    }

    /// Create graph with an explicit vertex count
    ///
    /// Vertices without edges are allowed (isolated vertices still count
    /// toward the universe).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexOutOfRange`] if an endpoint is `>= num_nodes`.
    pub fn with_num_nodes(num_nodes: usize, edges: &[(NodeId, NodeId)]) -> Result<Self> {
        if let Some(&(src, dst)) = edges
            .iter()
            .find(|(src, dst)| src.0 as usize >= num_nodes || dst.0 as usize >= num_nodes)
        {
            let bad = if src.0 as usize >= num_nodes { src } else { dst };
            return Err(GraphError::out_of_range(bad.0, num_nodes).into());
        }

        let (row_offsets, col_indices) =
            build_csr(num_nodes, edges.iter().map(|(src, dst)| (src.0, dst.0)));
        let (rev_row_offsets, rev_col_indices) =
            build_csr(num_nodes, edges.iter().map(|(src, dst)| (dst.0, src.0)));

        Ok(Self {
            row_offsets,
            col_indices,
            rev_row_offsets,
            rev_col_indices,
            num_nodes,
        })
    }

    /// Add edge to graph (dynamic insertion)
    ///
    /// Note: For large graphs, use `from_edge_list` for better performance;
    /// each insertion shifts the offsets of every later row.
    pub fn add_edge(&mut self, src: NodeId, dst: NodeId) {
        let max_node = src.0.max(dst.0) as usize;
        if max_node >= self.num_nodes {
            self.expand_to(max_node + 1);
        }

        insert_into_row(&mut self.row_offsets, &mut self.col_indices, src.0, dst.0);
        insert_into_row(
            &mut self.rev_row_offsets,
            &mut self.rev_col_indices,
            dst.0,
            src.0,
        );
    }

    /// Get outgoing neighbors of a node
    ///
    /// # Errors
    ///
    /// Returns error if node ID is out of bounds
    pub fn outgoing_neighbors(&self, node: NodeId) -> Result<&[u32]> {
        self.check(node)?;
        Ok(self.out_neighbors(node.0))
    }

    /// Get incoming neighbors of a node
    ///
    /// Returns O(1) access to incoming edges via reverse CSR.
    ///
    /// # Errors
    ///
    /// Returns error if node ID is out of bounds
    pub fn incoming_neighbors(&self, node: NodeId) -> Result<&[u32]> {
        self.check(node)?;
        Ok(self.in_neighbors(node.0))
    }

    /// Get number of nodes
    #[must_use]
    pub const fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Get number of edges
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.col_indices.len()
    }

    /// Get forward CSR components (`row_offsets`, `col_indices`)
    #[must_use]
    pub fn csr_components(&self) -> (&[u32], &[u32]) {
        (&self.row_offsets, &self.col_indices)
    }

    fn check(&self, node: NodeId) -> Result<()> {
        if (node.0 as usize) >= self.num_nodes {
            return Err(GraphError::out_of_range(node.0, self.num_nodes).into());
        }
        Ok(())
    }

    /// Expand graph to accommodate new nodes
    fn expand_to(&mut self, new_size: usize) {
        if new_size <= self.num_nodes {
            return;
        }

        // New nodes have empty rows: repeat the final offset
        let last_offset = *self.row_offsets.last().unwrap_or(&0);
        self.row_offsets.resize(new_size + 1, last_offset);

        let rev_last_offset = *self.rev_row_offsets.last().unwrap_or(&0);
        self.rev_row_offsets.resize(new_size + 1, rev_last_offset);

        self.num_nodes = new_size;
    }
}

impl Default for CsrGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphView for CsrGraph {
    fn vertex_count(&self) -> usize {
        self.num_nodes
    }

    fn out_degree(&self, v: u32) -> usize {
        let idx = v as usize;
        (self.row_offsets[idx + 1] - self.row_offsets[idx]) as usize
    }

    fn in_degree(&self, v: u32) -> usize {
        let idx = v as usize;
        (self.rev_row_offsets[idx + 1] - self.rev_row_offsets[idx]) as usize
    }

    fn out_neighbors(&self, v: u32) -> &[u32] {
        let idx = v as usize;
        let start = self.row_offsets[idx] as usize;
        let end = self.row_offsets[idx + 1] as usize;
        &self.col_indices[start..end]
    }

    fn in_neighbors(&self, v: u32) -> &[u32] {
        let idx = v as usize;
        let start = self.rev_row_offsets[idx] as usize;
        let end = self.rev_row_offsets[idx + 1] as usize;
        &self.rev_col_indices[start..end]
    }

    fn edge_count(&self) -> usize {
        self.col_indices.len()
    }
}

/// Counting-sort `(row, col)` pairs into CSR arrays, preserving input order within a row
#[allow(clippy::cast_possible_truncation)] // Graphs with >4B edges not supported
fn build_csr(
    num_nodes: usize,
    pairs: impl Iterator<Item = (u32, u32)> + Clone,
) -> (Vec<u32>, Vec<u32>) {
    let mut row_offsets = vec![0_u32; num_nodes + 1];
    for (row, _) in pairs.clone() {
        row_offsets[row as usize + 1] += 1;
    }
    for i in 0..num_nodes {
        row_offsets[i + 1] += row_offsets[i];
    }

    let mut cursor: Vec<u32> = row_offsets[..num_nodes].to_vec();
    let mut col_indices = vec![0_u32; row_offsets[num_nodes] as usize];
    for (row, col) in pairs {
        let slot = &mut cursor[row as usize];
        col_indices[*slot as usize] = col;
        *slot += 1;
    }

    (row_offsets, col_indices)
}

fn insert_into_row(offsets: &mut [u32], cols: &mut Vec<u32>, row: u32, col: u32) {
    let row = row as usize;
    let end = offsets[row + 1] as usize;
    cols.insert(end, col);
    for offset in &mut offsets[row + 1..] {
        *offset += 1;
    }
}

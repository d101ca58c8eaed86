//! Graph storage layer
//!
//! Kernels never touch a storage engine directly. They consume the narrow
//! read-side contract [`GraphView`], implemented here by two adapters:
//!
//! - [`CsrGraph`]: immutable forward + reverse CSR snapshot
//! - [`AdjacencyGraph`]: growable per-vertex in/out lists
//!
//! A view must not be mutated while a kernel runs. Neither adapter takes a
//! lock; the borrow held by the kernel enforces this for in-process callers.

pub mod adjacency;
pub mod csr;

use std::ops::ControlFlow;

pub use adjacency::AdjacencyGraph;
pub use csr::{CsrGraph, NodeId};

/// Edge direction relative to a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Edges leaving the vertex (`v → u`)
    Out,
    /// Edges entering the vertex (`u → v`)
    In,
}

impl Direction {
    /// The opposite direction
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Out => Self::In,
            Self::In => Self::Out,
        }
    }
}

/// Read-only graph contract consumed by every kernel
///
/// Vertex identifiers are dense `u32` values in `0..vertex_count()`. The
/// per-vertex accessors are unchecked beyond slice indexing: kernels validate
/// caller-supplied identifiers up front and only ever pass in-range ones.
///
/// # Example
///
/// ```
/// use frontier_graph::{CsrGraph, Direction, GraphView, NodeId};
///
/// let graph = CsrGraph::from_edge_list(&[(NodeId(0), NodeId(1)), (NodeId(2), NodeId(1))]).unwrap();
///
/// assert_eq!(graph.vertex_count(), 3);
/// assert_eq!(graph.in_degree(1), 2);
/// assert_eq!(graph.neighbors(1, Direction::In), &[0, 2]);
/// ```
pub trait GraphView: Sync {
    /// Number of vertices (size of the identifier universe)
    fn vertex_count(&self) -> usize;

    /// Number of edges leaving `v`
    fn out_degree(&self, v: u32) -> usize;

    /// Number of edges entering `v`
    fn in_degree(&self, v: u32) -> usize;

    /// Targets of edges leaving `v`
    fn out_neighbors(&self, v: u32) -> &[u32];

    /// Sources of edges entering `v`
    fn in_neighbors(&self, v: u32) -> &[u32];

    /// Total number of directed edges
    fn edge_count(&self) -> usize {
        (0..self.vertex_count())
            .map(|v| self.out_degree(vertex_id(v)))
            .sum()
    }

    /// Whether `v` names a vertex of this graph
    fn contains_vertex(&self, v: u32) -> bool {
        (v as usize) < self.vertex_count()
    }

    /// Degree of `v` in the given direction
    fn degree(&self, v: u32, direction: Direction) -> usize {
        match direction {
            Direction::Out => self.out_degree(v),
            Direction::In => self.in_degree(v),
        }
    }

    /// Neighbors of `v` in the given direction
    fn neighbors(&self, v: u32, direction: Direction) -> &[u32] {
        match direction {
            Direction::Out => self.out_neighbors(v),
            Direction::In => self.in_neighbors(v),
        }
    }

    /// Visit the neighbors of `v` in order, after skipping the first `skip`
    ///
    /// The visitor returns [`ControlFlow::Break`] to stop early. Returns the
    /// number of neighbors visited. This is the primitive the traversal
    /// engine and the component kernel drive; backends with non-contiguous
    /// adjacency may override it.
    fn scan_neighbors<F>(&self, v: u32, direction: Direction, skip: usize, mut visit: F) -> usize
    where
        F: FnMut(u32) -> ControlFlow<()>,
        Self: Sized,
    {
        let mut visited = 0;
        for &u in self.neighbors(v, direction).iter().skip(skip) {
            visited += 1;
            if visit(u).is_break() {
                break;
            }
        }
        visited
    }
}

/// Narrow a vertex index to its `u32` identifier
///
/// Views never exceed `u32::MAX` vertices, so the truncation is lossless.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Graphs >4B nodes not supported
pub(crate) const fn vertex_id(index: usize) -> u32 {
    index as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> CsrGraph {
        // 0 → 1, 0 → 2, 1 → 3, 2 → 3
        CsrGraph::from_edge_list(&[
            (NodeId(0), NodeId(1)),
            (NodeId(0), NodeId(2)),
            (NodeId(1), NodeId(3)),
            (NodeId(2), NodeId(3)),
        ])
        .unwrap()
    }

    #[test]
    fn test_direction_reverse() {
        assert_eq!(Direction::Out.reverse(), Direction::In);
        assert_eq!(Direction::In.reverse(), Direction::Out);
    }

    #[test]
    fn test_default_edge_count() {
        let graph = diamond();
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.degree(3, Direction::In), 2);
        assert_eq!(graph.degree(3, Direction::Out), 0);
    }

    #[test]
    fn test_scan_neighbors_skip_and_break() {
        let graph = diamond();

        let mut seen = Vec::new();
        let visited = graph.scan_neighbors(0, Direction::Out, 1, |u| {
            seen.push(u);
            ControlFlow::Continue(())
        });
        assert_eq!(visited, 1);
        assert_eq!(seen, vec![2]);

        let mut seen = Vec::new();
        let visited = graph.scan_neighbors(3, Direction::In, 0, |u| {
            seen.push(u);
            ControlFlow::Break(())
        });
        assert_eq!(visited, 1);
        assert_eq!(seen, vec![1]);
    }

    #[test]
    fn test_contains_vertex() {
        let graph = diamond();
        assert!(graph.contains_vertex(3));
        assert!(!graph.contains_vertex(4));
    }
}

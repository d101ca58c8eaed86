//! frontier-graph: shared-memory parallel graph analytics
//!
//! # Overview
//!
//! frontier-graph runs whole-graph kernels over any storage backend that can
//! answer degree and neighbor queries. Traversal is frontier-based: each step
//! pushes along out-edges while the frontier is sparse and pulls along
//! in-edges once it is dense (Ligra, Shun & Blelloch `PPoPP` 2013).
//!
//! # Quick Start
//!
//! ```
//! use frontier_graph::{bfs, connected_components, pagerank_pull, CsrGraph, NodeId};
//!
//! # fn main() -> frontier_graph::Result<()> {
//! let graph = CsrGraph::with_num_nodes(
//!     5,
//!     &[
//!         (NodeId(0), NodeId(1)),
//!         (NodeId(1), NodeId(2)),
//!         (NodeId(2), NodeId(0)),
//!         (NodeId(3), NodeId(4)),
//!     ],
//! )?;
//!
//! // Parent array: -1 marks unreached vertices
//! assert_eq!(bfs(&graph, NodeId(0))?, vec![0, 0, 1, -1, -1]);
//!
//! // Two weakly connected components
//! let labels = connected_components(&graph);
//! assert_eq!(labels[0], labels[2]);
//! assert_ne!(labels[0], labels[3]);
//!
//! // The 3-cycle outranks the source/sink pair
//! let scores = pagerank_pull(&graph, 20, 0.0)?;
//! assert!(scores[0] > scores[4]);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Storage**: [`GraphView`] contract, CSR and adjacency-list adapters
//! - **Frontier**: [`VertexSubset`] (sparse list or dense bitmap) and
//!   [`edge_map`] with a configurable [`DirectionPolicy`]
//! - **Algorithms**: direction-optimizing BFS, Afforest connected
//!   components, pull and push `PageRank`
//! - **Parallelism**: rayon fork-join; kernels run on the caller's pool

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod algorithms;
pub mod error;
pub mod frontier;
pub mod storage;

// Re-export core types
pub use algorithms::{
    bfs, bfs_levels, bfs_with_config, component_stats, connected_components,
    connected_components_with_config, pagerank_pull, pagerank_pull_with_config, pagerank_push,
    pagerank_push_with_config, parent_depths, top_score, BfsConfig, ComponentForest,
    ComponentStats, ComponentsConfig, PageRankConfig, PageRankResult,
};
pub use error::GraphError;
pub use frontier::{
    edge_map, vertex_filter, vertex_map, DirectionPolicy, EdgeMapConfig, EdgeOp, Output,
    StepDirection, StepStats, VertexSubset,
};
pub use storage::{AdjacencyGraph, CsrGraph, Direction, GraphView, NodeId};

// Error type
pub use anyhow::{Error, Result};

//! Graph kernels (BFS, connected components, `PageRank`)
//!
//! Every kernel is generic over [`GraphView`](crate::storage::GraphView) and
//! runs on the caller's current rayon pool.

pub mod bfs;
pub mod components;
pub mod pagerank;

pub use bfs::{
    bfs, bfs_levels, bfs_levels_with_fraction, bfs_with_config, parent_depths, BfsConfig,
    LEVEL_SWITCH_FRACTION, UNVISITED,
};
pub use components::{
    component_stats, connected_components, connected_components_with_config, ComponentForest,
    ComponentStats, ComponentsConfig,
};
pub use pagerank::{
    pagerank_pull, pagerank_pull_with_config, pagerank_push, pagerank_push_with_config,
    top_score, PageRankConfig, PageRankResult, DAMPING_FACTOR,
};

//! Frontier engine: vertex subsets and the direction-optimizing edge map
//!
//! Kernels express one traversal step as an [`EdgeOp`] and hand it to
//! [`edge_map`], which picks push (sparse) or pull (dense) per step.

pub mod counters;
pub mod edge_map;
pub mod subset;
pub mod vertex_map;

pub use counters::{AtomicF32, WorkerCounters};
pub use edge_map::{
    edge_map, DirectionPolicy, EdgeMapConfig, EdgeOp, Output, StepDirection, StepStats,
    DEFAULT_DENSITY,
};
pub use subset::{AtomicBitmap, Members, SetBits, VertexSubset};
pub use vertex_map::{vertex_filter, vertex_map};

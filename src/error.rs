//! Typed precondition failures
//!
//! Kernels report these through `anyhow::Error`; callers that need to branch
//! on the cause can `downcast_ref::<GraphError>()`.

use thiserror::Error;

/// Precondition violations detected before a kernel starts work
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// A vertex identifier lies outside `0..vertex_count`
    #[error("Vertex {vertex} out of range (vertex count {vertex_count})")]
    VertexOutOfRange {
        /// Offending vertex identifier
        vertex: u64,
        /// Size of the vertex universe
        vertex_count: usize,
    },

    /// A kernel configuration value is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GraphError {
    /// Convenience constructor for out-of-range vertices
    #[must_use]
    pub fn out_of_range(vertex: impl Into<u64>, vertex_count: usize) -> Self {
        Self::VertexOutOfRange {
            vertex: vertex.into(),
            vertex_count,
        }
    }
}

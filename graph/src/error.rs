//! Error types for graph operations.

use quiver_core::{EdgeId, VertexId};
use thiserror::Error;

/// Errors that can occur during graph operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    /// Vertex not found.
    #[error("Vertex not found: {0}")]
    VertexNotFound(VertexId),

    /// Edge not found.
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// A vertex changed or disappeared after this transaction first read it.
    #[error("Concurrent modification of vertex {vertex}")]
    Conflict { vertex: VertexId },

    /// Two vertices would hold the same value for a unique key.
    #[error("Unique key {key} already holds value {value}")]
    UniqueViolation { key: String, value: String },
}

impl GraphError {
    pub fn unique_violation(key: impl Into<String>, value: impl std::fmt::Debug) -> Self {
        GraphError::UniqueViolation {
            key: key.into(),
            value: format!("{:?}", value),
        }
    }
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

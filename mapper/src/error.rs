//! Mapper error types.

use quiver_core::{Guid, VertexId};
use quiver_registry::RegistryError;
use thiserror::Error;

/// Result type for mapping operations.
pub type MapperResult<T> = Result<T, MapperError>;

/// Errors that can occur while mapping vertices to entities.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapperError {
    #[error("Cannot resolve type {type_name}")]
    TypeResolution { type_name: String },

    #[error("Entity not found: {0}")]
    EntityNotFound(Guid),

    #[error("Vertex {vertex} is corrupt: {reason}")]
    CorruptVertex { vertex: VertexId, reason: String },
}

impl MapperError {
    pub fn type_resolution(type_name: impl Into<String>) -> Self {
        Self::TypeResolution {
            type_name: type_name.into(),
        }
    }

    pub fn corrupt(vertex: VertexId, reason: impl Into<String>) -> Self {
        Self::CorruptVertex {
            vertex,
            reason: reason.into(),
        }
    }
}

impl From<RegistryError> for MapperError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::UnknownType(type_name) => Self::TypeResolution { type_name },
            other => Self::TypeResolution {
                type_name: other.to_string(),
            },
        }
    }
}

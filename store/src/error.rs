//! Store error types.

use quiver_mapper::MapperError;
use quiver_mutation::MutationError;
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// A mutation, read or classification call failed.
    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// No ACTIVE entity carries the given unique attribute values.
    #[error("no {type_name} entity with unique attributes {attributes}")]
    NotFoundByUniqueAttributes { type_name: String, attributes: String },

    /// The batch holds more entities than the store accepts per call.
    #[error("batch of {size} entities exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// Configuration could not be read or parsed.
    #[error("config error: {reason}")]
    Config { reason: String },
}

impl StoreError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// The mutation error behind this failure, if any.
    pub fn as_mutation(&self) -> Option<&MutationError> {
        match self {
            Self::Mutation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MapperError> for StoreError {
    fn from(e: MapperError) -> Self {
        Self::Mutation(e.into())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

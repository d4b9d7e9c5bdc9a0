//! Mutation error types.

use quiver_core::Guid;
use quiver_graph::GraphError;
use quiver_mapper::MapperError;
use quiver_registry::RegistryError;
use thiserror::Error;

/// Result type for mutation operations.
pub type MutationResult<T> = Result<T, MutationError>;

/// Errors that can occur during mutation execution.
///
/// Every error aborts the whole call; nothing is committed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MutationError {
    #[error("Cannot resolve type: {type_name}")]
    TypeResolution { type_name: String },

    #[error("Missing required attribute: {attr} on type {type_name}")]
    RequiredAttributeMissing { type_name: String, attr: String },

    #[error("Invalid value for {type_name}.{attr}: expected {expected}, got {actual}")]
    TypeMismatch {
        type_name: String,
        attr: String,
        expected: String,
        actual: String,
    },

    #[error("Unknown attribute: {attr} on type {type_name}")]
    UnknownAttribute { type_name: String, attr: String },

    #[error("Unique attribute {type_name}.{attr} already has value {value}")]
    UniqueAttributeViolation {
        type_name: String,
        attr: String,
        value: String,
    },

    #[error("Entity not found: {guid}")]
    EntityNotFound { guid: Guid },

    #[error("Cannot resolve reference {reference}")]
    UnresolvedReference { reference: String },

    #[error("Stale state for {entity}: {reason}")]
    StaleState { entity: String, reason: String },

    #[error("Guid {guid} appears more than once in the batch")]
    DuplicateGuid { guid: Guid },

    #[error("Classification {classification} is already attached to {guid}")]
    DuplicateClassification { guid: Guid, classification: String },

    #[error("Classification {classification} is not attached to {guid}")]
    ClassificationNotFound { guid: Guid, classification: String },

    #[error("Corrupt graph: {reason}")]
    CorruptGraph { reason: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl MutationError {
    pub fn type_resolution(type_name: impl Into<String>) -> Self {
        Self::TypeResolution {
            type_name: type_name.into(),
        }
    }

    pub fn required_missing(type_name: impl Into<String>, attr: impl Into<String>) -> Self {
        Self::RequiredAttributeMissing {
            type_name: type_name.into(),
            attr: attr.into(),
        }
    }

    pub fn type_mismatch(
        type_name: impl Into<String>,
        attr: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            type_name: type_name.into(),
            attr: attr.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn unknown_attribute(type_name: impl Into<String>, attr: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            type_name: type_name.into(),
            attr: attr.into(),
        }
    }

    pub fn unique_violation(
        type_name: impl Into<String>,
        attr: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::UniqueAttributeViolation {
            type_name: type_name.into(),
            attr: attr.into(),
            value: value.into(),
        }
    }

    pub fn entity_not_found(guid: &Guid) -> Self {
        Self::EntityNotFound { guid: guid.clone() }
    }

    pub fn stale(entity: impl ToString, reason: impl Into<String>) -> Self {
        Self::StaleState {
            entity: entity.to_string(),
            reason: reason.into(),
        }
    }

    pub fn duplicate_classification(guid: &Guid, classification: impl Into<String>) -> Self {
        Self::DuplicateClassification {
            guid: guid.clone(),
            classification: classification.into(),
        }
    }

    pub fn classification_not_found(guid: &Guid, classification: impl Into<String>) -> Self {
        Self::ClassificationNotFound {
            guid: guid.clone(),
            classification: classification.into(),
        }
    }

    /// Translate a failed commit into the mutation taxonomy.
    pub(crate) fn from_commit(e: GraphError) -> Self {
        match e {
            GraphError::Conflict { vertex } => {
                Self::stale(vertex, "modified by a concurrent transaction")
            }
            other => Self::Graph(other),
        }
    }
}

impl From<MapperError> for MutationError {
    fn from(e: MapperError) -> Self {
        match e {
            MapperError::TypeResolution { type_name } => Self::TypeResolution { type_name },
            MapperError::EntityNotFound(guid) => Self::EntityNotFound { guid },
            MapperError::CorruptVertex { .. } => Self::CorruptGraph {
                reason: e.to_string(),
            },
        }
    }
}

impl From<RegistryError> for MutationError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::UnknownType(type_name) => Self::TypeResolution { type_name },
            other => Self::TypeResolution {
                type_name: other.to_string(),
            },
        }
    }
}

//! Quiver Mutation
//!
//! The write path: applies batches of typed entities to the property graph.
//!
//! Responsibilities:
//! - Resolve batch entities to stored entities or new guids
//! - Validate and normalize attribute values against the schema
//! - Diff attributes against stored state and write only the differences
//! - Cascade composite ownership to soft deletes
//! - Manage classifications attached to entities
//!
//! # Module Structure
//!
//! - `mutator` - EntityMutator, the batch create/update/delete entry point
//! - `classification` - ClassificationManager for add/update/delete of classifications
//! - `validation` - Attribute normalization and reference resolution
//! - `writer` - Per-category attribute writers over a graph transaction
//! - `cascade` - Composite cascade deletes
//! - `response` - Per-entity outcome of a mutation
//! - `error` - Error types for mutation failures

mod cascade;
mod classification;
mod error;
mod mutator;
mod response;
mod validation;
mod writer;

pub use classification::ClassificationManager;
pub use error::{MutationError, MutationResult};
pub use mutator::{declare_unique_keys, EntityMutator, DEFAULT_USER};
pub use response::{EntityOperation, MutationResponse};

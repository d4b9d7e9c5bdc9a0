//! Quiver Graph Storage
//!
//! An in-memory property graph with indexed access and optimistic
//! transactions:
//! - Vertex and edge storage with string-keyed properties
//! - Property index: find vertices by exact property value
//! - Adjacency index: find edges leaving a vertex by label
//! - Transactions buffer writes in a private overlay and validate storage
//!   revisions at commit

mod element;
mod error;
mod graph;
mod index;
pub mod keys;
mod transaction;

pub use element::*;
pub use error::{GraphError, GraphResult};
pub use graph::{Graph, GraphRead, GraphStore};
pub use transaction::{CommitSummary, Transaction};

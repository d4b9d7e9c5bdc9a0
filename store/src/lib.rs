//! Quiver Store
//!
//! The public facade over the Quiver components. An [`EntityStore`] owns a
//! schema registry and a graph store and exposes:
//! - Batch create/update of typed entities, with composite cascades
//! - Reads by guid and by unique attributes
//! - Soft deletes by guid
//! - Classification management
//!
//! [`StoreConfig`] carries the store settings (loaded from TOML and the
//! environment) and [`telemetry::init`] installs a `tracing` subscriber.

mod config;
mod error;
mod store;
pub mod telemetry;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use store::EntityStore;

pub use quiver_mutation::{EntityOperation, MutationError, MutationResponse};

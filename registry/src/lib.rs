//! Quiver Registry
//!
//! Runtime schema lookup: entity, struct, classification and enum types with
//! their attribute descriptors. The registry is immutable after construction
//! via RegistryBuilder.

mod builder;
mod registry;
mod types;

pub use builder::{RegistryBuilder, RegistryError, RegistryResult, TypeBuilder};
pub use registry::Registry;
pub use types::*;

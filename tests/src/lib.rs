//! Quiver Integration Test Support
//!
//! Fixtures and assertions shared by the integration tests under `tests/`:
//! - `fixtures` - a warehouse-catalog schema and entity builders
//! - `assertion` - declarative checks on mutation results
//! - `prelude` - everything a test file needs in one import

pub mod error;
pub mod fixtures;

pub mod prelude {
    pub use crate::assertion::{expect, Assertion, AssertionBuilder};
    pub use crate::error::{TestError, TestResult};
    pub use crate::fixtures::*;
    pub use quiver_core::{
        attrs, Attributes, Classification, EntityState, Guid, ObjectId, Struct, TypedEntity, Value,
    };
    pub use quiver_store::{
        EntityOperation, EntityStore, MutationError, MutationResponse, StoreConfig, StoreError,
        StoreResult,
    };
}

//! Quiver Mapper
//!
//! The read path: reconstructs typed entities from vertices of the property
//! graph. Composite references are materialized through a request-scoped
//! [`MappingContext`], which also breaks reference cycles.

mod codec;
mod context;
mod error;
mod mapper;

pub use codec::{decode_inline, read_system_attributes};
pub use context::MappingContext;
pub use error::{MapperError, MapperResult};
pub use mapper::GraphToEntityMapper;

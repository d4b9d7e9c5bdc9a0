//! Quiver Core Types
//!
//! This crate provides the foundational types shared by every Quiver component:
//! - Identity types (Guid, VertexId, EdgeId)
//! - Attribute values (the closed `Value` enum)
//! - Typed entity structures (TypedEntity, Struct, ObjectId, Classification)
//! - Entity headers used in mutation responses

mod entity;
mod id;
mod value;

pub use entity::*;
pub use id::*;
pub use value::*;

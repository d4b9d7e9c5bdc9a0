//! Identity types for Quiver.
//!
//! Entities are identified by a [`Guid`], stable across versions. Vertices
//! and edges of the backing property graph use opaque 64-bit ids.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

static NEXT_PLACEHOLDER: AtomicU64 = AtomicU64::new(1);

/// Globally unique entity identifier.
///
/// A guid starting with `-` is a placeholder: it only names an entity within
/// one mutation batch and is replaced by an assigned guid on create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid(String);

impl Guid {
    /// Wrap an existing guid string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Generate a fresh assigned guid.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Generate a batch-local placeholder guid.
    pub fn placeholder() -> Self {
        let n = NEXT_PLACEHOLDER.fetch_add(1, Ordering::Relaxed);
        Self(format!("-{}", n))
    }

    /// Returns true if this guid is a batch-local placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.0.is_empty() || self.0.starts_with('-')
    }

    /// Get the raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Guid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Guid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique identifier for a vertex in the property graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u64);

impl VertexId {
    /// Create a new VertexId from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Unique identifier for an edge in the property graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u64);

impl EdgeId {
    /// Create a new EdgeId from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

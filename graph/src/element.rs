//! Vertices, edges and their property values.

use quiver_core::{EdgeId, Value, VertexId};
use std::collections::BTreeMap;

/// A property value stored on a vertex or edge.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Property>),
    Map(BTreeMap<String, Property>),
}

impl Property {
    /// Encode an inline attribute value.
    ///
    /// Returns `None` for nulls, structs and references, which are never
    /// stored as properties.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null | Value::Struct(_) | Value::Ref(_) => None,
            Value::Bool(b) => Some(Property::Bool(*b)),
            Value::Int(i) | Value::Date(i) => Some(Property::Int(*i)),
            Value::Float(f) => Some(Property::Float(*f)),
            Value::String(s) | Value::Decimal(s) | Value::Enum(s) => Some(Property::Str(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(Property::from_value)
                .collect::<Option<Vec<_>>>()
                .map(Property::List),
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| Property::from_value(v).map(|p| (k.clone(), p)))
                .collect::<Option<BTreeMap<_, _>>>()
                .map(Property::Map),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Property::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Property::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Property]> {
        match self {
            Property::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Property {
    fn from(s: &str) -> Self {
        Property::Str(s.to_string())
    }
}

impl From<String> for Property {
    fn from(s: String) -> Self {
        Property::Str(s)
    }
}

impl From<i64> for Property {
    fn from(i: i64) -> Self {
        Property::Int(i)
    }
}

impl From<bool> for Property {
    fn from(b: bool) -> Self {
        Property::Bool(b)
    }
}

/// Property bag of a vertex or edge.
pub type Properties = BTreeMap<String, Property>;

/// A vertex in the property graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    pub properties: Properties,
    /// Storage revision, bumped on every committed write to the vertex.
    pub revision: u64,
}

impl Vertex {
    pub fn new(id: VertexId) -> Self {
        Self {
            id,
            properties: Properties::new(),
            revision: 0,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Property::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(Property::as_int)
    }
}

/// A directed, labeled edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub label: String,
    pub out_vertex: VertexId,
    pub in_vertex: VertexId,
    pub properties: Properties,
}

impl Edge {
    pub fn get(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(Property::as_int)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Property::as_str)
    }
}

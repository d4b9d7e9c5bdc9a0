//! Value types for entity attributes.
//!
//! Values are what a typed entity holds per attribute. Scalars map onto graph
//! properties; structs, references and collections map onto edges and
//! sub-vertices.

use crate::{ObjectId, Struct};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// A value that can be stored in an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null/missing value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer (byte, short, int and long kinds).
    Int(i64),
    /// 64-bit floating point (float and double kinds).
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Date as milliseconds since Unix epoch.
    Date(i64),
    /// Arbitrary-precision number in decimal text form.
    Decimal(String),
    /// Enum member name.
    Enum(String),
    /// Nested struct instance.
    Struct(Struct),
    /// Reference to another entity.
    Ref(ObjectId),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// String-keyed map.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Build a date value from a UTC timestamp (millisecond precision).
    pub fn date(at: DateTime<Utc>) -> Self {
        Value::Date(at.timestamp_millis())
    }

    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as boolean if this is a Bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer if this is an Int value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float if this is a Float value.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as string reference if this is a String or Enum value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Get as object id if this is a Ref value.
    pub fn as_ref_id(&self) -> Option<&ObjectId> {
        match self {
            Value::Ref(id) => Some(id),
            _ => None,
        }
    }

    /// Get as struct if this is a Struct value.
    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Get as slice if this is an Array value.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get as map if this is a Map value.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Date(_) => "Date",
            Value::Decimal(_) => "Decimal",
            Value::Enum(_) => "Enum",
            Value::Struct(_) => "Struct",
            Value::Ref(_) => "Ref",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
        }
    }

    /// Returns true for an empty array or map.
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::Array(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Date(ms) => write!(f, "date:{}", ms),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Enum(e) => write!(f, "{}", e),
            Value::Struct(s) => write!(f, "{}{{..{}}}", s.type_name, s.attributes.len()),
            Value::Ref(id) => write!(f, "{}", id),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Struct> for Value {
    fn from(s: Struct) -> Self {
        Value::Struct(s)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Ref(id)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// Type alias for attribute storage.
pub type Attributes = BTreeMap<String, Value>;

/// Helper macro to create attribute maps.
#[macro_export]
macro_rules! attrs {
    () => {
        $crate::Attributes::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut map = $crate::Attributes::new();
            $(
                map.insert($key.to_string(), $crate::Value::from($value));
            )+
            map
        }
    };
}

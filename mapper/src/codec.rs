//! Conversion of stored properties back into typed values.

use crate::{MapperError, MapperResult};
use chrono::{DateTime, TimeZone, Utc};
use quiver_core::{SystemAttributes, Value, VertexId};
use quiver_graph::{keys, Property, Vertex};
use quiver_registry::{AttrType, PrimitiveKind};
use std::collections::BTreeMap;

/// Decode an inline property into a value of the declared type.
pub fn decode_inline(vertex: VertexId, property: &Property, attr_type: &AttrType) -> MapperResult<Value> {
    let mismatch = || {
        MapperError::corrupt(
            vertex,
            format!("property {:?} is not a valid {}", property, attr_type),
        )
    };

    match (attr_type, property) {
        (AttrType::Primitive(kind), _) => decode_primitive(*kind, property).ok_or_else(mismatch),
        (AttrType::Enum(_), Property::Str(s)) => Ok(Value::Enum(s.clone())),
        (AttrType::Array(inner), Property::List(items)) => items
            .iter()
            .map(|item| decode_inline(vertex, item, inner))
            .collect::<MapperResult<Vec<_>>>()
            .map(Value::Array),
        (AttrType::Map(inner), Property::Map(entries)) => entries
            .iter()
            .map(|(k, v)| decode_inline(vertex, v, inner).map(|v| (k.clone(), v)))
            .collect::<MapperResult<BTreeMap<_, _>>>()
            .map(Value::Map),
        _ => Err(mismatch()),
    }
}

fn decode_primitive(kind: PrimitiveKind, property: &Property) -> Option<Value> {
    match (kind, property) {
        (PrimitiveKind::Boolean, Property::Bool(b)) => Some(Value::Bool(*b)),
        (
            PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Int | PrimitiveKind::Long,
            Property::Int(i),
        ) => Some(Value::Int(*i)),
        (PrimitiveKind::Float | PrimitiveKind::Double, Property::Float(f)) => Some(Value::Float(*f)),
        (PrimitiveKind::Float | PrimitiveKind::Double, Property::Int(i)) => Some(Value::Float(*i as f64)),
        (PrimitiveKind::BigInteger | PrimitiveKind::BigDecimal, Property::Str(s)) => {
            Some(Value::Decimal(s.clone()))
        }
        (PrimitiveKind::Date, Property::Int(ms)) => Some(Value::Date(*ms)),
        (PrimitiveKind::String, Property::Str(s)) => Some(Value::String(s.clone())),
        _ => None,
    }
}

fn timestamp(vertex: &Vertex, key: &str) -> Option<DateTime<Utc>> {
    vertex
        .get_int(key)
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

/// Read the audit attributes of an entity vertex.
pub fn read_system_attributes(vertex: &Vertex) -> SystemAttributes {
    SystemAttributes {
        created_by: vertex.get_str(keys::CREATED_BY).map(String::from),
        modified_by: vertex.get_str(keys::MODIFIED_BY).map(String::from),
        created_time: timestamp(vertex, keys::TIMESTAMP),
        modified_time: timestamp(vertex, keys::MODIFICATION_TIMESTAMP),
    }
}

//! Reserved property keys, edge labels and property-key encoding.
//!
//! Attribute properties are keyed by the encoded `DeclaringType.attr` name.
//! Attribute edges are labeled `__DeclaringType.attr`.

use regex_lite::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

pub const GUID: &str = "__guid";
pub const TYPE_NAME: &str = "__typeName";
pub const STATE: &str = "__state";
pub const VERSION: &str = "__version";
pub const CREATED_BY: &str = "__createdBy";
pub const MODIFIED_BY: &str = "__modifiedBy";
pub const TIMESTAMP: &str = "__timestamp";
pub const MODIFICATION_TIMESTAMP: &str = "__modificationTimestamp";
pub const CLASSIFICATION_NAMES: &str = "__traitNames";
/// Guid of the composite owner of an entity.
pub const OWNER: &str = "__owner";
/// Guid of the entity a classification vertex is attached to.
pub const ENTITY_GUID: &str = "__entityGuid";

/// Position of an array element edge.
pub const ORDINAL: &str = "__ordinal";
/// Key of a map member edge.
pub const MAP_KEY: &str = "__key";

const CLASSIFICATION_LABEL_PREFIX: &str = "__classification.";
const UNIQUE_PREFIX: &str = "__u_";

fn reserved_chars() -> Option<&'static Regex> {
    static RESERVED: OnceLock<Option<Regex>> = OnceLock::new();
    RESERVED
        .get_or_init(|| Regex::new(r#"[_.{}"$%]"#).ok())
        .as_ref()
}

/// Escape characters that are reserved in property keys.
///
/// `_` is escaped too so that distinct inputs never share an encoding.
pub fn encode_property_key(raw: &str) -> Cow<'_, str> {
    let Some(re) = reserved_chars() else {
        return Cow::Borrowed(raw);
    };
    re.replace_all(raw, |caps: &Captures<'_>| match &caps[0] {
        "_" => "__",
        "." => "_s",
        "{" => "_o",
        "}" => "_c",
        "\"" => "_q",
        "$" => "_d",
        _ => "_p",
    })
}

/// Property key of an attribute, from its qualified `Type.attr` name.
pub fn attribute_key(declaring_type: &str, attr: &str) -> String {
    format!(
        "{}.{}",
        encode_property_key(declaring_type),
        encode_property_key(attr)
    )
}

/// Property key holding one member of an inline map.
pub fn map_entry_key(attribute_key: &str, map_key: &str) -> String {
    format!("{}.{}", attribute_key, encode_property_key(map_key))
}

/// Property key that is only present while an entity is ACTIVE and is
/// enforced unique by the graph.
pub fn unique_key(attribute_key: &str) -> String {
    format!("{}{}", UNIQUE_PREFIX, attribute_key)
}

/// True if `key` is a unique-value property key.
pub fn is_unique_key(key: &str) -> bool {
    key.starts_with(UNIQUE_PREFIX)
}

/// Label of the edges backing an attribute.
pub fn edge_label(attribute_key: &str) -> String {
    format!("__{}", attribute_key)
}

/// Label of the edge from an entity to one of its classification vertices.
pub fn classification_label(classification_type: &str) -> String {
    format!(
        "{}{}",
        CLASSIFICATION_LABEL_PREFIX,
        encode_property_key(classification_type)
    )
}

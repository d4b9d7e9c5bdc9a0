//! Attribute validation and normalization for mutation operations.
//!
//! Every supplied value is checked against its declared type and rewritten
//! into the canonical form the mapper reads back, so that unchanged input
//! compares equal to the stored value.

use quiver_core::{Attributes, Guid, ObjectId, Struct, Value};
use quiver_registry::{AttrDef, AttrType, PrimitiveKind, Registry};
use regex_lite::Regex;
use std::sync::OnceLock;

use crate::error::{MutationError, MutationResult};

/// How supplied attributes are applied to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    /// New entity: defaults apply and required attributes must be present.
    Create,
    /// Full replace: defaults apply and other absent attributes are cleared.
    Update,
    /// Only supplied attributes change; an explicit null clears.
    PartialUpdate,
}

/// Resolves references found in attribute values.
pub(crate) trait ReferenceResolver {
    /// Guid and type name of the entity a reference points at.
    fn resolve(&self, reference: &ObjectId) -> MutationResult<(Guid, String)>;
}

/// Rejects every reference; for values that can hold none.
pub(crate) struct NoReferences;

impl ReferenceResolver for NoReferences {
    fn resolve(&self, reference: &ObjectId) -> MutationResult<(Guid, String)> {
        Err(MutationError::UnresolvedReference {
            reference: reference.to_string(),
        })
    }
}

/// Validates attribute values against the registry.
pub(crate) struct Validator<'a, R: ReferenceResolver + ?Sized> {
    registry: &'a Registry,
    resolver: &'a R,
}

impl<'a, R: ReferenceResolver + ?Sized> Validator<'a, R> {
    pub(crate) fn new(registry: &'a Registry, resolver: &'a R) -> Self {
        Self { registry, resolver }
    }

    /// Validate and normalize the supplied attributes of an entity or
    /// classification.
    ///
    /// Empty collections normalize to null. In partial mode explicit nulls
    /// are kept so the writer can clear them; otherwise nulls are dropped.
    pub(crate) fn normalize_attributes(
        &self,
        type_name: &str,
        supplied: &Attributes,
        mode: WriteMode,
    ) -> MutationResult<Attributes> {
        let defs = self.registry.attributes_of(type_name)?;
        let mut result = Attributes::new();

        for (name, value) in supplied {
            let attr = defs
                .iter()
                .find(|a| &a.name == name)
                .ok_or_else(|| MutationError::unknown_attribute(type_name, name))?;
            let normalized = self.normalize_top_level(type_name, attr, value)?;
            if mode == WriteMode::PartialUpdate || !normalized.is_null() {
                result.insert(name.clone(), normalized);
            }
        }

        match mode {
            WriteMode::Create | WriteMode::Update => {
                self.apply_defaults(type_name, defs, &mut result)?;
                check_required_attributes(type_name, defs, &result)?;
            }
            WriteMode::PartialUpdate => {
                for attr in defs.iter().filter(|a| a.is_required()) {
                    if result.get(&attr.name).is_some_and(Value::is_null) {
                        return Err(MutationError::required_missing(type_name, &attr.name));
                    }
                }
            }
        }
        Ok(result)
    }

    /// Normalized values of the unique attributes present in `supplied`,
    /// for looking up stored entities. Values that do not validate are left
    /// out; the full validation reports them.
    pub(crate) fn unique_values(&self, type_name: &str, supplied: &Attributes) -> Attributes {
        self.registry
            .unique_attributes_of(type_name)
            .into_iter()
            .filter_map(|attr| {
                let value = supplied.get(&attr.name)?;
                let normalized = self.normalize_top_level(type_name, attr, value).ok()?;
                (!normalized.is_null()).then(|| (attr.name.clone(), normalized))
            })
            .collect()
    }

    fn normalize_top_level(&self, type_name: &str, attr: &AttrDef, value: &Value) -> MutationResult<Value> {
        let normalized = self.normalize_value(type_name, &attr.name, &attr.attr_type, value)?;
        if normalized.is_empty_collection() {
            Ok(Value::Null)
        } else {
            Ok(normalized)
        }
    }

    /// Apply default values to attributes that were not supplied.
    fn apply_defaults(&self, type_name: &str, defs: &[AttrDef], attrs: &mut Attributes) -> MutationResult<()> {
        for attr in defs {
            if attrs.contains_key(&attr.name) {
                continue;
            }
            if let Some(default) = &attr.default {
                let normalized = self.normalize_top_level(type_name, attr, default)?;
                if !normalized.is_null() {
                    attrs.insert(attr.name.clone(), normalized);
                }
            }
        }
        Ok(())
    }

    fn normalize_value(
        &self,
        type_name: &str,
        attr_name: &str,
        attr_type: &AttrType,
        value: &Value,
    ) -> MutationResult<Value> {
        let mismatch =
            || MutationError::type_mismatch(type_name, attr_name, attr_type.to_string(), value.type_name());

        match (attr_type, value) {
            (_, Value::Null) => Ok(Value::Null),
            (AttrType::Primitive(kind), _) => normalize_primitive(*kind, value).ok_or_else(mismatch),
            (AttrType::Enum(enum_name), Value::Enum(member) | Value::String(member)) => {
                let members = self
                    .registry
                    .enum_values(enum_name)
                    .ok_or_else(|| MutationError::type_resolution(enum_name))?;
                if members.iter().any(|m| m == member) {
                    Ok(Value::Enum(member.clone()))
                } else {
                    Err(MutationError::type_mismatch(
                        type_name,
                        attr_name,
                        format!("one of {}", members.join(", ")),
                        member.clone(),
                    ))
                }
            }
            (AttrType::Struct(struct_type), Value::Struct(s))
                if s.type_name.is_empty() || &s.type_name == struct_type =>
            {
                Ok(Value::Struct(self.normalize_struct(struct_type, s)?))
            }
            (AttrType::ClassRef(target_type), Value::Ref(reference)) => {
                let (guid, actual_type) = self.resolver.resolve(reference)?;
                if !self.registry.is_subtype(&actual_type, target_type) {
                    return Err(MutationError::type_mismatch(
                        type_name,
                        attr_name,
                        target_type.clone(),
                        actual_type,
                    ));
                }
                Ok(Value::Ref(ObjectId::new(guid, actual_type)))
            }
            (AttrType::Array(element), Value::Array(items)) => items
                .iter()
                .map(|item| self.normalize_element(type_name, attr_name, element, item))
                .collect::<MutationResult<Vec<_>>>()
                .map(Value::Array),
            (AttrType::Map(element), Value::Map(entries)) => entries
                .iter()
                .map(|(k, v)| {
                    self.normalize_element(type_name, attr_name, element, v)
                        .map(|v| (k.clone(), v))
                })
                .collect::<MutationResult<_>>()
                .map(Value::Map),
            _ => Err(mismatch()),
        }
    }

    /// Collection members may not be null.
    fn normalize_element(
        &self,
        type_name: &str,
        attr_name: &str,
        element: &AttrType,
        value: &Value,
    ) -> MutationResult<Value> {
        if value.is_null() {
            return Err(MutationError::type_mismatch(
                type_name,
                attr_name,
                element.to_string(),
                "null element",
            ));
        }
        self.normalize_value(type_name, attr_name, element, value)
    }

    /// Validate a struct value. Structs are always complete: defaults apply
    /// and required members must be present.
    pub(crate) fn normalize_struct(&self, struct_type: &str, value: &Struct) -> MutationResult<Struct> {
        let defs = self.registry.attributes_of(struct_type)?;
        let mut result = Struct::new(struct_type);
        for (name, member) in &value.attributes {
            let attr = defs
                .iter()
                .find(|a| &a.name == name)
                .ok_or_else(|| MutationError::unknown_attribute(struct_type, name))?;
            let normalized = self.normalize_top_level(struct_type, attr, member)?;
            if !normalized.is_null() {
                result.attributes.insert(name.clone(), normalized);
            }
        }
        self.apply_defaults(struct_type, defs, &mut result.attributes)?;
        check_required_attributes(struct_type, defs, &result.attributes)?;
        Ok(result)
    }
}

/// Check that all required attributes are present and non-empty.
pub(crate) fn check_required_attributes(
    type_name: &str,
    defs: &[AttrDef],
    attrs: &Attributes,
) -> MutationResult<()> {
    for attr in defs.iter().filter(|a| a.is_required()) {
        let present = attrs
            .get(&attr.name)
            .is_some_and(|v| !v.is_null() && !v.is_empty_collection());
        if !present {
            return Err(MutationError::required_missing(type_name, &attr.name));
        }
    }
    Ok(())
}

fn normalize_primitive(kind: PrimitiveKind, value: &Value) -> Option<Value> {
    match (kind, value) {
        (PrimitiveKind::Boolean, Value::Bool(b)) => Some(Value::Bool(*b)),
        (
            PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Int | PrimitiveKind::Long,
            Value::Int(i),
        ) => kind
            .integral_range()
            .filter(|(min, max)| (*min..=*max).contains(i))
            .map(|_| Value::Int(*i)),
        (PrimitiveKind::Float | PrimitiveKind::Double, Value::Float(f)) => Some(Value::Float(*f)),
        (PrimitiveKind::Float | PrimitiveKind::Double, Value::Int(i)) => Some(Value::Float(*i as f64)),
        (PrimitiveKind::BigInteger | PrimitiveKind::BigDecimal, Value::Int(i)) => {
            Some(Value::Decimal(i.to_string()))
        }
        (PrimitiveKind::BigDecimal, Value::Float(f)) => Some(Value::Decimal(f.to_string())),
        (PrimitiveKind::BigInteger, Value::Decimal(s) | Value::String(s)) if is_integer_literal(s) => {
            Some(Value::Decimal(s.clone()))
        }
        (PrimitiveKind::BigDecimal, Value::Decimal(s) | Value::String(s)) if is_decimal_literal(s) => {
            Some(Value::Decimal(s.clone()))
        }
        (PrimitiveKind::Date, Value::Date(ms) | Value::Int(ms)) => Some(Value::Date(*ms)),
        (PrimitiveKind::String, Value::String(s)) => Some(Value::String(s.clone())),
        _ => None,
    }
}

fn integer_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[+-]?\d+$").ok()).as_ref()
}

fn decimal_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").ok())
        .as_ref()
}

fn is_integer_literal(s: &str) -> bool {
    match integer_pattern() {
        Some(re) => re.is_match(s),
        None => s.parse::<i128>().is_ok(),
    }
}

fn is_decimal_literal(s: &str) -> bool {
    match decimal_pattern() {
        Some(re) => re.is_match(s),
        None => s.parse::<f64>().is_ok(),
    }
}

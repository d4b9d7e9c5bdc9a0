//! The Registry - immutable schema lookup.

use crate::{AttrDef, RegistryError, RegistryResult, SubtypeIndex, TypeDef, TypeKind};
use std::collections::HashMap;

/// The Registry provides runtime lookup of schema definitions.
/// It is immutable after construction.
#[derive(Debug, Default)]
pub struct Registry {
    /// Type definitions by name.
    types: HashMap<String, TypeDef>,
    /// Resolved attributes per type, inherited ones first.
    all_attributes: HashMap<String, Vec<AttrDef>>,
    /// Precomputed subtype relationships.
    subtype_index: SubtypeIndex,
}

impl Registry {
    pub(crate) fn new(
        types: HashMap<String, TypeDef>,
        all_attributes: HashMap<String, Vec<AttrDef>>,
        subtype_index: SubtypeIndex,
    ) -> Self {
        Self {
            types,
            all_attributes,
            subtype_index,
        }
    }

    // ==================== Type Lookups ====================

    /// Get a type definition by name.
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Get a type definition, failing for unregistered names.
    pub fn require_type(&self, name: &str) -> RegistryResult<&TypeDef> {
        self.types
            .get(name)
            .ok_or_else(|| RegistryError::UnknownType(name.to_string()))
    }

    /// Check that `name` is a registered type of the given kind.
    pub fn is_kind(&self, name: &str, kind: TypeKind) -> bool {
        self.types.get(name).map(|t| t.kind == kind).unwrap_or(false)
    }

    /// Get all type definitions.
    pub fn all_types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    /// Get the number of types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    // ==================== Attribute Lookups ====================

    /// All attributes of a type including inherited ones.
    pub fn attributes_of(&self, type_name: &str) -> RegistryResult<&[AttrDef]> {
        self.all_attributes
            .get(type_name)
            .map(|attrs| attrs.as_slice())
            .ok_or_else(|| RegistryError::UnknownType(type_name.to_string()))
    }

    /// Get an attribute definition from a type, including inherited attributes.
    pub fn get_attr(&self, type_name: &str, attr_name: &str) -> Option<&AttrDef> {
        self.all_attributes
            .get(type_name)
            .and_then(|attrs| attrs.iter().find(|a| a.name == attr_name))
    }

    /// Unique attributes of a type including inherited ones.
    pub fn unique_attributes_of(&self, type_name: &str) -> Vec<&AttrDef> {
        self.all_attributes
            .get(type_name)
            .map(|attrs| attrs.iter().filter(|a| a.is_unique).collect())
            .unwrap_or_default()
    }

    /// Members of an enum type.
    pub fn enum_values(&self, enum_name: &str) -> Option<&[String]> {
        self.types
            .get(enum_name)
            .filter(|t| t.kind == TypeKind::Enum)
            .map(|t| t.enum_values.as_slice())
    }

    // ==================== Subtype Queries ====================

    /// Check if `sub` is a subtype of `super_type` (reflexive).
    pub fn is_subtype(&self, sub: &str, super_type: &str) -> bool {
        self.subtype_index.is_subtype(sub, super_type)
    }

    /// Get all supertypes of a type (not including the type itself).
    pub fn get_supertypes<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.subtype_index.get_supertypes(name)
    }
}

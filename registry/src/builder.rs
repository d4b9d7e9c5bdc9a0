//! RegistryBuilder for constructing an immutable Registry.

use crate::{AttrDef, AttrType, Registry, SubtypeIndex, TypeDef, TypeKind};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors raised while building or querying the registry.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate type name: {0}")]
    DuplicateTypeName(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Unknown parent type: {0}")]
    UnknownParentType(String),

    #[error("Type {type_name} cannot extend {parent}: kinds differ")]
    InvalidSupertype { type_name: String, parent: String },

    #[error("Duplicate attribute {attr} on type {type_name}")]
    DuplicateAttribute { type_name: String, attr: String },

    #[error("Attribute {type_name}.{attr} references unknown type {referenced}")]
    UnknownAttributeType {
        type_name: String,
        attr: String,
        referenced: String,
    },

    #[error("Attribute {type_name}.{attr} has an invalid type: {reason}")]
    InvalidAttributeType {
        type_name: String,
        attr: String,
        reason: String,
    },

    #[error("Attribute {type_name}.{attr} is composite but does not reference an entity type")]
    InvalidComposite { type_name: String, attr: String },

    #[error("Attribute {type_name}.{attr} names invalid reverse attribute {reverse}")]
    InvalidReverseAttribute {
        type_name: String,
        attr: String,
        reverse: String,
    },
}

impl RegistryError {
    fn invalid_type(type_name: &str, attr: &str, reason: impl Into<String>) -> Self {
        RegistryError::InvalidAttributeType {
            type_name: type_name.to_string(),
            attr: attr.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Builder for constructing an immutable Registry.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    /// Types being built.
    types: HashMap<String, TypeDef>,
    /// Registration order, for deterministic validation.
    order: Vec<String>,
}

impl RegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity type definition.
    pub fn add_entity_type(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        self.add_type(name, TypeKind::Entity)
    }

    /// Add a struct type definition.
    pub fn add_struct_type(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        self.add_type(name, TypeKind::Struct)
    }

    /// Add a classification type definition.
    pub fn add_classification_type(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        self.add_type(name, TypeKind::Classification)
    }

    /// Add an enum type with its members.
    pub fn add_enum_type(
        &mut self,
        name: impl Into<String>,
        values: &[&str],
    ) -> RegistryResult<()> {
        let name = name.into();
        if self.types.contains_key(&name) {
            return Err(RegistryError::DuplicateTypeName(name));
        }
        let mut def = TypeDef::new(name.clone(), TypeKind::Enum);
        def.enum_values = values.iter().map(|v| v.to_string()).collect();
        self.order.push(name.clone());
        self.types.insert(name, def);
        Ok(())
    }

    fn add_type(&mut self, name: impl Into<String>, kind: TypeKind) -> TypeBuilder<'_> {
        TypeBuilder {
            builder: self,
            name: name.into(),
            kind,
            parent_names: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Build the immutable Registry.
    pub fn build(self) -> RegistryResult<Registry> {
        let subtype_index = SubtypeIndex::build(&self.types);

        let mut all_attributes = HashMap::new();
        for name in &self.order {
            let mut collected = Vec::new();
            let mut seen = HashSet::new();
            let mut visited = HashSet::new();
            collect_attributes(&self.types, name, &mut collected, &mut seen, &mut visited)?;
            all_attributes.insert(name.clone(), collected);
        }

        for name in &self.order {
            if let Some(def) = self.types.get(name) {
                for attr in &def.attributes {
                    validate_attribute(&self.types, &all_attributes, &subtype_index, def, attr)?;
                }
            }
        }

        Ok(Registry::new(self.types, all_attributes, subtype_index))
    }
}

/// Collect a type's attributes, supertypes first.
fn collect_attributes(
    types: &HashMap<String, TypeDef>,
    name: &str,
    result: &mut Vec<AttrDef>,
    seen: &mut HashSet<String>,
    visited: &mut HashSet<String>,
) -> RegistryResult<()> {
    // Diamond inheritance reaches the same supertype twice.
    if !visited.insert(name.to_string()) {
        return Ok(());
    }
    let def = types
        .get(name)
        .ok_or_else(|| RegistryError::UnknownType(name.to_string()))?;
    for parent in &def.parent_names {
        collect_attributes(types, parent, result, seen, visited)?;
    }
    for attr in &def.attributes {
        if !seen.insert(attr.name.clone()) {
            return Err(RegistryError::DuplicateAttribute {
                type_name: def.name.clone(),
                attr: attr.name.clone(),
            });
        }
        result.push(attr.clone());
    }
    Ok(())
}

fn validate_attribute(
    types: &HashMap<String, TypeDef>,
    all_attributes: &HashMap<String, Vec<AttrDef>>,
    subtype_index: &SubtypeIndex,
    owner: &TypeDef,
    attr: &AttrDef,
) -> RegistryResult<()> {
    validate_attr_type(types, owner, attr, &attr.attr_type, 0)?;

    let target = attr.attr_type.referenced_entity_type();
    if attr.is_composite && target.is_none() {
        return Err(RegistryError::InvalidComposite {
            type_name: owner.name.clone(),
            attr: attr.name.clone(),
        });
    }

    if let Some(reverse) = &attr.reverse_attribute {
        let invalid = || RegistryError::InvalidReverseAttribute {
            type_name: owner.name.clone(),
            attr: attr.name.clone(),
            reverse: reverse.clone(),
        };
        let target = target.ok_or_else(invalid)?;
        let back = all_attributes
            .get(target)
            .and_then(|attrs| attrs.iter().find(|a| &a.name == reverse))
            .ok_or_else(invalid)?;
        match &back.attr_type {
            AttrType::ClassRef(back_target)
                if !back.is_composite && subtype_index.is_subtype(&owner.name, back_target) => {}
            _ => return Err(invalid()),
        }
    }

    Ok(())
}

fn validate_attr_type(
    types: &HashMap<String, TypeDef>,
    owner: &TypeDef,
    attr: &AttrDef,
    attr_type: &AttrType,
    depth: usize,
) -> RegistryResult<()> {
    let expect_kind = |referenced: &str, kind: TypeKind| -> RegistryResult<()> {
        match types.get(referenced) {
            None => Err(RegistryError::UnknownAttributeType {
                type_name: owner.name.clone(),
                attr: attr.name.clone(),
                referenced: referenced.to_string(),
            }),
            Some(def) if def.kind != kind => Err(RegistryError::invalid_type(
                &owner.name,
                &attr.name,
                format!("{} is a {} type, expected {}", referenced, def.kind, kind),
            )),
            Some(_) => Ok(()),
        }
    };

    match attr_type {
        AttrType::Primitive(_) => Ok(()),
        AttrType::Enum(name) => expect_kind(name, TypeKind::Enum),
        AttrType::Struct(name) => expect_kind(name, TypeKind::Struct),
        AttrType::ClassRef(name) => {
            if owner.kind == TypeKind::Classification {
                return Err(RegistryError::invalid_type(
                    &owner.name,
                    &attr.name,
                    "classifications cannot reference entities",
                ));
            }
            expect_kind(name, TypeKind::Entity)
        }
        AttrType::Array(inner) | AttrType::Map(inner) => {
            if depth > 0 && !attr_type.is_inline() {
                return Err(RegistryError::invalid_type(
                    &owner.name,
                    &attr.name,
                    "nested collections may only hold primitives or enums",
                ));
            }
            validate_attr_type(types, owner, attr, inner, depth + 1)
        }
    }
}

/// Builder for a type definition.
pub struct TypeBuilder<'a> {
    builder: &'a mut RegistryBuilder,
    name: String,
    kind: TypeKind,
    parent_names: Vec<String>,
    attributes: Vec<AttrDef>,
}

impl<'a> TypeBuilder<'a> {
    /// Add a parent type by name.
    pub fn extends(mut self, parent_name: impl Into<String>) -> Self {
        self.parent_names.push(parent_name.into());
        self
    }

    /// Add an attribute.
    pub fn attr(mut self, attr: AttrDef) -> Self {
        self.attributes.push(attr);
        self
    }

    /// Finish building this type.
    pub fn done(self) -> RegistryResult<()> {
        if self.builder.types.contains_key(&self.name) {
            return Err(RegistryError::DuplicateTypeName(self.name));
        }

        for parent_name in &self.parent_names {
            match self.builder.types.get(parent_name) {
                Some(parent) if parent.kind == self.kind => {}
                Some(_) => {
                    return Err(RegistryError::InvalidSupertype {
                        type_name: self.name.clone(),
                        parent: parent_name.clone(),
                    })
                }
                None => return Err(RegistryError::UnknownParentType(parent_name.clone())),
            }
        }

        let mut attributes = Vec::with_capacity(self.attributes.len());
        for mut attr in self.attributes {
            if attributes.iter().any(|a: &AttrDef| a.name == attr.name) {
                return Err(RegistryError::DuplicateAttribute {
                    type_name: self.name.clone(),
                    attr: attr.name,
                });
            }
            attr.declaring_type = self.name.clone();
            attributes.push(attr);
        }

        let type_def = TypeDef {
            name: self.name.clone(),
            kind: self.kind,
            parent_names: self.parent_names,
            attributes,
            enum_values: Vec::new(),
        };

        self.builder.order.push(self.name.clone());
        self.builder.types.insert(self.name, type_def);

        Ok(())
    }
}

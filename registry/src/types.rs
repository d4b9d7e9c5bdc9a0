//! Schema definition types.

use quiver_core::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Primitive attribute kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    Date,
    String,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::BigInteger => "biginteger",
            PrimitiveKind::BigDecimal => "bigdecimal",
            PrimitiveKind::Date => "date",
            PrimitiveKind::String => "string",
        }
    }

    /// Inclusive range for the bounded integral kinds.
    pub fn integral_range(self) -> Option<(i64, i64)> {
        match self {
            PrimitiveKind::Byte => Some((i8::MIN as i64, i8::MAX as i64)),
            PrimitiveKind::Short => Some((i16::MIN as i64, i16::MAX as i64)),
            PrimitiveKind::Int => Some((i32::MIN as i64, i32::MAX as i64)),
            PrimitiveKind::Long => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared type of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrType {
    Primitive(PrimitiveKind),
    /// Enum type name.
    Enum(String),
    /// Struct type name.
    Struct(String),
    /// Entity type name.
    ClassRef(String),
    Array(Box<AttrType>),
    /// String-keyed map.
    Map(Box<AttrType>),
}

/// Category of an attribute type, used for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Primitive,
    Enum,
    Struct,
    ClassRef,
    Array,
    Map,
}

impl AttrType {
    pub fn string() -> Self {
        AttrType::Primitive(PrimitiveKind::String)
    }

    pub fn int() -> Self {
        AttrType::Primitive(PrimitiveKind::Int)
    }

    pub fn long() -> Self {
        AttrType::Primitive(PrimitiveKind::Long)
    }

    pub fn boolean() -> Self {
        AttrType::Primitive(PrimitiveKind::Boolean)
    }

    pub fn date() -> Self {
        AttrType::Primitive(PrimitiveKind::Date)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        AttrType::Enum(name.into())
    }

    pub fn struct_of(name: impl Into<String>) -> Self {
        AttrType::Struct(name.into())
    }

    pub fn class_ref(name: impl Into<String>) -> Self {
        AttrType::ClassRef(name.into())
    }

    pub fn array_of(element: AttrType) -> Self {
        AttrType::Array(Box::new(element))
    }

    pub fn map_of(value: AttrType) -> Self {
        AttrType::Map(Box::new(value))
    }

    pub fn category(&self) -> TypeCategory {
        match self {
            AttrType::Primitive(_) => TypeCategory::Primitive,
            AttrType::Enum(_) => TypeCategory::Enum,
            AttrType::Struct(_) => TypeCategory::Struct,
            AttrType::ClassRef(_) => TypeCategory::ClassRef,
            AttrType::Array(_) => TypeCategory::Array,
            AttrType::Map(_) => TypeCategory::Map,
        }
    }

    /// Element type of an array or value type of a map.
    pub fn element(&self) -> Option<&AttrType> {
        match self {
            AttrType::Array(inner) | AttrType::Map(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, AttrType::Array(_) | AttrType::Map(_))
    }

    /// True if values of this type are stored inline as vertex properties
    /// (primitives, enums and collections of them).
    pub fn is_inline(&self) -> bool {
        match self {
            AttrType::Primitive(_) | AttrType::Enum(_) => true,
            AttrType::Struct(_) | AttrType::ClassRef(_) => false,
            AttrType::Array(inner) | AttrType::Map(inner) => inner.is_inline(),
        }
    }

    /// Entity type referenced by this type or its elements.
    pub fn referenced_entity_type(&self) -> Option<&str> {
        match self {
            AttrType::ClassRef(name) => Some(name),
            AttrType::Array(inner) | AttrType::Map(inner) => inner.referenced_entity_type(),
            _ => None,
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrType::Primitive(kind) => write!(f, "{}", kind),
            AttrType::Enum(name) | AttrType::Struct(name) | AttrType::ClassRef(name) => {
                write!(f, "{}", name)
            }
            AttrType::Array(inner) => write!(f, "array<{}>", inner),
            AttrType::Map(inner) => write!(f, "map<string,{}>", inner),
        }
    }
}

/// Attribute multiplicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    Required,
    Optional,
    /// Optional array or map.
    Collection,
}

/// Attribute definition within a type.
#[derive(Debug, Clone)]
pub struct AttrDef {
    /// Attribute name.
    pub name: String,
    /// Declared type.
    pub attr_type: AttrType,
    pub multiplicity: Multiplicity,
    /// Whether the referenced entities are owned by the declaring entity.
    pub is_composite: bool,
    /// Whether values must be unique across instances of the type.
    pub is_unique: bool,
    /// Default value applied on create when the attribute is absent.
    pub default: Option<Value>,
    /// Attribute on the referenced type pointing back at the declaring entity.
    pub reverse_attribute: Option<String>,
    /// Type that declares this attribute (set when the type is registered).
    pub declaring_type: String,
}

impl AttrDef {
    pub fn new(name: impl Into<String>, attr_type: AttrType) -> Self {
        let multiplicity = if attr_type.is_collection() {
            Multiplicity::Collection
        } else {
            Multiplicity::Optional
        };
        Self {
            name: name.into(),
            attr_type,
            multiplicity,
            is_composite: false,
            is_unique: false,
            default: None,
            reverse_attribute: None,
            declaring_type: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.multiplicity = Multiplicity::Required;
        self
    }

    pub fn composite(mut self) -> Self {
        self.is_composite = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn reverse(mut self, attr_name: impl Into<String>) -> Self {
        self.reverse_attribute = Some(attr_name.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.multiplicity == Multiplicity::Required
    }

    /// `DeclaringType.name`, the base of every property key and edge label.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_type, self.name)
    }
}

/// Kind of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Entity,
    Struct,
    Classification,
    Enum,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeKind::Entity => "entity",
            TypeKind::Struct => "struct",
            TypeKind::Classification => "classification",
            TypeKind::Enum => "enum",
        };
        f.write_str(name)
    }
}

/// Type definition.
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Type name.
    pub name: String,
    pub kind: TypeKind,
    /// Direct supertypes.
    pub parent_names: Vec<String>,
    /// Own attribute definitions, in declaration order.
    pub attributes: Vec<AttrDef>,
    /// Members of an enum type.
    pub enum_values: Vec<String>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent_names: Vec::new(),
            attributes: Vec::new(),
            enum_values: Vec::new(),
        }
    }

    /// Get an own attribute definition by name.
    pub fn get_attr(&self, name: &str) -> Option<&AttrDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn has_enum_value(&self, value: &str) -> bool {
        self.enum_values.iter().any(|v| v == value)
    }
}

/// Precomputed subtype relationships.
#[derive(Debug, Default)]
pub struct SubtypeIndex {
    /// For each type, the set of all its supertypes (transitive).
    supertypes: HashMap<String, HashSet<String>>,
}

impl SubtypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the subtype index from type definitions.
    pub fn build(types: &HashMap<String, TypeDef>) -> Self {
        let mut index = Self::new();

        for (name, type_def) in types {
            let mut closure = HashSet::new();
            let mut pending: Vec<&str> = type_def.parent_names.iter().map(|s| s.as_str()).collect();
            while let Some(parent) = pending.pop() {
                if !closure.insert(parent.to_string()) {
                    continue;
                }
                if let Some(parent_def) = types.get(parent) {
                    pending.extend(parent_def.parent_names.iter().map(|s| s.as_str()));
                }
            }
            index.supertypes.insert(name.clone(), closure);
        }

        index
    }

    /// Check if `sub` is a subtype of `super_type`.
    pub fn is_subtype(&self, sub: &str, super_type: &str) -> bool {
        if sub == super_type {
            return true;
        }
        self.supertypes
            .get(sub)
            .map(|set| set.contains(super_type))
            .unwrap_or(false)
    }

    /// Get all supertypes of a type (not including the type itself).
    pub fn get_supertypes<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.supertypes
            .get(name)
            .into_iter()
            .flat_map(|set| set.iter().map(|s| s.as_str()))
    }
}

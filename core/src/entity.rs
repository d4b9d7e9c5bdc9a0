//! Typed entity structures.
//!
//! A [`TypedEntity`] is the strongly-typed view of a graph vertex. Structs are
//! identity-less nested instances, [`ObjectId`]s are lightweight pointers to
//! other entities and [`Classification`]s are tags attached to an entity.

use crate::{Attributes, Guid, Value};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityState {
    #[default]
    Active,
    Deleted,
}

impl EntityState {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityState::Active => "ACTIVE",
            EntityState::Deleted => "DELETED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ACTIVE" => Some(EntityState::Active),
            "DELETED" => Some(EntityState::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit attributes maintained by the store.
///
/// Unset on input; the mutator fills them in and ignores caller values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SystemAttributes {
    pub created_by: Option<String>,
    pub modified_by: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
}

/// A typed entity instance.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedEntity {
    /// Identity; a placeholder until the entity is first created.
    pub guid: Guid,
    /// Entity type name (reference to the schema registry).
    pub type_name: String,
    /// Version, starting at 1 on create. Zero on input means "unchecked".
    pub version: u64,
    /// Lifecycle state.
    pub state: EntityState,
    /// Audit attributes.
    pub system: SystemAttributes,
    /// Attribute values by name.
    pub attributes: Attributes,
    /// Attached classifications.
    pub classifications: Vec<Classification>,
}

impl TypedEntity {
    /// Create a new, not yet persisted entity with a placeholder guid.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            guid: Guid::placeholder(),
            type_name: type_name.into(),
            version: 0,
            state: EntityState::Active,
            system: SystemAttributes::default(),
            attributes: Attributes::new(),
            classifications: Vec::new(),
        }
    }

    /// Create an entity addressed by an existing guid (used for updates).
    pub fn with_guid(guid: Guid, type_name: impl Into<String>) -> Self {
        Self {
            guid,
            ..Self::new(type_name)
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Get an attribute value by name.
    pub fn get_attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Set an attribute value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Remove an attribute.
    pub fn remove_attr(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    /// A reference to this entity.
    pub fn object_id(&self) -> ObjectId {
        ObjectId {
            guid: Some(self.guid.clone()),
            type_name: self.type_name.clone(),
            state: Some(self.state),
            unique_attributes: Attributes::new(),
        }
    }

    /// Get a classification by type name.
    pub fn classification(&self, type_name: &str) -> Option<&Classification> {
        self.classifications
            .iter()
            .find(|c| c.type_name == type_name)
    }

    /// Names of attached classifications, in attachment order.
    pub fn classification_names(&self) -> Vec<&str> {
        self.classifications
            .iter()
            .map(|c| c.type_name.as_str())
            .collect()
    }
}

/// A struct instance: typed attribute bag without identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    pub type_name: String,
    pub attributes: Attributes,
}

impl Struct {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// Lightweight pointer to another entity.
///
/// Either `guid` is set, or the target is named by `type_name` plus its
/// unique attribute values.
#[derive(Debug, Clone)]
pub struct ObjectId {
    pub guid: Option<Guid>,
    pub type_name: String,
    pub state: Option<EntityState>,
    pub unique_attributes: Attributes,
}

impl ObjectId {
    /// Reference by guid.
    pub fn new(guid: Guid, type_name: impl Into<String>) -> Self {
        Self {
            guid: Some(guid),
            type_name: type_name.into(),
            state: None,
            unique_attributes: Attributes::new(),
        }
    }

    /// Reference by a unique attribute value.
    pub fn by_unique_attr(
        type_name: impl Into<String>,
        attr: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let mut unique_attributes = Attributes::new();
        unique_attributes.insert(attr.into(), value.into());
        Self {
            guid: None,
            type_name: type_name.into(),
            state: None,
            unique_attributes,
        }
    }

    pub fn with_state(mut self, state: EntityState) -> Self {
        self.state = Some(state);
        self
    }
}

/// References with guids compare by guid alone; state is informational.
impl PartialEq for ObjectId {
    fn eq(&self, other: &Self) -> bool {
        match (&self.guid, &other.guid) {
            (Some(a), Some(b)) => a == b,
            (None, None) => {
                self.type_name == other.type_name
                    && self.unique_attributes == other.unique_attributes
            }
            _ => false,
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.guid {
            Some(guid) => write!(f, "{}#{}", self.type_name, guid),
            None => write!(f, "{}{:?}", self.type_name, self.unique_attributes),
        }
    }
}

/// A classification (tag) instance attached to an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub type_name: String,
    pub entity_guid: Option<Guid>,
    pub attributes: Attributes,
}

impl Classification {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            entity_guid: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// Summary of an entity as reported in mutation responses.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityHeader {
    pub guid: Guid,
    pub type_name: String,
    pub version: u64,
    pub state: EntityState,
    /// Unique attribute values of the entity.
    pub attributes: Attributes,
}

impl EntityHeader {
    pub fn get_attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// An entity together with the composite sub-entities materialized while
/// reading it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityWithExtInfo {
    pub entity: TypedEntity,
    pub referred_entities: BTreeMap<Guid, TypedEntity>,
}

impl EntityWithExtInfo {
    pub fn new(entity: TypedEntity) -> Self {
        Self {
            entity,
            referred_entities: BTreeMap::new(),
        }
    }

    pub fn referred(&self, guid: &Guid) -> Option<&TypedEntity> {
        self.referred_entities.get(guid)
    }
}

//! Mutation response types.

use quiver_core::{EntityHeader, Guid, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// What a mutation did to one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityOperation {
    Create,
    Update,
    PartialUpdate,
    Delete,
}

impl EntityOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityOperation::Create => "CREATE",
            EntityOperation::Update => "UPDATE",
            EntityOperation::PartialUpdate => "PARTIAL_UPDATE",
            EntityOperation::Delete => "DELETE",
        }
    }

    fn is_update(&self) -> bool {
        matches!(self, EntityOperation::Update | EntityOperation::PartialUpdate)
    }
}

impl fmt::Display for EntityOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Headers of every entity a call touched, grouped by operation.
///
/// An entity appears under at most one operation: a delete supersedes an
/// update, and a create absorbs later updates in the same call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationResponse {
    mutated: BTreeMap<EntityOperation, Vec<EntityHeader>>,
    guid_assignments: BTreeMap<Guid, Guid>,
}

impl MutationResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an operation on an entity.
    pub fn add_entity(&mut self, op: EntityOperation, header: EntityHeader) {
        let recorded = self.operation_of(&header.guid);
        match (recorded, op) {
            (Some(EntityOperation::Create), o) if o.is_update() => return,
            (Some(EntityOperation::Delete), o) if o.is_update() => return,
            (Some(prev), EntityOperation::Delete) if prev.is_update() => {
                self.remove(prev, &header.guid);
            }
            _ => {}
        }

        let headers = self.mutated.entry(op).or_default();
        match headers.iter_mut().find(|h| h.guid == header.guid) {
            Some(existing) => *existing = header,
            None => headers.push(header),
        }
    }

    fn remove(&mut self, op: EntityOperation, guid: &Guid) {
        if let Some(headers) = self.mutated.get_mut(&op) {
            headers.retain(|h| &h.guid != guid);
            if headers.is_empty() {
                self.mutated.remove(&op);
            }
        }
    }

    /// Record that a placeholder guid resolved to `assigned`.
    pub fn assign_guid(&mut self, placeholder: Guid, assigned: Guid) {
        self.guid_assignments.insert(placeholder, assigned);
    }

    /// Operation recorded for an entity, if any.
    pub fn operation_of(&self, guid: &Guid) -> Option<EntityOperation> {
        self.mutated
            .iter()
            .find(|(_, headers)| headers.iter().any(|h| &h.guid == guid))
            .map(|(op, _)| *op)
    }

    // ==================== Lookups ====================

    /// Headers recorded under `op`, in the order they were recorded.
    pub fn entities(&self, op: EntityOperation) -> &[EntityHeader] {
        self.mutated.get(&op).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Headers recorded under `op` for one entity type.
    pub fn entities_by_type(&self, op: EntityOperation, type_name: &str) -> Vec<&EntityHeader> {
        self.entities(op)
            .iter()
            .filter(|h| h.type_name == type_name)
            .collect()
    }

    pub fn created_entities(&self) -> &[EntityHeader] {
        self.entities(EntityOperation::Create)
    }

    pub fn updated_entities(&self) -> &[EntityHeader] {
        self.entities(EntityOperation::Update)
    }

    pub fn partially_updated_entities(&self) -> &[EntityHeader] {
        self.entities(EntityOperation::PartialUpdate)
    }

    pub fn deleted_entities(&self) -> &[EntityHeader] {
        self.entities(EntityOperation::Delete)
    }

    pub fn first_created(&self) -> Option<&EntityHeader> {
        self.created_entities().first()
    }

    pub fn first_updated(&self) -> Option<&EntityHeader> {
        self.updated_entities().first()
    }

    pub fn first_partially_updated(&self) -> Option<&EntityHeader> {
        self.partially_updated_entities().first()
    }

    pub fn first_created_by_type(&self, type_name: &str) -> Option<&EntityHeader> {
        self.first_by_type(EntityOperation::Create, type_name)
    }

    pub fn first_updated_by_type(&self, type_name: &str) -> Option<&EntityHeader> {
        self.first_by_type(EntityOperation::Update, type_name)
    }

    pub fn first_partially_updated_by_type(&self, type_name: &str) -> Option<&EntityHeader> {
        self.first_by_type(EntityOperation::PartialUpdate, type_name)
    }

    fn first_by_type(&self, op: EntityOperation, type_name: &str) -> Option<&EntityHeader> {
        self.entities(op).iter().find(|h| h.type_name == type_name)
    }

    /// Created entity of `type_name` whose unique attribute `attr` equals `value`.
    pub fn created_by_unique_attribute(
        &self,
        type_name: &str,
        attr: &str,
        value: &Value,
    ) -> Option<&EntityHeader> {
        self.created_entities()
            .iter()
            .find(|h| h.type_name == type_name && h.get_attr(attr) == Some(value))
    }

    /// Placeholder guid to assigned guid.
    pub fn guid_assignments(&self) -> &BTreeMap<Guid, Guid> {
        &self.guid_assignments
    }

    pub fn assigned_guid(&self, placeholder: &Guid) -> Option<&Guid> {
        self.guid_assignments.get(placeholder)
    }

    /// Guid of every entity the call touched.
    pub fn touched_guids(&self) -> BTreeSet<Guid> {
        self.mutated
            .values()
            .flatten()
            .map(|h| h.guid.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.mutated.is_empty()
    }
}

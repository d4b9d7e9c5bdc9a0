//! Writes typed attribute values into a graph transaction.
//!
//! Every write is a diff against the value currently stored: unchanged
//! edges and struct vertices are kept, so re-applying the same value is a
//! no-op at the graph level.

use chrono::{DateTime, Utc};
use quiver_core::{Attributes, EntityHeader, EntityState, Guid, Struct, Value, VertexId};
use quiver_graph::{keys, Edge, GraphRead, GraphResult, Properties, Property, Transaction};
use quiver_mapper::decode_inline;
use quiver_registry::{AttrDef, AttrType, Registry};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{MutationError, MutationResult};

/// The vertex an attribute is written to.
pub(crate) struct Owner<'a> {
    /// Entity or struct vertex holding the attribute.
    pub vertex: VertexId,
    /// Guid of the entity the vertex belongs to.
    pub entity: &'a Guid,
}

/// A composite target dropped by its owner.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Orphan {
    pub target: Guid,
    pub owner: Guid,
}

/// Batch-scoped writer over one transaction.
pub(crate) struct GraphWriter<'r> {
    registry: &'r Registry,
    txn: Transaction,
    user: String,
    now: i64,
    /// Entity vertices resolved so far.
    vertices: HashMap<Guid, VertexId>,
    /// Entities created by this batch.
    created: HashSet<Guid>,
    /// Existing entities whose stored state changed, in first-change order.
    changed: Vec<Guid>,
    changed_set: HashSet<Guid>,
    orphans: Vec<Orphan>,
}

impl<'r> GraphWriter<'r> {
    pub(crate) fn new(registry: &'r Registry, txn: Transaction, user: &str, now: DateTime<Utc>) -> Self {
        Self {
            registry,
            txn,
            user: user.to_string(),
            now: now.timestamp_millis(),
            vertices: HashMap::new(),
            created: HashSet::new(),
            changed: Vec::new(),
            changed_set: HashSet::new(),
            orphans: Vec::new(),
        }
    }

    pub(crate) fn txn(&self) -> &Transaction {
        &self.txn
    }

    /// Run raw graph writes against the transaction.
    pub(crate) fn txn_write<T>(
        &mut self,
        write: impl FnOnce(&mut Transaction) -> GraphResult<T>,
    ) -> MutationResult<T> {
        Ok(write(&mut self.txn)?)
    }

    pub(crate) fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub(crate) fn into_transaction(self) -> Transaction {
        self.txn
    }

    // ==================== Entity Vertices ====================

    /// Create an ACTIVE entity vertex with version 1 and audit attributes.
    pub(crate) fn create_entity(&mut self, guid: &Guid, type_name: &str) -> MutationResult<VertexId> {
        let vertex = self.txn.add_vertex();
        self.txn.set_property(vertex, keys::GUID, Property::from(guid.as_str()))?;
        self.txn.set_property(vertex, keys::TYPE_NAME, Property::from(type_name))?;
        self.txn
            .set_property(vertex, keys::STATE, Property::from(EntityState::Active.as_str()))?;
        self.txn.set_property(vertex, keys::VERSION, Property::Int(1))?;
        self.txn
            .set_property(vertex, keys::CREATED_BY, Property::from(self.user.as_str()))?;
        self.txn.set_property(vertex, keys::TIMESTAMP, Property::Int(self.now))?;
        self.stamp(vertex)?;

        self.vertices.insert(guid.clone(), vertex);
        self.created.insert(guid.clone());
        Ok(vertex)
    }

    /// Vertex of an entity, created in this batch or already stored.
    pub(crate) fn entity_vertex(&mut self, guid: &Guid) -> MutationResult<VertexId> {
        if let Some(vertex) = self.vertices.get(guid) {
            return Ok(*vertex);
        }
        let vertex = self
            .txn
            .find_vertex(keys::GUID, &Property::from(guid.as_str()))
            .ok_or_else(|| MutationError::entity_not_found(guid))?;
        self.vertices.insert(guid.clone(), vertex);
        Ok(vertex)
    }

    pub(crate) fn is_created(&self, guid: &Guid) -> bool {
        self.created.contains(guid)
    }

    pub(crate) fn mark_changed(&mut self, guid: &Guid) {
        if !self.created.contains(guid) && self.changed_set.insert(guid.clone()) {
            self.changed.push(guid.clone());
        }
    }

    /// Existing entities whose stored state changed.
    pub(crate) fn changed(&self) -> &[Guid] {
        &self.changed
    }

    fn stamp(&mut self, vertex: VertexId) -> MutationResult<()> {
        self.txn
            .set_property(vertex, keys::MODIFIED_BY, Property::from(self.user.as_str()))?;
        self.txn
            .set_property(vertex, keys::MODIFICATION_TIMESTAMP, Property::Int(self.now))?;
        Ok(())
    }

    /// Record a modification of an entity; the version moves only when
    /// `bump_version` is set.
    pub(crate) fn touch_entity(&mut self, guid: &Guid, bump_version: bool) -> MutationResult<()> {
        let vertex = self.entity_vertex(guid)?;
        if bump_version {
            let version = self
                .txn
                .vertex(vertex)
                .and_then(|v| v.get_int(keys::VERSION))
                .unwrap_or(0);
            self.txn.set_property(vertex, keys::VERSION, Property::Int(version + 1))?;
        }
        self.stamp(vertex)
    }

    /// Mark an entity DELETED. Unique values are released; edges stay.
    pub(crate) fn soft_delete(&mut self, vertex: VertexId) -> MutationResult<()> {
        self.txn
            .set_property(vertex, keys::STATE, Property::from(EntityState::Deleted.as_str()))?;
        let unique_keys: Vec<String> = self
            .txn
            .vertex(vertex)
            .map(|v| {
                v.properties
                    .keys()
                    .filter(|k| keys::is_unique_key(k))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        for key in unique_keys {
            self.txn.remove_property(vertex, &key)?;
        }
        Ok(())
    }

    /// Header of an entity as it stands in this batch.
    pub(crate) fn header(&mut self, guid: &Guid) -> MutationResult<EntityHeader> {
        let vertex_id = self.entity_vertex(guid)?;
        let vertex = self
            .txn
            .vertex(vertex_id)
            .ok_or_else(|| MutationError::entity_not_found(guid))?;
        let type_name = vertex.get_str(keys::TYPE_NAME).unwrap_or_default().to_string();

        let mut attributes = Attributes::new();
        for attr in self.registry.unique_attributes_of(&type_name) {
            let key = keys::attribute_key(&attr.declaring_type, &attr.name);
            if let Some(property) = vertex.get(&key) {
                let value = decode_inline(vertex.id, property, &attr.attr_type)?;
                attributes.insert(attr.name.clone(), value);
            }
        }

        Ok(EntityHeader {
            guid: guid.clone(),
            version: vertex.get_int(keys::VERSION).unwrap_or(0).max(0) as u64,
            state: vertex
                .get_str(keys::STATE)
                .and_then(EntityState::parse)
                .unwrap_or_default(),
            type_name,
            attributes,
        })
    }

    /// Composite targets dropped since the last call.
    pub(crate) fn take_orphans(&mut self) -> Vec<Orphan> {
        std::mem::take(&mut self.orphans)
    }

    /// Fail if an entity's unique values are held by another vertex.
    pub(crate) fn check_unique(&self, guid: &Guid, type_name: &str) -> MutationResult<()> {
        let Some(vertex) = self.vertices.get(guid).and_then(|v| self.txn.vertex(*v)) else {
            return Ok(());
        };
        for attr in self.registry.unique_attributes_of(type_name) {
            let key = keys::unique_key(&keys::attribute_key(&attr.declaring_type, &attr.name));
            let Some(value) = vertex.get(&key) else {
                continue;
            };
            if self.txn.find_vertices(&key, value).iter().any(|v| *v != vertex.id) {
                let shown = value
                    .as_str()
                    .map(String::from)
                    .unwrap_or_else(|| format!("{:?}", value));
                return Err(MutationError::unique_violation(type_name, &attr.name, shown));
            }
        }
        Ok(())
    }

    // ==================== Attributes ====================

    /// Write one attribute, replacing `old` with `new`.
    ///
    /// `indexed` maintains the unique-value key of unique attributes and is
    /// only set for entity vertices.
    pub(crate) fn write_attribute(
        &mut self,
        owner: &Owner<'_>,
        attr: &AttrDef,
        old: Option<&Value>,
        new: Option<&Value>,
        indexed: bool,
    ) -> MutationResult<()> {
        let key = keys::attribute_key(&attr.declaring_type, &attr.name);

        match &attr.attr_type {
            AttrType::Primitive(_) | AttrType::Enum(_) => {
                self.write_inline(owner.vertex, &key, indexed && attr.is_unique, new)
            }
            AttrType::Array(element) if element.is_inline() => {
                self.write_inline(owner.vertex, &key, false, new)
            }
            AttrType::Map(element) if element.is_inline() => {
                self.write_inline_map(owner.vertex, &key, old, new)
            }
            AttrType::Struct(struct_type) => self.write_struct(owner, &key, struct_type, old, new),
            AttrType::ClassRef(_) => self.write_reference(owner, attr, &key, new),
            AttrType::Array(element) => match element.as_ref() {
                AttrType::Struct(struct_type) => {
                    self.write_struct_array(owner, &key, struct_type, old, new)
                }
                _ => self.write_reference_array(owner, attr, &key, new),
            },
            AttrType::Map(element) => match element.as_ref() {
                AttrType::Struct(struct_type) => {
                    self.write_struct_map(owner, &key, struct_type, old, new)
                }
                _ => self.write_reference_map(owner, attr, &key, new),
            },
        }
    }

    fn write_inline(
        &mut self,
        vertex: VertexId,
        key: &str,
        unique: bool,
        new: Option<&Value>,
    ) -> MutationResult<()> {
        match new.and_then(Property::from_value) {
            Some(property) => {
                if unique {
                    self.txn
                        .set_property(vertex, keys::unique_key(key), property.clone())?;
                }
                self.txn.set_property(vertex, key, property)?;
            }
            None => {
                self.txn.remove_property(vertex, key)?;
                if unique {
                    self.txn.remove_property(vertex, &keys::unique_key(key))?;
                }
            }
        }
        Ok(())
    }

    fn write_inline_map(
        &mut self,
        vertex: VertexId,
        key: &str,
        old: Option<&Value>,
        new: Option<&Value>,
    ) -> MutationResult<()> {
        let new_entries = new.and_then(Value::as_map).filter(|m| !m.is_empty());
        if let Some(old_entries) = old.and_then(Value::as_map) {
            for map_key in old_entries.keys() {
                if !new_entries.is_some_and(|m| m.contains_key(map_key)) {
                    self.txn
                        .remove_property(vertex, &keys::map_entry_key(key, map_key))?;
                }
            }
        }

        let Some(entries) = new_entries else {
            self.txn.remove_property(vertex, key)?;
            return Ok(());
        };
        self.txn.set_property(vertex, key, listing(entries.keys()))?;
        for (map_key, value) in entries {
            if let Some(property) = Property::from_value(value) {
                self.txn
                    .set_property(vertex, keys::map_entry_key(key, map_key), property)?;
            }
        }
        Ok(())
    }

    // ==================== Structs ====================

    fn write_struct(
        &mut self,
        owner: &Owner<'_>,
        key: &str,
        struct_type: &str,
        old: Option<&Value>,
        new: Option<&Value>,
    ) -> MutationResult<()> {
        let label = keys::edge_label(key);
        let existing = self.txn.out_edges(owner.vertex, &label).into_iter().next();

        match (existing, new.and_then(Value::as_struct)) {
            (Some(edge), Some(value)) => {
                let old = old.and_then(Value::as_struct);
                self.write_struct_fields(owner.entity, edge.in_vertex, struct_type, old, value)
            }
            (Some(edge), None) => self.remove_struct_vertex(edge.in_vertex, struct_type),
            (None, Some(value)) => {
                let vertex = self.create_struct_vertex(owner.entity, struct_type, value)?;
                self.txn.add_edge(label, owner.vertex, vertex, Properties::new())?;
                Ok(())
            }
            (None, None) => Ok(()),
        }
    }

    fn create_struct_vertex(
        &mut self,
        entity: &Guid,
        struct_type: &str,
        value: &Struct,
    ) -> MutationResult<VertexId> {
        let vertex = self.txn.add_vertex();
        self.txn.set_property(vertex, keys::TYPE_NAME, Property::from(struct_type))?;
        self.write_struct_fields(entity, vertex, struct_type, None, value)?;
        Ok(vertex)
    }

    /// Diff a struct vertex in place.
    fn write_struct_fields(
        &mut self,
        entity: &Guid,
        vertex: VertexId,
        struct_type: &str,
        old: Option<&Struct>,
        new: &Struct,
    ) -> MutationResult<()> {
        let registry = self.registry;
        let owner = Owner { vertex, entity };
        for attr in registry.attributes_of(struct_type)? {
            let old_value = old.and_then(|s| s.get_attr(&attr.name));
            let new_value = new.get_attr(&attr.name).filter(|v| !v.is_null());
            if old_value != new_value {
                self.write_attribute(&owner, attr, old_value, new_value, false)?;
            }
        }
        Ok(())
    }

    /// Physically remove a struct vertex and the struct vertices nested in it.
    fn remove_struct_vertex(&mut self, vertex: VertexId, struct_type: &str) -> MutationResult<()> {
        let registry = self.registry;
        for attr in registry.attributes_of(struct_type)? {
            let nested = match &attr.attr_type {
                AttrType::Struct(t) => t,
                AttrType::Array(e) | AttrType::Map(e) => match e.as_ref() {
                    AttrType::Struct(t) => t,
                    _ => continue,
                },
                _ => continue,
            };
            let label = keys::edge_label(&keys::attribute_key(&attr.declaring_type, &attr.name));
            for edge in self.txn.out_edges(vertex, &label) {
                self.remove_struct_vertex(edge.in_vertex, nested)?;
            }
        }
        self.txn.remove_vertex(vertex)?;
        Ok(())
    }

    fn write_struct_array(
        &mut self,
        owner: &Owner<'_>,
        key: &str,
        struct_type: &str,
        old: Option<&Value>,
        new: Option<&Value>,
    ) -> MutationResult<()> {
        let label = keys::edge_label(key);
        let existing = ordered_edges(self.txn.out_edges(owner.vertex, &label));
        let old_items = old.and_then(Value::as_array).unwrap_or(&[]);
        let new_items: Vec<&Struct> = new
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_struct).collect())
            .unwrap_or_default();

        for (position, value) in new_items.iter().enumerate() {
            match existing.get(position) {
                Some(edge) => {
                    let old = old_items.get(position).and_then(Value::as_struct);
                    if old != Some(*value) {
                        self.write_struct_fields(owner.entity, edge.in_vertex, struct_type, old, value)?;
                    }
                    self.set_ordinal(edge, position)?;
                }
                None => {
                    let vertex = self.create_struct_vertex(owner.entity, struct_type, value)?;
                    self.txn
                        .add_edge(label.clone(), owner.vertex, vertex, ordinal(position))?;
                }
            }
        }
        for edge in existing.iter().skip(new_items.len()) {
            self.remove_struct_vertex(edge.in_vertex, struct_type)?;
        }
        Ok(())
    }

    fn write_struct_map(
        &mut self,
        owner: &Owner<'_>,
        key: &str,
        struct_type: &str,
        old: Option<&Value>,
        new: Option<&Value>,
    ) -> MutationResult<()> {
        let label = keys::edge_label(key);
        let existing = self.txn.out_edges(owner.vertex, &label);
        let old_entries = old.and_then(Value::as_map);
        let new_entries: BTreeMap<&String, &Struct> = new
            .and_then(Value::as_map)
            .map(|m| m.iter().filter_map(|(k, v)| v.as_struct().map(|s| (k, s))).collect())
            .unwrap_or_default();

        for edge in &existing {
            let member = edge.get_str(keys::MAP_KEY).unwrap_or_default().to_string();
            match new_entries.get(&member) {
                Some(value) => {
                    let old = old_entries
                        .and_then(|m| m.get(&member))
                        .and_then(Value::as_struct);
                    if old != Some(*value) {
                        self.write_struct_fields(owner.entity, edge.in_vertex, struct_type, old, value)?;
                    }
                }
                None => self.remove_struct_vertex(edge.in_vertex, struct_type)?,
            }
        }
        for (member, value) in &new_entries {
            let present = existing
                .iter()
                .any(|e| e.get_str(keys::MAP_KEY) == Some(member.as_str()));
            if !present {
                let vertex = self.create_struct_vertex(owner.entity, struct_type, value)?;
                self.txn
                    .add_edge(label.clone(), owner.vertex, vertex, map_member(member))?;
            }
        }
        self.write_listing(owner.vertex, key, new_entries.keys().copied())
    }

    // ==================== References ====================

    fn write_reference(
        &mut self,
        owner: &Owner<'_>,
        attr: &AttrDef,
        key: &str,
        new: Option<&Value>,
    ) -> MutationResult<()> {
        let label = keys::edge_label(key);
        let new_target = new.and_then(reference_guid);
        let existing = self.targets_of(owner.vertex, &label);
        if existing.len() == 1 && existing[0].1.as_ref() == new_target.as_ref() {
            return Ok(());
        }

        for (edge, _) in &existing {
            self.txn.remove_edge(edge.id)?;
        }
        if let Some(target) = &new_target {
            self.link_target(owner, attr, &label, target, Properties::new())?;
        }
        for (_, old_target) in existing {
            if let Some(old_target) = old_target.filter(|g| Some(g) != new_target.as_ref()) {
                self.release_target(owner, attr, &old_target)?;
            }
        }
        Ok(())
    }

    fn write_reference_array(
        &mut self,
        owner: &Owner<'_>,
        attr: &AttrDef,
        key: &str,
        new: Option<&Value>,
    ) -> MutationResult<()> {
        let label = keys::edge_label(key);
        let mut existing = self.targets_of(owner.vertex, &label);
        existing.sort_by_key(|(e, _)| (e.get_int(keys::ORDINAL).unwrap_or(i64::MAX), e.id));
        let new_targets: Vec<Guid> = new
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(reference_guid).collect())
            .unwrap_or_default();

        let mut kept = vec![false; existing.len()];
        for (position, target) in new_targets.iter().enumerate() {
            let reusable = (0..existing.len())
                .find(|&i| !kept[i] && existing[i].1.as_ref() == Some(target));
            match reusable {
                Some(i) => {
                    kept[i] = true;
                    self.set_ordinal(&existing[i].0, position)?;
                }
                None => self.link_target(owner, attr, &label, target, ordinal(position))?,
            }
        }

        for (i, (edge, target)) in existing.into_iter().enumerate() {
            if kept[i] {
                continue;
            }
            self.txn.remove_edge(edge.id)?;
            if let Some(target) = target.filter(|g| !new_targets.contains(g)) {
                self.release_target(owner, attr, &target)?;
            }
        }
        Ok(())
    }

    fn write_reference_map(
        &mut self,
        owner: &Owner<'_>,
        attr: &AttrDef,
        key: &str,
        new: Option<&Value>,
    ) -> MutationResult<()> {
        let label = keys::edge_label(key);
        let existing = self.targets_of(owner.vertex, &label);
        let new_entries: BTreeMap<String, Guid> = new
            .and_then(Value::as_map)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| reference_guid(v).map(|g| (k.clone(), g)))
                    .collect()
            })
            .unwrap_or_default();
        let new_targets: HashSet<&Guid> = new_entries.values().collect();

        let mut dropped = Vec::new();
        let mut kept_members = HashSet::new();
        for (edge, target) in existing {
            let member = edge.get_str(keys::MAP_KEY).unwrap_or_default().to_string();
            let unchanged = target.is_some() && new_entries.get(&member) == target.as_ref();
            if unchanged && kept_members.insert(member) {
                continue;
            }
            self.txn.remove_edge(edge.id)?;
            if let Some(target) = target.filter(|g| !new_targets.contains(g)) {
                dropped.push(target);
            }
        }
        for (member, target) in &new_entries {
            if !kept_members.contains(member) {
                self.link_target(owner, attr, &label, target, map_member(member))?;
            }
        }
        for target in dropped {
            self.release_target(owner, attr, &target)?;
        }
        self.write_listing(owner.vertex, key, new_entries.keys())
    }

    /// Edges under `label` with the guid of their target entity.
    fn targets_of(&self, vertex: VertexId, label: &str) -> Vec<(Edge, Option<Guid>)> {
        self.txn
            .out_edges(vertex, label)
            .into_iter()
            .map(|edge| {
                let guid = self
                    .txn
                    .vertex(edge.in_vertex)
                    .and_then(|v| v.get_str(keys::GUID).map(Guid::new));
                (edge, guid)
            })
            .collect()
    }

    fn link_target(
        &mut self,
        owner: &Owner<'_>,
        attr: &AttrDef,
        label: &str,
        target: &Guid,
        properties: Properties,
    ) -> MutationResult<()> {
        let target_vertex = self.entity_vertex(target)?;
        self.txn
            .add_edge(label, owner.vertex, target_vertex, properties)?;
        if attr.is_composite {
            self.adopt(target, target_vertex, owner.entity)?;
        }
        if let Some(reverse) = &attr.reverse_attribute {
            self.set_reverse(owner.entity, reverse, target, target_vertex)?;
        }
        Ok(())
    }

    /// Composite targets become cascade candidates; other targets lose
    /// their back-reference.
    fn release_target(&mut self, owner: &Owner<'_>, attr: &AttrDef, target: &Guid) -> MutationResult<()> {
        if attr.is_composite {
            self.orphans.push(Orphan {
                target: target.clone(),
                owner: owner.entity.clone(),
            });
            Ok(())
        } else if let Some(reverse) = &attr.reverse_attribute {
            self.clear_reverse(owner.entity, reverse, target)
        } else {
            Ok(())
        }
    }

    /// Point a composite target's owner back-link at `owner`.
    fn adopt(&mut self, target: &Guid, target_vertex: VertexId, owner: &Guid) -> MutationResult<()> {
        let current = self
            .txn
            .vertex(target_vertex)
            .and_then(|v| v.get_str(keys::OWNER).map(String::from));
        if current.as_deref() != Some(owner.as_str()) {
            self.txn
                .set_property(target_vertex, keys::OWNER, Property::from(owner.as_str()))?;
            self.mark_changed(target);
        }
        Ok(())
    }

    fn reverse_label(&self, target_vertex: VertexId, reverse: &str) -> Option<String> {
        let vertex = self.txn.vertex(target_vertex)?;
        let def = self.registry.get_attr(vertex.get_str(keys::TYPE_NAME)?, reverse)?;
        Some(keys::edge_label(&keys::attribute_key(&def.declaring_type, &def.name)))
    }

    fn set_reverse(
        &mut self,
        owner: &Guid,
        reverse: &str,
        target: &Guid,
        target_vertex: VertexId,
    ) -> MutationResult<()> {
        let Some(label) = self.reverse_label(target_vertex, reverse) else {
            return Ok(());
        };
        let owner_vertex = self.entity_vertex(owner)?;
        let existing = self.txn.out_edges(target_vertex, &label);
        if existing.len() == 1 && existing[0].in_vertex == owner_vertex {
            return Ok(());
        }
        for edge in existing {
            self.txn.remove_edge(edge.id)?;
        }
        self.txn
            .add_edge(label, target_vertex, owner_vertex, Properties::new())?;
        self.mark_changed(target);
        Ok(())
    }

    fn clear_reverse(&mut self, owner: &Guid, reverse: &str, target: &Guid) -> MutationResult<()> {
        let target_vertex = self.entity_vertex(target)?;
        let Some(label) = self.reverse_label(target_vertex, reverse) else {
            return Ok(());
        };
        let owner_vertex = self.entity_vertex(owner)?;
        let mut cleared = false;
        for edge in self.txn.out_edges(target_vertex, &label) {
            if edge.in_vertex == owner_vertex {
                self.txn.remove_edge(edge.id)?;
                cleared = true;
            }
        }
        if cleared {
            self.mark_changed(target);
        }
        Ok(())
    }

    // ==================== Edge Properties ====================

    fn set_ordinal(&mut self, edge: &Edge, position: usize) -> MutationResult<()> {
        self.txn
            .set_edge_property(edge.id, keys::ORDINAL, Property::Int(position as i64))?;
        Ok(())
    }

    fn write_listing<'k>(
        &mut self,
        vertex: VertexId,
        key: &str,
        members: impl Iterator<Item = &'k String>,
    ) -> MutationResult<()> {
        let property = listing(members);
        if property.as_list().is_some_and(|l| l.is_empty()) {
            self.txn.remove_property(vertex, key)?;
        } else {
            self.txn.set_property(vertex, key, property)?;
        }
        Ok(())
    }
}

fn reference_guid(value: &Value) -> Option<Guid> {
    value.as_ref_id().and_then(|r| r.guid.clone())
}

fn ordered_edges(mut edges: Vec<Edge>) -> Vec<Edge> {
    edges.sort_by_key(|e| (e.get_int(keys::ORDINAL).unwrap_or(i64::MAX), e.id));
    edges
}

fn ordinal(position: usize) -> Properties {
    let mut properties = Properties::new();
    properties.insert(keys::ORDINAL.to_string(), Property::Int(position as i64));
    properties
}

fn map_member(member: &str) -> Properties {
    let mut properties = Properties::new();
    properties.insert(keys::MAP_KEY.to_string(), Property::from(member));
    properties
}

fn listing<'k>(members: impl Iterator<Item = &'k String>) -> Property {
    Property::List(members.map(|m| Property::from(m.as_str())).collect())
}

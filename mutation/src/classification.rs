//! Classification management.
//!
//! A classification is stored as its own vertex, tagged with the guid of
//! the entity it is attached to and linked from the entity vertex by a
//! per-type edge. The entity vertex also lists the names of its
//! classifications. Classification changes stamp the entity's audit
//! attributes but never move its version.

use chrono::Utc;
use quiver_core::{Attributes, Classification, EntityState, Guid, VertexId};
use quiver_graph::{keys, GraphRead, GraphStore, Property, Transaction};
use quiver_mapper::GraphToEntityMapper;
use quiver_registry::{Registry, TypeKind};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::error::{MutationError, MutationResult};
use crate::mutator::DEFAULT_USER;
use crate::validation::{NoReferences, Validator, WriteMode};
use crate::writer::{GraphWriter, Owner};

/// Adds, updates and removes the classifications of stored entities.
pub struct ClassificationManager<'r> {
    registry: &'r Registry,
    graph: &'r GraphStore,
    user: String,
}

impl<'r> ClassificationManager<'r> {
    pub fn new(registry: &'r Registry, graph: &'r GraphStore) -> Self {
        Self {
            registry,
            graph,
            user: DEFAULT_USER.to_string(),
        }
    }

    /// Principal recorded as the modifier of touched entities.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Attach classifications to an entity.
    pub fn add_classifications(
        &self,
        guid: &Guid,
        classifications: &[Classification],
    ) -> MutationResult<()> {
        if classifications.is_empty() {
            debug!(guid = %guid, "no classifications to add");
            return Ok(());
        }
        let mut writer = GraphWriter::new(self.registry, self.graph.begin(), &self.user, Utc::now());
        let vertex = active_entity(&mut writer, guid)?;
        let attached = attached_names(writer.txn(), vertex);

        let validator = Validator::new(self.registry, &NoReferences);
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(classifications.len());
        for classification in classifications {
            let type_name = classification.type_name.as_str();
            self.require_classification_type(type_name)?;
            if attached.iter().any(|n| n == type_name) || !seen.insert(type_name) {
                return Err(MutationError::duplicate_classification(guid, type_name));
            }
            let attributes =
                validator.normalize_attributes(type_name, &classification.attributes, WriteMode::Create)?;
            normalized.push((type_name, attributes));
        }

        for (type_name, attributes) in &normalized {
            attach(&mut writer, guid, vertex, type_name, attributes)?;
        }
        writer.touch_entity(guid, false)?;
        commit(writer)?;

        info!(guid = %guid, count = normalized.len(), "classifications added");
        Ok(())
    }

    /// Replace the attributes of classifications already attached to an
    /// entity. Attributes absent from the input are cleared.
    pub fn update_classifications(
        &self,
        guid: &Guid,
        classifications: &[Classification],
    ) -> MutationResult<()> {
        if classifications.is_empty() {
            debug!(guid = %guid, "no classifications to update");
            return Ok(());
        }
        let mut writer = GraphWriter::new(self.registry, self.graph.begin(), &self.user, Utc::now());
        let vertex = active_entity(&mut writer, guid)?;
        let attached = attached_names(writer.txn(), vertex);

        let validator = Validator::new(self.registry, &NoReferences);
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(classifications.len());
        for classification in classifications {
            let type_name = classification.type_name.as_str();
            self.require_classification_type(type_name)?;
            if !attached.iter().any(|n| n == type_name) {
                return Err(MutationError::classification_not_found(guid, type_name));
            }
            if !seen.insert(type_name) {
                return Err(MutationError::duplicate_classification(guid, type_name));
            }
            let attributes =
                validator.normalize_attributes(type_name, &classification.attributes, WriteMode::Update)?;
            normalized.push((type_name, attributes));
        }

        let mapper = GraphToEntityMapper::new(self.registry);
        for (type_name, attributes) in &normalized {
            let label = keys::classification_label(type_name);
            let Some(edge) = writer.txn().out_edges(vertex, &label).into_iter().next() else {
                return Err(MutationError::classification_not_found(guid, *type_name));
            };
            let current = mapper
                .map_classification(writer.txn(), vertex, guid, type_name)?
                .map(|c| c.attributes)
                .unwrap_or_default();

            let owner = Owner {
                vertex: edge.in_vertex,
                entity: guid,
            };
            for attr in self.registry.attributes_of(type_name)? {
                let old = current.get(&attr.name);
                let new = attributes.get(&attr.name);
                if old != new {
                    writer.write_attribute(&owner, attr, old, new, false)?;
                }
            }
        }
        writer.touch_entity(guid, false)?;
        commit(writer)?;

        info!(guid = %guid, count = normalized.len(), "classifications updated");
        Ok(())
    }

    /// Detach one classification from an entity.
    pub fn delete_classification(&self, guid: &Guid, classification_type: &str) -> MutationResult<()> {
        self.require_classification_type(classification_type)?;
        let mut writer = GraphWriter::new(self.registry, self.graph.begin(), &self.user, Utc::now());
        let vertex = active_entity(&mut writer, guid)?;

        let mut names = attached_names(writer.txn(), vertex);
        let before = names.len();
        names.retain(|n| n != classification_type);
        if names.len() == before {
            return Err(MutationError::classification_not_found(guid, classification_type));
        }

        let label = keys::classification_label(classification_type);
        for edge in writer.txn().out_edges(vertex, &label) {
            writer.txn_write(|txn| txn.remove_vertex(edge.in_vertex))?;
        }
        write_names(&mut writer, vertex, &names)?;
        writer.touch_entity(guid, false)?;
        commit(writer)?;

        info!(guid = %guid, classification = %classification_type, "classification deleted");
        Ok(())
    }

    /// Classifications attached to an entity.
    pub fn get_classifications(&self, guid: &Guid) -> MutationResult<Vec<Classification>> {
        let graph = self.graph.read();
        let mapper = GraphToEntityMapper::new(self.registry);
        let vertex_id = mapper
            .find_entity_vertex(&graph, guid)
            .ok_or_else(|| MutationError::entity_not_found(guid))?;
        let vertex = graph
            .vertex(vertex_id)
            .ok_or_else(|| MutationError::entity_not_found(guid))?;
        Ok(mapper.map_classifications(&graph, &vertex, guid)?)
    }

    /// One classification of an entity.
    pub fn get_classification(
        &self,
        guid: &Guid,
        classification_type: &str,
    ) -> MutationResult<Classification> {
        let graph = self.graph.read();
        let mapper = GraphToEntityMapper::new(self.registry);
        let vertex = mapper
            .find_entity_vertex(&graph, guid)
            .ok_or_else(|| MutationError::entity_not_found(guid))?;
        mapper
            .map_classification(&graph, vertex, guid, classification_type)?
            .ok_or_else(|| MutationError::classification_not_found(guid, classification_type))
    }

    fn require_classification_type(&self, type_name: &str) -> MutationResult<()> {
        if self.registry.is_kind(type_name, TypeKind::Classification) {
            Ok(())
        } else {
            Err(MutationError::type_resolution(type_name))
        }
    }
}

/// Vertex of an ACTIVE entity; classifications of deleted entities are frozen.
fn active_entity(writer: &mut GraphWriter<'_>, guid: &Guid) -> MutationResult<VertexId> {
    let vertex = writer.entity_vertex(guid)?;
    let deleted = writer
        .txn()
        .vertex(vertex)
        .is_some_and(|v| v.get_str(keys::STATE) == Some(EntityState::Deleted.as_str()));
    if deleted {
        return Err(MutationError::stale(guid, "entity is deleted"));
    }
    Ok(vertex)
}

pub(crate) fn attached_names(txn: &Transaction, vertex: VertexId) -> Vec<String> {
    txn.vertex(vertex)
        .and_then(|v| {
            v.get(keys::CLASSIFICATION_NAMES)
                .and_then(Property::as_list)
                .map(|names| names.iter().filter_map(|n| n.as_str().map(String::from)).collect())
        })
        .unwrap_or_default()
}

fn write_names(writer: &mut GraphWriter<'_>, vertex: VertexId, names: &[String]) -> MutationResult<()> {
    writer.txn_write(|txn| {
        if names.is_empty() {
            txn.remove_property(vertex, keys::CLASSIFICATION_NAMES).map(|_| ())
        } else {
            let listing = names.iter().map(|n| Property::from(n.as_str())).collect();
            txn.set_property(vertex, keys::CLASSIFICATION_NAMES, Property::List(listing))
        }
    })
}

/// Create a classification vertex for an entity and link it.
pub(crate) fn attach(
    writer: &mut GraphWriter<'_>,
    guid: &Guid,
    entity_vertex: VertexId,
    type_name: &str,
    attributes: &Attributes,
) -> MutationResult<()> {
    let registry = writer.registry();
    let vertex = writer.txn_write(|txn| {
        let vertex = txn.add_vertex();
        txn.set_property(vertex, keys::TYPE_NAME, Property::from(type_name))?;
        txn.set_property(vertex, keys::ENTITY_GUID, Property::from(guid.as_str()))?;
        txn.add_edge(
            keys::classification_label(type_name),
            entity_vertex,
            vertex,
            Default::default(),
        )?;
        Ok(vertex)
    })?;

    let owner = Owner { vertex, entity: guid };
    for attr in registry.attributes_of(type_name)? {
        if let Some(value) = attributes.get(&attr.name).filter(|v| !v.is_null()) {
            writer.write_attribute(&owner, attr, None, Some(value), false)?;
        }
    }

    let mut names = attached_names(writer.txn(), entity_vertex);
    names.push(type_name.to_string());
    write_names(writer, entity_vertex, &names)
}

fn commit(writer: GraphWriter<'_>) -> MutationResult<()> {
    writer
        .into_transaction()
        .commit()
        .map_err(MutationError::from_commit)?;
    Ok(())
}

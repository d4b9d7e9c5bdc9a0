//! Batch create-or-update and delete of typed entities.
//!
//! A call runs in four phases inside one graph transaction:
//! 1. Resolve every batch entity to an existing entity or a new guid
//! 2. Validate and normalize all attribute values (nothing written yet)
//! 3. Write: entity shells first, then attributes, then composite cascades
//! 4. Stamp versions, build the response and commit
//!
//! Any error drops the transaction, so a failed call leaves no trace.

use chrono::Utc;
use quiver_core::{Attributes, EntityState, Guid, ObjectId, TypedEntity, VertexId};
use quiver_graph::{keys, GraphRead, GraphStore, Transaction};
use quiver_mapper::{GraphToEntityMapper, MappingContext};
use quiver_registry::{AttrDef, Registry, TypeKind};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::cascade::{cascade_delete, owned_orphans};
use crate::classification::attach;
use crate::error::{MutationError, MutationResult};
use crate::response::{EntityOperation, MutationResponse};
use crate::validation::{NoReferences, ReferenceResolver, Validator, WriteMode};
use crate::writer::{GraphWriter, Owner};

/// Principal recorded when the caller names none.
pub const DEFAULT_USER: &str = "quiver";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Create,
    Update,
}

/// A batch entity after resolution.
struct Planned<'b> {
    entity: &'b TypedEntity,
    /// Guid the entity has (or gets) in the store.
    guid: Guid,
    action: Action,
}

/// Normalized input of one batch entity.
struct Prepared {
    attributes: Attributes,
    classifications: Vec<(String, Attributes)>,
}

/// Applies batches of typed entities to the graph.
pub struct EntityMutator<'r> {
    registry: &'r Registry,
    graph: &'r GraphStore,
    user: String,
}

impl<'r> EntityMutator<'r> {
    pub fn new(registry: &'r Registry, graph: &'r GraphStore) -> Self {
        Self {
            registry,
            graph,
            user: DEFAULT_USER.to_string(),
        }
    }

    /// Principal recorded as creator or modifier of touched entities.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Create or update every entity of a batch atomically.
    ///
    /// With `partial` set, updates touch only the supplied attributes and
    /// an assigned guid that does not exist is an error. Otherwise updates
    /// replace the whole attribute set and an unknown assigned guid is
    /// created under that guid.
    pub fn create_or_update(
        &self,
        batch: &[TypedEntity],
        partial: bool,
    ) -> MutationResult<MutationResponse> {
        let txn = self.graph.begin();
        let update_mode = if partial {
            WriteMode::PartialUpdate
        } else {
            WriteMode::Update
        };

        let plan = self.resolve_batch(&txn, batch, partial)?;
        let prepared = self.prepare(&txn, &plan, update_mode)?;

        let mut writer = GraphWriter::new(self.registry, txn, &self.user, Utc::now());
        for planned in plan.iter().filter(|p| p.action == Action::Create) {
            writer.create_entity(&planned.guid, &planned.entity.type_name)?;
        }
        for (planned, input) in plan.iter().zip(&prepared) {
            let mode = match planned.action {
                Action::Create => WriteMode::Create,
                Action::Update => update_mode,
            };
            if self.write_entity(&mut writer, planned, &input.attributes, mode)? {
                writer.mark_changed(&planned.guid);
            }
            if planned.action == Action::Create {
                let vertex = writer.entity_vertex(&planned.guid)?;
                for (type_name, attributes) in &input.classifications {
                    attach(&mut writer, &planned.guid, vertex, type_name, attributes)?;
                }
            }
        }

        let orphans = writer.take_orphans();
        let roots = owned_orphans(&mut writer, orphans)?;
        let deleted = cascade_delete(&mut writer, roots)?;

        let mut stamped = HashSet::new();
        let changed = writer.changed().to_vec();
        for guid in changed.iter().chain(&deleted) {
            if !writer.is_created(guid) && stamped.insert(guid.clone()) {
                writer.touch_entity(guid, true)?;
            }
        }
        for planned in &plan {
            writer.check_unique(&planned.guid, &planned.entity.type_name)?;
        }

        let mut response = MutationResponse::new();
        let update_op = if partial {
            EntityOperation::PartialUpdate
        } else {
            EntityOperation::Update
        };
        for planned in &plan {
            if planned.entity.guid.is_placeholder() {
                response.assign_guid(planned.entity.guid.clone(), planned.guid.clone());
            }
            if planned.action == Action::Create {
                response.add_entity(EntityOperation::Create, writer.header(&planned.guid)?);
            }
        }
        for guid in &changed {
            let op = if plan.iter().any(|p| &p.guid == guid) {
                update_op
            } else {
                EntityOperation::Update
            };
            response.add_entity(op, writer.header(guid)?);
        }
        for guid in &deleted {
            response.add_entity(EntityOperation::Delete, writer.header(guid)?);
        }

        let summary = writer
            .into_transaction()
            .commit()
            .map_err(|e| {
                warn!(error = %e, "entity batch rejected at commit");
                MutationError::from_commit(e)
            })?;
        info!(
            created = response.created_entities().len(),
            updated = response.updated_entities().len() + response.partially_updated_entities().len(),
            deleted = response.deleted_entities().len(),
            vertices_written = summary.vertices_written,
            "entity batch committed"
        );
        Ok(response)
    }

    /// Soft-delete entities and everything they transitively own.
    ///
    /// Entities that are already DELETED are left as they are.
    pub fn delete_by_guids(&self, guids: &[Guid]) -> MutationResult<MutationResponse> {
        let mut writer = GraphWriter::new(self.registry, self.graph.begin(), &self.user, Utc::now());
        for guid in guids {
            writer.entity_vertex(guid)?;
        }

        let deleted = cascade_delete(&mut writer, guids.to_vec())?;
        let mut response = MutationResponse::new();
        for guid in &deleted {
            writer.touch_entity(guid, true)?;
            response.add_entity(EntityOperation::Delete, writer.header(guid)?);
        }

        writer
            .into_transaction()
            .commit()
            .map_err(MutationError::from_commit)?;
        info!(requested = guids.len(), deleted = deleted.len(), "entities deleted");
        Ok(response)
    }

    // ==================== Resolution ====================

    fn resolve_batch<'b>(
        &self,
        txn: &Transaction,
        batch: &'b [TypedEntity],
        partial: bool,
    ) -> MutationResult<Vec<Planned<'b>>> {
        let mapper = GraphToEntityMapper::new(self.registry);
        let lookup = Validator::new(self.registry, &NoReferences);
        let mut input_guids = HashSet::new();
        let mut resolved_guids = HashSet::new();
        let mut plan = Vec::with_capacity(batch.len());

        for entity in batch {
            if !self.registry.is_kind(&entity.type_name, TypeKind::Entity) {
                return Err(MutationError::type_resolution(&entity.type_name));
            }
            if !entity.guid.as_str().is_empty() && !input_guids.insert(entity.guid.clone()) {
                return Err(MutationError::DuplicateGuid {
                    guid: entity.guid.clone(),
                });
            }

            let existing = if entity.guid.is_placeholder() {
                let unique = lookup.unique_values(&entity.type_name, &entity.attributes);
                mapper.find_by_unique_attributes(txn, &entity.type_name, &unique)
            } else {
                mapper
                    .find_entity_vertex(txn, &entity.guid)
                    .map(|vertex| (vertex, entity.guid.clone()))
            };

            let planned = match existing {
                Some((vertex, guid)) => {
                    check_updatable(txn, vertex, &guid, entity)?;
                    Planned {
                        entity,
                        guid,
                        action: Action::Update,
                    }
                }
                None if partial && !entity.guid.is_placeholder() => {
                    return Err(MutationError::entity_not_found(&entity.guid));
                }
                None => Planned {
                    entity,
                    guid: if entity.guid.is_placeholder() {
                        Guid::generate()
                    } else {
                        entity.guid.clone()
                    },
                    action: Action::Create,
                },
            };

            if !resolved_guids.insert(planned.guid.clone()) {
                return Err(MutationError::DuplicateGuid { guid: planned.guid });
            }
            debug!(
                input = %entity.guid,
                guid = %planned.guid,
                type_name = %entity.type_name,
                action = ?planned.action,
                "resolved batch entity"
            );
            plan.push(planned);
        }
        Ok(plan)
    }

    fn prepare(
        &self,
        txn: &Transaction,
        plan: &[Planned<'_>],
        update_mode: WriteMode,
    ) -> MutationResult<Vec<Prepared>> {
        let resolver = BatchResolver {
            registry: self.registry,
            mapper: GraphToEntityMapper::new(self.registry),
            graph: txn,
            plan,
        };
        let validator = Validator::new(self.registry, &resolver);

        plan.iter()
            .map(|planned| {
                let entity = planned.entity;
                let mode = match planned.action {
                    Action::Create => WriteMode::Create,
                    Action::Update => update_mode,
                };
                let attributes =
                    validator.normalize_attributes(&entity.type_name, &entity.attributes, mode)?;

                // Classifications travel with an entity only when it is created.
                let mut classifications = Vec::new();
                if planned.action == Action::Create {
                    for classification in &entity.classifications {
                        let type_name = &classification.type_name;
                        if !self.registry.is_kind(type_name, TypeKind::Classification) {
                            return Err(MutationError::type_resolution(type_name));
                        }
                        if classifications.iter().any(|(t, _)| t == type_name) {
                            return Err(MutationError::duplicate_classification(&planned.guid, type_name));
                        }
                        let attributes = validator.normalize_attributes(
                            type_name,
                            &classification.attributes,
                            WriteMode::Create,
                        )?;
                        classifications.push((type_name.clone(), attributes));
                    }
                }
                Ok(Prepared {
                    attributes,
                    classifications,
                })
            })
            .collect()
    }

    // ==================== Writes ====================

    /// Diff the supplied attributes against the stored entity and write
    /// the differences. Returns true if any attribute changed.
    fn write_entity(
        &self,
        writer: &mut GraphWriter<'_>,
        planned: &Planned<'_>,
        attributes: &Attributes,
        mode: WriteMode,
    ) -> MutationResult<bool> {
        let vertex = writer.entity_vertex(&planned.guid)?;
        let current = GraphToEntityMapper::new(self.registry).map_to_entity(
            writer.txn(),
            vertex,
            &planned.guid,
            &mut MappingContext::shallow(),
        )?;

        let owner = Owner {
            vertex,
            entity: &planned.guid,
        };
        let mut changed = false;
        for attr in self.registry.attributes_of(&planned.entity.type_name)? {
            let supplied = attributes.get(&attr.name);
            // Only a full update clears what the input leaves out, and never
            // a back-reference, which its owner's side maintains.
            if supplied.is_none()
                && (mode != WriteMode::Update
                    || is_back_reference(self.registry, &planned.entity.type_name, attr))
            {
                continue;
            }
            let new = supplied.filter(|v| !v.is_null());
            let old = current.attributes.get(&attr.name);
            if old == new {
                continue;
            }
            writer.write_attribute(&owner, attr, old, new, true)?;
            changed = true;
        }
        Ok(changed)
    }
}

/// Register the unique-value keys of every unique entity attribute with
/// the graph, once per declaring type.
pub fn declare_unique_keys(registry: &Registry, graph: &GraphStore) {
    for type_def in registry.all_types().filter(|t| t.kind == TypeKind::Entity) {
        for attr in type_def.attributes.iter().filter(|a| a.is_unique) {
            let key = keys::unique_key(&keys::attribute_key(&type_def.name, &attr.name));
            debug!(key = %key, "declaring unique key");
            graph.declare_unique(key);
        }
    }
}

/// True if another type names `attr` of `type_name` as its reverse attribute.
fn is_back_reference(registry: &Registry, type_name: &str, attr: &AttrDef) -> bool {
    registry
        .all_types()
        .flat_map(|t| t.attributes.iter())
        .any(|forward| {
            forward.reverse_attribute.as_deref() == Some(attr.name.as_str())
                && forward
                    .attr_type
                    .referenced_entity_type()
                    .is_some_and(|target| registry.is_subtype(type_name, target))
        })
}

/// An existing entity may be updated only while ACTIVE, by its own type,
/// and at the version the caller saw (when the caller names one).
fn check_updatable(
    txn: &Transaction,
    vertex: VertexId,
    guid: &Guid,
    entity: &TypedEntity,
) -> MutationResult<()> {
    let stored = txn
        .vertex(vertex)
        .ok_or_else(|| MutationError::entity_not_found(guid))?;
    let stored_type = stored.get_str(keys::TYPE_NAME).unwrap_or_default();
    if stored_type != entity.type_name {
        return Err(MutationError::type_mismatch(
            &entity.type_name,
            "typeName",
            stored_type,
            &entity.type_name,
        ));
    }
    if stored.get_str(keys::STATE) == Some(EntityState::Deleted.as_str()) {
        return Err(MutationError::stale(guid, "entity is deleted"));
    }
    let version = stored.get_int(keys::VERSION).unwrap_or(0).max(0) as u64;
    if entity.version > 0 && entity.version != version {
        warn!(guid = %guid, expected = entity.version, found = version, "version mismatch");
        return Err(MutationError::stale(
            guid,
            format!("expected version {}, found {}", entity.version, version),
        ));
    }
    Ok(())
}

/// Resolves references against the batch first and the store second.
struct BatchResolver<'a, 'b> {
    registry: &'a Registry,
    mapper: GraphToEntityMapper<'a>,
    graph: &'a Transaction,
    plan: &'a [Planned<'b>],
}

impl BatchResolver<'_, '_> {
    fn stored(&self, guid: Guid, vertex: VertexId) -> MutationResult<(Guid, String)> {
        let stored = self
            .graph
            .vertex(vertex)
            .ok_or_else(|| MutationError::entity_not_found(&guid))?;
        if stored.get_str(keys::STATE) == Some(EntityState::Deleted.as_str()) {
            return Err(MutationError::stale(&guid, "referenced entity is deleted"));
        }
        // The target must still be ACTIVE when the batch commits.
        self.graph.watch(vertex);
        let type_name = stored.get_str(keys::TYPE_NAME).unwrap_or_default().to_string();
        Ok((guid, type_name))
    }

    /// True if a batch entity carries every unique value the reference names.
    fn matches_unique(&self, entity: &TypedEntity, reference: &ObjectId) -> bool {
        let mut matched = false;
        for attr in self.registry.unique_attributes_of(&reference.type_name) {
            let Some(wanted) = reference.unique_attributes.get(&attr.name) else {
                continue;
            };
            if wanted.is_null() || entity.get_attr(&attr.name) != Some(wanted) {
                return false;
            }
            matched = true;
        }
        matched
    }
}

impl ReferenceResolver for BatchResolver<'_, '_> {
    fn resolve(&self, reference: &ObjectId) -> MutationResult<(Guid, String)> {
        if let Some(guid) = reference.guid.as_ref().filter(|g| !g.as_str().is_empty()) {
            let in_batch = self
                .plan
                .iter()
                .find(|p| &p.entity.guid == guid || &p.guid == guid);
            if let Some(planned) = in_batch {
                return Ok((planned.guid.clone(), planned.entity.type_name.clone()));
            }
            let vertex = self
                .mapper
                .find_entity_vertex(self.graph, guid)
                .ok_or_else(|| MutationError::entity_not_found(guid))?;
            return self.stored(guid.clone(), vertex);
        }

        let in_batch = self.plan.iter().find(|p| {
            self.registry.is_subtype(&p.entity.type_name, &reference.type_name)
                && self.matches_unique(p.entity, reference)
        });
        if let Some(planned) = in_batch {
            return Ok((planned.guid.clone(), planned.entity.type_name.clone()));
        }
        let unique = Validator::new(self.registry, self)
            .unique_values(&reference.type_name, &reference.unique_attributes);
        match self
            .mapper
            .find_by_unique_attributes(self.graph, &reference.type_name, &unique)
        {
            Some((vertex, guid)) => self.stored(guid, vertex),
            None => Err(MutationError::UnresolvedReference {
                reference: reference.to_string(),
            }),
        }
    }
}

//! Entity store.

use quiver_core::{Attributes, Classification, EntityWithExtInfo, Guid, TypedEntity};
use quiver_graph::GraphStore;
use quiver_mapper::GraphToEntityMapper;
use quiver_mutation::{declare_unique_keys, ClassificationManager, EntityMutator, MutationResponse};
use quiver_registry::Registry;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

/// Typed entities persisted in a property graph.
///
/// Cloning is cheap and clones share the same graph.
#[derive(Debug, Clone)]
pub struct EntityStore {
    registry: Arc<Registry>,
    graph: GraphStore,
    config: StoreConfig,
}

impl EntityStore {
    /// Create a store over an empty graph.
    pub fn new(registry: Arc<Registry>, config: StoreConfig) -> Self {
        Self::with_graph(registry, GraphStore::new(), config)
    }

    /// Create a store over an existing graph.
    pub fn with_graph(registry: Arc<Registry>, graph: GraphStore, config: StoreConfig) -> Self {
        declare_unique_keys(&registry, &graph);
        Self {
            registry,
            graph,
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ==================== Mutations ====================

    /// Create or update a batch of entities as the configured user.
    pub fn create_or_update(
        &self,
        batch: &[TypedEntity],
        partial: bool,
    ) -> StoreResult<MutationResponse> {
        self.create_or_update_as(&self.config.user, batch, partial)
    }

    /// Create or update a batch of entities on behalf of `user`.
    pub fn create_or_update_as(
        &self,
        user: &str,
        batch: &[TypedEntity],
        partial: bool,
    ) -> StoreResult<MutationResponse> {
        self.check_batch_size(batch.len())?;
        debug!(entities = batch.len(), partial, user, "create_or_update");
        let response = EntityMutator::new(&self.registry, &self.graph)
            .with_user(user)
            .create_or_update(batch, partial)?;
        Ok(response)
    }

    /// Soft-delete entities and everything they own.
    pub fn delete_by_guids(&self, guids: &[Guid]) -> StoreResult<MutationResponse> {
        self.check_batch_size(guids.len())?;
        let response = EntityMutator::new(&self.registry, &self.graph)
            .with_user(&self.config.user)
            .delete_by_guids(guids)?;
        Ok(response)
    }

    fn check_batch_size(&self, size: usize) -> StoreResult<()> {
        let max = self.config.max_batch_size;
        if size > max {
            warn!(size, max, "batch rejected");
            return Err(StoreError::BatchTooLarge { size, max });
        }
        Ok(())
    }

    // ==================== Reads ====================

    /// Read an entity with its composite sub-entities.
    pub fn get_by_id(&self, guid: &Guid) -> StoreResult<EntityWithExtInfo> {
        let graph = self.graph.read();
        let entity = GraphToEntityMapper::new(&self.registry).get_entity(&graph, guid)?;
        Ok(entity)
    }

    /// Read several entities; fails on the first guid that does not exist.
    pub fn get_by_ids(&self, guids: &[Guid]) -> StoreResult<Vec<EntityWithExtInfo>> {
        let graph = self.graph.read();
        let mapper = GraphToEntityMapper::new(&self.registry);
        guids
            .iter()
            .map(|guid| mapper.get_entity(&graph, guid).map_err(StoreError::from))
            .collect()
    }

    /// Read the ACTIVE entity of `type_name` (or a subtype) that carries
    /// any of the given unique attribute values.
    pub fn get_by_unique_attributes(
        &self,
        type_name: &str,
        unique_attributes: &Attributes,
    ) -> StoreResult<EntityWithExtInfo> {
        let graph = self.graph.read();
        let mapper = GraphToEntityMapper::new(&self.registry);
        let (_, guid) = mapper
            .find_by_unique_attributes(&graph, type_name, unique_attributes)
            .ok_or_else(|| StoreError::NotFoundByUniqueAttributes {
                type_name: type_name.to_string(),
                attributes: format!("{:?}", unique_attributes),
            })?;
        Ok(mapper.get_entity(&graph, &guid)?)
    }

    // ==================== Classifications ====================

    fn classifications(&self) -> ClassificationManager<'_> {
        ClassificationManager::new(&self.registry, &self.graph).with_user(&self.config.user)
    }

    pub fn add_classifications(&self, guid: &Guid, classifications: &[Classification]) -> StoreResult<()> {
        Ok(self.classifications().add_classifications(guid, classifications)?)
    }

    pub fn update_classifications(&self, guid: &Guid, classifications: &[Classification]) -> StoreResult<()> {
        Ok(self.classifications().update_classifications(guid, classifications)?)
    }

    pub fn delete_classification(&self, guid: &Guid, classification_type: &str) -> StoreResult<()> {
        Ok(self.classifications().delete_classification(guid, classification_type)?)
    }

    pub fn get_classifications(&self, guid: &Guid) -> StoreResult<Vec<Classification>> {
        Ok(self.classifications().get_classifications(guid)?)
    }

    pub fn get_classification(&self, guid: &Guid, classification_type: &str) -> StoreResult<Classification> {
        Ok(self.classifications().get_classification(guid, classification_type)?)
    }
}

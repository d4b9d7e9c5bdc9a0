//! Request-scoped mapping state.

use quiver_core::{Guid, TypedEntity};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Cache of entities materialized during one read request.
///
/// A context must never outlive the request that created it; it is passed
/// explicitly by `&mut` and dropped with the request.
#[derive(Debug, Default)]
pub struct MappingContext {
    cache: HashMap<Guid, TypedEntity>,
    in_progress: HashSet<Guid>,
    materialize_composites: bool,
}

impl MappingContext {
    /// A context that materializes composite references.
    pub fn new() -> Self {
        Self {
            materialize_composites: true,
            ..Self::default()
        }
    }

    /// A context that returns every reference as a lightweight object id.
    pub fn shallow() -> Self {
        Self::default()
    }

    pub fn materializes_composites(&self) -> bool {
        self.materialize_composites
    }

    pub fn get(&self, guid: &Guid) -> Option<&TypedEntity> {
        self.cache.get(guid)
    }

    pub fn contains(&self, guid: &Guid) -> bool {
        self.cache.contains_key(guid)
    }

    pub fn is_in_progress(&self, guid: &Guid) -> bool {
        self.in_progress.contains(guid)
    }

    pub(crate) fn begin(&mut self, guid: &Guid) {
        self.in_progress.insert(guid.clone());
    }

    pub(crate) fn finish(&mut self, entity: TypedEntity) {
        self.in_progress.remove(&entity.guid);
        self.cache.insert(entity.guid.clone(), entity);
    }

    pub(crate) fn abandon(&mut self, guid: &Guid) {
        self.in_progress.remove(guid);
    }

    /// Number of materialized entities.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Consume the context, returning every materialized entity except `root`.
    pub fn into_referred(mut self, root: &Guid) -> BTreeMap<Guid, TypedEntity> {
        self.cache.remove(root);
        self.cache.into_iter().collect()
    }
}

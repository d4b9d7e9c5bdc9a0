//! Composite cascade - soft-deletes entities and everything they own.

use quiver_core::{EntityState, Guid};
use quiver_graph::{keys, GraphRead, Property};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

use crate::error::MutationResult;
use crate::writer::{GraphWriter, Orphan};

/// Orphans whose owner back-link still names the owner that dropped them.
///
/// A target adopted by another owner in the same batch is left alone.
pub(crate) fn owned_orphans(writer: &mut GraphWriter<'_>, orphans: Vec<Orphan>) -> MutationResult<Vec<Guid>> {
    let mut roots = Vec::new();
    for orphan in orphans {
        if roots.contains(&orphan.target) {
            continue;
        }
        let vertex = writer.entity_vertex(&orphan.target)?;
        let still_owned = writer
            .txn()
            .vertex(vertex)
            .is_some_and(|v| v.get_str(keys::OWNER) == Some(orphan.owner.as_str()));
        if still_owned {
            roots.push(orphan.target);
        }
    }
    Ok(roots)
}

/// Soft-delete `roots` and, transitively, every ACTIVE entity whose owner
/// back-link names a deleted entity.
///
/// Returns the guids that changed state, in deletion order. Entities that
/// are already DELETED are skipped, so owner cycles terminate.
pub(crate) fn cascade_delete(writer: &mut GraphWriter<'_>, roots: Vec<Guid>) -> MutationResult<Vec<Guid>> {
    let root_count = roots.len();
    let mut deleted = Vec::new();
    let mut visited = HashSet::new();
    let mut to_delete: VecDeque<Guid> = roots.into();

    while let Some(guid) = to_delete.pop_front() {
        if !visited.insert(guid.clone()) {
            continue;
        }

        let vertex = writer.entity_vertex(&guid)?;
        let already_deleted = writer
            .txn()
            .vertex(vertex)
            .is_some_and(|v| v.get_str(keys::STATE) == Some(EntityState::Deleted.as_str()));
        if already_deleted {
            continue;
        }

        writer.soft_delete(vertex)?;
        deleted.push(guid.clone());

        let owned = writer
            .txn()
            .find_vertices(keys::OWNER, &Property::from(guid.as_str()));
        for child in owned {
            let child_guid = writer
                .txn()
                .vertex(child)
                .and_then(|v| v.get_str(keys::GUID).map(Guid::new));
            if let Some(child_guid) = child_guid.filter(|g| !visited.contains(g)) {
                to_delete.push_back(child_guid);
            }
        }
    }

    debug!(roots = root_count, deleted = deleted.len(), "cascade delete");
    Ok(deleted)
}

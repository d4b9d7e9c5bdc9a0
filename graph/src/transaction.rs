//! Optimistic transactions over the committed graph.

use crate::index::IndexValue;
use crate::{Edge, Graph, GraphError, GraphRead, GraphResult, Properties, Property, Vertex};
use parking_lot::RwLock;
use quiver_core::{EdgeId, VertexId};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Counts of what a commit wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub vertices_written: usize,
    pub vertices_removed: usize,
    pub edges_written: usize,
    pub edges_removed: usize,
}

/// A write transaction.
///
/// Writes are buffered in a private overlay; reads see the overlay first and
/// the committed graph second. At commit, every committed vertex the
/// transaction wrote (directly or by changing its outgoing edges) or
/// watched (including the target of every added edge) must still carry the
/// storage revision the transaction first observed. Dropping the
/// transaction without committing discards all buffered writes.
pub struct Transaction {
    graph: Arc<RwLock<Graph>>,
    ids: Arc<AtomicU64>,
    /// Buffered vertex states; `None` marks a removal.
    vertices: HashMap<VertexId, Option<Vertex>>,
    /// Buffered edge states; `None` marks a removal.
    edges: HashMap<EdgeId, Option<Edge>>,
    /// Vertices created by this transaction.
    created: HashSet<VertexId>,
    /// Committed vertices written by this transaction.
    touched: HashSet<VertexId>,
    /// Committed vertices read and relied upon but not written.
    watched: RefCell<HashSet<VertexId>>,
    /// Storage revision of each committed vertex when first read.
    seen: RefCell<HashMap<VertexId, u64>>,
}

impl Transaction {
    pub(crate) fn new(graph: Arc<RwLock<Graph>>, ids: Arc<AtomicU64>) -> Self {
        Self {
            graph,
            ids,
            vertices: HashMap::new(),
            edges: HashMap::new(),
            created: HashSet::new(),
            touched: HashSet::new(),
            watched: RefCell::new(HashSet::new()),
            seen: RefCell::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> u64 {
        self.ids.fetch_add(1, Ordering::Relaxed)
    }

    /// True if the transaction has buffered any write.
    pub fn is_dirty(&self) -> bool {
        !self.vertices.is_empty() || !self.edges.is_empty() || !self.touched.is_empty()
    }

    // ==================== Reads ====================

    fn committed_vertex(&self, id: VertexId) -> Option<Vertex> {
        let vertex = self.graph.read().get_vertex(id).cloned()?;
        self.seen.borrow_mut().entry(id).or_insert(vertex.revision);
        Some(vertex)
    }

    fn exists(&self, id: VertexId) -> bool {
        match self.vertices.get(&id) {
            Some(state) => state.is_some(),
            None => self.committed_vertex(id).is_some(),
        }
    }

    /// Every edge leaving or entering a vertex.
    fn edges_involving(&self, id: VertexId) -> Vec<Edge> {
        let committed: Vec<EdgeId> = {
            let graph = self.graph.read();
            graph
                .all_edge_ids_out(id)
                .chain(graph.edge_ids_in(id))
                .collect()
        };
        let mut result: Vec<Edge> = committed
            .into_iter()
            .filter_map(|edge_id| self.edge(edge_id))
            .collect();
        for edge in self.edges.values().flatten() {
            let involved = edge.out_vertex == id || edge.in_vertex == id;
            if involved && !result.iter().any(|e| e.id == edge.id) {
                result.push(edge.clone());
            }
        }
        result
    }

    /// Add a committed vertex to the read set. Commit fails with
    /// [`GraphError::Conflict`] if another transaction has written it since
    /// this transaction first read it.
    pub fn watch(&self, id: VertexId) {
        if self.created.contains(&id) || matches!(self.vertices.get(&id), Some(None)) {
            return;
        }
        if self.committed_vertex(id).is_some() {
            self.watched.borrow_mut().insert(id);
        }
    }

    // ==================== Vertex Writes ====================

    /// Create an empty vertex.
    pub fn add_vertex(&mut self) -> VertexId {
        let id = VertexId::new(self.next_id());
        self.vertices.insert(id, Some(Vertex::new(id)));
        self.created.insert(id);
        id
    }

    fn touch(&mut self, id: VertexId) -> GraphResult<()> {
        if self.created.contains(&id) || self.touched.contains(&id) {
            return Ok(());
        }
        if !self.exists(id) {
            return Err(GraphError::VertexNotFound(id));
        }
        if !self.seen.borrow().contains_key(&id) {
            self.committed_vertex(id);
        }
        self.touched.insert(id);
        Ok(())
    }

    fn vertex_mut(&mut self, id: VertexId) -> GraphResult<&mut Vertex> {
        if !self.vertices.contains_key(&id) {
            let vertex = self
                .committed_vertex(id)
                .ok_or(GraphError::VertexNotFound(id))?;
            self.vertices.insert(id, Some(vertex));
        }
        self.touch(id)?;
        self.vertices
            .get_mut(&id)
            .and_then(Option::as_mut)
            .ok_or(GraphError::VertexNotFound(id))
    }

    /// Set a vertex property.
    pub fn set_property(
        &mut self,
        id: VertexId,
        key: impl Into<String>,
        value: Property,
    ) -> GraphResult<()> {
        let key = key.into();
        let vertex = self.vertex_mut(id)?;
        if vertex.properties.get(&key) != Some(&value) {
            vertex.properties.insert(key, value);
        }
        Ok(())
    }

    /// Remove a vertex property, returning its previous value.
    pub fn remove_property(&mut self, id: VertexId, key: &str) -> GraphResult<Option<Property>> {
        let vertex = self.vertex_mut(id)?;
        Ok(vertex.properties.remove(key))
    }

    /// Remove a vertex and every edge involving it.
    pub fn remove_vertex(&mut self, id: VertexId) -> GraphResult<()> {
        if !self.exists(id) {
            return Err(GraphError::VertexNotFound(id));
        }
        for edge in self.edges_involving(id) {
            self.remove_edge(edge.id)?;
        }
        if self.created.remove(&id) {
            self.vertices.remove(&id);
        } else {
            self.touch(id)?;
            self.vertices.insert(id, None);
        }
        Ok(())
    }

    // ==================== Edge Writes ====================

    /// Add an edge from `out_vertex` to `in_vertex`.
    pub fn add_edge(
        &mut self,
        label: impl Into<String>,
        out_vertex: VertexId,
        in_vertex: VertexId,
        properties: Properties,
    ) -> GraphResult<EdgeId> {
        if !self.exists(in_vertex) {
            return Err(GraphError::VertexNotFound(in_vertex));
        }
        self.touch(out_vertex)?;
        self.watch(in_vertex);
        let id = EdgeId::new(self.next_id());
        self.edges.insert(
            id,
            Some(Edge {
                id,
                label: label.into(),
                out_vertex,
                in_vertex,
                properties,
            }),
        );
        Ok(id)
    }

    /// Set an edge property.
    pub fn set_edge_property(
        &mut self,
        id: EdgeId,
        key: impl Into<String>,
        value: Property,
    ) -> GraphResult<()> {
        let mut edge = self.edge(id).ok_or(GraphError::EdgeNotFound(id))?;
        let key = key.into();
        if edge.properties.get(&key) == Some(&value) {
            return Ok(());
        }
        self.touch(edge.out_vertex)?;
        edge.properties.insert(key, value);
        self.edges.insert(id, Some(edge));
        Ok(())
    }

    /// Remove an edge.
    pub fn remove_edge(&mut self, id: EdgeId) -> GraphResult<()> {
        let edge = self.edge(id).ok_or(GraphError::EdgeNotFound(id))?;
        if self.created.contains(&edge.out_vertex) || self.exists(edge.out_vertex) {
            self.touch(edge.out_vertex)?;
        }
        let is_committed = self.graph.read().get_edge(id).is_some();
        if is_committed {
            self.edges.insert(id, None);
        } else {
            self.edges.remove(&id);
        }
        Ok(())
    }

    // ==================== Commit / Rollback ====================

    /// Validate and atomically apply all buffered writes.
    pub fn commit(self) -> GraphResult<CommitSummary> {
        let mut graph = self.graph.write();

        self.check_revisions(&graph)?;
        self.check_edge_endpoints(&graph)?;
        self.check_unique_keys(&graph)?;

        let mut summary = CommitSummary::default();
        for (id, state) in &self.edges {
            if state.is_none() {
                graph.remove_edge(*id);
                summary.edges_removed += 1;
            }
        }
        for (id, state) in &self.vertices {
            match state {
                None => {
                    graph.remove_vertex(*id);
                    summary.vertices_removed += 1;
                }
                Some(vertex) => {
                    let mut vertex = vertex.clone();
                    vertex.revision = graph.get_vertex(*id).map(|v| v.revision).unwrap_or(0) + 1;
                    graph.put_vertex(vertex);
                    summary.vertices_written += 1;
                }
            }
        }
        for edge in self.edges.values().flatten() {
            graph.put_edge(edge.clone());
            summary.edges_written += 1;
        }
        for id in &self.touched {
            if !self.vertices.contains_key(id) {
                graph.bump_revision(*id);
            }
        }

        debug!(
            vertices_written = summary.vertices_written,
            vertices_removed = summary.vertices_removed,
            edges_written = summary.edges_written,
            edges_removed = summary.edges_removed,
            "graph transaction committed"
        );
        Ok(summary)
    }

    /// Discard all buffered writes.
    pub fn rollback(self) {
        debug!(
            vertices = self.vertices.len(),
            edges = self.edges.len(),
            "graph transaction rolled back"
        );
    }

    fn check_revisions(&self, graph: &Graph) -> GraphResult<()> {
        let seen = self.seen.borrow();
        let watched = self.watched.borrow();
        for id in self.touched.iter().chain(watched.iter()) {
            let current = graph.get_vertex(*id).map(|v| v.revision);
            if current.is_none() || current != seen.get(id).copied() {
                warn!(vertex = %id, "stale vertex revision at commit");
                return Err(GraphError::Conflict { vertex: *id });
            }
        }
        Ok(())
    }

    fn check_edge_endpoints(&self, graph: &Graph) -> GraphResult<()> {
        let present = |id: &VertexId| match self.vertices.get(id) {
            Some(state) => state.is_some(),
            None => graph.get_vertex(*id).is_some(),
        };
        for edge in self.edges.values().flatten() {
            for endpoint in [edge.out_vertex, edge.in_vertex] {
                if !present(&endpoint) {
                    warn!(vertex = %endpoint, edge = %edge.id, "edge endpoint vanished before commit");
                    return Err(GraphError::Conflict { vertex: endpoint });
                }
            }
        }
        Ok(())
    }

    fn check_unique_keys(&self, graph: &Graph) -> GraphResult<()> {
        let mut claimed: HashMap<(&str, IndexValue), VertexId> = HashMap::new();
        for vertex in self.vertices.values().flatten() {
            for (key, property) in &vertex.properties {
                if !graph.is_unique_key(key) {
                    continue;
                }
                let Some(value) = IndexValue::from_property(property) else {
                    continue;
                };
                if claimed.insert((key.as_str(), value), vertex.id).is_some() {
                    return Err(GraphError::unique_violation(key.clone(), property));
                }
                let held_elsewhere = graph
                    .vertex_ids_by_property(key, property)
                    .filter(|other| *other != vertex.id)
                    // Holders rewritten by this transaction were checked above.
                    .any(|other| !self.vertices.contains_key(&other));
                if held_elsewhere {
                    return Err(GraphError::unique_violation(key.clone(), property));
                }
            }
        }
        Ok(())
    }
}

impl GraphRead for Transaction {
    fn vertex(&self, id: VertexId) -> Option<Vertex> {
        match self.vertices.get(&id) {
            Some(state) => state.clone(),
            None => self.committed_vertex(id),
        }
    }

    fn edge(&self, id: EdgeId) -> Option<Edge> {
        match self.edges.get(&id) {
            Some(state) => state.clone(),
            None => self.graph.read().get_edge(id).cloned(),
        }
    }

    fn out_edges(&self, vertex: VertexId, label: &str) -> Vec<Edge> {
        let committed: Vec<EdgeId> = self.graph.read().edge_ids_out(vertex, label).collect();
        let mut result: Vec<Edge> = committed
            .into_iter()
            .filter_map(|id| self.edge(id))
            .collect();
        for edge in self.edges.values().flatten() {
            if edge.out_vertex == vertex
                && edge.label == label
                && !result.iter().any(|e| e.id == edge.id)
            {
                result.push(edge.clone());
            }
        }
        result.sort_by_key(|e| e.id);
        result
    }

    fn find_vertices(&self, key: &str, value: &Property) -> Vec<VertexId> {
        let committed: Vec<VertexId> = self
            .graph
            .read()
            .vertex_ids_by_property(key, value)
            .collect();
        let mut result: Vec<VertexId> = committed
            .into_iter()
            .filter(|id| !self.vertices.contains_key(id))
            .collect();
        for vertex in self.vertices.values().flatten() {
            if vertex.properties.get(key) == Some(value) {
                result.push(vertex.id);
            }
        }
        result.sort();
        result
    }
}

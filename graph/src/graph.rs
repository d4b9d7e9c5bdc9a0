//! Committed graph storage and the shared store handle.

use crate::index::{AdjacencyIndex, PropertyIndex};
use crate::{Edge, Property, Transaction, Vertex};
use parking_lot::{RwLock, RwLockReadGuard};
use quiver_core::{EdgeId, VertexId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

/// Read access to a property graph, committed or transactional.
///
/// Results are owned so that transactional overlays can serve them.
pub trait GraphRead {
    /// Get a vertex by id.
    fn vertex(&self, id: VertexId) -> Option<Vertex>;

    /// Get an edge by id.
    fn edge(&self, id: EdgeId) -> Option<Edge>;

    /// Edges leaving `vertex` with the given label, in id order.
    fn out_edges(&self, vertex: VertexId, label: &str) -> Vec<Edge>;

    /// Vertices whose property `key` equals `value`, in id order.
    fn find_vertices(&self, key: &str, value: &Property) -> Vec<VertexId>;

    /// First vertex whose property `key` equals `value`.
    fn find_vertex(&self, key: &str, value: &Property) -> Option<VertexId> {
        self.find_vertices(key, value).into_iter().next()
    }
}

/// The committed, in-memory graph.
#[derive(Debug, Default)]
pub struct Graph {
    /// Vertex storage
    vertices: HashMap<VertexId, Vertex>,
    /// Edge storage
    edges: HashMap<EdgeId, Edge>,
    /// Property index
    property_index: PropertyIndex,
    /// Adjacency index
    adjacency: AdjacencyIndex,
    /// Property keys whose values must be unique across vertices
    unique_keys: HashSet<String>,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Vertex Operations ====================

    /// Borrow a vertex by id.
    pub fn get_vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    /// Insert or replace a vertex, keeping indexes current.
    pub(crate) fn put_vertex(&mut self, vertex: Vertex) {
        if let Some(old) = self.vertices.remove(&vertex.id) {
            for (key, property) in &old.properties {
                self.property_index.remove(key, property, old.id);
            }
        }
        for (key, property) in &vertex.properties {
            self.property_index.insert(key, property, vertex.id);
        }
        self.vertices.insert(vertex.id, vertex);
    }

    /// Remove a vertex and every edge involving it.
    pub(crate) fn remove_vertex(&mut self, id: VertexId) {
        let involved: Vec<EdgeId> = self
            .adjacency
            .all_edges_out(id)
            .chain(self.adjacency.edges_in(id))
            .collect();
        for edge_id in involved {
            self.remove_edge(edge_id);
        }
        if let Some(old) = self.vertices.remove(&id) {
            for (key, property) in &old.properties {
                self.property_index.remove(key, property, id);
            }
        }
    }

    /// Bump the storage revision of a vertex whose edges changed.
    pub(crate) fn bump_revision(&mut self, id: VertexId) {
        if let Some(vertex) = self.vertices.get_mut(&id) {
            vertex.revision += 1;
        }
    }

    // ==================== Edge Operations ====================

    /// Borrow an edge by id.
    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Insert or replace an edge, keeping the adjacency index current.
    pub(crate) fn put_edge(&mut self, edge: Edge) {
        if let Some(old) = self.edges.remove(&edge.id) {
            self.adjacency
                .remove(old.id, &old.label, old.out_vertex, old.in_vertex);
        }
        self.adjacency
            .insert(edge.id, &edge.label, edge.out_vertex, edge.in_vertex);
        self.edges.insert(edge.id, edge);
    }

    /// Remove an edge.
    pub(crate) fn remove_edge(&mut self, id: EdgeId) {
        if let Some(old) = self.edges.remove(&id) {
            self.adjacency
                .remove(old.id, &old.label, old.out_vertex, old.in_vertex);
        }
    }

    // ==================== Query Operations ====================

    /// Ids of edges leaving a vertex with the given label.
    pub fn edge_ids_out(&self, vertex: VertexId, label: &str) -> impl Iterator<Item = EdgeId> + '_ {
        self.adjacency.edges_out(vertex, label)
    }

    /// Ids of edges leaving a vertex under any label.
    pub fn all_edge_ids_out(&self, vertex: VertexId) -> impl Iterator<Item = EdgeId> + '_ {
        self.adjacency.all_edges_out(vertex)
    }

    /// Ids of edges entering a vertex.
    pub fn edge_ids_in(&self, vertex: VertexId) -> impl Iterator<Item = EdgeId> + '_ {
        self.adjacency.edges_in(vertex)
    }

    /// Ids of vertices whose indexed property matches.
    pub fn vertex_ids_by_property(
        &self,
        key: &str,
        value: &Property,
    ) -> impl Iterator<Item = VertexId> + '_ {
        self.property_index.find(key, value)
    }

    // ==================== Unique Keys ====================

    pub fn declare_unique(&mut self, key: impl Into<String>) {
        self.unique_keys.insert(key.into());
    }

    pub fn is_unique_key(&self, key: &str) -> bool {
        self.unique_keys.contains(key)
    }

    // ==================== Statistics ====================

    /// Get the number of vertices in the graph.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

impl GraphRead for Graph {
    fn vertex(&self, id: VertexId) -> Option<Vertex> {
        self.vertices.get(&id).cloned()
    }

    fn edge(&self, id: EdgeId) -> Option<Edge> {
        self.edges.get(&id).cloned()
    }

    fn out_edges(&self, vertex: VertexId, label: &str) -> Vec<Edge> {
        self.adjacency
            .edges_out(vertex, label)
            .filter_map(|id| self.edges.get(&id).cloned())
            .collect()
    }

    fn find_vertices(&self, key: &str, value: &Property) -> Vec<VertexId> {
        let mut ids: Vec<VertexId> = self.property_index.find(key, value).collect();
        ids.sort();
        ids
    }
}

impl<'a> GraphRead for RwLockReadGuard<'a, Graph> {
    fn vertex(&self, id: VertexId) -> Option<Vertex> {
        (**self).vertex(id)
    }

    fn edge(&self, id: EdgeId) -> Option<Edge> {
        (**self).edge(id)
    }

    fn out_edges(&self, vertex: VertexId, label: &str) -> Vec<Edge> {
        (**self).out_edges(vertex, label)
    }

    fn find_vertices(&self, key: &str, value: &Property) -> Vec<VertexId> {
        (**self).find_vertices(key, value)
    }
}

/// Shared handle to a committed graph.
///
/// Cloning the handle shares the same graph.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    graph: Arc<RwLock<Graph>>,
    next_id: Arc<AtomicU64>,
}

impl GraphStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            graph: Arc::new(RwLock::new(Graph::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Require unique values for a property key across all vertices.
    pub fn declare_unique(&self, key: impl Into<String>) {
        self.graph.write().declare_unique(key);
    }

    /// Begin a transaction over the current committed state.
    pub fn begin(&self) -> Transaction {
        Transaction::new(Arc::clone(&self.graph), Arc::clone(&self.next_id))
    }

    /// Read the committed state.
    pub fn read(&self) -> RwLockReadGuard<'_, Graph> {
        self.graph.read()
    }
}

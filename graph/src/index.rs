//! Indexes for efficient graph lookups.

use crate::Property;
use quiver_core::{EdgeId, VertexId};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Simplified value for property indexing.
/// Only scalar strings, integers and booleans are indexed for exact match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl IndexValue {
    pub fn from_property(property: &Property) -> Option<Self> {
        match property {
            Property::Bool(b) => Some(IndexValue::Bool(*b)),
            Property::Int(i) => Some(IndexValue::Int(*i)),
            Property::Str(s) => Some(IndexValue::Str(s.clone())),
            // Floats and collections are not indexed for exact match
            _ => None,
        }
    }
}

/// Property index: (key, value) -> Set<VertexId>
#[derive(Debug, Default)]
pub struct PropertyIndex {
    exact: HashMap<(String, IndexValue), HashSet<VertexId>>,
}

impl PropertyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, property: &Property, vertex_id: VertexId) {
        if let Some(value) = IndexValue::from_property(property) {
            self.exact
                .entry((key.to_string(), value))
                .or_default()
                .insert(vertex_id);
        }
    }

    pub fn remove(&mut self, key: &str, property: &Property, vertex_id: VertexId) {
        if let Some(value) = IndexValue::from_property(property) {
            let index_key = (key.to_string(), value);
            if let Some(set) = self.exact.get_mut(&index_key) {
                set.remove(&vertex_id);
                if set.is_empty() {
                    self.exact.remove(&index_key);
                }
            }
        }
    }

    pub fn find(&self, key: &str, property: &Property) -> impl Iterator<Item = VertexId> + '_ {
        IndexValue::from_property(property)
            .and_then(|value| self.exact.get(&(key.to_string(), value)))
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }
}

/// Adjacency index: VertexId -> { outbound: Map<label, Set<EdgeId>>, inbound: Set<EdgeId> }
#[derive(Debug, Default)]
pub struct AdjacencyIndex {
    /// Edges leaving a vertex, by label
    outbound: HashMap<VertexId, HashMap<String, BTreeSet<EdgeId>>>,
    /// Edges entering a vertex
    inbound: HashMap<VertexId, BTreeSet<EdgeId>>,
}

impl AdjacencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, edge_id: EdgeId, label: &str, out_vertex: VertexId, in_vertex: VertexId) {
        self.outbound
            .entry(out_vertex)
            .or_default()
            .entry(label.to_string())
            .or_default()
            .insert(edge_id);
        self.inbound.entry(in_vertex).or_default().insert(edge_id);
    }

    pub fn remove(&mut self, edge_id: EdgeId, label: &str, out_vertex: VertexId, in_vertex: VertexId) {
        if let Some(by_label) = self.outbound.get_mut(&out_vertex) {
            if let Some(set) = by_label.get_mut(label) {
                set.remove(&edge_id);
                if set.is_empty() {
                    by_label.remove(label);
                }
            }
            if by_label.is_empty() {
                self.outbound.remove(&out_vertex);
            }
        }
        if let Some(set) = self.inbound.get_mut(&in_vertex) {
            set.remove(&edge_id);
            if set.is_empty() {
                self.inbound.remove(&in_vertex);
            }
        }
    }

    /// Edges leaving a vertex with the given label, in id order.
    pub fn edges_out(&self, vertex: VertexId, label: &str) -> impl Iterator<Item = EdgeId> + '_ {
        self.outbound
            .get(&vertex)
            .and_then(|by_label| by_label.get(label))
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Edges leaving a vertex under any label.
    pub fn all_edges_out(&self, vertex: VertexId) -> impl Iterator<Item = EdgeId> + '_ {
        self.outbound
            .get(&vertex)
            .into_iter()
            .flat_map(|by_label| by_label.values().flat_map(|set| set.iter().copied()))
    }

    /// Edges entering a vertex.
    pub fn edges_in(&self, vertex: VertexId) -> impl Iterator<Item = EdgeId> + '_ {
        self.inbound
            .get(&vertex)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }
}

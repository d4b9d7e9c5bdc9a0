//! Graph to entity mapping.

use crate::codec::{decode_inline, read_system_attributes};
use crate::{MapperError, MapperResult, MappingContext};
use quiver_core::{
    Attributes, Classification, EntityState, EntityWithExtInfo, Guid, ObjectId, Struct,
    TypedEntity, Value, VertexId,
};
use quiver_graph::{keys, GraphRead, Property, Vertex};
use quiver_registry::{AttrDef, AttrType, Registry};
use std::collections::BTreeMap;
use tracing::debug;

/// Reconstructs typed entities from graph vertices.
pub struct GraphToEntityMapper<'r> {
    registry: &'r Registry,
}

impl<'r> GraphToEntityMapper<'r> {
    /// Create a mapper over a schema registry.
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Find the vertex of an entity by guid.
    pub fn find_entity_vertex<G: GraphRead + ?Sized>(&self, graph: &G, guid: &Guid) -> Option<VertexId> {
        graph.find_vertex(keys::GUID, &Property::from(guid.as_str()))
    }

    /// Find an ACTIVE entity of `type_name` (or a subtype) by any of its
    /// unique attribute values.
    pub fn find_by_unique_attributes<G: GraphRead + ?Sized>(
        &self,
        graph: &G,
        type_name: &str,
        values: &Attributes,
    ) -> Option<(VertexId, Guid)> {
        for attr in self.registry.unique_attributes_of(type_name) {
            let Some(property) = values.get(&attr.name).and_then(Property::from_value) else {
                continue;
            };
            let key = keys::unique_key(&keys::attribute_key(&attr.declaring_type, &attr.name));
            for candidate in graph.find_vertices(&key, &property) {
                let Some(vertex) = graph.vertex(candidate) else {
                    continue;
                };
                let matches_type = vertex
                    .get_str(keys::TYPE_NAME)
                    .map(|t| self.registry.is_subtype(t, type_name))
                    .unwrap_or(false);
                if let (true, Some(guid)) = (matches_type, vertex.get_str(keys::GUID)) {
                    return Some((candidate, Guid::new(guid)));
                }
            }
        }
        None
    }

    /// Read an entity with its composite sub-entities.
    pub fn get_entity<G: GraphRead + ?Sized>(
        &self,
        graph: &G,
        guid: &Guid,
    ) -> MapperResult<EntityWithExtInfo> {
        let vertex = self
            .find_entity_vertex(graph, guid)
            .ok_or_else(|| MapperError::EntityNotFound(guid.clone()))?;
        let mut ctx = MappingContext::new();
        let entity = self.map_to_entity(graph, vertex, guid, &mut ctx)?;
        Ok(EntityWithExtInfo {
            referred_entities: ctx.into_referred(guid),
            entity,
        })
    }

    /// Map an entity vertex to a typed entity.
    ///
    /// Entities already in `ctx` are returned from the cache.
    pub fn map_to_entity<G: GraphRead + ?Sized>(
        &self,
        graph: &G,
        vertex_id: VertexId,
        guid: &Guid,
        ctx: &mut MappingContext,
    ) -> MapperResult<TypedEntity> {
        if let Some(cached) = ctx.get(guid) {
            return Ok(cached.clone());
        }

        let vertex = graph
            .vertex(vertex_id)
            .ok_or_else(|| MapperError::corrupt(vertex_id, "vertex does not exist"))?;
        let type_name = vertex
            .get_str(keys::TYPE_NAME)
            .ok_or_else(|| MapperError::corrupt(vertex_id, "missing type name"))?;
        let attributes = self.registry.attributes_of(type_name)?;

        debug!(guid = %guid, type_name = %type_name, vertex = %vertex_id, "mapping entity");

        ctx.begin(guid);
        match self.fill_entity(graph, &vertex, guid, type_name, attributes, ctx) {
            Ok(entity) => {
                ctx.finish(entity.clone());
                Ok(entity)
            }
            Err(e) => {
                ctx.abandon(guid);
                Err(e)
            }
        }
    }

    fn fill_entity<G: GraphRead + ?Sized>(
        &self,
        graph: &G,
        vertex: &Vertex,
        guid: &Guid,
        type_name: &str,
        attributes: &[AttrDef],
        ctx: &mut MappingContext,
    ) -> MapperResult<TypedEntity> {
        let mut entity = TypedEntity::with_guid(guid.clone(), type_name);
        entity.version = vertex.get_int(keys::VERSION).unwrap_or(0).max(0) as u64;
        entity.state = entity_state(vertex);
        entity.system = read_system_attributes(vertex);

        for attr in attributes {
            if let Some(value) = self.map_attribute(graph, vertex, attr, ctx)? {
                entity.attributes.insert(attr.name.clone(), value);
            }
        }

        entity.classifications = self.map_classifications(graph, vertex, guid)?;
        Ok(entity)
    }

    /// Map one attribute of an entity or struct vertex. Absent and empty
    /// values map to `None`.
    pub fn map_attribute<G: GraphRead + ?Sized>(
        &self,
        graph: &G,
        vertex: &Vertex,
        attr: &AttrDef,
        ctx: &mut MappingContext,
    ) -> MapperResult<Option<Value>> {
        let key = keys::attribute_key(&attr.declaring_type, &attr.name);
        let label = keys::edge_label(&key);

        let value = match &attr.attr_type {
            AttrType::Primitive(_) | AttrType::Enum(_) => vertex
                .get(&key)
                .map(|p| decode_inline(vertex.id, p, &attr.attr_type))
                .transpose()?,
            AttrType::Struct(struct_type) => match graph.out_edges(vertex.id, &label).first() {
                Some(edge) => Some(Value::Struct(self.map_struct(
                    graph,
                    edge.in_vertex,
                    struct_type,
                    ctx,
                )?)),
                None => None,
            },
            AttrType::ClassRef(_) => match graph.out_edges(vertex.id, &label).first() {
                Some(edge) => Some(self.map_reference(graph, edge.in_vertex, attr.is_composite, ctx)?),
                None => None,
            },
            AttrType::Array(element) if element.is_inline() => vertex
                .get(&key)
                .map(|p| decode_inline(vertex.id, p, &attr.attr_type))
                .transpose()?,
            AttrType::Array(element) => {
                let mut edges = graph.out_edges(vertex.id, &label);
                edges.sort_by_key(|e| (e.get_int(keys::ORDINAL).unwrap_or(i64::MAX), e.id));
                let items = edges
                    .iter()
                    .map(|e| self.map_element(graph, e.in_vertex, element, attr.is_composite, ctx))
                    .collect::<MapperResult<Vec<_>>>()?;
                Some(Value::Array(items))
            }
            AttrType::Map(element) => {
                let listing = map_listing(vertex, &key);
                let mut entries = BTreeMap::new();
                if element.is_inline() {
                    for map_key in listing {
                        if let Some(p) = vertex.get(&keys::map_entry_key(&key, &map_key)) {
                            entries.insert(map_key, decode_inline(vertex.id, p, element)?);
                        }
                    }
                } else {
                    let edges = graph.out_edges(vertex.id, &label);
                    for map_key in listing {
                        let member = edges
                            .iter()
                            .find(|e| e.get_str(keys::MAP_KEY) == Some(map_key.as_str()));
                        if let Some(edge) = member {
                            let value =
                                self.map_element(graph, edge.in_vertex, element, attr.is_composite, ctx)?;
                            entries.insert(map_key, value);
                        }
                    }
                }
                Some(Value::Map(entries))
            }
        };

        Ok(value.filter(|v| !v.is_empty_collection()))
    }

    fn map_element<G: GraphRead + ?Sized>(
        &self,
        graph: &G,
        target: VertexId,
        element: &AttrType,
        composite: bool,
        ctx: &mut MappingContext,
    ) -> MapperResult<Value> {
        match element {
            AttrType::Struct(struct_type) => {
                Ok(Value::Struct(self.map_struct(graph, target, struct_type, ctx)?))
            }
            AttrType::ClassRef(_) => self.map_reference(graph, target, composite, ctx),
            other => Err(MapperError::corrupt(
                target,
                format!("{} elements are stored inline, not as edges", other),
            )),
        }
    }

    /// Map a struct vertex.
    pub fn map_struct<G: GraphRead + ?Sized>(
        &self,
        graph: &G,
        vertex_id: VertexId,
        struct_type: &str,
        ctx: &mut MappingContext,
    ) -> MapperResult<Struct> {
        let vertex = graph
            .vertex(vertex_id)
            .ok_or_else(|| MapperError::corrupt(vertex_id, "struct vertex does not exist"))?;
        let mut result = Struct::new(struct_type);
        for attr in self.registry.attributes_of(struct_type)? {
            if let Some(value) = self.map_attribute(graph, &vertex, attr, ctx)? {
                result.attributes.insert(attr.name.clone(), value);
            }
        }
        Ok(result)
    }

    fn map_reference<G: GraphRead + ?Sized>(
        &self,
        graph: &G,
        target: VertexId,
        composite: bool,
        ctx: &mut MappingContext,
    ) -> MapperResult<Value> {
        let vertex = graph
            .vertex(target)
            .ok_or_else(|| MapperError::corrupt(target, "referenced vertex does not exist"))?;
        let guid = vertex
            .get_str(keys::GUID)
            .map(Guid::new)
            .ok_or_else(|| MapperError::corrupt(target, "referenced vertex has no guid"))?;
        let type_name = vertex
            .get_str(keys::TYPE_NAME)
            .ok_or_else(|| MapperError::corrupt(target, "referenced vertex has no type"))?;

        // A guid still in progress is a composite cycle; it stays a plain reference.
        if composite
            && ctx.materializes_composites()
            && !ctx.contains(&guid)
            && !ctx.is_in_progress(&guid)
        {
            self.map_to_entity(graph, target, &guid, ctx)?;
        }

        Ok(Value::Ref(
            ObjectId::new(guid, type_name).with_state(entity_state(&vertex)),
        ))
    }

    /// Map every classification attached to an entity vertex.
    pub fn map_classifications<G: GraphRead + ?Sized>(
        &self,
        graph: &G,
        vertex: &Vertex,
        guid: &Guid,
    ) -> MapperResult<Vec<Classification>> {
        let mut result = Vec::new();
        for name in classification_names(vertex) {
            if let Some(classification) = self.map_classification(graph, vertex.id, guid, &name)? {
                result.push(classification);
            }
        }
        Ok(result)
    }

    /// Map one classification of an entity vertex, if attached.
    pub fn map_classification<G: GraphRead + ?Sized>(
        &self,
        graph: &G,
        entity_vertex: VertexId,
        guid: &Guid,
        classification_type: &str,
    ) -> MapperResult<Option<Classification>> {
        let label = keys::classification_label(classification_type);
        let Some(edge) = graph.out_edges(entity_vertex, &label).into_iter().next() else {
            return Ok(None);
        };
        let vertex = graph.vertex(edge.in_vertex).ok_or_else(|| {
            MapperError::corrupt(edge.in_vertex, "classification vertex does not exist")
        })?;

        let mut classification = Classification::new(classification_type);
        classification.entity_guid = Some(guid.clone());
        let mut ctx = MappingContext::shallow();
        for attr in self.registry.attributes_of(classification_type)? {
            if let Some(value) = self.map_attribute(graph, &vertex, attr, &mut ctx)? {
                classification.attributes.insert(attr.name.clone(), value);
            }
        }
        Ok(Some(classification))
    }
}

/// Lifecycle state recorded on an entity vertex.
pub(crate) fn entity_state(vertex: &Vertex) -> EntityState {
    vertex
        .get_str(keys::STATE)
        .and_then(EntityState::parse)
        .unwrap_or_default()
}

fn classification_names(vertex: &Vertex) -> Vec<String> {
    vertex
        .get(keys::CLASSIFICATION_NAMES)
        .and_then(Property::as_list)
        .map(|names| names.iter().filter_map(|n| n.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

fn map_listing(vertex: &Vertex, key: &str) -> Vec<String> {
    vertex
        .get(key)
        .and_then(Property::as_list)
        .map(|keys| keys.iter().filter_map(|k| k.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

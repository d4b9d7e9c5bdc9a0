//! Warehouse-catalog schema and entity builders.
//!
//! Schema outline:
//!
//! ```text
//! Asset            qualifiedName (required, unique), name, description, owner
//! ├── Database     location, clusterName
//! ├── Table        db, databaseComposite, columns*, columnsMap*, serde,
//! │                partitionKeys, partitionsMap, parametersMap, tags,
//! │                tableType, retention, createTime, sizeBytes, bucketColumns
//! ├── Column       dataType, position, table (reverse of Table.columns)
//! └── Process      inputs, outputs
//!
//! * composite
//! ```
//!
//! Classifications: `PII` (level: int, required), `Sensitive`, `Deprecated`
//! (reason: string).

use std::sync::Arc;

use quiver_core::{Guid, Struct, TypedEntity, Value};
use quiver_registry::{AttrDef, AttrType, PrimitiveKind, Registry, RegistryBuilder};
use quiver_store::{EntityStore, MutationResponse, StoreConfig};

use crate::error::TestResult;

pub const CLUSTER: &str = "primary";

/// Build the catalog schema.
pub fn catalog_registry() -> TestResult<Registry> {
    let mut builder = RegistryBuilder::new();

    builder.add_enum_type("TableType", &["MANAGED", "EXTERNAL", "VIEW"])?;

    builder
        .add_struct_type("SerDe")
        .attr(AttrDef::new("name", AttrType::string()))
        .attr(AttrDef::new("serializationLib", AttrType::string()))
        .attr(AttrDef::new("parameters", AttrType::map_of(AttrType::string())))
        .done()?;
    builder
        .add_struct_type("Partition")
        .attr(AttrDef::new("name", AttrType::string()).required())
        .attr(AttrDef::new("values", AttrType::array_of(AttrType::string())))
        .done()?;

    builder
        .add_entity_type("Asset")
        .attr(AttrDef::new("qualifiedName", AttrType::string()).required().unique())
        .attr(AttrDef::new("name", AttrType::string()))
        .attr(AttrDef::new("description", AttrType::string()))
        .attr(AttrDef::new("owner", AttrType::string()))
        .done()?;
    builder
        .add_entity_type("Database")
        .extends("Asset")
        .attr(AttrDef::new("location", AttrType::string()))
        .attr(AttrDef::new("clusterName", AttrType::string()))
        .done()?;
    builder
        .add_entity_type("Column")
        .extends("Asset")
        .attr(AttrDef::new("dataType", AttrType::string()))
        .attr(AttrDef::new("position", AttrType::int()))
        .attr(AttrDef::new("table", AttrType::class_ref("Table")))
        .done()?;
    builder
        .add_entity_type("Table")
        .extends("Asset")
        .attr(AttrDef::new("db", AttrType::class_ref("Database")))
        .attr(AttrDef::new("databaseComposite", AttrType::class_ref("Database")).composite())
        .attr(
            AttrDef::new("columns", AttrType::array_of(AttrType::class_ref("Column")))
                .composite()
                .reverse("table"),
        )
        .attr(
            AttrDef::new("columnsMap", AttrType::map_of(AttrType::class_ref("Column")))
                .composite(),
        )
        .attr(AttrDef::new("serde", AttrType::struct_of("SerDe")))
        .attr(AttrDef::new("partitionKeys", AttrType::array_of(AttrType::struct_of("Partition"))))
        .attr(AttrDef::new("partitionsMap", AttrType::map_of(AttrType::struct_of("Partition"))))
        .attr(AttrDef::new("parametersMap", AttrType::map_of(AttrType::string())))
        .attr(AttrDef::new("tags", AttrType::array_of(AttrType::string())))
        .attr(
            AttrDef::new("bucketColumns", AttrType::array_of(AttrType::array_of(AttrType::string()))),
        )
        .attr(
            AttrDef::new("tableType", AttrType::enumeration("TableType"))
                .with_default(Value::Enum("MANAGED".to_string())),
        )
        .attr(AttrDef::new("retention", AttrType::int()))
        .attr(AttrDef::new("createTime", AttrType::date()))
        .attr(AttrDef::new("sizeBytes", AttrType::Primitive(PrimitiveKind::BigInteger)))
        .done()?;
    builder
        .add_entity_type("Process")
        .extends("Asset")
        .attr(AttrDef::new("inputs", AttrType::array_of(AttrType::class_ref("Table"))))
        .attr(AttrDef::new("outputs", AttrType::array_of(AttrType::class_ref("Table"))))
        .done()?;

    builder
        .add_classification_type("PII")
        .attr(AttrDef::new("level", AttrType::int()).required())
        .done()?;
    builder.add_classification_type("Sensitive").done()?;
    builder
        .add_classification_type("Deprecated")
        .attr(AttrDef::new("reason", AttrType::string()))
        .done()?;

    Ok(builder.build()?)
}

/// A store over an empty graph with the catalog schema.
pub fn catalog_store() -> TestResult<EntityStore> {
    catalog_store_with(StoreConfig::default())
}

pub fn catalog_store_with(config: StoreConfig) -> TestResult<EntityStore> {
    Ok(EntityStore::new(Arc::new(catalog_registry()?), config))
}

// ==================== Entity Builders ====================

pub fn qualified(name: &str) -> String {
    format!("{}@{}", name, CLUSTER)
}

pub fn database(name: &str) -> TypedEntity {
    TypedEntity::new("Database")
        .with_attr("qualifiedName", qualified(name))
        .with_attr("name", name)
        .with_attr("clusterName", CLUSTER)
}

/// A table in `db` owning `columns` in order.
pub fn table(name: &str, db: &TypedEntity, columns: &[&TypedEntity]) -> TypedEntity {
    let mut table = TypedEntity::new("Table")
        .with_attr("qualifiedName", qualified(&format!("{}.{}", db_name(db), name)))
        .with_attr("name", name)
        .with_attr("db", db.object_id());
    if !columns.is_empty() {
        table.set_attr("columns", refs(columns));
    }
    table
}

pub fn column(table_name: &str, name: &str, position: i64) -> TypedEntity {
    TypedEntity::new("Column")
        .with_attr("qualifiedName", qualified(&format!("{}.{}", table_name, name)))
        .with_attr("name", name)
        .with_attr("dataType", "string")
        .with_attr("position", position)
}

pub fn serde(name: &str, lib: &str) -> Struct {
    Struct::new("SerDe")
        .with_attr("name", name)
        .with_attr("serializationLib", lib)
}

pub fn partition(name: &str, values: &[&str]) -> Struct {
    Struct::new("Partition")
        .with_attr("name", name)
        .with_attr("values", values.to_vec())
}

/// References to `entities`, in order.
pub fn refs(entities: &[&TypedEntity]) -> Value {
    Value::Array(entities.iter().map(|e| Value::Ref(e.object_id())).collect())
}

/// The stored guid of a batch entity: its assigned guid if it was a
/// placeholder, otherwise its own guid.
pub fn guid_of(response: &MutationResponse, entity: &TypedEntity) -> Guid {
    response
        .assigned_guid(&entity.guid)
        .cloned()
        .unwrap_or_else(|| entity.guid.clone())
}

/// A copy of a batch entity addressed by its stored guid, for building
/// follow-up batches that reference it.
pub fn persisted(response: &MutationResponse, entity: &TypedEntity) -> TypedEntity {
    let mut entity = entity.clone();
    entity.guid = guid_of(response, &entity);
    entity
}

fn db_name(db: &TypedEntity) -> &str {
    db.get_attr("name").and_then(Value::as_str).unwrap_or("default")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== TEST: catalog_schema_builds ==========
    #[test]
    fn test_catalog_schema_builds() {
        let registry = catalog_registry().unwrap();
        assert!(registry.is_subtype("Table", "Asset"));
        assert_eq!(
            registry.get_attr("Table", "qualifiedName").map(|a| a.declaring_type.as_str()),
            Some("Asset")
        );
    }

    // ========== TEST: table_builder ==========
    #[test]
    fn test_table_builder() {
        let db = database("sales");
        let c1 = column("orders", "id", 0);

        let t = table("orders", &db, &[&c1]);

        assert_eq!(
            t.get_attr("qualifiedName"),
            Some(&Value::from("sales.orders@primary"))
        );
        assert_eq!(t.get_attr("columns"), Some(&refs(&[&c1])));
    }
}

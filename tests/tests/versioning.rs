//! Entity versions and audit attributes.

use pretty_assertions::assert_eq;
use quiver_tests::prelude::*;

fn version_of(store: &EntityStore, guid: &Guid) -> u64 {
    store.get_by_id(guid).unwrap().entity.version
}

// ========== TEST: version_moves_only_on_change ==========
#[test]
fn test_version_moves_only_on_change() {
    // GIVEN a new database
    let store = catalog_store().unwrap();
    let created = store.create_or_update(&[database("sales")], false).unwrap();
    let guid = created.created_entities()[0].guid.clone();
    assert_eq!(version_of(&store, &guid), 1);

    // WHEN it goes through a full update, a no-op resubmit, a partial
    // update, a classification and a delete
    let described = database("sales").with_attr("description", "sales data");
    let updated = store.create_or_update(&[described.clone()], false).unwrap();
    assert_eq!(updated.first_updated().map(|h| h.version), Some(2));

    expect()
        .nothing()
        .verify("no-op", &store.create_or_update(&[described], false))
        .unwrap();
    assert_eq!(version_of(&store, &guid), 2);

    let partial = TypedEntity::with_guid(guid.clone(), "Database").with_attr("location", "s3://sales");
    let partially = store.create_or_update(&[partial], true).unwrap();
    assert_eq!(partially.first_partially_updated().map(|h| h.version), Some(3));

    store
        .add_classifications(&guid, &[Classification::new("Sensitive")])
        .unwrap();
    assert_eq!(version_of(&store, &guid), 3);

    let deleted = store.delete_by_guids(&[guid.clone()]).unwrap();

    // THEN the version went 1, 2, 2, 3, 3, 4
    assert_eq!(deleted.deleted_entities()[0].version, 4);
    assert_eq!(version_of(&store, &guid), 4);
}

// ========== TEST: stale_version_is_rejected ==========
#[test]
fn test_stale_version_is_rejected() {
    // GIVEN a database updated once, now at version 2
    let store = catalog_store().unwrap();
    let created = store.create_or_update(&[database("sales")], false).unwrap();
    let guid = created.created_entities()[0].guid.clone();
    let first = TypedEntity::with_guid(guid.clone(), "Database").with_attr("location", "hdfs://a");
    store.create_or_update(&[first], true).unwrap();

    // WHEN a writer that saw version 1 updates it
    let mut stale = TypedEntity::with_guid(guid.clone(), "Database").with_attr("location", "hdfs://b");
    stale.version = 1;
    let result = store.create_or_update(&[stale], true);

    // THEN the write is refused and the stored value stands
    expect()
        .error("expected version 1, found 2")
        .verify("stale write", &result)
        .unwrap();
    let read = store.get_by_id(&guid).unwrap().entity;
    assert_eq!(read.get_attr("location"), Some(&Value::from("hdfs://a")));

    // AND a writer that saw version 2 succeeds
    let mut current = TypedEntity::with_guid(guid.clone(), "Database").with_attr("location", "hdfs://c");
    current.version = 2;
    expect()
        .partially_updated(1)
        .verify("current write", &store.create_or_update(&[current], true))
        .unwrap();
}

// ========== TEST: type_mismatch_on_update ==========
#[test]
fn test_type_mismatch_on_update() {
    let store = catalog_store().unwrap();
    let created = store.create_or_update(&[database("sales")], false).unwrap();
    let guid = created.created_entities()[0].guid.clone();

    let wrong = TypedEntity::with_guid(guid, "Table").with_attr("name", "orders");
    let result = store.create_or_update(&[wrong], true);

    expect()
        .error("Invalid value for Table.typeName: expected Database, got Table")
        .verify("wrong type", &result)
        .unwrap();
}

// ========== TEST: deleted_entity_cannot_be_updated ==========
#[test]
fn test_deleted_entity_cannot_be_updated() {
    // GIVEN a deleted database
    let store = catalog_store().unwrap();
    let created = store.create_or_update(&[database("sales")], false).unwrap();
    let guid = created.created_entities()[0].guid.clone();
    store.delete_by_guids(&[guid.clone()]).unwrap();

    // WHEN it is updated by guid
    let by_guid = TypedEntity::with_guid(guid.clone(), "Database").with_attr("location", "x");
    expect()
        .error("entity is deleted")
        .verify("update deleted", &store.create_or_update(&[by_guid], true))
        .unwrap();

    // THEN resubmitting it by qualifiedName creates a new entity instead
    let again = store.create_or_update(&[database("sales")], false).unwrap();
    let new_guid = again.created_entities()[0].guid.clone();
    assert!(new_guid != guid);
    assert_eq!(version_of(&store, &new_guid), 1);
    assert_eq!(
        store.get_by_id(&guid).unwrap().entity.state,
        EntityState::Deleted
    );
}

// ========== TEST: audit_attributes ==========
#[test]
fn test_audit_attributes() {
    // GIVEN a database created by the default user
    let store = catalog_store().unwrap();
    let created = store.create_or_update(&[database("sales")], false).unwrap();
    let guid = created.created_entities()[0].guid.clone();
    let before = store.get_by_id(&guid).unwrap().entity.system;
    assert_eq!(before.created_by.as_deref(), Some("quiver"));
    assert_eq!(before.modified_by.as_deref(), Some("quiver"));

    // WHEN another user changes it
    let update = TypedEntity::with_guid(guid.clone(), "Database").with_attr("location", "s3://sales");
    store.create_or_update_as("etl-bot", &[update], true).unwrap();

    // THEN the creator stays and the modifier moves
    let after = store.get_by_id(&guid).unwrap().entity.system;
    assert_eq!(after.created_by.as_deref(), Some("quiver"));
    assert_eq!(after.modified_by.as_deref(), Some("etl-bot"));
    assert_eq!(after.created_time, before.created_time);
    assert!(after.modified_time >= before.modified_time);
}

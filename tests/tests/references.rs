//! Reference resolution: by guid, by unique attributes, within the batch
//! and against the store.

use pretty_assertions::assert_eq;
use quiver_tests::prelude::*;

fn by_name(type_name: &str, name: &str) -> ObjectId {
    ObjectId::by_unique_attr(type_name, "qualifiedName", qualified(name))
}

// ========== TEST: unique_reference_to_stored_entity ==========
#[test]
fn test_unique_reference_to_stored_entity() {
    // GIVEN a stored database
    let store = catalog_store().unwrap();
    let created = store.create_or_update(&[database("sales")], false).unwrap();
    let db_guid = created.created_entities()[0].guid.clone();

    // WHEN a table names it by qualifiedName alone
    let orders = TypedEntity::new("Table")
        .with_attr("qualifiedName", qualified("sales.orders"))
        .with_attr("name", "orders")
        .with_attr("db", by_name("Database", "sales"));
    let response = store.create_or_update(&[orders.clone()], false).unwrap();

    // THEN the stored reference carries the database guid
    let read = store.get_by_id(&guid_of(&response, &orders)).unwrap().entity;
    assert_eq!(
        read.get_attr("db"),
        Some(&Value::from(ObjectId::new(db_guid, "Database")))
    );
}

// ========== TEST: unique_reference_within_batch ==========
#[test]
fn test_unique_reference_within_batch() {
    // GIVEN a new database and a table naming it by qualifiedName
    let store = catalog_store().unwrap();
    let db = database("sales");
    let orders = TypedEntity::new("Table")
        .with_attr("qualifiedName", qualified("sales.orders"))
        .with_attr("name", "orders")
        .with_attr("db", by_name("Database", "sales"));

    // WHEN both are created together, table first
    let response = store
        .create_or_update(&[orders.clone(), db.clone()], false)
        .unwrap();

    // THEN the reference resolves to the database created by the batch
    expect().created(2).verify("create", &Ok(response.clone())).unwrap();
    let read = store.get_by_id(&guid_of(&response, &orders)).unwrap().entity;
    assert_eq!(
        read.get_attr("db"),
        Some(&Value::from(ObjectId::new(guid_of(&response, &db), "Database")))
    );
}

// ========== TEST: process_lineage_references ==========
#[test]
fn test_process_lineage_references() {
    // GIVEN two stored tables
    let store = catalog_store().unwrap();
    let db = database("sales");
    let raw = table("raw", &db, &[]);
    let clean = table("clean", &db, &[]);
    let stored = store
        .create_or_update(&[db, raw.clone(), clean.clone()], false)
        .unwrap();

    // WHEN a process reads one by guid and writes the other by name
    let etl = TypedEntity::new("Process")
        .with_attr("qualifiedName", qualified("etl"))
        .with_attr("inputs", refs(&[&persisted(&stored, &raw)]))
        .with_attr("outputs", vec![by_name("Table", "sales.clean")]);
    let response = store.create_or_update(&[etl.clone()], false);

    // THEN the process is created and the tables are untouched
    expect()
        .created(1)
        .updated(0)
        .untouched(&guid_of(&stored, &raw))
        .untouched(&guid_of(&stored, &clean))
        .verify("create process", &response)
        .unwrap();
    let read = store
        .get_by_id(&guid_of(response.as_ref().unwrap(), &etl))
        .unwrap()
        .entity;
    assert_eq!(
        read.get_attr("outputs"),
        Some(&Value::from(vec![ObjectId::new(guid_of(&stored, &clean), "Table")]))
    );
}

// ========== TEST: unresolved_reference_fails_the_batch ==========
#[test]
fn test_unresolved_reference_fails_the_batch() {
    // GIVEN a batch whose table names a database that exists nowhere
    let store = catalog_store().unwrap();
    let other = database("other");
    let orders = TypedEntity::new("Table")
        .with_attr("qualifiedName", qualified("sales.orders"))
        .with_attr("name", "orders")
        .with_attr("db", by_name("Database", "sales"));

    // WHEN submitted
    let result = store.create_or_update(&[other.clone(), orders], false);

    // THEN nothing is created, not even the valid database
    expect()
        .error("Cannot resolve reference")
        .verify("create", &result)
        .unwrap();
    assert!(store
        .get_by_unique_attributes("Database", &other.attributes)
        .is_err());
}

// ========== TEST: reference_to_unknown_guid ==========
#[test]
fn test_reference_to_unknown_guid() {
    let store = catalog_store().unwrap();
    let ghost = TypedEntity::with_guid(Guid::new("ghost"), "Database");

    let result = store.create_or_update(&[table("orders", &ghost, &[])], false);

    expect()
        .error("Entity not found: ghost")
        .verify("create", &result)
        .unwrap();
}

// ========== TEST: reference_to_deleted_entity_is_stale ==========
#[test]
fn test_reference_to_deleted_entity_is_stale() {
    // GIVEN a deleted database
    let store = catalog_store().unwrap();
    let db = database("sales");
    let created = store.create_or_update(&[db.clone()], false).unwrap();
    let db = persisted(&created, &db);
    store.delete_by_guids(&[db.guid.clone()]).unwrap();

    // WHEN a new table references it by guid
    let result = store.create_or_update(&[table("orders", &db, &[])], false);

    // THEN the batch is rejected
    expect()
        .error_matching(r"^Stale state for \S+: referenced entity is deleted$")
        .verify("create", &result)
        .unwrap();
}

// ========== TEST: reference_of_wrong_type ==========
#[test]
fn test_reference_of_wrong_type() {
    // GIVEN a stored column
    let store = catalog_store().unwrap();
    let id = column("orders", "id", 0);
    let created = store.create_or_update(&[id.clone()], false).unwrap();

    // WHEN a table's db points at it
    let result = store.create_or_update(&[table("orders", &persisted(&created, &id), &[])], false);

    // THEN the value is rejected
    expect()
        .error("Invalid value for Table.db")
        .verify("create", &result)
        .unwrap();
}

// ========== TEST: response_reports_assigned_guids ==========
#[test]
fn test_response_reports_assigned_guids() {
    // GIVEN a new database and table
    let store = catalog_store().unwrap();
    let db = database("sales");
    let orders = table("orders", &db, &[]);

    // WHEN created
    let response = store
        .create_or_update(&[db.clone(), orders.clone()], false)
        .unwrap();

    // THEN each placeholder maps to a fresh guid and headers carry the
    // unique attributes
    assert_eq!(response.guid_assignments().len(), 2);
    let db_guid = response.assigned_guid(&db.guid).unwrap();
    assert!(!db_guid.is_placeholder());
    let header = response
        .created_by_unique_attribute("Table", "qualifiedName", &Value::from(qualified("sales.orders")))
        .unwrap();
    assert_eq!(&header.guid, response.assigned_guid(&orders.guid).unwrap());
    assert_eq!(header.version, 1);
    assert_eq!(header.state, EntityState::Active);
    assert_eq!(
        response.first_created_by_type("Database").map(|h| &h.guid),
        Some(db_guid)
    );
}

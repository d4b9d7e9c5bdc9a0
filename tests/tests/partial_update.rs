//! Partial updates change only what they name.

use pretty_assertions::assert_eq;
use quiver_tests::prelude::*;

fn stored_table(store: &EntityStore) -> (Guid, Guid) {
    let db = database("sales");
    let c1 = column("orders", "id", 0);
    let table = table("orders", &db, &[&c1])
        .with_attr("description", "orders")
        .with_attr("owner", "ops")
        .with_attr("serde", serde("json", "org.json.JsonSerDe"));
    let response = store
        .create_or_update(&[db, table.clone(), c1.clone()], false)
        .unwrap();
    (guid_of(&response, &table), guid_of(&response, &c1))
}

// ========== TEST: unnamed_attributes_are_untouched ==========
#[test]
fn test_unnamed_attributes_are_untouched() {
    // GIVEN a stored table with a column, owner and serde
    let store = catalog_store().unwrap();
    let (table_guid, column_guid) = stored_table(&store);
    let before = store.get_by_id(&table_guid).unwrap().entity;

    // WHEN only the description is changed
    let update = TypedEntity::with_guid(table_guid.clone(), "Table")
        .with_attr("description", "all orders");
    let result = store.create_or_update(&[update], true);

    // THEN only the description differs and the column lives on
    expect()
        .partially_updated(1)
        .updated(0)
        .deleted(0)
        .untouched(&column_guid)
        .verify("partial", &result)
        .unwrap();
    let after = store.get_by_id(&table_guid).unwrap().entity;
    let mut expected = before.attributes.clone();
    expected.insert("description".to_string(), Value::from("all orders"));
    assert_eq!(after.attributes, expected);
    assert_eq!(after.version, before.version + 1);
}

// ========== TEST: explicit_null_clears ==========
#[test]
fn test_explicit_null_clears() {
    let store = catalog_store().unwrap();
    let (table_guid, _) = stored_table(&store);

    let update = TypedEntity::with_guid(table_guid.clone(), "Table")
        .with_attr("owner", Value::Null)
        .with_attr("serde", Value::Null);
    store.create_or_update(&[update], true).unwrap();

    let read = store.get_by_id(&table_guid).unwrap().entity;
    assert_eq!(read.get_attr("owner"), None);
    assert_eq!(read.get_attr("serde"), None);
    assert_eq!(read.get_attr("description"), Some(&Value::from("orders")));
}

// ========== TEST: struct_fields_update_in_place ==========
#[test]
fn test_struct_fields_update_in_place() {
    let store = catalog_store().unwrap();
    let (table_guid, _) = stored_table(&store);

    let update = TypedEntity::with_guid(table_guid.clone(), "Table")
        .with_attr("serde", serde("csv", "org.csv.CsvSerDe"));
    store.create_or_update(&[update], true).unwrap();

    let read = store.get_by_id(&table_guid).unwrap().entity;
    assert_eq!(
        read.get_attr("serde"),
        Some(&Value::from(serde("csv", "org.csv.CsvSerDe")))
    );
}

// ========== TEST: partial_update_rules ==========
#[test]
fn test_partial_update_rules() {
    // GIVEN a stored table
    let store = catalog_store().unwrap();
    let (table_guid, _) = stored_table(&store);

    // WHEN partial updates null a required attribute, name an unknown
    // attribute, or address an unknown guid
    let null_required = TypedEntity::with_guid(table_guid.clone(), "Table")
        .with_attr("qualifiedName", Value::Null);
    let unknown_attr = TypedEntity::with_guid(table_guid.clone(), "Table")
        .with_attr("color", "blue");
    let unknown_guid = TypedEntity::with_guid(Guid::new("no-such-table"), "Table")
        .with_attr("description", "x");

    // THEN each is rejected and the table is unchanged
    expect()
        .error("Missing required attribute: qualifiedName")
        .verify("null required", &store.create_or_update(&[null_required], true))
        .unwrap();
    expect()
        .error("Unknown attribute: color")
        .verify("unknown attribute", &store.create_or_update(&[unknown_attr], true))
        .unwrap();
    expect()
        .error("Entity not found: no-such-table")
        .verify("unknown guid", &store.create_or_update(&[unknown_guid], true))
        .unwrap();
    assert_eq!(store.get_by_id(&table_guid).unwrap().entity.version, 1);
}

// ========== TEST: full_update_creates_unknown_guid ==========
#[test]
fn test_full_update_creates_unknown_guid() {
    let store = catalog_store().unwrap();
    let guid = Guid::new("11111111-2222-3333-4444-555555555555");

    let entity = TypedEntity::with_guid(guid.clone(), "Database")
        .with_attr("qualifiedName", qualified("imported"));
    let result = store.create_or_update(&[entity], false);

    expect().created(1).verify("create with guid", &result).unwrap();
    assert_eq!(store.get_by_id(&guid).unwrap().entity.state, EntityState::Active);
}

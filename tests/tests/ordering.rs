//! Order preservation of collection attributes.

use pretty_assertions::assert_eq;
use quiver_tests::prelude::*;

struct Stored {
    store: EntityStore,
    db: TypedEntity,
    columns: Vec<TypedEntity>,
    table_guid: Guid,
}

fn stored_table() -> Stored {
    let store = catalog_store().unwrap();
    let db = database("sales");
    let a = column("orders", "a", 0);
    let b = column("orders", "b", 1);
    let c = column("orders", "c", 2);
    let table = table("orders", &db, &[&a, &b, &c])
        .with_attr("tags", vec!["x", "y", "z"])
        .with_attr(
            "partitionKeys",
            vec![partition("p1", &[]), partition("p2", &["v"])],
        );
    let response = store
        .create_or_update(&[db.clone(), table.clone(), a.clone(), b.clone(), c.clone()], false)
        .unwrap();
    Stored {
        table_guid: guid_of(&response, &table),
        db: persisted(&response, &db),
        columns: [a, b, c].iter().map(|e| persisted(&response, e)).collect(),
        store,
    }
}

fn column_names(store: &EntityStore, table: &Guid) -> Vec<String> {
    let read = store.get_by_id(table).unwrap();
    read.entity
        .get_attr("columns")
        .and_then(Value::as_array)
        .unwrap_or_default()
        .iter()
        .filter_map(|v| v.as_ref_id().and_then(|r| r.guid.as_ref()))
        .filter_map(|g| read.referred(g))
        .filter_map(|c| c.get_attr("name").and_then(Value::as_str).map(String::from))
        .collect()
}

// ========== TEST: reordered_columns_keep_identity ==========
#[test]
fn test_reordered_columns_keep_identity() {
    // GIVEN a table with columns [a, b, c]
    let stored = stored_table();
    let [a, b, c] = [&stored.columns[0], &stored.columns[1], &stored.columns[2]];
    assert_eq!(column_names(&stored.store, &stored.table_guid), vec!["a", "b", "c"]);

    // WHEN the table is resubmitted with [c, a, b]
    let reordered = table("orders", &stored.db, &[c, a, b])
        .with_attr("tags", vec!["x", "y", "z"])
        .with_attr(
            "partitionKeys",
            vec![partition("p1", &[]), partition("p2", &["v"])],
        );
    let result = stored.store.create_or_update(&[reordered], false);

    // THEN only the table is updated and the columns read back in the new order
    expect()
        .created(0)
        .updated(1)
        .deleted(0)
        .untouched(&a.guid)
        .untouched(&b.guid)
        .untouched(&c.guid)
        .verify("reorder", &result)
        .unwrap();
    assert_eq!(column_names(&stored.store, &stored.table_guid), vec!["c", "a", "b"]);
    for column in &stored.columns {
        let read = stored.store.get_by_id(&column.guid).unwrap().entity;
        assert_eq!(read.version, 1);
        assert_eq!(read.state, EntityState::Active);
    }
}

// ========== TEST: reordered_inline_and_struct_arrays ==========
#[test]
fn test_reordered_inline_and_struct_arrays() {
    // GIVEN a table with tags and partition keys
    let stored = stored_table();
    let columns: Vec<&TypedEntity> = stored.columns.iter().collect();

    // WHEN both are reversed
    let reordered = table("orders", &stored.db, &columns)
        .with_attr("tags", vec!["z", "y", "x"])
        .with_attr(
            "partitionKeys",
            vec![partition("p2", &["v"]), partition("p1", &[])],
        );
    stored.store.create_or_update(&[reordered], false).unwrap();

    // THEN the new order is what reads back
    let read = stored.store.get_by_id(&stored.table_guid).unwrap().entity;
    assert_eq!(read.get_attr("tags"), Some(&Value::from(vec!["z", "y", "x"])));
    assert_eq!(
        read.get_attr("partitionKeys"),
        Some(&Value::from(vec![
            Struct::new("Partition").with_attr("name", "p2").with_attr("values", vec!["v"]),
            Struct::new("Partition").with_attr("name", "p1"),
        ]))
    );
    assert_eq!(read.version, 2);
}

// ========== TEST: duplicate_references_are_kept ==========
#[test]
fn test_duplicate_references_are_kept() {
    // GIVEN a process reading a table twice
    let store = catalog_store().unwrap();
    let db = database("sales");
    let orders = table("orders", &db, &[]);
    let etl = TypedEntity::new("Process")
        .with_attr("qualifiedName", qualified("etl"))
        .with_attr("inputs", refs(&[&orders, &orders]));

    // WHEN created
    let response = store
        .create_or_update(&[db, orders.clone(), etl.clone()], false)
        .unwrap();

    // THEN both entries survive in order
    let orders_guid = guid_of(&response, &orders);
    let read = store.get_by_id(&guid_of(&response, &etl)).unwrap().entity;
    assert_eq!(
        read.get_attr("inputs"),
        Some(&Value::from(vec![
            ObjectId::new(orders_guid.clone(), "Table"),
            ObjectId::new(orders_guid, "Table"),
        ]))
    );
}

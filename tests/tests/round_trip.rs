//! Round trip and idempotence of entity batches.

use pretty_assertions::assert_eq;
use quiver_tests::prelude::*;

fn full_batch() -> (TypedEntity, TypedEntity, TypedEntity, TypedEntity) {
    let db = database("sales");
    let c1 = column("orders", "id", 0);
    let c2 = column("orders", "total", 1);
    let table = table("orders", &db, &[&c1, &c2])
        .with_attr("description", "every order ever placed")
        .with_attr(
            "serde",
            serde("json", "org.json.JsonSerDe").with_attr("parameters", Value::Map(attrs! { "strict" => "true" })),
        )
        .with_attr("partitionKeys", vec![partition("year", &["2024", "2025"])])
        .with_attr(
            "partitionsMap",
            Value::Map(attrs! { "region" => partition("region", &["eu"]) }),
        )
        .with_attr(
            "parametersMap",
            Value::Map(attrs! { "owner.team" => "ops", "retention {days}" => "30" }),
        )
        .with_attr("tags", vec!["gold", "finance"])
        .with_attr("bucketColumns", vec![vec!["id"], vec!["total", "id"]])
        .with_attr("tableType", "EXTERNAL")
        .with_attr("retention", 30)
        .with_attr("createTime", Value::Date(1_700_000_000_000))
        .with_attr("sizeBytes", "123456789012345678901234567890");
    (db, table, c1, c2)
}

// ========== TEST: every_attribute_kind_reads_back ==========
#[test]
fn test_every_attribute_kind_reads_back() {
    // GIVEN a table using every attribute category, with its db and columns
    let store = catalog_store().unwrap();
    let (db, table, c1, c2) = full_batch();

    // WHEN created in one batch
    let response = store
        .create_or_update(&[db.clone(), table.clone(), c1.clone(), c2.clone()], false)
        .unwrap();
    expect()
        .created(4)
        .updated(0)
        .deleted(0)
        .verify("create", &Ok(response.clone()))
        .unwrap();

    // THEN the table reads back with normalized values
    let db_guid = guid_of(&response, &db);
    let table_guid = guid_of(&response, &table);
    let c1_guid = guid_of(&response, &c1);
    let c2_guid = guid_of(&response, &c2);
    let read = store.get_by_id(&table_guid).unwrap();
    let expected = attrs! {
        "qualifiedName" => "sales.orders@primary",
        "name" => "orders",
        "description" => "every order ever placed",
        "db" => ObjectId::new(db_guid.clone(), "Database"),
        "columns" => vec![
            ObjectId::new(c1_guid.clone(), "Column"),
            ObjectId::new(c2_guid.clone(), "Column"),
        ],
        "serde" => serde("json", "org.json.JsonSerDe")
            .with_attr("parameters", Value::Map(attrs! { "strict" => "true" })),
        "partitionKeys" => vec![partition("year", &["2024", "2025"])],
        "partitionsMap" => Value::Map(attrs! { "region" => partition("region", &["eu"]) }),
        "parametersMap" => Value::Map(attrs! { "owner.team" => "ops", "retention {days}" => "30" }),
        "tags" => vec!["gold", "finance"],
        "bucketColumns" => vec![vec!["id"], vec!["total", "id"]],
        "tableType" => Value::Enum("EXTERNAL".to_string()),
        "retention" => 30,
        "createTime" => Value::Date(1_700_000_000_000),
        "sizeBytes" => Value::Decimal("123456789012345678901234567890".to_string()),
    };
    assert_eq!(read.entity.attributes, expected);
    assert_eq!(read.entity.version, 1);
    assert_eq!(read.entity.state, EntityState::Active);
    assert_eq!(read.entity.system.created_by.as_deref(), Some("quiver"));

    // AND composite columns come back as referred entities, the db does not
    let column = read.referred(&c1_guid).unwrap();
    assert_eq!(column.get_attr("name"), Some(&Value::from("id")));
    assert_eq!(
        column.get_attr("table"),
        Some(&Value::from(ObjectId::new(table_guid.clone(), "Table")))
    );
    assert!(read.referred(&c2_guid).is_some());
    assert!(read.referred(&db_guid).is_none());
}

// ========== TEST: defaults_apply_on_create ==========
#[test]
fn test_defaults_apply_on_create() {
    let store = catalog_store().unwrap();
    let db = database("sales");
    let table = table("orders", &db, &[]);

    let response = store.create_or_update(&[db, table.clone()], false).unwrap();

    let read = store.get_by_id(&guid_of(&response, &table)).unwrap().entity;
    assert_eq!(
        read.get_attr("tableType"),
        Some(&Value::Enum("MANAGED".to_string()))
    );
}

// ========== TEST: resubmission_is_idempotent ==========
#[test]
fn test_resubmission_is_idempotent() {
    // GIVEN a stored batch
    let store = catalog_store().unwrap();
    let (db, table, c1, c2) = full_batch();
    let first = store
        .create_or_update(&[db, table.clone(), c1, c2], false)
        .unwrap();
    let table_guid = guid_of(&first, &table);
    let before = store.get_by_id(&table_guid).unwrap();

    // WHEN an identical batch with fresh placeholders is submitted
    let (db, table, c1, c2) = full_batch();
    let second = store.create_or_update(&[db, table.clone(), c1, c2], false);

    // THEN nothing is reported, the placeholders map to the stored guids
    // and no version moves
    expect().nothing().verify("resubmit", &second).unwrap();
    let second = second.unwrap();
    assert_eq!(second.assigned_guid(&table.guid), Some(&table_guid));
    assert_eq!(second.guid_assignments().len(), 4);
    let after = store.get_by_id(&table_guid).unwrap();
    assert_eq!(after, before);
}

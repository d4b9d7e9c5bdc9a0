//! Classifications: attached with a batch on create, managed one entity at
//! a time afterwards.

use pretty_assertions::assert_eq;
use quiver_tests::prelude::*;

fn stored_database(store: &EntityStore) -> Guid {
    let db = database("sales");
    let response = store.create_or_update(&[db.clone()], false).unwrap();
    guid_of(&response, &db)
}

fn error_of<T: std::fmt::Debug>(result: StoreResult<T>) -> String {
    result.unwrap_err().to_string()
}

// ========== TEST: batch_classifications_attach_on_create ==========
#[test]
fn test_batch_classifications_attach_on_create() {
    // GIVEN a new table carrying PII and Sensitive
    let store = catalog_store().unwrap();
    let db = database("sales");
    let mut orders = table("orders", &db, &[]);
    orders.classifications = vec![
        Classification::new("PII").with_attr("level", 2),
        Classification::new("Sensitive"),
    ];

    // WHEN created
    let response = store.create_or_update(&[db, orders.clone()], false).unwrap();

    // THEN both read back, in order, tagged with the entity guid
    let guid = guid_of(&response, &orders);
    let read = store.get_by_id(&guid).unwrap().entity;
    assert_eq!(read.classification_names(), vec!["PII", "Sensitive"]);
    let pii = store.get_classification(&guid, "PII").unwrap();
    assert_eq!(pii.get_attr("level"), Some(&Value::from(2)));
    assert_eq!(pii.entity_guid, Some(guid.clone()));
    assert_eq!(store.get_classifications(&guid).unwrap().len(), 2);
}

// ========== TEST: batch_classifications_ignored_on_update ==========
#[test]
fn test_batch_classifications_ignored_on_update() {
    // GIVEN a stored database without classifications
    let store = catalog_store().unwrap();
    let guid = stored_database(&store);

    // WHEN the same database is resubmitted carrying a classification
    let mut again = database("sales");
    again.classifications = vec![Classification::new("Deprecated")];
    let result = store.create_or_update(&[again], false);

    // THEN the batch changes nothing
    expect().nothing().verify("resubmit", &result).unwrap();
    assert!(store.get_classifications(&guid).unwrap().is_empty());
}

// ========== TEST: classification_lifecycle ==========
#[test]
fn test_classification_lifecycle() {
    // GIVEN a stored database
    let store = catalog_store().unwrap();
    let guid = stored_database(&store);

    // WHEN PII is added, updated and deleted
    store
        .add_classifications(&guid, &[Classification::new("PII").with_attr("level", 1)])
        .unwrap();
    store
        .update_classifications(&guid, &[Classification::new("PII").with_attr("level", 3)])
        .unwrap();
    assert_eq!(
        store.get_classification(&guid, "PII").unwrap().get_attr("level"),
        Some(&Value::from(3))
    );
    store.delete_classification(&guid, "PII").unwrap();

    // THEN it is gone and the entity version never moved
    assert!(store.get_classifications(&guid).unwrap().is_empty());
    let read = store.get_by_id(&guid).unwrap().entity;
    assert_eq!(read.version, 1);
    assert!(read.classifications.is_empty());
}

// ========== TEST: update_clears_absent_classification_attributes ==========
#[test]
fn test_update_clears_absent_classification_attributes() {
    let store = catalog_store().unwrap();
    let guid = stored_database(&store);
    store
        .add_classifications(
            &guid,
            &[Classification::new("Deprecated").with_attr("reason", "replaced by sales_v2")],
        )
        .unwrap();

    store
        .update_classifications(&guid, &[Classification::new("Deprecated")])
        .unwrap();

    let deprecated = store.get_classification(&guid, "Deprecated").unwrap();
    assert_eq!(deprecated.get_attr("reason"), None);
}

// ========== TEST: classification_errors ==========
#[test]
fn test_classification_errors() {
    // GIVEN a stored database tagged Sensitive
    let store = catalog_store().unwrap();
    let guid = stored_database(&store);
    store
        .add_classifications(&guid, &[Classification::new("Sensitive")])
        .unwrap();

    // THEN each misuse fails with its own error
    assert!(error_of(store.add_classifications(&guid, &[Classification::new("Sensitive")]))
        .contains("is already attached"));
    assert!(error_of(store.add_classifications(
        &guid,
        &[Classification::new("Deprecated"), Classification::new("Deprecated")]
    ))
    .contains("is already attached"));
    assert!(error_of(store.update_classifications(&guid, &[Classification::new("Deprecated")]))
        .contains("Classification Deprecated is not attached"));
    assert!(error_of(store.delete_classification(&guid, "PII")).contains("is not attached"));
    assert!(error_of(store.get_classification(&guid, "PII")).contains("is not attached"));
    assert!(error_of(store.add_classifications(&guid, &[Classification::new("Secret")]))
        .contains("Cannot resolve type: Secret"));
    assert!(error_of(store.add_classifications(&guid, &[Classification::new("Table")]))
        .contains("Cannot resolve type: Table"));
    assert!(error_of(store.add_classifications(&guid, &[Classification::new("PII")]))
        .contains("Missing required attribute: level"));
    assert!(error_of(store.add_classifications(
        &Guid::new("missing"),
        &[Classification::new("Deprecated")]
    ))
    .contains("Entity not found: missing"));

    // AND none of the failures left anything behind
    let names: Vec<String> = store
        .get_classifications(&guid)
        .unwrap()
        .into_iter()
        .map(|c| c.type_name)
        .collect();
    assert_eq!(names, vec!["Sensitive".to_string()]);
}

// ========== TEST: invalid_batch_classification_fails_the_batch ==========
#[test]
fn test_invalid_batch_classification_fails_the_batch() {
    let store = catalog_store().unwrap();
    let mut db = database("sales");
    db.classifications = vec![Classification::new("PII")];

    let result = store.create_or_update(&[db.clone()], false);

    expect()
        .error("Missing required attribute: level on type PII")
        .verify("create", &result)
        .unwrap();
    assert!(store
        .get_by_unique_attributes("Database", &db.attributes)
        .is_err());
}

// ========== TEST: deleted_entity_classifications_are_frozen ==========
#[test]
fn test_deleted_entity_classifications_are_frozen() {
    let store = catalog_store().unwrap();
    let guid = stored_database(&store);
    store.delete_by_guids(&[guid.clone()]).unwrap();

    let error = error_of(store.add_classifications(&guid, &[Classification::new("Sensitive")]));

    assert!(error.contains("Stale state"), "unexpected error: {error}");
}

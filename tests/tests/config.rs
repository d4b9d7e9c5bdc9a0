//! Store settings as seen through the store.

use pretty_assertions::assert_eq;
use quiver_tests::prelude::*;

// ========== TEST: configured_user_is_recorded ==========
#[test]
fn test_configured_user_is_recorded() {
    // GIVEN a store configured from TOML
    let config = StoreConfig::from_toml_str(r#"user = "catalog-sync""#).unwrap();
    let store = catalog_store_with(config).unwrap();

    // WHEN it creates a database
    let created = store.create_or_update(&[database("sales")], false).unwrap();
    let guid = created.created_entities()[0].guid.clone();

    // THEN the configured user is creator and modifier
    let system = store.get_by_id(&guid).unwrap().entity.system;
    assert_eq!(system.created_by.as_deref(), Some("catalog-sync"));
    assert_eq!(system.modified_by.as_deref(), Some("catalog-sync"));
    assert_eq!(store.config().max_batch_size, 1000);
}

// ========== TEST: oversized_batch_is_rejected ==========
#[test]
fn test_oversized_batch_is_rejected() {
    // GIVEN a store limited to two entities per call
    let config = StoreConfig::from_toml_str("max_batch_size = 2").unwrap();
    let store = catalog_store_with(config).unwrap();
    let db = database("sales");
    let batch = [
        db.clone(),
        table("a", &db, &[]),
        table("b", &db, &[]),
    ];

    // WHEN three entities are submitted
    let result = store.create_or_update(&batch, false);

    // THEN nothing is written
    assert_eq!(result.unwrap_err(), StoreError::BatchTooLarge { size: 3, max: 2 });
    assert!(store.get_by_unique_attributes("Database", &db.attributes).is_err());

    // AND two entities pass
    expect()
        .created(2)
        .verify("within limit", &store.create_or_update(&batch[..2], false))
        .unwrap();
}

// ========== TEST: config_errors_surface_as_store_errors ==========
#[test]
fn test_config_errors_surface_as_store_errors() {
    let error = StoreConfig::from_toml_str("max_batch_size = \"many\"").unwrap_err();

    assert!(matches!(error, StoreError::Config { .. }));
    assert!(error.to_string().starts_with("config error: failed to parse config"));
}

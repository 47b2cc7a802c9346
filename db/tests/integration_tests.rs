//! Integration tests for the bookstore-schema-db crate.

use bookstore_schema_core::{SeedSet, SeedValue};
use bookstore_schema_db::{
    DatabaseError, SeedSource, SetupConfig, load_seed_file, seed_fingerprint,
};

const LOOKUPS_YAML: &str = r#"
tables:
  - table: book_language
    key: language_code
    columns: [language_code, language_name]
    rows:
      - [en, English]
      - [de, German]
  - table: shipping_method
    key: method_name
    columns: [method_name, cost]
    rows:
      - [Standard, 5.00]
"#;

#[test]
fn test_config_with_seed_file_loads_file_rows() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("seeds")).unwrap();
    std::fs::write(dir.path().join("seeds/lookups.yaml"), LOOKUPS_YAML).unwrap();
    std::fs::write(
        dir.path().join("setup.yml"),
        "version: \"1.0\"\ndatabase: shop.db\nseed: seeds/lookups.yaml\n",
    )
    .unwrap();

    let config = SetupConfig::load(dir.path().join("setup.yml")).unwrap();
    let loaded = config.seed_loader().load().unwrap();

    assert_eq!(
        loaded.source,
        SeedSource::File(dir.path().join("seeds/lookups.yaml"))
    );
    let languages = loaded.seed.table("book_language").unwrap();
    assert_eq!(languages.rows[1], vec![SeedValue::from("de"), SeedValue::from("German")]);
}

#[test]
fn test_missing_seed_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("setup.yml"),
        "version: \"1.0\"\ndatabase: shop.db\nseed: missing.yaml\n",
    )
    .unwrap();

    let config = SetupConfig::load(dir.path().join("setup.yml")).unwrap();
    let loaded = config.seed_loader().load().unwrap();
    assert_eq!(loaded.source, SeedSource::Defaults);
    assert_eq!(
        seed_fingerprint(&loaded.seed),
        seed_fingerprint(&SeedSet::bookstore_defaults())
    );
}

#[test]
fn test_missing_seed_file_without_fallback_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("setup.yml"),
        "version: \"1.0\"\ndatabase: shop.db\nseed: missing.yaml\nfallback_to_defaults: false\n",
    )
    .unwrap();

    let config = SetupConfig::load(dir.path().join("setup.yml")).unwrap();
    assert!(matches!(
        config.seed_loader().load(),
        Err(DatabaseError::NoSourcesAvailable)
    ));
}

#[test]
fn test_seed_file_fingerprint_differs_from_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lookups.yml");
    std::fs::write(&path, LOOKUPS_YAML).unwrap();

    let seed = load_seed_file(&path).unwrap();
    assert_ne!(
        seed_fingerprint(&seed),
        seed_fingerprint(&SeedSet::bookstore_defaults())
    );
}

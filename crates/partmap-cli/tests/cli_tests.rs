//! Integration tests for the CLI library
//!
//! These tests wire the engine the way the binary does: configuration file,
//! SQLite catalog built from a JSON document, then resolution.

use partmap_cli::commands::{build_engine, catalog};
use partmap_cli::Config;
use partmap_domain::{ExternalReference, MappingStatus};
use std::fs;
use tempfile::TempDir;

const CATALOG: &str = r#"{
    "parts": [{"key": "ZA3232260", "description": "NOZZLE, HEAVY DUTY"}],
    "entities": [
        {"key": "C2001", "display_name": "Indiana Oxygen Company", "street_address": "5 Main St",
         "city": "Indianapolis", "region_code": "IN", "postal_code": "46204"}
    ]
}"#;

#[tokio::test]
async fn test_sqlite_catalog_with_config_overrides() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("catalog.json");
    let db = dir.path().join("catalog.db");
    fs::write(&json, CATALOG).unwrap();
    assert_eq!(catalog::import(&json, &db).unwrap(), 2);

    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[[policy.overrides]]
kind = "parts"
raw = "NOZ-HD"
key = "ZA3232260"
"#,
    )
    .unwrap();
    let config = Config::load(Some(&config_path)).unwrap();

    let engine = build_engine(&config, &db).unwrap();

    let overridden = engine
        .resolve(&ExternalReference::part("noz-hd"), &config.policy)
        .await
        .unwrap();
    assert_eq!(overridden.matched_key(), Some("ZA3232260"));

    let prefixed = engine
        .resolve(&ExternalReference::part("KOI ZA323-2260"), &config.policy)
        .await
        .unwrap();
    assert_eq!(prefixed.status(), MappingStatus::Mapped);
    assert_eq!(prefixed.matched_key(), Some("ZA3232260"));
}

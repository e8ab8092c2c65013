//! Command implementations.

pub mod catalog;
pub mod config;
pub mod correct;
pub mod order;
pub mod resolve;

pub use self::catalog::execute_catalog;
pub use self::config::execute_config;
pub use self::correct::execute_correct;
pub use self::order::execute_order;
pub use self::resolve::{execute_entity, execute_part};

use crate::config::Config;
use crate::error::{CliError, Result};
use partmap_catalog::{open_source, CatalogSnapshot, SnapshotCache};
use partmap_engine::{ConfiguredArbitrator, Normalizer, ResolutionEngine};
use partmap_llm::ConfiguredProvider;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// The engine as wired by the CLI
pub type Engine = ResolutionEngine<Arc<CatalogSnapshot>, ConfiguredArbitrator<ConfiguredProvider>>;

/// Catalog path from the command line, else from the config file
pub fn catalog_path<'a>(cli_path: Option<&'a Path>, config: &'a Config) -> Result<&'a Path> {
    cli_path.or(config.catalog.path.as_deref()).ok_or(CliError::NoCatalog)
}

/// Load the catalog snapshot at `path`
pub fn load_snapshot(path: &Path) -> Result<(String, Arc<CatalogSnapshot>)> {
    let source = open_source(path)?;
    let cache = SnapshotCache::load(&*source)?;
    let snapshot = cache.snapshot()?;
    Ok((source.describe(), snapshot))
}

/// Build the engine from configuration
pub fn build_engine(config: &Config, catalog: &Path) -> Result<Engine> {
    let (source, snapshot) = load_snapshot(catalog)?;
    info!("Loaded catalog {} ({})", source, snapshot.fingerprint().short());

    let arbitrator = ConfiguredArbitrator::from_provider(config.llm.build()?);
    if !arbitrator.is_enabled() {
        info!("No LLM provider configured; ambiguous items go to manual review");
    }

    let normalizer = Normalizer::new(config.normalizer.clone())?;
    Ok(ResolutionEngine::new(snapshot, arbitrator, normalizer))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;
    use tempfile::NamedTempFile;

    pub const CATALOG_JSON: &str = r#"{
        "parts": [
            {"key": "103D72", "description": "TIP, CUTTING SIZE 2"},
            {"key": "28Y05E", "description": "REGULATORS"}
        ],
        "entities": [
            {"key": "C1001", "display_name": "Acme Gas Co.", "street_address": "12 Oak St",
             "city": "Springfield", "region_code": "IL", "postal_code": "62701"},
            {"key": "C1002", "display_name": "Acme Gas Inc", "street_address": "400 Industrial Pkwy",
             "city": "Peoria", "region_code": "IL", "postal_code": "61602"}
        ]
    }"#;

    pub fn catalog_file() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(CATALOG_JSON.as_bytes()).unwrap();
        file
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::catalog_file;
    use super::*;
    use partmap_domain::{ExternalReference, MappingStatus};
    use partmap_engine::PolicyConfig;
    use std::path::PathBuf;

    #[test]
    fn test_catalog_path_precedence() {
        let mut config = Config::default();
        assert!(matches!(catalog_path(None, &config), Err(CliError::NoCatalog)));

        config.catalog.path = Some(PathBuf::from("from-config.json"));
        assert_eq!(catalog_path(None, &config).unwrap(), Path::new("from-config.json"));
        assert_eq!(
            catalog_path(Some(Path::new("cli.json")), &config).unwrap(),
            Path::new("cli.json")
        );
    }

    #[tokio::test]
    async fn test_build_engine_from_json() {
        let file = catalog_file();
        let engine = build_engine(&Config::default(), file.path()).unwrap();
        let result = engine
            .resolve(&ExternalReference::part("103D7-2"), &PolicyConfig::default())
            .await
            .unwrap();
        assert_eq!(result.status(), MappingStatus::Mapped);
    }

    #[test]
    fn test_missing_catalog() {
        let result = build_engine(&Config::default(), Path::new("/nonexistent/catalog.json"));
        assert!(matches!(result, Err(CliError::Catalog(_))));
    }
}

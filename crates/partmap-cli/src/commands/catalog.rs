//! Catalog management commands.

use crate::cli::{CatalogAction, CatalogArgs};
use crate::commands::{catalog_path, load_snapshot};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use partmap_catalog::{CatalogSnapshot, SqliteCatalog};
use std::path::Path;

/// Execute a catalog command.
pub fn execute_catalog(
    args: CatalogArgs,
    cli_catalog: Option<&Path>,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        CatalogAction::Stats => {
            let path = catalog_path(cli_catalog, config)?;
            let (source, snapshot) = load_snapshot(path)?;
            println!(
                "{}",
                formatter.format_catalog_stats(
                    &source,
                    snapshot.parts().len(),
                    snapshot.entities().len(),
                    snapshot.fingerprint().as_str(),
                )?
            );
        }
        CatalogAction::Import { json, db } => {
            let written = import(&json, &db)?;
            println!(
                "{}",
                formatter.success(&format!("Imported {} records into {}", written, db.display()))
            );
        }
    }
    Ok(())
}

/// Load a JSON catalog document into a SQLite database
pub fn import(json: &Path, db: &Path) -> Result<usize> {
    let snapshot = CatalogSnapshot::from_json_file(json)?;
    let mut catalog = SqliteCatalog::open(db)?;
    Ok(catalog.import(&snapshot.to_document())?)
}

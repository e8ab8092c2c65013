//! Partmap Catalog Layer
//!
//! Implements the `CatalogAccessor` trait over an immutable in-memory
//! snapshot, and the sources that snapshots are loaded from.
//!
//! # Architecture
//!
//! - `CatalogSnapshot`: sorted records, exact-key index, containment, prefix and fuzzy search
//! - `SqliteCatalog`: persistent source (SQLite, bundled)
//! - `JsonCatalogFile`: file source for fixtures and small catalogs
//! - `SnapshotCache`: swaps the shared snapshot when the content fingerprint changes
//!
//! # Examples
//!
//! ```
//! use partmap_catalog::CatalogSnapshot;
//! use partmap_domain::traits::CatalogAccessor;
//! use partmap_domain::{CatalogKind, PartRecord};
//!
//! let snapshot = CatalogSnapshot::new(
//!     vec![PartRecord { key: "103D72".to_string(), description: "TIP".to_string() }],
//!     Vec::new(),
//! );
//! let found = snapshot.lookup_exact(CatalogKind::Parts, "103d72").unwrap();
//! assert!(found.is_some());
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod similarity;
pub mod snapshot;
pub mod sqlite;

pub use cache::SnapshotCache;
pub use error::CatalogError;
pub use fingerprint::CatalogFingerprint;
pub use snapshot::{CatalogDocument, CatalogSnapshot};
pub use sqlite::SqliteCatalog;

use std::path::{Path, PathBuf};

/// Anything a catalog snapshot can be loaded from
pub trait SnapshotSource {
    /// Read the full catalog into a new snapshot
    fn load_snapshot(&self) -> Result<CatalogSnapshot, CatalogError>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// A JSON catalog document on disk
#[derive(Debug, Clone)]
pub struct JsonCatalogFile {
    path: PathBuf,
}

impl JsonCatalogFile {
    /// Point at a JSON file; nothing is read until a snapshot is loaded
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SnapshotSource for JsonCatalogFile {
    fn load_snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        CatalogSnapshot::from_json_file(&self.path)
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

/// Open a catalog source by file extension (`.json` or SQLite otherwise)
pub fn open_source<P: AsRef<Path>>(path: P) -> Result<Box<dyn SnapshotSource>, CatalogError> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        if !path.exists() {
            return Err(CatalogError::Unavailable(format!(
                "catalog file not found: {}",
                path.display()
            )));
        }
        Ok(Box::new(JsonCatalogFile::new(path)))
    } else {
        Ok(Box::new(SqliteCatalog::open(path)?))
    }
}

//! Refreshable snapshot cache

use crate::error::CatalogError;
use crate::fingerprint::CatalogFingerprint;
use crate::snapshot::CatalogSnapshot;
use crate::SnapshotSource;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Holds the current catalog snapshot and swaps it on content change
///
/// Readers clone the inner `Arc` and keep using their snapshot for the whole
/// resolution, so a refresh never blocks or disturbs in-flight work.
#[derive(Debug)]
pub struct SnapshotCache {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl SnapshotCache {
    /// Create a cache holding `snapshot`
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Load the initial snapshot from a source
    pub fn load<S: SnapshotSource + ?Sized>(source: &S) -> Result<Self, CatalogError> {
        Ok(Self::new(source.load_snapshot()?))
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        let guard = self
            .current
            .read()
            .map_err(|_| CatalogError::Unavailable("snapshot lock poisoned".to_string()))?;
        Ok(Arc::clone(&guard))
    }

    /// Fingerprint of the current snapshot
    pub fn fingerprint(&self) -> Result<CatalogFingerprint, CatalogError> {
        Ok(self.snapshot()?.fingerprint().clone())
    }

    /// Replace the snapshot if `candidate` has different content
    ///
    /// Returns `true` when the snapshot was swapped.
    pub fn refresh(&self, candidate: CatalogSnapshot) -> Result<bool, CatalogError> {
        let mut guard = self
            .current
            .write()
            .map_err(|_| CatalogError::Unavailable("snapshot lock poisoned".to_string()))?;

        if guard.fingerprint() == candidate.fingerprint() {
            debug!("Catalog unchanged ({}), keeping snapshot", candidate.fingerprint().short());
            return Ok(false);
        }

        info!(
            "Catalog changed ({} -> {}), swapping snapshot",
            guard.fingerprint().short(),
            candidate.fingerprint().short()
        );
        *guard = Arc::new(candidate);
        Ok(true)
    }

    /// Reload from a source and refresh if its content changed
    pub fn refresh_from<S: SnapshotSource + ?Sized>(&self, source: &S) -> Result<bool, CatalogError> {
        self.refresh(source.load_snapshot()?)
    }
}

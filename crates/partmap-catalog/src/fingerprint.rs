//! Content fingerprints for catalog snapshots

use partmap_domain::{EntityRecord, PartRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// blake3 digest of a snapshot's records
///
/// Two snapshots with the same records in any order share a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogFingerprint(String);

impl CatalogFingerprint {
    /// Fingerprint records that are already sorted by key
    pub(crate) fn of_sorted(parts: &[PartRecord], entities: &[EntityRecord]) -> Self {
        let mut hasher = blake3::Hasher::new();

        for part in parts {
            hasher.update(b"P\x1f");
            hasher.update(part.key.as_bytes());
            hasher.update(b"\x1f");
            hasher.update(part.description.as_bytes());
            hasher.update(b"\x1e");
        }

        for entity in entities {
            hasher.update(b"E\x1f");
            for field in [
                &entity.key,
                &entity.display_name,
                &entity.street_address,
                &entity.city,
                &entity.region_code,
                &entity.postal_code,
            ] {
                hasher.update(field.as_bytes());
                hasher.update(b"\x1f");
            }
            hasher.update(b"\x1e");
        }

        Self(hasher.finalize().to_hex().to_string())
    }

    /// Full hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for logs
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for CatalogFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

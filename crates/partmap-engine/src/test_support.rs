//! Shared fixtures for unit tests

use partmap_catalog::CatalogSnapshot;
use partmap_domain::traits::CatalogAccessor;
use partmap_domain::{CanonicalRecord, CatalogKind, Confidence, EntityRecord, PartRecord};

pub fn part(key: &str, description: &str) -> PartRecord {
    PartRecord {
        key: key.to_string(),
        description: description.to_string(),
    }
}

pub fn entity(key: &str, name: &str, street: &str, city: &str, region: &str, postal: &str) -> EntityRecord {
    EntityRecord {
        key: key.to_string(),
        display_name: name.to_string(),
        street_address: street.to_string(),
        city: city.to_string(),
        region_code: region.to_string(),
        postal_code: postal.to_string(),
    }
}

pub fn sample_catalog() -> CatalogSnapshot {
    CatalogSnapshot::new(
        vec![
            part("103D72", "TIP, CUTTING SIZE 2"),
            part("103D71", "TIP, CUTTING SIZE 1"),
            part("ZTIP103D75", "TIP, CUTTING SIZE 5"),
            part("ZA3232260", "NOZZLE, HEAVY DUTY"),
            part("28Y05E", "REGULATORS"),
        ],
        vec![
            entity("C1001", "Acme Gas Co.", "12 Oak St", "Springfield", "IL", "62701"),
            entity("C1002", "Acme Gas Inc", "400 Industrial Pkwy", "Peoria", "IL", "61602"),
            entity("C2001", "Indiana Oxygen Company", "5 Main St", "Indianapolis", "IN", "46204"),
            entity("C3001", "Acme Welding Supply LLC", "77 River Rd", "Dayton", "OH", "45402"),
        ],
    )
}

/// Catalog whose every call fails
pub struct FailingCatalog;

impl CatalogAccessor for FailingCatalog {
    type Error = String;

    fn lookup_exact(&self, _kind: CatalogKind, _key: &str) -> Result<Option<CanonicalRecord>, Self::Error> {
        Err("connection refused".to_string())
    }

    fn search_contains(
        &self,
        _kind: CatalogKind,
        _token: &str,
        _limit: usize,
    ) -> Result<Vec<CanonicalRecord>, Self::Error> {
        Err("connection refused".to_string())
    }

    fn search_prefix(
        &self,
        _kind: CatalogKind,
        _prefix: &str,
        _limit: usize,
    ) -> Result<Vec<CanonicalRecord>, Self::Error> {
        Err("connection refused".to_string())
    }

    fn search_fuzzy(
        &self,
        _kind: CatalogKind,
        _query: &str,
        _cutoff: f64,
        _limit: usize,
    ) -> Result<Vec<(CanonicalRecord, Confidence)>, Self::Error> {
        Err("connection refused".to_string())
    }

    fn len(&self, _kind: CatalogKind) -> Result<usize, Self::Error> {
        Err("connection refused".to_string())
    }
}

//! In-memory catalog snapshot
//!
//! A snapshot is an immutable, sorted copy of both catalogs with an exact-key
//! index and pre-folded search columns. It is built once per load and shared
//! read-only between resolutions.

use crate::error::CatalogError;
use crate::fingerprint::CatalogFingerprint;
use crate::similarity::ratio;
use partmap_domain::traits::CatalogAccessor;
use partmap_domain::{CanonicalRecord, CatalogKind, Confidence, EntityRecord, PartRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Serialized catalog contents (JSON source and import format)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Part records
    #[serde(default)]
    pub parts: Vec<PartRecord>,

    /// Entity records
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
}

/// Immutable in-memory catalog
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    parts: Vec<PartRecord>,
    entities: Vec<EntityRecord>,
    part_index: HashMap<String, usize>,
    entity_index: HashMap<String, usize>,
    // folded (key, description) per part
    part_search: Vec<(String, String)>,
    // folded (key, display name) per entity
    entity_search: Vec<(String, String)>,
    fingerprint: CatalogFingerprint,
}

impl CatalogSnapshot {
    /// Build a snapshot from raw records
    ///
    /// Records are sorted by key. Records with an empty key are dropped, and
    /// for duplicate keys (compared case-insensitively) the first wins.
    pub fn new(parts: Vec<PartRecord>, entities: Vec<EntityRecord>) -> Self {
        let parts = dedup_by_key(parts, |p| &p.key, CatalogKind::Parts);
        let entities = dedup_by_key(entities, |e| &e.key, CatalogKind::Entities);

        let part_index = parts
            .iter()
            .enumerate()
            .map(|(i, p)| (fold(&p.key), i))
            .collect();
        let entity_index = entities
            .iter()
            .enumerate()
            .map(|(i, e)| (fold(&e.key), i))
            .collect();

        let part_search = parts
            .iter()
            .map(|p| (fold(&p.key), fold(&p.description)))
            .collect();
        let entity_search = entities
            .iter()
            .map(|e| (fold(&e.key), fold(&e.display_name)))
            .collect();

        let fingerprint = CatalogFingerprint::of_sorted(&parts, &entities);

        debug!(
            "Built catalog snapshot: {} parts, {} entities, fingerprint {}",
            parts.len(),
            entities.len(),
            fingerprint.short()
        );

        Self {
            parts,
            entities,
            part_index,
            entity_index,
            part_search,
            entity_search,
            fingerprint,
        }
    }

    /// Build an empty snapshot
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Build a snapshot from a catalog document
    pub fn from_document(document: CatalogDocument) -> Self {
        Self::new(document.parts, document.entities)
    }

    /// Parse a JSON catalog document
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(document))
    }

    /// Load a JSON catalog document from disk
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Copy the contents back out as a document
    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            parts: self.parts.clone(),
            entities: self.entities.clone(),
        }
    }

    /// Content fingerprint
    pub fn fingerprint(&self) -> &CatalogFingerprint {
        &self.fingerprint
    }

    /// All part records, sorted by key
    pub fn parts(&self) -> &[PartRecord] {
        &self.parts
    }

    /// All entity records, sorted by key
    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    fn part_record(&self, idx: usize) -> CanonicalRecord {
        CanonicalRecord::Part(self.parts[idx].clone())
    }

    fn entity_record(&self, idx: usize) -> CanonicalRecord {
        CanonicalRecord::Entity(self.entities[idx].clone())
    }

    fn record(&self, kind: CatalogKind, idx: usize) -> CanonicalRecord {
        match kind {
            CatalogKind::Parts => self.part_record(idx),
            CatalogKind::Entities => self.entity_record(idx),
        }
    }

    /// Folded (key, searchable text) columns for a catalog
    fn search_columns(&self, kind: CatalogKind) -> &[(String, String)] {
        match kind {
            CatalogKind::Parts => &self.part_search,
            CatalogKind::Entities => &self.entity_search,
        }
    }
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl CatalogAccessor for CatalogSnapshot {
    type Error = CatalogError;

    fn lookup_exact(&self, kind: CatalogKind, key: &str) -> Result<Option<CanonicalRecord>, Self::Error> {
        let folded = fold(key);
        let idx = match kind {
            CatalogKind::Parts => self.part_index.get(&folded),
            CatalogKind::Entities => self.entity_index.get(&folded),
        };
        Ok(idx.map(|&i| self.record(kind, i)))
    }

    fn search_contains(
        &self,
        kind: CatalogKind,
        token: &str,
        limit: usize,
    ) -> Result<Vec<CanonicalRecord>, Self::Error> {
        let token = fold(token);
        if token.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .search_columns(kind)
            .iter()
            .enumerate()
            .filter(|(_, (key, text))| key.contains(&token) || text.contains(&token))
            .take(limit)
            .map(|(i, _)| self.record(kind, i))
            .collect())
    }

    fn search_prefix(
        &self,
        kind: CatalogKind,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<CanonicalRecord>, Self::Error> {
        let prefix = fold(prefix);
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .search_columns(kind)
            .iter()
            .enumerate()
            .filter(|(_, (key, _))| key.starts_with(&prefix))
            .take(limit)
            .map(|(i, _)| self.record(kind, i))
            .collect())
    }

    fn search_fuzzy(
        &self,
        kind: CatalogKind,
        query: &str,
        cutoff: f64,
        limit: usize,
    ) -> Result<Vec<(CanonicalRecord, Confidence)>, Self::Error> {
        let query = fold(query);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f64)> = self
            .search_columns(kind)
            .iter()
            .enumerate()
            .map(|(i, (key, text))| {
                let target = match kind {
                    CatalogKind::Parts => key,
                    CatalogKind::Entities => text,
                };
                (i, ratio(&query, target))
            })
            .filter(|(_, score)| *score >= cutoff)
            .collect();

        // records are key-sorted, so index order breaks score ties by key
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(i, score)| (self.record(kind, i), Confidence::new(score)))
            .collect())
    }

    fn len(&self, kind: CatalogKind) -> Result<usize, Self::Error> {
        Ok(match kind {
            CatalogKind::Parts => self.parts.len(),
            CatalogKind::Entities => self.entities.len(),
        })
    }
}

/// Uppercase, trim, collapse internal whitespace
pub(crate) fn fold(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

fn dedup_by_key<T>(mut records: Vec<T>, key: impl Fn(&T) -> &String, kind: CatalogKind) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    records.retain(|r| {
        let k = fold(key(r));
        if k.is_empty() {
            warn!("Dropping {} record with empty key", kind);
            return false;
        }
        if !seen.insert(k) {
            warn!("Dropping duplicate {} key '{}'", kind, key(r));
            return false;
        }
        true
    });
    records.sort_by(|a, b| fold(key(a)).cmp(&fold(key(b))));
    records
}

//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::arbitration::{ArbitrationRequest, ArbitrationVerdict};
use crate::confidence::Confidence;
use crate::record::CanonicalRecord;
use crate::reference::CatalogKind;
use std::fmt::Display;
use std::future::Future;

/// Read access to a reference catalog
///
/// Implemented by the infrastructure layer (partmap-catalog). All searches
/// return records in a deterministic order.
pub trait CatalogAccessor {
    /// Error type for catalog operations
    type Error: Display;

    /// Look up a record by its exact key (case-insensitive)
    fn lookup_exact(&self, kind: CatalogKind, key: &str) -> Result<Option<CanonicalRecord>, Self::Error>;

    /// Records whose key, description or name contains `token` (case-insensitive)
    fn search_contains(
        &self,
        kind: CatalogKind,
        token: &str,
        limit: usize,
    ) -> Result<Vec<CanonicalRecord>, Self::Error>;

    /// Records whose key starts with `prefix` (case-insensitive)
    fn search_prefix(
        &self,
        kind: CatalogKind,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<CanonicalRecord>, Self::Error>;

    /// Whole-catalog edit-distance search
    ///
    /// Parts compare against keys, entities against display names. Only
    /// scores at or above `cutoff` are returned, best first.
    fn search_fuzzy(
        &self,
        kind: CatalogKind,
        query: &str,
        cutoff: f64,
        limit: usize,
    ) -> Result<Vec<(CanonicalRecord, Confidence)>, Self::Error>;

    /// Number of records in a catalog
    fn len(&self, kind: CatalogKind) -> Result<usize, Self::Error>;

    /// Whether a catalog has no records
    fn is_empty(&self, kind: CatalogKind) -> Result<bool, Self::Error> {
        Ok(self.len(kind)? == 0)
    }
}

impl<T: CatalogAccessor + ?Sized> CatalogAccessor for std::sync::Arc<T> {
    type Error = T::Error;

    fn lookup_exact(&self, kind: CatalogKind, key: &str) -> Result<Option<CanonicalRecord>, Self::Error> {
        (**self).lookup_exact(kind, key)
    }

    fn search_contains(
        &self,
        kind: CatalogKind,
        token: &str,
        limit: usize,
    ) -> Result<Vec<CanonicalRecord>, Self::Error> {
        (**self).search_contains(kind, token, limit)
    }

    fn search_prefix(
        &self,
        kind: CatalogKind,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<CanonicalRecord>, Self::Error> {
        (**self).search_prefix(kind, prefix, limit)
    }

    fn search_fuzzy(
        &self,
        kind: CatalogKind,
        query: &str,
        cutoff: f64,
        limit: usize,
    ) -> Result<Vec<(CanonicalRecord, Confidence)>, Self::Error> {
        (**self).search_fuzzy(kind, query, cutoff, limit)
    }

    fn len(&self, kind: CatalogKind) -> Result<usize, Self::Error> {
        (**self).len(kind)
    }
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (partmap-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error: Display;

    /// Generate a text completion
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}

/// Natural-language arbitrator consulted when scoring is inconclusive
///
/// Implemented by the application layer (partmap-engine). Calls must be
/// side-effect-free from the engine's perspective.
pub trait Arbitrator {
    /// Error type for arbitration failures
    type Error: Display;

    /// Choose among a shortlist of candidates
    fn arbitrate(
        &self,
        request: &ArbitrationRequest,
    ) -> impl Future<Output = Result<ArbitrationVerdict, Self::Error>> + Send;
}

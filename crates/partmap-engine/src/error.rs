//! Error types for the resolution engine

use std::time::Duration;
use thiserror::Error;

/// Errors that end a resolution call
///
/// Missing or ambiguous matches are not errors; they come back as
/// `NotFound` or `ManualReview` results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The catalog could not be queried; fatal for the call, never retried
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Policy, batch or normalizer configuration is invalid; raised at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Reasons an arbitration call produced no usable verdict
///
/// Always recovered inside the engine: the resolution falls back to the
/// top-ranked scored candidate and routes it to manual review.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArbitrationError {
    /// No answer within the configured timeout
    #[error("Arbitration timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the resolution
    #[error("Arbitration cancelled")]
    Cancelled,

    /// The LLM provider failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// The answer could not be parsed
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The pick is not on the shortlist
    #[error("Pick '{0}' is not on the shortlist")]
    UnknownPick(String),

    /// No arbitrator is configured
    #[error("Arbitrator unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for ArbitrationError {
    fn from(e: serde_json::Error) -> Self {
        ArbitrationError::Malformed(e.to_string())
    }
}

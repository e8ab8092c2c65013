//! Catalog error types

use thiserror::Error;

/// Errors that can occur while loading or reading a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON document error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Catalog cannot be read at all
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

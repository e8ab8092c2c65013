//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Engine error
    #[error("Engine error: {0}")]
    Engine(#[from] partmap_engine::EngineError),

    /// Catalog error
    #[error("Catalog error: {0}")]
    Catalog(#[from] partmap_catalog::CatalogError),

    /// LLM provider error
    #[error("LLM provider error: {0}")]
    Llm(#[from] partmap_llm::LlmError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No catalog given on the command line or in the configuration
    #[error("No catalog configured. Pass --catalog or set [catalog] path in the config file.")]
    NoCatalog,
}

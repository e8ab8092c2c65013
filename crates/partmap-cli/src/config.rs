//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use partmap_engine::{BatchConfig, NormalizerRules, PolicyConfig};
use partmap_llm::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration, one table per concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Output settings
    #[serde(default)]
    pub settings: Settings,

    /// Catalog location
    #[serde(default)]
    pub catalog: CatalogSettings,

    /// Thresholds and rules
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Normalization tables
    #[serde(default)]
    pub normalizer: NormalizerRules,

    /// Arbitration backend
    #[serde(default)]
    pub llm: ProviderConfig,

    /// Worker pool
    #[serde(default)]
    pub batch: BatchConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Where the catalog lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// JSON document or SQLite database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_level")]
    pub level: String,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".partmap").join("config.toml"))
    }

    /// Load configuration from `path`, or the default location.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::path()?,
        };

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            Self::from_toml(&contents)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.policy
            .validate()
            .map_err(|e| CliError::Config(format!("[policy] {}", e)))?;
        self.llm.validate().map_err(|e| CliError::Config(format!("[llm] {}", e)))?;
        self.batch
            .validate()
            .map_err(|e| CliError::Config(format!("[batch] {}", e)))?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_level() }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use partmap_llm::ProviderKind;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.color);
        assert_eq!(config.llm.provider, ProviderKind::None);
        assert_eq!(config.batch.max_concurrency, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml(
            r#"
[catalog]
path = "catalog.json"

[policy]
auto_accept_floor = 97.0

[llm]
provider = "ollama"
model = "llama3"
"#,
        )
        .unwrap();
        assert_eq!(config.catalog.path, Some(PathBuf::from("catalog.json")));
        assert_eq!(config.policy.auto_accept_floor, 97.0);
        assert_eq!(config.policy.arbitration_floor, 70.0);
        assert_eq!(config.llm.provider, ProviderKind::Ollama);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_invalid_section_reported() {
        let result = Config::from_toml("[batch]\nmax_concurrency = 0\n");
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.starts_with("[batch]")));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.settings.format = OutputFormat::Json;
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(loaded, Config::default());
    }
}

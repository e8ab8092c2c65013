//! Provider configuration

use crate::{LlmError, MockProvider, OllamaProvider, OpenAiProvider};
use partmap_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// No provider; arbitration is always unavailable
    None,
    /// Local Ollama server
    Ollama,
    /// OpenAI-compatible chat completions
    OpenAi,
    /// Canned responses (development only)
    Mock,
}

/// LLM provider configuration (`[llm]` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Backend
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,

    /// API endpoint; the backend default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed reply for the mock backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_response: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: None,
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            mock_response: None,
        }
    }
}

impl ProviderConfig {
    /// Request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.provider != ProviderKind::None && self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("max_retries must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Build the configured provider, or `None` when disabled
    ///
    /// The OpenAI backend reads its key from `api_key_env` at build time.
    pub fn build(&self) -> Result<Option<ConfiguredProvider>, LlmError> {
        self.validate().map_err(LlmError::Config)?;

        let provider = match self.provider {
            ProviderKind::None => return Ok(None),
            ProviderKind::Mock => ConfiguredProvider::Mock(MockProvider::new(
                self.mock_response.clone().unwrap_or_else(|| "{}".to_string()),
            )),
            ProviderKind::Ollama => {
                let endpoint = self
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| crate::ollama::DEFAULT_ENDPOINT.to_string());
                ConfiguredProvider::Ollama(
                    OllamaProvider::with_timeout(endpoint, &self.model, self.timeout())?
                        .with_max_retries(self.max_retries),
                )
            }
            ProviderKind::OpenAi => {
                let api_key = std::env::var(&self.api_key_env).map_err(|_| {
                    LlmError::Config(format!("environment variable {} is not set", self.api_key_env))
                })?;
                let endpoint = self
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| crate::openai::DEFAULT_ENDPOINT.to_string());
                ConfiguredProvider::OpenAi(
                    OpenAiProvider::new(endpoint, &self.model, api_key, self.timeout())?
                        .with_max_retries(self.max_retries),
                )
            }
        };

        Ok(Some(provider))
    }
}

/// A provider chosen at runtime from configuration
pub enum ConfiguredProvider {
    /// Ollama backend
    Ollama(OllamaProvider),
    /// OpenAI-compatible backend
    OpenAi(OpenAiProvider),
    /// Mock backend
    Mock(MockProvider),
}

impl LlmProviderTrait for ConfiguredProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        match self {
            ConfiguredProvider::Ollama(p) => p.generate(prompt).await,
            ConfiguredProvider::OpenAi(p) => p.generate(prompt).await,
            ConfiguredProvider::Mock(p) => p.generate(prompt).await,
        }
    }

    fn model_name(&self) -> &str {
        match self {
            ConfiguredProvider::Ollama(p) => p.model_name(),
            ConfiguredProvider::OpenAi(p) => p.model_name(),
            ConfiguredProvider::Mock(p) => p.model_name(),
        }
    }
}

fn default_provider() -> ProviderKind {
    ProviderKind::None
}

fn default_model() -> String {
    crate::openai::DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

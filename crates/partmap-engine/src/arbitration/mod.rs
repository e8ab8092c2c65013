//! Arbitrators consulted when scoring alone cannot decide
//!
//! - `LlmArbitrator`: prompts an [`LlmProvider`] and parses its JSON verdict
//! - `NoArbitrator`: always unavailable, so every ambiguous case goes to review
//! - `ConfiguredArbitrator`: one of the two, chosen from configuration

pub mod parser;
pub mod prompt;

pub use parser::parse_verdict;
pub use prompt::ArbitrationPrompt;

use crate::error::ArbitrationError;
use partmap_domain::traits::{Arbitrator, LlmProvider};
use partmap_domain::{ArbitrationRequest, ArbitrationVerdict};
use tracing::debug;

/// Arbitrates through a language model
pub struct LlmArbitrator<P> {
    provider: P,
}

impl<P> LlmArbitrator<P> {
    /// Wrap a provider
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: LlmProvider + Sync> Arbitrator for LlmArbitrator<P> {
    type Error = ArbitrationError;

    async fn arbitrate(&self, request: &ArbitrationRequest) -> Result<ArbitrationVerdict, Self::Error> {
        let prompt = ArbitrationPrompt::new(request).build();
        debug!(
            "Arbitrating '{}' over {} candidates with {}",
            request.query_text,
            request.candidates.len(),
            self.provider.model_name()
        );

        let response = self
            .provider
            .generate(&prompt)
            .await
            .map_err(|e| ArbitrationError::Provider(e.to_string()))?;

        parse_verdict(&response, request)
    }
}

/// Arbitrator used when no model is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArbitrator;

impl Arbitrator for NoArbitrator {
    type Error = ArbitrationError;

    async fn arbitrate(&self, _request: &ArbitrationRequest) -> Result<ArbitrationVerdict, Self::Error> {
        Err(ArbitrationError::Unavailable("no arbitrator configured".to_string()))
    }
}

/// Either an LLM arbitrator or none, decided at startup
pub enum ConfiguredArbitrator<P> {
    /// Model-backed arbitration
    Llm(LlmArbitrator<P>),
    /// Arbitration disabled
    Disabled(NoArbitrator),
}

impl<P> ConfiguredArbitrator<P> {
    /// Arbitrate with `provider`, or disable arbitration when there is none
    pub fn from_provider(provider: Option<P>) -> Self {
        match provider {
            Some(provider) => ConfiguredArbitrator::Llm(LlmArbitrator::new(provider)),
            None => ConfiguredArbitrator::Disabled(NoArbitrator),
        }
    }

    /// Whether a model is behind this arbitrator
    pub fn is_enabled(&self) -> bool {
        matches!(self, ConfiguredArbitrator::Llm(_))
    }
}

impl<P: LlmProvider + Sync> Arbitrator for ConfiguredArbitrator<P> {
    type Error = ArbitrationError;

    async fn arbitrate(&self, request: &ArbitrationRequest) -> Result<ArbitrationVerdict, Self::Error> {
        match self {
            ConfiguredArbitrator::Llm(arbitrator) => arbitrator.arbitrate(request).await,
            ConfiguredArbitrator::Disabled(arbitrator) => arbitrator.arbitrate(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partmap_domain::{ArbitrationCandidate, ArbitrationMode, CatalogKind, Confidence};
    use partmap_llm::MockProvider;

    fn request() -> ArbitrationRequest {
        ArbitrationRequest {
            kind: CatalogKind::Parts,
            query_text: "103D7".to_string(),
            context_text: Some("TIP, CUTTING".to_string()),
            candidates: vec![
                ArbitrationCandidate {
                    key: "103D71".to_string(),
                    display_text: "103D71 (TIP, CUTTING SIZE 1)".to_string(),
                    score: Confidence::new(83.0),
                },
                ArbitrationCandidate {
                    key: "103D72".to_string(),
                    display_text: "103D72 (TIP, CUTTING SIZE 2)".to_string(),
                    score: Confidence::new(83.0),
                },
            ],
            mode: ArbitrationMode::BestMatch,
        }
    }

    #[tokio::test]
    async fn test_llm_arbitrator_pick() {
        let provider = MockProvider::new(r#"{"best_match": "103D72", "confidence": 96, "reasoning": "size 2"}"#);
        let arbitrator = LlmArbitrator::new(provider);
        let verdict = arbitrator.arbitrate(&request()).await.unwrap();
        assert_eq!(verdict.pick_key.as_deref(), Some("103D72"));
        assert_eq!(arbitrator.provider().call_count(), 1);
        assert!(arbitrator.provider().prompts()[0].contains("2. key: 103D72"));
    }

    #[tokio::test]
    async fn test_llm_arbitrator_provider_error() {
        let mut provider = MockProvider::new("unused");
        provider.add_error("103D7");
        let result = LlmArbitrator::new(provider).arbitrate(&request()).await;
        assert!(matches!(result, Err(ArbitrationError::Provider(_))));
    }

    #[tokio::test]
    async fn test_llm_arbitrator_malformed() {
        let arbitrator = LlmArbitrator::new(MockProvider::new("not json at all"));
        let result = arbitrator.arbitrate(&request()).await;
        assert!(matches!(result, Err(ArbitrationError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_no_arbitrator() {
        let result = NoArbitrator.arbitrate(&request()).await;
        assert!(matches!(result, Err(ArbitrationError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_configured_arbitrator() {
        let disabled = ConfiguredArbitrator::<MockProvider>::from_provider(None);
        assert!(!disabled.is_enabled());
        assert!(disabled.arbitrate(&request()).await.is_err());

        let enabled = ConfiguredArbitrator::from_provider(Some(MockProvider::new(
            r#"{"best_match": null, "confidence": 10}"#,
        )));
        assert!(enabled.is_enabled());
        assert_eq!(enabled.arbitrate(&request()).await.unwrap().pick_key, None);
    }
}

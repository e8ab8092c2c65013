//! Batch resolution over a bounded worker pool
//!
//! References fan out as tokio tasks gated by a semaphore. Every task owns
//! its stats accumulator; the batch merges them once all tasks are joined.

use crate::cancel::CancelToken;
use crate::config::PolicyConfig;
use crate::error::{ArbitrationError, EngineError};
use crate::resolver::ResolutionEngine;
use crate::stats::ResolutionStats;
use partmap_domain::traits::{Arbitrator, CatalogAccessor};
use partmap_domain::{ExternalReference, MappingResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

/// Worker pool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Resolutions running at the same time
    pub max_concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_concurrency: 4 }
    }
}

impl BatchConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Outcome for one reference in a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchEntry {
    /// The engine produced a result
    Resolved {
        /// The mapping result
        result: MappingResult,
    },
    /// The engine returned an error
    Failed {
        /// Error message
        error: String,
    },
    /// Cancelled before it started
    Cancelled,
}

impl BatchEntry {
    /// The mapping result, if resolved
    pub fn result(&self) -> Option<&MappingResult> {
        match self {
            BatchEntry::Resolved { result } => Some(result),
            _ => None,
        }
    }
}

/// Results of one batch, in input order
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Batch identifier
    pub id: Uuid,
    /// One entry per input reference
    pub entries: Vec<BatchEntry>,
    /// Merged statistics
    pub stats: ResolutionStats,
}

impl BatchReport {
    /// Number of entries that failed with an engine error
    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, BatchEntry::Failed { .. }))
            .count()
    }
}

/// Resolves many references against a shared engine
pub struct BatchResolver<C, A> {
    engine: Arc<ResolutionEngine<C, A>>,
    policy: Arc<PolicyConfig>,
    config: BatchConfig,
}

impl<C, A> BatchResolver<C, A>
where
    C: CatalogAccessor + Send + Sync + 'static,
    A: Arbitrator + Send + Sync + 'static,
    A::Error: Into<ArbitrationError>,
{
    /// Create a batch resolver; both configurations are validated up front
    pub fn new(
        engine: Arc<ResolutionEngine<C, A>>,
        policy: PolicyConfig,
        config: BatchConfig,
    ) -> Result<Self, EngineError> {
        policy.validate().map_err(EngineError::InvalidConfig)?;
        config.validate().map_err(EngineError::InvalidConfig)?;
        Ok(Self {
            engine,
            policy: Arc::new(policy),
            config,
        })
    }

    /// The shared engine
    pub fn engine(&self) -> &ResolutionEngine<C, A> {
        &self.engine
    }

    /// The policy applied to every reference
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Resolve `references`; results line up with the input
    pub async fn run(&self, references: Vec<ExternalReference>, cancel: CancelToken) -> BatchReport {
        let id = Uuid::now_v7();
        let total = references.len();
        info!(
            "Batch {} started: {} references, concurrency {}",
            id, total, self.config.max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut tasks = JoinSet::new();

        for (index, reference) in references.into_iter().enumerate() {
            let engine = Arc::clone(&self.engine);
            let policy = Arc::clone(&self.policy);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let mut stats = ResolutionStats::new();

                let permit = tokio::select! {
                    permit = semaphore.acquire_owned() => permit.ok(),
                    _ = cancel.cancelled() => None,
                };
                let Some(_permit) = permit else {
                    stats.record_cancellation();
                    return (index, BatchEntry::Cancelled, stats);
                };
                if cancel.is_cancelled() {
                    stats.record_cancellation();
                    return (index, BatchEntry::Cancelled, stats);
                }

                let entry = match engine
                    .resolve_cancellable(&reference, &policy, &mut stats, &cancel)
                    .await
                {
                    Ok(result) => BatchEntry::Resolved { result },
                    Err(e) => {
                        warn!("Failed to resolve '{}': {}", reference.primary_text(), e);
                        BatchEntry::Failed { error: e.to_string() }
                    }
                };
                (index, entry, stats)
            });
        }

        let mut slots: Vec<Option<BatchEntry>> = vec![None; total];
        let mut stats = ResolutionStats::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, entry, task_stats)) => {
                    stats.merge(&task_stats);
                    slots[index] = Some(entry);
                }
                Err(e) => warn!("Batch task aborted: {}", e),
            }
        }

        let entries: Vec<BatchEntry> = slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| BatchEntry::Failed {
                    error: "resolution task aborted".to_string(),
                })
            })
            .collect();

        info!(
            "Batch {} finished: {} mapped, {} for review, {} not found, {} cancelled",
            id, stats.mapped, stats.manual_review, stats.not_found, stats.cancelled
        );

        BatchReport { id, entries, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitration::{LlmArbitrator, NoArbitrator};
    use crate::cancel::cancellation;
    use crate::normalizer::Normalizer;
    use crate::test_support::{sample_catalog, FailingCatalog};
    use partmap_domain::MappingStatus;
    use partmap_llm::MockProvider;
    use std::time::Duration;

    #[test]
    fn test_batch_config_validation() {
        assert!(BatchConfig::default().validate().is_ok());
        assert!(BatchConfig { max_concurrency: 0 }.validate().is_err());
    }

    #[tokio::test]
    async fn test_results_in_input_order() {
        let engine = Arc::new(ResolutionEngine::new(
            sample_catalog(),
            NoArbitrator,
            Normalizer::with_defaults().unwrap(),
        ));
        let batch = BatchResolver::new(engine, PolicyConfig::default(), BatchConfig { max_concurrency: 2 }).unwrap();

        let references = vec![
            ExternalReference::part("103D72"),
            ExternalReference::part("QQQQQQQQQQ"),
            ExternalReference::part("103D7-2"),
            ExternalReference::entity("C2001", None),
        ];
        let report = batch.run(references, CancelToken::never()).await;

        let keys: Vec<Option<&str>> = report
            .entries
            .iter()
            .map(|e| e.result().and_then(MappingResult::matched_key))
            .collect();
        assert_eq!(keys, vec![Some("103D72"), None, Some("103D72"), Some("C2001")]);
        assert_eq!(report.stats.processed, 4);
        assert_eq!(report.stats.mapped, 3);
        assert_eq!(report.stats.not_found, 1);
    }

    #[tokio::test]
    async fn test_cancelled_batch() {
        let provider = MockProvider::new(r#"{"best_match": "28Y05E", "confidence": 99}"#)
            .with_delay(Duration::from_secs(5));
        let engine = Arc::new(ResolutionEngine::new(
            sample_catalog(),
            LlmArbitrator::new(provider),
            Normalizer::with_defaults().unwrap(),
        ));
        let batch = BatchResolver::new(engine, PolicyConfig::default(), BatchConfig { max_concurrency: 1 }).unwrap();
        let references = vec![ExternalReference::part("28Y05F"); 3];

        let (handle, token) = cancellation();
        let run = batch.run(references, token);
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            handle.cancel();
        };
        let (report, _) = tokio::join!(run, canceller);

        assert_eq!(report.entries.len(), 3);
        let reviewed = report
            .entries
            .iter()
            .filter_map(BatchEntry::result)
            .filter(|r| r.status() == MappingStatus::ManualReview)
            .count();
        let cancelled = report
            .entries
            .iter()
            .filter(|e| matches!(e, BatchEntry::Cancelled))
            .count();
        assert_eq!(reviewed + cancelled, 3);
        assert!(cancelled >= 1);
        assert_eq!(report.stats.cancelled, cancelled);
    }

    #[tokio::test]
    async fn test_catalog_failure_is_reported_per_entry() {
        let engine = Arc::new(ResolutionEngine::new(
            FailingCatalog,
            NoArbitrator,
            Normalizer::with_defaults().unwrap(),
        ));
        let batch = BatchResolver::new(engine, PolicyConfig::default(), BatchConfig::default()).unwrap();
        let report = batch
            .run(vec![ExternalReference::part("103D72")], CancelToken::never())
            .await;
        assert_eq!(report.failures(), 1);
        assert_eq!(report.stats.processed, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let engine = Arc::new(ResolutionEngine::new(
            sample_catalog(),
            NoArbitrator,
            Normalizer::with_defaults().unwrap(),
        ));
        let result = BatchResolver::new(engine, PolicyConfig::default(), BatchConfig { max_concurrency: 0 });
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_entry_serialization() {
        let json = serde_json::to_value(BatchEntry::Cancelled).unwrap();
        assert_eq!(json["outcome"], "cancelled");
        let json = serde_json::to_value(BatchEntry::Failed { error: "x".to_string() }).unwrap();
        assert_eq!(json["outcome"], "failed");
    }
}

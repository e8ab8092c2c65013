//! The resolution engine
//!
//! Runs one reference through generation, scoring, disambiguation and
//! arbitration, and always ends in exactly one [`MappingResult`].

use crate::cancel::CancelToken;
use crate::config::PolicyConfig;
use crate::disambiguator::{Disambiguation, Disambiguator};
use crate::error::{ArbitrationError, EngineError};
use crate::generator::CandidateGenerator;
use crate::normalizer::Normalizer;
use crate::policy::{Decision, ResolutionPolicy, ResolutionState};
use crate::scorer::{ScoredCandidate, Scorer};
use crate::stats::ResolutionStats;
use partmap_domain::traits::{Arbitrator, CatalogAccessor};
use partmap_domain::{ArbitrationMode, ArbitrationRequest, ArbitrationVerdict, ExternalReference, MappingResult};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Maps external references onto catalog records
///
/// Shared read-only between concurrent resolutions; wrap it in an `Arc` for
/// batch work.
pub struct ResolutionEngine<C, A> {
    catalog: C,
    arbitrator: A,
    normalizer: Normalizer,
}

impl<C, A> ResolutionEngine<C, A>
where
    C: CatalogAccessor,
    A: Arbitrator,
    A::Error: Into<ArbitrationError>,
{
    /// Create an engine
    pub fn new(catalog: C, arbitrator: A, normalizer: Normalizer) -> Self {
        Self {
            catalog,
            arbitrator,
            normalizer,
        }
    }

    /// The catalog being resolved against
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// The normalizer in use
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Resolve one reference
    ///
    /// `policy` is expected to have passed [`PolicyConfig::validate`], as
    /// [`BatchResolver::new`](crate::BatchResolver::new) and config loading
    /// check. Only a catalog failure is an error; every other
    /// outcome, including a failed arbitration, comes back as a result.
    pub async fn resolve(
        &self,
        reference: &ExternalReference,
        policy: &PolicyConfig,
    ) -> Result<MappingResult, EngineError> {
        let mut stats = ResolutionStats::new();
        self.resolve_with_stats(reference, policy, &mut stats).await
    }

    /// Resolve one reference, recording into `stats`
    pub async fn resolve_with_stats(
        &self,
        reference: &ExternalReference,
        policy: &PolicyConfig,
        stats: &mut ResolutionStats,
    ) -> Result<MappingResult, EngineError> {
        self.resolve_cancellable(reference, policy, stats, &CancelToken::never())
            .await
    }

    /// Resolve one reference; cancelling makes a pending arbitration fail
    pub async fn resolve_cancellable(
        &self,
        reference: &ExternalReference,
        policy: &PolicyConfig,
        stats: &mut ResolutionStats,
        cancel: &CancelToken,
    ) -> Result<MappingResult, EngineError> {
        let rules = ResolutionPolicy::new(policy);

        if let Some(rule) = policy.exclusion_for(reference) {
            debug!("'{}' excluded by rule '{}'", reference.primary_text(), rule.contains);
            stats.record_exclusion();
            return Ok(finish(stats, rules.excluded(rule)));
        }

        if let Some(rule) = policy.override_for(reference) {
            debug!("'{}' overridden to {}", reference.primary_text(), rule.key);
            return Ok(finish(stats, rules.overridden(rule)));
        }

        let candidates = CandidateGenerator::new(&self.catalog, &self.normalizer, policy).generate(reference)?;
        trace_state(ResolutionState::Generated, reference, candidates.len());

        let mut scored = Scorer::new(policy).score(candidates);
        trace_state(ResolutionState::Scored, reference, scored.len());

        if let ExternalReference::Entity(entity) = reference {
            let outcome = Disambiguator::new(&self.normalizer, policy).disambiguate(entity, scored);
            scored = outcome.candidates;
            if outcome.disposition != Disambiguation::NotNeeded {
                trace_state(ResolutionState::Disambiguated, reference, scored.len());
            }
            if outcome.disposition == Disambiguation::Rejected {
                return Ok(finish(stats, rules.rejected(&scored, &outcome.group)));
            }
        }

        let (shortlist, mode) = match rules.triage(reference.kind(), &scored) {
            Decision::Accept => {
                let result = rules
                    .accept(&scored)
                    .unwrap_or_else(|| rules.below_floor(reference.kind(), &scored));
                return Ok(finish(stats, result));
            }
            Decision::BelowFloor => return Ok(finish(stats, rules.below_floor(reference.kind(), &scored))),
            Decision::BreakTie(mode) => (rules.tied(&scored), mode),
            Decision::Arbitrate => (rules.shortlist(&scored), ArbitrationMode::BestMatch),
        };

        let verdict = self.arbitrate(reference, &shortlist, mode, policy, cancel).await;
        stats.record_arbitration(verdict.is_err());
        if let Err(e) = &verdict {
            warn!("Arbitration for '{}' failed: {}", reference.primary_text(), e);
        }
        trace_state(ResolutionState::Arbitrated, reference, shortlist.len());
        let result = rules.after_arbitration(&shortlist, verdict);

        Ok(finish(stats, result))
    }

    /// Operator-supplied mapping; never re-scored
    pub fn apply_manual_correction(&self, key: impl Into<String>) -> MappingResult {
        let key = key.into();
        info!("Manual correction applied: {}", key);
        MappingResult::manual_correction(key)
    }

    async fn arbitrate(
        &self,
        reference: &ExternalReference,
        shortlist: &[ScoredCandidate],
        mode: ArbitrationMode,
        policy: &PolicyConfig,
        cancel: &CancelToken,
    ) -> Result<ArbitrationVerdict, ArbitrationError> {
        if cancel.is_cancelled() {
            return Err(ArbitrationError::Cancelled);
        }

        let request = ArbitrationRequest {
            kind: reference.kind(),
            query_text: reference.primary_text().to_string(),
            context_text: reference.context_text().map(str::to_string),
            candidates: shortlist.iter().map(ScoredCandidate::arbitration_candidate).collect(),
            mode,
        };

        let limit = policy.arbitration_timeout();
        let outcome = tokio::select! {
            outcome = timeout(limit, self.arbitrator.arbitrate(&request)) => outcome,
            _ = cancel.cancelled() => return Err(ArbitrationError::Cancelled),
        };

        let verdict = outcome
            .map_err(|_| ArbitrationError::Timeout(limit))?
            .map_err(Into::<ArbitrationError>::into)?;

        if let Some(key) = verdict.pick_key.as_deref() {
            if !request.contains_key(key) {
                return Err(ArbitrationError::UnknownPick(key.to_string()));
            }
        }
        Ok(verdict)
    }
}

fn finish(stats: &mut ResolutionStats, result: MappingResult) -> MappingResult {
    stats.record(&result);
    debug!(
        "State {}: {} (confidence {}, {} suggestions)",
        ResolutionState::Resolved,
        result.status(),
        result.confidence(),
        result.top_candidates().len()
    );
    result
}

fn trace_state(state: ResolutionState, reference: &ExternalReference, count: usize) {
    debug!("State {} for '{}': {} candidates", state, reference.primary_text(), count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitration::{LlmArbitrator, NoArbitrator};
    use crate::cancel::cancellation;
    use crate::config::{ExclusionRule, OverrideRule};
    use crate::test_support::{part, sample_catalog, FailingCatalog};
    use partmap_catalog::CatalogSnapshot;
    use partmap_domain::{CatalogKind, MappingOrigin, MappingStatus};
    use partmap_llm::MockProvider;
    use std::time::Duration;

    fn engine<A>(arbitrator: A) -> ResolutionEngine<CatalogSnapshot, A>
    where
        A: Arbitrator,
        A::Error: Into<ArbitrationError>,
    {
        ResolutionEngine::new(sample_catalog(), arbitrator, Normalizer::with_defaults().unwrap())
    }

    #[tokio::test]
    async fn test_exact_part_is_mapped() {
        let result = engine(NoArbitrator)
            .resolve(&ExternalReference::part("103D72"), &PolicyConfig::default())
            .await
            .unwrap();
        assert_eq!(result.status(), MappingStatus::Mapped);
        assert_eq!(result.matched_key(), Some("103D72"));
        assert_eq!(result.confidence().value(), 100.0);
    }

    fn engine_over(keys: &[&str]) -> ResolutionEngine<CatalogSnapshot, NoArbitrator> {
        let parts = keys.iter().map(|key| part(key, "TIP, CUTTING")).collect();
        ResolutionEngine::new(
            CatalogSnapshot::new(parts, Vec::new()),
            NoArbitrator,
            Normalizer::with_defaults().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_exact_key_beside_prefixed_key_is_mapped() {
        let engine = engine_over(&["103D72", "ZTIP103D72"]);
        let policy = PolicyConfig::default();

        let exact = engine.resolve(&ExternalReference::part("103D72"), &policy).await.unwrap();
        assert_eq!(exact.status(), MappingStatus::Mapped);
        assert_eq!(exact.matched_key(), Some("103D72"));
        assert_eq!(exact.confidence().value(), 100.0);

        let dashed = engine.resolve(&ExternalReference::part("103D7-2"), &policy).await.unwrap();
        assert_eq!(dashed.status(), MappingStatus::Mapped);
        assert_eq!(dashed.matched_key(), Some("103D72"));
        assert!(dashed.confidence().value() >= 90.0);
    }

    #[tokio::test]
    async fn test_dashed_key_beside_collapsed_key_is_mapped() {
        let engine = engine_over(&["ABC-2", "ABC2"]);
        let policy = PolicyConfig::default();

        for key in ["ABC-2", "ABC2"] {
            let result = engine.resolve(&ExternalReference::part(key), &policy).await.unwrap();
            assert_eq!(result.status(), MappingStatus::Mapped);
            assert_eq!(result.matched_key(), Some(key));
            assert_eq!(result.confidence().value(), 100.0);
        }
    }

    #[tokio::test]
    async fn test_close_fuzzy_part_maps_above_accept_floor() {
        let mut stats = ResolutionStats::new();
        let result = engine_over(&["XYZ1234567890ABCDEFGJ"])
            .resolve_with_stats(
                &ExternalReference::part("XYZ1234567890ABCDEFGH"),
                &PolicyConfig::default(),
                &mut stats,
            )
            .await
            .unwrap();
        assert_eq!(result.status(), MappingStatus::Mapped);
        assert_eq!(result.matched_key(), Some("XYZ1234567890ABCDEFGJ"));
        assert_eq!(result.confidence().value(), 95.0);
        assert_eq!(stats.arbitrations, 0);
    }

    #[tokio::test]
    async fn test_tied_transformed_parts_go_to_review() {
        // one transform each: strip the vendor prefix, or drop the separators
        let result = engine_over(&["AB-12", "KOIAB12"])
            .resolve(&ExternalReference::part("KOI AB-12"), &PolicyConfig::default())
            .await
            .unwrap();
        assert_eq!(result.status(), MappingStatus::ManualReview);
        assert_eq!(result.matched_key(), None);
        let keys: Vec<_> = result.top_candidates().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["AB-12", "KOIAB12"]);
    }

    #[tokio::test]
    async fn test_fuzzy_part_without_arbitrator_goes_to_review() {
        let mut stats = ResolutionStats::new();
        let result = engine(NoArbitrator)
            .resolve_with_stats(&ExternalReference::part("28Y05F"), &PolicyConfig::default(), &mut stats)
            .await
            .unwrap();
        assert_eq!(result.status(), MappingStatus::ManualReview);
        assert_eq!(result.top_candidates()[0].key, "28Y05E");
        assert_eq!(stats.arbitrations, 1);
        assert_eq!(stats.arbitration_failures, 1);
        assert_eq!(stats.manual_review, 1);
    }

    #[tokio::test]
    async fn test_arbitrator_confirms_fuzzy_part() {
        let provider = MockProvider::new(r#"{"best_match": "28Y05E", "confidence": 97, "reasoning": "typo"}"#);
        let result = engine(LlmArbitrator::new(provider))
            .resolve(&ExternalReference::part("28Y05F"), &PolicyConfig::default())
            .await
            .unwrap();
        assert_eq!(result.status(), MappingStatus::Mapped);
        assert_eq!(result.matched_key(), Some("28Y05E"));
        assert!(result.reasoning().contains("typo"));
    }

    #[tokio::test]
    async fn test_arbitration_timeout_falls_back() {
        let provider = MockProvider::new(r#"{"best_match": "28Y05E", "confidence": 99}"#)
            .with_delay(Duration::from_secs(3));
        let policy = PolicyConfig {
            arbitration_timeout_secs: 1,
            ..PolicyConfig::default()
        };
        let result = engine(LlmArbitrator::new(provider))
            .resolve(&ExternalReference::part("28Y05F"), &policy)
            .await
            .unwrap();
        assert_eq!(result.status(), MappingStatus::ManualReview);
        assert_eq!(result.top_candidates()[0].key, "28Y05E");
        assert!(result.reasoning().contains("timed out"));
    }

    #[tokio::test]
    async fn test_cancelled_arbitration_falls_back() {
        let (handle, token) = cancellation();
        handle.cancel();
        let provider = MockProvider::new(r#"{"best_match": "28Y05E", "confidence": 99}"#);
        let engine = engine(LlmArbitrator::new(provider));
        let mut stats = ResolutionStats::new();

        let result = engine
            .resolve_cancellable(&ExternalReference::part("28Y05F"), &PolicyConfig::default(), &mut stats, &token)
            .await
            .unwrap();
        assert_eq!(result.status(), MappingStatus::ManualReview);
        assert!(result.reasoning().contains("cancelled"));
    }

    #[tokio::test]
    async fn test_same_name_entities_resolved_by_address() {
        let reference = ExternalReference::entity(
            "Acme Gas",
            Some("400 Industrial Parkway\nPeoria, IL 61602".to_string()),
        );
        let result = engine(NoArbitrator)
            .resolve(&reference, &PolicyConfig::default())
            .await
            .unwrap();
        assert_eq!(result.status(), MappingStatus::Mapped);
        assert_eq!(result.matched_key(), Some("C1002"));
        assert!(result.reasoning().contains("billing address"));
    }

    #[tokio::test]
    async fn test_same_name_entities_without_address_need_review() {
        let result = engine(NoArbitrator)
            .resolve(&ExternalReference::entity("Acme Gas", None), &PolicyConfig::default())
            .await
            .unwrap();
        assert_eq!(result.status(), MappingStatus::ManualReview);
        assert_eq!(result.matched_key(), None);
    }

    #[tokio::test]
    async fn test_unmatched_address_rejected() {
        let reference = ExternalReference::entity("Acme Gas", Some("PO Box 77\nAustin, TX 78701".to_string()));
        let provider = MockProvider::new(r#"{"best_match": "C1001", "confidence": 99}"#);
        let engine = engine(LlmArbitrator::new(provider));
        let result = engine.resolve(&reference, &PolicyConfig::default()).await.unwrap();
        assert_eq!(result.status(), MappingStatus::ManualReview);
        assert!(result.reasoning().contains("matches none"));
    }

    #[tokio::test]
    async fn test_unknown_part_not_found() {
        let result = engine(NoArbitrator)
            .resolve(&ExternalReference::part("QQQQQQQQQQ"), &PolicyConfig::default())
            .await
            .unwrap();
        assert_eq!(result.status(), MappingStatus::NotFound);
        assert_eq!(result.matched_key(), None);
    }

    #[tokio::test]
    async fn test_exclusion_and_override() {
        let policy = PolicyConfig {
            exclusions: vec![ExclusionRule {
                kind: CatalogKind::Entities,
                contains: "acme".to_string(),
                reason: Some("handled separately".to_string()),
            }],
            overrides: vec![OverrideRule {
                kind: CatalogKind::Parts,
                raw: "KP-5000".to_string(),
                key: "28Y05E".to_string(),
            }],
            ..PolicyConfig::default()
        };
        let engine = engine(NoArbitrator);
        let mut stats = ResolutionStats::new();

        let excluded = engine
            .resolve_with_stats(&ExternalReference::entity("Acme Gas", None), &policy, &mut stats)
            .await
            .unwrap();
        assert_eq!(excluded.status(), MappingStatus::ManualReview);
        assert!(excluded.reasoning().contains("handled separately"));

        let overridden = engine
            .resolve_with_stats(&ExternalReference::part("kp-5000"), &policy, &mut stats)
            .await
            .unwrap();
        assert_eq!(overridden.matched_key(), Some("28Y05E"));
        assert_eq!(overridden.origin(), MappingOrigin::ConfiguredOverride);

        assert_eq!(stats.excluded, 1);
        assert_eq!(stats.overrides, 1);
        assert_eq!(stats.processed, 2);
    }

    #[tokio::test]
    async fn test_unchecked_policy_still_resolves() {
        let policy = PolicyConfig {
            arbitration_floor: 99.0,
            ..PolicyConfig::default()
        };
        assert!(policy.validate().is_err());

        let result = engine(NoArbitrator)
            .resolve(&ExternalReference::part("103D72"), &policy)
            .await
            .unwrap();
        assert_eq!(result.matched_key(), Some("103D72"));
    }

    #[tokio::test]
    async fn test_catalog_failure_is_an_error() {
        let engine = ResolutionEngine::new(FailingCatalog, NoArbitrator, Normalizer::with_defaults().unwrap());
        let result = engine.resolve(&ExternalReference::part("103D72"), &PolicyConfig::default()).await;
        assert!(matches!(result, Err(EngineError::CatalogUnavailable(_))));
    }

    #[tokio::test]
    async fn test_manual_correction() {
        let result = engine(NoArbitrator).apply_manual_correction("C2001");
        assert_eq!(result.status(), MappingStatus::Mapped);
        assert_eq!(result.origin(), MappingOrigin::ManualCorrection);
        assert_eq!(result.confidence().value(), 100.0);
    }
}

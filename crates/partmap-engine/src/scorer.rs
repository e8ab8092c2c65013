//! Unified confidence scoring and deterministic ranking

use crate::config::PolicyConfig;
use partmap_domain::{
    ArbitrationCandidate, CandidateSummary, CanonicalRecord, Confidence, MatchCandidate, MatchStrategy,
};
use std::cmp::Ordering;

/// A candidate with its final confidence
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    /// The proposed record
    pub record: CanonicalRecord,
    /// Strategy that produced (or last adjusted) the score
    pub strategy: MatchStrategy,
    /// Unified confidence
    pub confidence: Confidence,
}

impl ScoredCandidate {
    /// Catalog key
    pub fn key(&self) -> &str {
        self.record.key()
    }

    /// Suggestion shown on a result
    pub fn summary(&self) -> CandidateSummary {
        CandidateSummary::new(self.key(), self.confidence, self.record.label())
    }

    /// Shortlist entry for the arbitrator
    pub fn arbitration_candidate(&self) -> ArbitrationCandidate {
        ArbitrationCandidate {
            key: self.key().to_string(),
            display_text: self.record.display_text(),
            score: self.confidence,
        }
    }
}

/// Confidence descending, then strategy priority, then key ascending
pub fn compare(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| b.strategy.priority().cmp(&a.strategy.priority()))
        .then_with(|| a.key().cmp(b.key()))
}

/// Sort candidates into ranking order
pub fn rank(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(compare);
}

/// Maps strategy scores onto the unified scale
pub struct Scorer<'a> {
    policy: &'a PolicyConfig,
}

impl<'a> Scorer<'a> {
    /// Create a scorer
    pub fn new(policy: &'a PolicyConfig) -> Self {
        Self { policy }
    }

    /// Confidence for a single candidate
    ///
    /// Identity and fuzzy matches keep their score; containment and core-name
    /// matches stay under their ceilings until a later stage boosts them.
    pub fn confidence(&self, candidate: &MatchCandidate) -> Confidence {
        let ceiling = match candidate.strategy {
            MatchStrategy::Exact
            | MatchStrategy::Transformed
            | MatchStrategy::AddressBoosted
            | MatchStrategy::Fuzzy => 100.0,
            MatchStrategy::Substring => self.policy.substring_cap,
            MatchStrategy::Core => self.policy.core_cap,
        };
        candidate.raw_score.capped(ceiling)
    }

    /// Score and rank a candidate set
    pub fn score(&self, candidates: Vec<MatchCandidate>) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|c| {
                let confidence = self.confidence(&c);
                ScoredCandidate {
                    record: c.record,
                    strategy: c.strategy,
                    confidence,
                }
            })
            .collect();
        rank(&mut scored);
        scored
    }
}

//! Resolution policy: turns ranked candidates into a mapping result

use crate::config::{ExclusionRule, OverrideRule, PolicyConfig};
use crate::error::ArbitrationError;
use crate::scorer::ScoredCandidate;
use partmap_domain::mapping::INSUFFICIENT_INFORMATION;
use partmap_domain::{
    ArbitrationMode, ArbitrationVerdict, CandidateSummary, CatalogKind, Confidence, MappingResult, MatchStrategy,
};
use std::fmt;

/// Stage a resolution has reached, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// Candidates proposed
    Generated,
    /// Confidences assigned and ranked
    Scored,
    /// Same-name entities checked against the address
    Disambiguated,
    /// Arbitrator consulted
    Arbitrated,
    /// Result produced
    Resolved,
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionState::Generated => "generated",
            ResolutionState::Scored => "scored",
            ResolutionState::Disambiguated => "disambiguated",
            ResolutionState::Arbitrated => "arbitrated",
            ResolutionState::Resolved => "resolved",
        };
        f.write_str(name)
    }
}

/// What to do with a ranked candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The top candidate is accepted without arbitration
    Accept,
    /// Several candidates share the top confidence at or above the auto-accept floor
    BreakTie(ArbitrationMode),
    /// The best candidate sits between the arbitration and auto-accept floors
    Arbitrate,
    /// Nothing reaches the arbitration floor
    BelowFloor,
}

/// Applies [`PolicyConfig`] thresholds to ranked candidates
pub struct ResolutionPolicy<'a> {
    config: &'a PolicyConfig,
}

impl<'a> ResolutionPolicy<'a> {
    /// Create a policy
    pub fn new(config: &'a PolicyConfig) -> Self {
        Self { config }
    }

    /// Decide the next step for a ranked list
    ///
    /// An exact part key is always accepted. Otherwise a top candidate at or
    /// above the auto-accept floor is accepted unless another candidate has
    /// the same confidence.
    pub fn triage(&self, kind: CatalogKind, candidates: &[ScoredCandidate]) -> Decision {
        let Some(top) = candidates.first() else {
            return Decision::BelowFloor;
        };

        if kind == CatalogKind::Parts && top.strategy == MatchStrategy::Exact {
            return Decision::Accept;
        }

        if top.confidence.is_at_least(self.config.auto_accept_floor) {
            return if self.tied(candidates).len() > 1 {
                Decision::BreakTie(match kind {
                    CatalogKind::Entities => ArbitrationMode::AddressValidation,
                    CatalogKind::Parts => ArbitrationMode::BestMatch,
                })
            } else {
                Decision::Accept
            };
        }

        if top.confidence.is_at_least(self.config.arbitration_floor) {
            Decision::Arbitrate
        } else {
            Decision::BelowFloor
        }
    }

    /// Candidates sharing the top confidence, at most `max_arbitration_candidates`
    pub fn tied(&self, candidates: &[ScoredCandidate]) -> Vec<ScoredCandidate> {
        let Some(top) = candidates.first() else {
            return Vec::new();
        };
        candidates
            .iter()
            .take_while(|c| c.confidence == top.confidence)
            .take(self.config.max_arbitration_candidates)
            .cloned()
            .collect()
    }

    /// The best `max_arbitration_candidates` candidates
    pub fn shortlist(&self, candidates: &[ScoredCandidate]) -> Vec<ScoredCandidate> {
        candidates
            .iter()
            .take(self.config.max_arbitration_candidates)
            .cloned()
            .collect()
    }

    /// Auto-accept the top candidate
    pub fn accept(&self, candidates: &[ScoredCandidate]) -> Option<MappingResult> {
        let top = candidates.first()?;
        let reasoning = match top.strategy {
            MatchStrategy::Exact => format!("exact match on {}", top.key()),
            MatchStrategy::Transformed => format!("matched {} after normalizing the identifier", top.key()),
            MatchStrategy::AddressBoosted => format!("name and billing address match {}", top.key()),
            other => format!("{} match on {} at {}", other, top.key(), top.confidence),
        };
        Some(MappingResult::mapped(
            top.key(),
            top.confidence,
            self.summaries(candidates),
            reasoning,
        ))
    }

    /// Nothing plausible: not found for parts, review for entities
    pub fn below_floor(&self, kind: CatalogKind, candidates: &[ScoredCandidate]) -> MappingResult {
        let suggestions = self.summaries(candidates);
        let (confidence, reasoning) = match suggestions.first() {
            Some(best) => (
                best.confidence,
                format!(
                    "best candidate {} at {} is below the arbitration floor",
                    best.key, best.confidence
                ),
            ),
            None => (Confidence::ZERO, INSUFFICIENT_INFORMATION.to_string()),
        };

        match kind {
            CatalogKind::Parts => MappingResult::not_found(confidence, suggestions, reasoning),
            CatalogKind::Entities => MappingResult::manual_review(confidence, suggestions, reasoning),
        }
    }

    /// Apply an arbitration verdict, or fall back to the top candidate
    pub fn after_arbitration(
        &self,
        shortlist: &[ScoredCandidate],
        verdict: Result<ArbitrationVerdict, ArbitrationError>,
    ) -> MappingResult {
        let Some(top) = shortlist.first() else {
            return MappingResult::manual_review(Confidence::ZERO, Vec::new(), INSUFFICIENT_INFORMATION);
        };

        let verdict = match verdict {
            Ok(verdict) => verdict,
            Err(e) => {
                return MappingResult::manual_review(
                    top.confidence,
                    self.led_by(top.summary(), shortlist),
                    format!(
                        "arbitration unavailable ({}); top candidate {} at {} needs review",
                        e,
                        top.key(),
                        top.confidence
                    ),
                )
            }
        };

        let Some(pick) = verdict
            .pick_key
            .as_deref()
            .and_then(|key| shortlist.iter().find(|c| c.key() == key))
        else {
            return MappingResult::manual_review(
                top.confidence,
                self.led_by(top.summary(), shortlist),
                with_detail("arbitrator found no matching candidate", &verdict.reasoning),
            );
        };

        let pick_summary = CandidateSummary::new(pick.key(), verdict.confidence, pick.record.label());
        if verdict.confidence.is_at_least(self.config.auto_accept_floor) {
            MappingResult::mapped(
                pick.key(),
                verdict.confidence,
                self.led_by(pick_summary, shortlist),
                with_detail(&format!("arbitrator confirmed {}", pick.key()), &verdict.reasoning),
            )
        } else {
            MappingResult::manual_review(
                verdict.confidence,
                self.led_by(pick_summary, shortlist),
                with_detail(
                    &format!("arbitrator suggested {} at {}", pick.key(), verdict.confidence),
                    &verdict.reasoning,
                ),
            )
        }
    }

    /// Same-name group that the address could not separate
    pub fn rejected(&self, candidates: &[ScoredCandidate], group: &[String]) -> MappingResult {
        let members: Vec<CandidateSummary> = candidates
            .iter()
            .filter(|c| group.iter().any(|k| k == c.key()))
            .map(ScoredCandidate::summary)
            .take(self.config.max_top_candidates)
            .collect();
        let confidence = members.first().map(|m| m.confidence).unwrap_or(Confidence::ZERO);

        MappingResult::manual_review(
            confidence,
            members,
            format!(
                "{} accounts share this name and the billing address matches none of them",
                group.len()
            ),
        )
    }

    /// Reference kept out of automatic matching
    pub fn excluded(&self, rule: &ExclusionRule) -> MappingResult {
        let reason = rule.reason.as_deref().unwrap_or("automatic mapping disabled");
        MappingResult::excluded(format!("excluded by rule '{}': {}", rule.contains, reason))
    }

    /// Reference with a configured mapping
    pub fn overridden(&self, rule: &OverrideRule) -> MappingResult {
        MappingResult::configured_override(&rule.key, format!("override rule for '{}'", rule.raw))
    }

    /// Suggestions at or above the display floor
    fn summaries(&self, candidates: &[ScoredCandidate]) -> Vec<CandidateSummary> {
        candidates
            .iter()
            .filter(|c| c.confidence.is_at_least(self.config.display_floor))
            .take(self.config.max_top_candidates)
            .map(ScoredCandidate::summary)
            .collect()
    }

    /// `leader` first, then the rest of the shortlist above the display floor
    fn led_by(&self, leader: CandidateSummary, shortlist: &[ScoredCandidate]) -> Vec<CandidateSummary> {
        let leader_key = leader.key.clone();
        let rest = shortlist
            .iter()
            .filter(move |c| c.key() != leader_key)
            .filter(|c| c.confidence.is_at_least(self.config.display_floor))
            .map(ScoredCandidate::summary);
        std::iter::once(leader)
            .chain(rest)
            .take(self.config.max_top_candidates)
            .collect()
    }
}

fn with_detail(summary: &str, detail: &str) -> String {
    if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{}: {}", summary, detail)
    }
}

//! The mapping result contract returned by every resolution

use crate::confidence::Confidence;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Maximum number of suggestions carried on a result
pub const MAX_TOP_CANDIDATES: usize = 3;

/// Reasoning used when nothing cleared the display floor
///
/// Every result without suggestions carries this text, except
/// [`MappingResult::excluded`], whose reasoning names the exclusion rule.
pub const INSUFFICIENT_INFORMATION: &str =
    "insufficient information for reliable automatic mapping";

/// Final disposition of a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStatus {
    /// Auto-accepted; `matched_key` is set
    Mapped,
    /// Needs a human decision; `matched_key` is empty
    ManualReview,
    /// No plausible candidate
    NotFound,
}

impl MappingStatus {
    /// Short snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingStatus::Mapped => "mapped",
            MappingStatus::ManualReview => "manual_review",
            MappingStatus::NotFound => "not_found",
        }
    }
}

impl fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingOrigin {
    /// Scored and decided by the engine
    Automatic,
    /// Taken from a configured override rule
    ConfiguredOverride,
    /// Supplied by an operator; ground truth, never re-scored
    ManualCorrection,
}

/// A suggestion shown alongside a result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    /// Catalog key
    pub key: String,
    /// Confidence for this suggestion
    pub confidence: Confidence,
    /// Description or company name
    pub label: String,
}

impl CandidateSummary {
    /// Create a suggestion
    pub fn new(key: impl Into<String>, confidence: Confidence, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            confidence,
            label: label.into(),
        }
    }
}

/// Outcome of resolving one external reference
///
/// The constructors are the only way to build a result, and they enforce the
/// contract: a mapped result always carries a key, non-mapped results never
/// do, and suggestions are de-duplicated by key and capped at
/// [`MAX_TOP_CANDIDATES`].
///
/// A non-mapped result with no suggestions explains itself with
/// [`INSUFFICIENT_INFORMATION`]. The one exception is an excluded reference
/// ([`MappingResult::excluded`]): it is never scored, so it has no
/// suggestions and its reasoning names the rule instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingResult {
    status: MappingStatus,
    matched_key: Option<String>,
    confidence: Confidence,
    top_candidates: Vec<CandidateSummary>,
    reasoning: String,
    origin: MappingOrigin,
}

impl MappingResult {
    /// An auto-accepted match
    pub fn mapped(
        key: impl Into<String>,
        confidence: Confidence,
        candidates: impl IntoIterator<Item = CandidateSummary>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            status: MappingStatus::Mapped,
            matched_key: Some(key.into()),
            confidence,
            top_candidates: normalize_candidates(candidates),
            reasoning: reasoning.into(),
            origin: MappingOrigin::Automatic,
        }
    }

    /// A result routed to a human
    pub fn manual_review(
        confidence: Confidence,
        candidates: impl IntoIterator<Item = CandidateSummary>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            status: MappingStatus::ManualReview,
            matched_key: None,
            confidence,
            top_candidates: normalize_candidates(candidates),
            reasoning: reasoning.into(),
            origin: MappingOrigin::Automatic,
        }
    }

    /// A reference kept out of automatic matching by an exclusion rule
    ///
    /// Routed to review at confidence 0 with no suggestions.
    pub fn excluded(reasoning: impl Into<String>) -> Self {
        Self::manual_review(Confidence::ZERO, Vec::new(), reasoning)
    }

    /// No plausible candidate
    pub fn not_found(
        confidence: Confidence,
        candidates: impl IntoIterator<Item = CandidateSummary>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            status: MappingStatus::NotFound,
            matched_key: None,
            confidence,
            top_candidates: normalize_candidates(candidates),
            reasoning: reasoning.into(),
            origin: MappingOrigin::Automatic,
        }
    }

    /// Mapping from a configured override rule
    pub fn configured_override(key: impl Into<String>, reasoning: impl Into<String>) -> Self {
        let mut result = Self::mapped(key, Confidence::CERTAIN, Vec::new(), reasoning);
        result.origin = MappingOrigin::ConfiguredOverride;
        result
    }

    /// Operator-supplied correction, treated as ground truth
    pub fn manual_correction(key: impl Into<String>) -> Self {
        let mut result = Self::mapped(
            key,
            Confidence::CERTAIN,
            Vec::new(),
            "manual correction applied by operator",
        );
        result.origin = MappingOrigin::ManualCorrection;
        result
    }

    /// Final disposition
    pub fn status(&self) -> MappingStatus {
        self.status
    }

    /// Matched catalog key (only for mapped results)
    pub fn matched_key(&self) -> Option<&str> {
        self.matched_key.as_deref()
    }

    /// Confidence of the match, or of the leading suggestion
    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Up to three suggestions, best first
    pub fn top_candidates(&self) -> &[CandidateSummary] {
        &self.top_candidates
    }

    /// Human-readable explanation
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    /// Where the result came from
    pub fn origin(&self) -> MappingOrigin {
        self.origin
    }

    /// Whether a human needs to look at this result
    pub fn needs_review(&self) -> bool {
        self.status != MappingStatus::Mapped
    }
}

fn normalize_candidates(candidates: impl IntoIterator<Item = CandidateSummary>) -> Vec<CandidateSummary> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.key.clone()))
        .take(MAX_TOP_CANDIDATES)
        .collect()
}

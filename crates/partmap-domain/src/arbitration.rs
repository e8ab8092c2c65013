//! Arbitration request and verdict types

use crate::confidence::Confidence;
use crate::reference::CatalogKind;
use serde::{Deserialize, Serialize};

/// Why the arbitrator is being consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbitrationMode {
    /// Several candidates scored at or above the auto-accept floor; validate
    /// which one the address supports
    AddressValidation,
    /// The best candidate sits in the arbitration band; pick the best match
    BestMatch,
}

/// One shortlisted candidate as presented to the arbitrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationCandidate {
    /// Catalog key
    pub key: String,
    /// Label and location
    pub display_text: String,
    /// Score from the scorer
    pub score: Confidence,
}

/// Input to an arbitration call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationRequest {
    /// Catalog being resolved against
    pub kind: CatalogKind,
    /// Raw identifier or name from the document
    pub query_text: String,
    /// Description or address block, if any
    pub context_text: Option<String>,
    /// Shortlist, best first
    pub candidates: Vec<ArbitrationCandidate>,
    /// Why arbitration is needed
    pub mode: ArbitrationMode,
}

impl ArbitrationRequest {
    /// Whether `key` is on the shortlist
    pub fn contains_key(&self, key: &str) -> bool {
        self.candidates.iter().any(|c| c.key == key)
    }
}

/// The arbitrator's answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationVerdict {
    /// Chosen key; `None` when no candidate is a match
    pub pick_key: Option<String>,
    /// Confidence in the pick
    pub confidence: Confidence,
    /// Free-text explanation
    pub reasoning: String,
}

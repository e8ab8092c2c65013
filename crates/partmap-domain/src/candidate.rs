//! Match candidates and the strategies that produce them

use crate::confidence::Confidence;
use crate::record::CanonicalRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The strategy that proposed a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Direct equality with a catalog key or normalized name
    Exact,
    /// Equality after one or more normalization transforms
    Transformed,
    /// Name match whose confidence was raised by a matching address
    AddressBoosted,
    /// Containment of the query in a catalog key, description or name
    Substring,
    /// Containment of the query's core token (industry words removed)
    Core,
    /// Edit-distance similarity
    Fuzzy,
}

impl MatchStrategy {
    /// Tie-break rank, higher wins
    ///
    /// `Exact > Transformed > AddressBoosted > Substring = Core > Fuzzy`
    pub fn priority(&self) -> u8 {
        match self {
            MatchStrategy::Exact => 5,
            MatchStrategy::Transformed => 4,
            MatchStrategy::AddressBoosted => 3,
            MatchStrategy::Substring | MatchStrategy::Core => 2,
            MatchStrategy::Fuzzy => 1,
        }
    }

    /// Whether the strategy's score is trusted at face value
    pub fn is_identity_match(&self) -> bool {
        matches!(self, MatchStrategy::Exact | MatchStrategy::Transformed)
    }

    /// Short snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Exact => "exact",
            MatchStrategy::Transformed => "transformed",
            MatchStrategy::AddressBoosted => "address_boosted",
            MatchStrategy::Substring => "substring",
            MatchStrategy::Core => "core",
            MatchStrategy::Fuzzy => "fuzzy",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog record proposed as a possible match
///
/// Transient: candidates live only for the duration of one resolution call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// The proposed record
    pub record: CanonicalRecord,

    /// Strategy that proposed it
    pub strategy: MatchStrategy,

    /// Score assigned by the strategy
    pub raw_score: Confidence,
}

impl MatchCandidate {
    /// Create a candidate
    pub fn new(record: CanonicalRecord, strategy: MatchStrategy, raw_score: f64) -> Self {
        Self {
            record,
            strategy,
            raw_score: Confidence::new(raw_score),
        }
    }

    /// Key of the proposed record
    pub fn key(&self) -> &str {
        self.record.key()
    }

    /// Whether this candidate should replace `other` for the same key
    ///
    /// The higher score wins; equal scores go to the higher-priority strategy.
    pub fn outranks(&self, other: &MatchCandidate) -> bool {
        match self.raw_score.total_cmp(&other.raw_score) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => self.strategy.priority() > other.strategy.priority(),
        }
    }
}

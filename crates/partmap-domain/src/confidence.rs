//! Confidence score module

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Confidence score in the closed range [0, 100]
///
/// Every constructor and adjustment clamps, so a `Confidence` can never hold
/// a value outside the range. NaN is treated as zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Lowest possible confidence
    pub const ZERO: Confidence = Confidence(0.0);

    /// Highest possible confidence
    pub const CERTAIN: Confidence = Confidence(100.0);

    /// Create a confidence, clamping the value into [0, 100]
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 100.0))
    }

    /// Get the raw score
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Check whether the score reaches a threshold
    pub fn is_at_least(&self, threshold: f64) -> bool {
        self.0 >= threshold
    }

    /// Raise the score by `amount`, saturating at 100
    pub fn boosted(self, amount: f64) -> Self {
        Self::new(self.0 + amount)
    }

    /// Lower the score by `amount`, saturating at 0
    pub fn penalized(self, amount: f64) -> Self {
        Self::new(self.0 - amount)
    }

    /// Cap the score at `ceiling`
    pub fn capped(self, ceiling: f64) -> Self {
        Self::new(self.0.min(ceiling))
    }

    /// Total ordering (values are never NaN)
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_confidence_clamps() {
        assert_eq!(Confidence::new(150.0).value(), 100.0);
        assert_eq!(Confidence::new(-3.0).value(), 0.0);
        assert_eq!(Confidence::new(f64::NAN).value(), 0.0);
        assert_eq!(Confidence::new(87.5).value(), 87.5);
    }

    #[test]
    fn test_boost_and_penalty_saturate() {
        let c = Confidence::new(90.0);
        assert_eq!(c.boosted(25.0), Confidence::CERTAIN);
        assert_eq!(c.penalized(200.0), Confidence::ZERO);
        assert_eq!(c.capped(60.0).value(), 60.0);
    }

    #[test]
    fn test_deserialize_clamps() {
        let c: Confidence = serde_json::from_str("140.0").unwrap();
        assert_eq!(c.value(), 100.0);
        assert_eq!(serde_json::to_string(&Confidence::new(42.0)).unwrap(), "42.0");
    }

    #[test]
    fn test_display_one_decimal() {
        assert_eq!(Confidence::new(95.0).to_string(), "95.0");
    }

    proptest! {
        #[test]
        fn prop_always_in_range(value in proptest::num::f64::ANY, delta in -500.0f64..500.0) {
            let c = Confidence::new(value).boosted(delta);
            prop_assert!(c.value() >= 0.0 && c.value() <= 100.0);
        }
    }
}

//! Resolution policy configuration
//!
//! Every threshold the engine uses lives here, together with the exclusion
//! and override lists. Loaded from the `[policy]` table of the config file.

use crate::normalizer::fold;
use partmap_domain::{CatalogKind, ExternalReference};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// References that must never be auto-resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionRule {
    /// Catalog the rule applies to
    pub kind: CatalogKind,

    /// Case-insensitive substring of the raw identifier or name
    pub contains: String,

    /// Shown in the result's reasoning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Fixed mappings that bypass scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRule {
    /// Catalog the rule applies to
    pub kind: CatalogKind,

    /// Raw identifier or name, compared case-insensitively after trimming
    pub raw: String,

    /// Catalog key to map to
    pub key: String,
}

/// Thresholds and lists driving the resolution policy
///
/// # Examples
///
/// ```
/// use partmap_engine::PolicyConfig;
///
/// let config = PolicyConfig::default();
/// assert_eq!(config.auto_accept_floor, 95.0);
///
/// let strict = PolicyConfig::strict();
/// assert!(strict.auto_accept_floor > config.auto_accept_floor);
/// assert!(strict.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Score at or above which a single candidate is accepted automatically
    pub auto_accept_floor: f64,

    /// Lowest score that is sent to the arbitrator
    pub arbitration_floor: f64,

    /// Score band that qualifies a candidate for address disambiguation
    pub high_confidence_band: f64,

    /// Same-identity candidates needed before disambiguation runs
    pub disambiguation_min_count: usize,

    /// Lowest score shown as a suggestion
    pub display_floor: f64,

    /// Lowest edit-distance score kept as a fuzzy candidate
    pub fuzzy_cutoff: f64,

    /// Shortest form used for containment searches
    pub min_token_len: usize,

    /// Ceiling for containment candidates
    pub substring_cap: f64,

    /// Bonus added to core-name candidates
    pub core_bonus: f64,

    /// Ceiling for core-name candidates
    pub core_cap: f64,

    /// Score lost per extra transform
    pub transform_step: f64,

    /// Lowest score a transformed candidate can have
    pub transform_floor: f64,

    /// Name similarity at which two candidates are the same company
    pub identity_similarity: f64,

    /// Lowest street similarity that counts as an address match
    pub min_address_similarity: f64,

    /// Boost for a weak address match
    pub address_boost_small: f64,

    /// Boost for a fair address match
    pub address_boost_medium: f64,

    /// Boost for a strong address match
    pub address_boost_large: f64,

    /// Penalty for a region mismatch
    pub region_penalty: f64,

    /// Candidates kept after generation
    pub max_candidates: usize,

    /// Suggestions carried on a result
    pub max_top_candidates: usize,

    /// Candidates sent to the arbitrator
    pub max_arbitration_candidates: usize,

    /// Row limit for each catalog search
    pub search_limit: usize,

    /// Maximum time for one arbitration call (seconds)
    pub arbitration_timeout_secs: u64,

    /// References routed straight to manual review
    pub exclusions: Vec<ExclusionRule>,

    /// References mapped without scoring
    pub overrides: Vec<OverrideRule>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            auto_accept_floor: 95.0,
            arbitration_floor: 70.0,
            high_confidence_band: 85.0,
            disambiguation_min_count: 2,
            display_floor: 70.0,
            fuzzy_cutoff: 60.0,
            min_token_len: 4,
            substring_cap: 94.0,
            core_bonus: 15.0,
            core_cap: 90.0,
            transform_step: 5.0,
            transform_floor: 90.0,
            identity_similarity: 90.0,
            min_address_similarity: 50.0,
            address_boost_small: 5.0,
            address_boost_medium: 10.0,
            address_boost_large: 20.0,
            region_penalty: 20.0,
            max_candidates: 10,
            max_top_candidates: 3,
            max_arbitration_candidates: 10,
            search_limit: 200,
            arbitration_timeout_secs: 10,
            exclusions: Vec::new(),
            overrides: Vec::new(),
        }
    }
}

impl PolicyConfig {
    /// Strict preset: more goes to manual review
    pub fn strict() -> Self {
        Self {
            auto_accept_floor: 98.0,
            arbitration_floor: 80.0,
            high_confidence_band: 90.0,
            display_floor: 75.0,
            fuzzy_cutoff: 70.0,
            identity_similarity: 95.0,
            min_address_similarity: 60.0,
            ..Self::default()
        }
    }

    /// Lenient preset: more is accepted automatically
    pub fn lenient() -> Self {
        Self {
            auto_accept_floor: 90.0,
            arbitration_floor: 60.0,
            high_confidence_band: 80.0,
            display_floor: 60.0,
            fuzzy_cutoff: 50.0,
            substring_cap: 89.0,
            core_cap: 85.0,
            identity_similarity: 85.0,
            min_address_similarity: 40.0,
            ..Self::default()
        }
    }

    /// Get the arbitration timeout as a Duration
    pub fn arbitration_timeout(&self) -> Duration {
        Duration::from_secs(self.arbitration_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let scores = [
            ("auto_accept_floor", self.auto_accept_floor),
            ("arbitration_floor", self.arbitration_floor),
            ("high_confidence_band", self.high_confidence_band),
            ("display_floor", self.display_floor),
            ("fuzzy_cutoff", self.fuzzy_cutoff),
            ("substring_cap", self.substring_cap),
            ("core_cap", self.core_cap),
            ("transform_floor", self.transform_floor),
            ("identity_similarity", self.identity_similarity),
            ("min_address_similarity", self.min_address_similarity),
        ];
        for (name, value) in scores {
            if !(0.0..=100.0).contains(&value) {
                return Err(format!("{} must be between 0 and 100", name));
            }
        }

        if self.arbitration_floor > self.auto_accept_floor {
            return Err("arbitration_floor cannot exceed auto_accept_floor".to_string());
        }
        if self.disambiguation_min_count < 2 {
            return Err("disambiguation_min_count must be at least 2".to_string());
        }
        if self.max_candidates == 0 || self.max_arbitration_candidates == 0 || self.search_limit == 0 {
            return Err("candidate limits must be greater than 0".to_string());
        }
        if self.max_top_candidates == 0 || self.max_top_candidates > partmap_domain::mapping::MAX_TOP_CANDIDATES {
            return Err(format!(
                "max_top_candidates must be between 1 and {}",
                partmap_domain::mapping::MAX_TOP_CANDIDATES
            ));
        }
        if self.arbitration_timeout_secs == 0 {
            return Err("arbitration_timeout_secs must be greater than 0".to_string());
        }
        if let Some(rule) = self.exclusions.iter().find(|r| r.contains.trim().is_empty()) {
            return Err(format!("exclusion rule for {} has an empty pattern", rule.kind));
        }
        if let Some(rule) = self.overrides.iter().find(|r| r.raw.trim().is_empty() || r.key.trim().is_empty()) {
            return Err(format!("override rule for {} needs both raw and key", rule.kind));
        }
        Ok(())
    }

    /// The first exclusion rule matching a reference
    pub fn exclusion_for(&self, reference: &ExternalReference) -> Option<&ExclusionRule> {
        let text = fold(reference.primary_text());
        self.exclusions
            .iter()
            .find(|rule| rule.kind == reference.kind() && text.contains(&fold(&rule.contains)))
    }

    /// The first override rule matching a reference
    pub fn override_for(&self, reference: &ExternalReference) -> Option<&OverrideRule> {
        let text = fold(reference.primary_text());
        self.overrides
            .iter()
            .find(|rule| rule.kind == reference.kind() && text == fold(&rule.raw))
    }

    /// Score for a candidate reached through `transforms` transforms
    pub fn transform_score(&self, transforms: usize) -> f64 {
        let steps = transforms.saturating_sub(1) as f64;
        (100.0 - self.transform_step * steps).max(self.transform_floor)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PolicyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_strict_config_is_valid() {
        let config = PolicyConfig::strict();
        assert!(config.validate().is_ok());
        assert!(config.auto_accept_floor > PolicyConfig::default().auto_accept_floor);
    }

    #[test]
    fn test_lenient_config_is_valid() {
        let config = PolicyConfig::lenient();
        assert!(config.validate().is_ok());
        assert!(config.arbitration_floor < PolicyConfig::default().arbitration_floor);
    }

    #[test]
    fn test_invalid_floor_order() {
        let mut config = PolicyConfig::default();
        config.arbitration_floor = 97.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_out_of_range() {
        let mut config = PolicyConfig::default();
        config.display_floor = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_caps_may_reach_accept_floor() {
        let mut config = PolicyConfig::default();
        config.substring_cap = 100.0;
        config.core_cap = 98.0;
        assert!(config.validate().is_ok());

        config.core_cap = 101.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_timeout() {
        let mut config = PolicyConfig::default();
        config.arbitration_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transform_score() {
        let config = PolicyConfig::default();
        assert_eq!(config.transform_score(1), 100.0);
        assert_eq!(config.transform_score(2), 95.0);
        assert_eq!(config.transform_score(3), 90.0);
        assert_eq!(config.transform_score(6), 90.0);
    }

    #[test]
    fn test_exclusion_matching() {
        let config = PolicyConfig {
            exclusions: vec![ExclusionRule {
                kind: CatalogKind::Entities,
                contains: "praxair".to_string(),
                reason: Some("handled by a separate team".to_string()),
            }],
            ..PolicyConfig::default()
        };

        let excluded = ExternalReference::entity("Praxair Distribution Inc", None);
        assert!(config.exclusion_for(&excluded).is_some());

        // rules are scoped to one catalog
        assert!(config.exclusion_for(&ExternalReference::part("PRAXAIR-1")).is_none());
        assert!(config.exclusion_for(&ExternalReference::entity("Acme Gas", None)).is_none());
    }

    #[test]
    fn test_override_matching() {
        let config = PolicyConfig {
            overrides: vec![OverrideRule {
                kind: CatalogKind::Parts,
                raw: "kp-5000".to_string(),
                key: "28Y05E".to_string(),
            }],
            ..PolicyConfig::default()
        };

        let rule = config.override_for(&ExternalReference::part("  KP-5000 ")).unwrap();
        assert_eq!(rule.key, "28Y05E");
        assert!(config.override_for(&ExternalReference::part("KP-50001")).is_none());
    }

    #[test]
    fn test_empty_override_rejected() {
        let config = PolicyConfig {
            overrides: vec![OverrideRule {
                kind: CatalogKind::Parts,
                raw: "X".to_string(),
                key: " ".to_string(),
            }],
            ..PolicyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PolicyConfig {
            exclusions: vec![ExclusionRule {
                kind: CatalogKind::Entities,
                contains: "PRAXAIR".to_string(),
                reason: None,
            }],
            ..PolicyConfig::default()
        };
        let toml_str = config.to_toml().unwrap();
        let parsed = PolicyConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = PolicyConfig::from_toml("auto_accept_floor = 97.0").unwrap();
        assert_eq!(config.auto_accept_floor, 97.0);
        assert_eq!(config.arbitration_floor, 70.0);
        assert!(config.exclusions.is_empty());
    }
}

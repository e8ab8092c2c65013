//! Address-based disambiguation of same-name entity candidates
//!
//! When several high-scoring candidates are the same company (branches of
//! one chain, duplicate accounts), the billing address decides between them.

use crate::config::PolicyConfig;
use crate::normalizer::Normalizer;
use crate::scorer::{rank, ScoredCandidate};
use partmap_catalog::similarity::ratio;
use partmap_domain::{EntityReference, MatchStrategy};
use tracing::debug;

/// Why a candidate group was or was not resolved
#[derive(Debug, Clone, PartialEq)]
pub enum Disambiguation {
    /// Fewer than `disambiguation_min_count` same-identity candidates
    NotNeeded,
    /// The query has no address, or the best street matches tied
    Unresolved,
    /// One candidate won on its street address
    Resolved {
        /// Winning key
        winner: String,
        /// Street similarity of the winner
        similarity: f64,
    },
    /// Several candidates survived the region check
    Narrowed {
        /// Keys still in contention
        survivors: Vec<String>,
    },
    /// No street cleared the bar and no region matched
    Rejected,
}

/// Re-ranked candidates and what happened to them
#[derive(Debug, Clone, PartialEq)]
pub struct DisambiguationOutcome {
    /// Candidates in their new ranking order
    pub candidates: Vec<ScoredCandidate>,
    /// Result of the group check
    pub disposition: Disambiguation,
    /// Keys of the same-identity group (empty when not needed)
    pub group: Vec<String>,
}

/// Breaks ties between same-name entity candidates
pub struct Disambiguator<'a> {
    normalizer: &'a Normalizer,
    policy: &'a PolicyConfig,
}

impl<'a> Disambiguator<'a> {
    /// Create a disambiguator
    pub fn new(normalizer: &'a Normalizer, policy: &'a PolicyConfig) -> Self {
        Self { normalizer, policy }
    }

    /// Run the address and region checks over a ranked candidate list
    pub fn disambiguate(
        &self,
        reference: &EntityReference,
        mut candidates: Vec<ScoredCandidate>,
    ) -> DisambiguationOutcome {
        let group = self.identity_group(&candidates);
        if group.len() < self.policy.disambiguation_min_count {
            return DisambiguationOutcome {
                candidates,
                disposition: Disambiguation::NotNeeded,
                group: Vec::new(),
            };
        }

        let group_keys: Vec<String> = group.iter().map(|&i| candidates[i].key().to_string()).collect();
        debug!("Disambiguating {} same-identity candidates: {:?}", group.len(), group_keys);

        let block = match reference.raw_address_block.as_deref().map(str::trim) {
            Some(block) if !block.is_empty() => block,
            _ => {
                return DisambiguationOutcome {
                    candidates,
                    disposition: Disambiguation::Unresolved,
                    group: group_keys,
                }
            }
        };

        let address = self.normalizer.normalize_address(block);

        let mut similarities: Vec<(usize, f64)> = group
            .iter()
            .map(|&i| {
                let street = candidates[i]
                    .record
                    .as_entity()
                    .map(|e| self.normalizer.normalize_street(&e.street_address))
                    .unwrap_or_default();
                (i, address_similarity(&address.street, &street))
            })
            .collect();
        similarities.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let (best_idx, best) = similarities[0];
        let runner_up = similarities.get(1).map(|s| s.1).unwrap_or(0.0);

        if address.has_street() && best >= self.policy.min_address_similarity {
            if best <= runner_up {
                debug!("Street similarity tied at {}", best);
                return DisambiguationOutcome {
                    candidates,
                    disposition: Disambiguation::Unresolved,
                    group: group_keys,
                };
            }

            let amount = self.boost_for(best);
            for &i in &group {
                let candidate = &mut candidates[i];
                if i == best_idx {
                    candidate.confidence = candidate.confidence.boosted(amount);
                    candidate.strategy = MatchStrategy::AddressBoosted;
                } else {
                    candidate.confidence = candidate.confidence.penalized(amount);
                }
            }
            let winner = candidates[best_idx].key().to_string();
            rank(&mut candidates);
            debug!("Address match picked {} (similarity {})", winner, best);
            return DisambiguationOutcome {
                candidates,
                disposition: Disambiguation::Resolved {
                    winner,
                    similarity: best,
                },
                group: group_keys,
            };
        }

        if address.region_codes.is_empty() {
            return DisambiguationOutcome {
                candidates,
                disposition: Disambiguation::Rejected,
                group: group_keys,
            };
        }

        let mut survivors = Vec::new();
        for &i in &group {
            let candidate = &mut candidates[i];
            let region = candidate
                .record
                .as_entity()
                .map(|e| e.region_code.trim().to_uppercase())
                .unwrap_or_default();
            if address.region_codes.contains(&region) {
                survivors.push(candidate.key().to_string());
            } else {
                candidate.confidence = candidate.confidence.penalized(self.policy.region_penalty);
            }
        }
        rank(&mut candidates);

        let disposition = match survivors.len() {
            0 => Disambiguation::Rejected,
            1 => Disambiguation::Resolved {
                winner: survivors.remove(0),
                similarity: best,
            },
            _ => Disambiguation::Narrowed { survivors },
        };
        debug!("Region fallback: {:?}", disposition);

        DisambiguationOutcome {
            candidates,
            disposition,
            group: group_keys,
        }
    }

    /// Indexes of candidates in the band that are the same company as the top one
    fn identity_group(&self, candidates: &[ScoredCandidate]) -> Vec<usize> {
        let Some(top) = candidates.first() else {
            return Vec::new();
        };
        if !top.confidence.is_at_least(self.policy.high_confidence_band) {
            return Vec::new();
        }

        let top_name = self.normalizer.normalize_entity_name(top.record.label());
        candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.confidence.is_at_least(self.policy.high_confidence_band))
            .filter(|(_, c)| {
                let name = self.normalizer.normalize_entity_name(c.record.label());
                name == top_name || ratio(&name, &top_name) >= self.policy.identity_similarity
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn boost_for(&self, similarity: f64) -> f64 {
        if similarity >= 80.0 {
            self.policy.address_boost_large
        } else if similarity >= 60.0 {
            self.policy.address_boost_medium
        } else {
            self.policy.address_boost_small
        }
    }
}

/// Similarity of two normalized street lines on the 0-100 scale
///
/// Equal streets score 100. A near match whose first two tokens agree (same
/// number, same street name) is raised by 20, up to 95.
pub fn address_similarity(query: &str, candidate: &str) -> f64 {
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    if query == candidate {
        return 100.0;
    }

    let score = ratio(query, candidate);
    let same_lead = leading_tokens(query).len() == 2 && leading_tokens(query) == leading_tokens(candidate);

    if (60.0..100.0).contains(&score) && same_lead {
        (score + 20.0).min(95.0)
    } else {
        score
    }
}

fn leading_tokens(street: &str) -> Vec<&str> {
    street.split_whitespace().take(2).collect()
}

//! Candidate generation
//!
//! Runs every matching strategy for one reference against the catalog and
//! unions the results. Each key appears once, carrying its best strategy.

use crate::config::PolicyConfig;
use crate::error::EngineError;
use crate::normalizer::{fold, Normalizer};
use partmap_catalog::similarity::{length_ratio, ratio};
use partmap_domain::traits::CatalogAccessor;
use partmap_domain::{
    CanonicalRecord, CatalogKind, EntityReference, ExternalReference, MatchCandidate, MatchStrategy,
    PartReference,
};
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::debug;

/// Proposes catalog records for a reference
pub struct CandidateGenerator<'a, C> {
    catalog: &'a C,
    normalizer: &'a Normalizer,
    policy: &'a PolicyConfig,
}

/// Candidates keyed by catalog key, keeping the best proposal per key
#[derive(Debug, Default)]
struct CandidatePool {
    by_key: BTreeMap<String, MatchCandidate>,
}

impl CandidatePool {
    fn offer(&mut self, candidate: MatchCandidate) {
        match self.by_key.entry(candidate.key().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(candidate);
            }
            Entry::Occupied(mut slot) => {
                if candidate.outranks(slot.get()) {
                    slot.insert(candidate);
                }
            }
        }
    }

    fn into_ranked(self, limit: usize) -> Vec<MatchCandidate> {
        let mut candidates: Vec<MatchCandidate> = self.by_key.into_values().collect();
        candidates.sort_by(rank);
        candidates.truncate(limit);
        candidates
    }
}

fn rank(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    b.raw_score
        .total_cmp(&a.raw_score)
        .then_with(|| b.strategy.priority().cmp(&a.strategy.priority()))
        .then_with(|| a.key().cmp(b.key()))
}

fn unavailable<E: Display>(e: E) -> EngineError {
    EngineError::CatalogUnavailable(e.to_string())
}

impl<'a, C: CatalogAccessor> CandidateGenerator<'a, C> {
    /// Create a generator over a catalog
    pub fn new(catalog: &'a C, normalizer: &'a Normalizer, policy: &'a PolicyConfig) -> Self {
        Self {
            catalog,
            normalizer,
            policy,
        }
    }

    /// All candidates for a reference, best first, at most `max_candidates`
    pub fn generate(&self, reference: &ExternalReference) -> Result<Vec<MatchCandidate>, EngineError> {
        let mut pool = CandidatePool::default();
        match reference {
            ExternalReference::Part(part) => self.part_candidates(part, &mut pool)?,
            ExternalReference::Entity(entity) => self.entity_candidates(entity, &mut pool)?,
        }

        let candidates = pool.into_ranked(self.policy.max_candidates);
        debug!(
            "Generated {} {} candidates for '{}'",
            candidates.len(),
            reference.kind(),
            reference.primary_text()
        );
        Ok(candidates)
    }

    fn part_candidates(&self, part: &PartReference, pool: &mut CandidatePool) -> Result<(), EngineError> {
        let query = self.normalizer.normalize_part_number(&part.raw_identifier);
        if query.is_empty() {
            return match part.description.as_deref() {
                Some(description) => self.description_candidates(description, pool),
                None => Ok(()),
            };
        }

        if let Some(record) = self.lookup(CatalogKind::Parts, &query)? {
            pool.offer(MatchCandidate::new(record, MatchStrategy::Exact, 100.0));
        }

        let variants = self.normalizer.part_variants(&query);
        for variant in &variants {
            if let Some(record) = self.lookup(CatalogKind::Parts, &variant.form)? {
                let score = self.policy.transform_score(variant.transforms);
                pool.offer(MatchCandidate::new(record, MatchStrategy::Transformed, score));
            }
        }

        // a prefixed key counts as two transforms, so it never ties a direct hit
        let forms: Vec<(&str, usize)> = std::iter::once((query.as_str(), 0))
            .chain(variants.iter().map(|v| (v.form.as_str(), v.transforms)))
            .collect();

        for (form, transforms) in &forms {
            for prefix in &self.normalizer.rules().catalog_prefixes {
                let key = format!("{}{}", fold(prefix), form);
                if let Some(record) = self.lookup(CatalogKind::Parts, &key)? {
                    let score = self.policy.transform_score(transforms + 2);
                    pool.offer(MatchCandidate::new(record, MatchStrategy::Transformed, score));
                }
            }
        }

        let mut prefiltered: BTreeMap<String, CanonicalRecord> = BTreeMap::new();

        for (form, _) in forms.iter().filter(|(f, _)| f.chars().count() >= self.policy.min_token_len) {
            let records = self
                .catalog
                .search_contains(CatalogKind::Parts, form, self.policy.search_limit)
                .map_err(unavailable)?;

            for record in records {
                let key = fold(record.key());
                let description = fold(record.label());
                let matched = if key.contains(form) {
                    key
                } else if description.contains(form) {
                    description
                } else {
                    continue;
                };
                let score = length_ratio(form, &matched).min(self.policy.substring_cap);
                pool.offer(MatchCandidate::new(record.clone(), MatchStrategy::Substring, score));
                prefiltered.insert(record.key().to_string(), record);
            }
        }

        if let Some(base) = self.normalizer.suffix_base(&query) {
            if base.chars().count() >= self.policy.min_token_len {
                let family = self
                    .catalog
                    .search_prefix(CatalogKind::Parts, &base, self.policy.search_limit)
                    .map_err(unavailable)?;
                for record in family {
                    let score = length_ratio(&base, &fold(record.key())).min(self.policy.substring_cap);
                    pool.offer(MatchCandidate::new(record.clone(), MatchStrategy::Substring, score));
                    prefiltered.insert(record.key().to_string(), record);
                }
            }
        }

        let primary = self.normalizer.primary_form(&query);
        if prefiltered.is_empty() {
            let scored = self
                .catalog
                .search_fuzzy(CatalogKind::Parts, &primary, self.policy.fuzzy_cutoff, self.policy.search_limit)
                .map_err(unavailable)?;
            for (record, score) in scored {
                self.offer_fuzzy(pool, record, score.value());
            }
        } else {
            for record in prefiltered.into_values() {
                let score = ratio(&primary, &fold(record.key()));
                self.offer_fuzzy(pool, record, score);
            }
        }

        Ok(())
    }

    /// Lines without a part number: match on the description text
    fn description_candidates(&self, description: &str, pool: &mut CandidatePool) -> Result<(), EngineError> {
        let text = fold(description);
        let mut prefiltered: BTreeMap<String, CanonicalRecord> = BTreeMap::new();

        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.chars().count() >= self.policy.min_token_len);
        for token in tokens {
            let records = self
                .catalog
                .search_contains(CatalogKind::Parts, token, self.policy.search_limit)
                .map_err(unavailable)?;
            for record in records {
                prefiltered.insert(record.key().to_string(), record);
            }
        }

        for record in prefiltered.into_values() {
            let score = ratio(&text, &fold(record.label()));
            self.offer_fuzzy(pool, record, score);
        }
        Ok(())
    }

    fn entity_candidates(&self, entity: &EntityReference, pool: &mut CandidatePool) -> Result<(), EngineError> {
        let normalized = self.normalizer.normalize_entity_name(&entity.raw_name);
        if normalized.is_empty() {
            return Ok(());
        }

        // an account key typed in place of the name
        if let Some(record) = self.lookup(CatalogKind::Entities, &fold(&entity.raw_name))? {
            pool.offer(MatchCandidate::new(record, MatchStrategy::Exact, 100.0));
        }

        let mut prefiltered: BTreeMap<String, CanonicalRecord> = BTreeMap::new();

        if normalized.chars().count() >= self.policy.min_token_len {
            let records = self
                .catalog
                .search_contains(CatalogKind::Entities, &normalized, self.policy.search_limit)
                .map_err(unavailable)?;
            for record in records {
                let candidate = self.normalizer.normalize_entity_name(record.label());
                if candidate == normalized {
                    pool.offer(MatchCandidate::new(record.clone(), MatchStrategy::Exact, 100.0));
                } else {
                    let matched = if candidate.contains(&normalized) {
                        candidate
                    } else {
                        fold(record.label())
                    };
                    let score = length_ratio(&normalized, &matched).min(self.policy.substring_cap);
                    pool.offer(MatchCandidate::new(record.clone(), MatchStrategy::Substring, score));
                }
                prefiltered.insert(record.key().to_string(), record);
            }
        }

        if let Some(core) = self.normalizer.core_name(&entity.raw_name) {
            if core != normalized {
                let records = self
                    .catalog
                    .search_contains(CatalogKind::Entities, &core, self.policy.search_limit)
                    .map_err(unavailable)?;
                for record in records {
                    let candidate_core = self
                        .normalizer
                        .core_name(record.label())
                        .unwrap_or_else(|| self.normalizer.normalize_entity_name(record.label()));
                    if candidate_core.contains(&core) {
                        let score = (ratio(&core, &candidate_core) + self.policy.core_bonus).min(self.policy.core_cap);
                        pool.offer(MatchCandidate::new(record.clone(), MatchStrategy::Core, score));
                    }
                    prefiltered.insert(record.key().to_string(), record);
                }
            }
        }

        if prefiltered.is_empty() {
            let scored = self
                .catalog
                .search_fuzzy(CatalogKind::Entities, &normalized, 0.0, self.policy.search_limit)
                .map_err(unavailable)?;
            for (record, raw) in scored {
                let candidate = self.normalizer.normalize_entity_name(record.label());
                let score = raw.value().max(ratio(&normalized, &candidate));
                self.offer_name_match(pool, record, &normalized, &candidate, score);
            }
        } else {
            for record in prefiltered.into_values() {
                let candidate = self.normalizer.normalize_entity_name(record.label());
                let score = ratio(&normalized, &candidate);
                self.offer_name_match(pool, record, &normalized, &candidate, score);
            }
        }

        Ok(())
    }

    fn offer_name_match(
        &self,
        pool: &mut CandidatePool,
        record: CanonicalRecord,
        normalized: &str,
        candidate: &str,
        score: f64,
    ) {
        if candidate == normalized {
            pool.offer(MatchCandidate::new(record, MatchStrategy::Exact, 100.0));
        } else {
            self.offer_fuzzy(pool, record, score);
        }
    }

    fn offer_fuzzy(&self, pool: &mut CandidatePool, record: CanonicalRecord, score: f64) {
        if score >= self.policy.fuzzy_cutoff {
            pool.offer(MatchCandidate::new(record, MatchStrategy::Fuzzy, score));
        }
    }

    fn lookup(&self, kind: CatalogKind, key: &str) -> Result<Option<CanonicalRecord>, EngineError> {
        self.catalog.lookup_exact(kind, key).map_err(unavailable)
    }
}

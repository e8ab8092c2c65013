//! Resolution statistics
//!
//! An explicit accumulator passed into each resolution call. Batch callers
//! give every task its own and merge them when the batch is done.

use partmap_domain::{MappingOrigin, MappingResult, MappingStatus};
use serde::Serialize;

/// Counters collected while resolving references
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    /// References resolved (every status)
    pub processed: usize,

    /// Results with status `Mapped`
    pub mapped: usize,

    /// Results with status `ManualReview`
    pub manual_review: usize,

    /// Results with status `NotFound`
    pub not_found: usize,

    /// Arbitration calls made
    pub arbitrations: usize,

    /// Arbitration calls that produced no usable verdict
    pub arbitration_failures: usize,

    /// References mapped by an override rule
    pub overrides: usize,

    /// References stopped by an exclusion rule
    pub excluded: usize,

    /// Order lines skipped as charges
    pub skipped: usize,

    /// References not resolved because the batch was cancelled
    pub cancelled: usize,
}

impl ResolutionStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished resolution
    pub fn record(&mut self, result: &MappingResult) {
        self.processed += 1;
        match result.status() {
            MappingStatus::Mapped => self.mapped += 1,
            MappingStatus::ManualReview => self.manual_review += 1,
            MappingStatus::NotFound => self.not_found += 1,
        }
        if result.origin() == MappingOrigin::ConfiguredOverride {
            self.overrides += 1;
        }
    }

    /// Record an arbitration call and whether it failed
    pub fn record_arbitration(&mut self, failed: bool) {
        self.arbitrations += 1;
        if failed {
            self.arbitration_failures += 1;
        }
    }

    /// Record an excluded reference
    pub fn record_exclusion(&mut self) {
        self.excluded += 1;
    }

    /// Record a skipped order line
    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Record a cancelled reference
    pub fn record_cancellation(&mut self) {
        self.cancelled += 1;
    }

    /// Add another accumulator's counts into this one
    pub fn merge(&mut self, other: &ResolutionStats) {
        self.processed += other.processed;
        self.mapped += other.mapped;
        self.manual_review += other.manual_review;
        self.not_found += other.not_found;
        self.arbitrations += other.arbitrations;
        self.arbitration_failures += other.arbitration_failures;
        self.overrides += other.overrides;
        self.excluded += other.excluded;
        self.skipped += other.skipped;
        self.cancelled += other.cancelled;
    }

    /// Share of processed references that were mapped, in percent
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        self.mapped as f64 / self.processed as f64 * 100.0
    }

    /// Reset all counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Resolution Summary".to_string(),
            "==================".to_string(),
            format!("Processed: {}", self.processed),
            format!("Mapped: {} ({:.1}%)", self.mapped, self.success_rate()),
            format!("Manual review: {}", self.manual_review),
            format!("Not found: {}", self.not_found),
        ];

        if self.arbitrations > 0 {
            lines.push(format!(
                "Arbitrations: {} ({} failed)",
                self.arbitrations, self.arbitration_failures
            ));
        }
        if self.overrides > 0 {
            lines.push(format!("Overrides: {}", self.overrides));
        }
        if self.excluded > 0 {
            lines.push(format!("Excluded: {}", self.excluded));
        }
        if self.skipped > 0 {
            lines.push(format!("Skipped lines: {}", self.skipped));
        }
        if self.cancelled > 0 {
            lines.push(format!("Cancelled: {}", self.cancelled));
        }

        lines.join("\n")
    }
}

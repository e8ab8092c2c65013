//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use partmap_domain::{CandidateSummary, MappingResult, MappingStatus};
use partmap_engine::order::{LineOutcome, OrderReport};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format one mapping result for `query`.
    pub fn format_result(&self, query: &str, result: &MappingResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "query": query,
                "result": result,
            }))?),
            OutputFormat::Table => Ok(self.format_result_table(query, result)),
            OutputFormat::Quiet => Ok(result.matched_key().unwrap_or("-").to_string()),
        }
    }

    fn format_result_table(&self, query: &str, result: &MappingResult) -> String {
        let mut lines = vec![
            format!("{} {}", self.status_label(result.status()), query),
            format!("  Key:        {}", result.matched_key().unwrap_or("-")),
            format!("  Confidence: {}", result.confidence()),
            format!("  Origin:     {:?}", result.origin()),
            format!("  Reasoning:  {}", result.reasoning()),
        ];
        if !result.top_candidates().is_empty() {
            lines.push(self.suggestions_table(result.top_candidates()));
        }
        lines.join("\n")
    }

    fn suggestions_table(&self, suggestions: &[CandidateSummary]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Key", "Label", "Confidence"]);
        for suggestion in suggestions {
            builder.push_record([
                suggestion.key.clone(),
                suggestion.label.clone(),
                suggestion.confidence.to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format an order report.
    pub fn format_order(&self, report: &OrderReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Table => Ok(self.format_order_table(report)),
            OutputFormat::Quiet => Ok(report
                .lines
                .iter()
                .map(|line| match &line.outcome {
                    LineOutcome::Resolved { result } => result.matched_key().unwrap_or("-").to_string(),
                    _ => "-".to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_order_table(&self, report: &OrderReport) -> String {
        let mut out = vec![format!(
            "Order {} (batch {})",
            report.po_number.as_deref().unwrap_or("-"),
            report.batch_id
        )];

        if let Some(customer) = &report.customer {
            out.push(format!("Customer: {}", self.outcome_text(customer)));
        }

        let mut builder = Builder::default();
        builder.push_record(["Line", "Part number", "Description", "Outcome", "Key", "Confidence"]);
        for line in &report.lines {
            let (key, confidence) = match &line.outcome {
                LineOutcome::Resolved { result } => (
                    result.matched_key().unwrap_or("-").to_string(),
                    result.confidence().to_string(),
                ),
                _ => ("-".to_string(), "-".to_string()),
            };
            builder.push_record([
                line.line_number.to_string(),
                line.item.part_number.clone().unwrap_or_default(),
                line.item.description.clone().unwrap_or_default(),
                outcome_name(&line.outcome).to_string(),
                key,
                confidence,
            ]);
        }
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        out.push(table.to_string());

        out.push(report.stats.summary());

        if report.requires_review() {
            out.push(self.warning(&format!("{} item(s) need review:", report.review_items.len())));
            for item in &report.review_items {
                out.push(format!("  - {} '{}': {}", item.subject, item.raw_text, item.reason));
            }
        } else {
            out.push(self.success("No items need review"));
        }

        out.join("\n")
    }

    fn outcome_text(&self, outcome: &LineOutcome) -> String {
        match outcome {
            LineOutcome::Resolved { result } => format!(
                "{} {} ({})",
                self.status_label(result.status()),
                result.matched_key().unwrap_or("-"),
                result.confidence()
            ),
            other => outcome_name(other).to_string(),
        }
    }

    /// Format catalog statistics.
    pub fn format_catalog_stats(&self, source: &str, parts: usize, entities: usize, fingerprint: &str) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "source": source,
                "parts": parts,
                "entities": entities,
                "fingerprint": fingerprint,
            }))?),
            OutputFormat::Table => Ok([
                format!("Catalog:     {}", source),
                format!("Parts:       {}", parts),
                format!("Entities:    {}", entities),
                format!("Fingerprint: {}", fingerprint),
            ]
            .join("\n")),
            OutputFormat::Quiet => Ok(fingerprint.to_string()),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn status_label(&self, status: MappingStatus) -> String {
        match status {
            MappingStatus::Mapped => self.colorize("MAPPED", "green"),
            MappingStatus::ManualReview => self.colorize("REVIEW", "yellow"),
            MappingStatus::NotFound => self.colorize("NOT FOUND", "red"),
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn outcome_name(outcome: &LineOutcome) -> &'static str {
    match outcome {
        LineOutcome::Resolved { result } => result.status().as_str(),
        LineOutcome::Failed { .. } => "failed",
        LineOutcome::Cancelled => "cancelled",
        LineOutcome::Skipped { .. } => "skipped",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partmap_domain::Confidence;

    fn review_result() -> MappingResult {
        MappingResult::manual_review(
            Confidence::new(83.0),
            vec![
                CandidateSummary::new("28Y05E", Confidence::new(83.0), "REGULATORS"),
                CandidateSummary::new("28Y05D", Confidence::new(80.0), "REGULATOR, LOW"),
            ],
            "arbitration unavailable",
        )
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_result("28Y05F", &review_result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["query"], "28Y05F");
        assert_eq!(value["result"]["status"], "manual_review");
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        assert_eq!(formatter.format_result("28Y05F", &review_result()).unwrap(), "-");

        let mapped = MappingResult::manual_correction("28Y05E");
        assert_eq!(formatter.format_result("28Y05F", &mapped).unwrap(), "28Y05E");
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_result("28Y05F", &review_result()).unwrap();
        assert!(output.starts_with("REVIEW 28Y05F"));
        assert!(output.contains("REGULATOR, LOW"));
        assert!(output.contains("Confidence"));
    }

    #[test]
    fn test_catalog_stats() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_catalog_stats("json:catalog.json", 5, 3, "abc123").unwrap();
        assert!(output.contains("Parts:       5"));
        assert!(output.contains("abc123"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}

//! Purchase-order resolution
//!
//! An order resolves its customer block as an entity reference and each
//! line item as a part reference, in one batch. Shipping and handling lines
//! are charges, not parts, and are skipped.

use crate::batch::{BatchEntry, BatchResolver};
use crate::cancel::CancelToken;
use crate::error::ArbitrationError;
use crate::normalizer::fold;
use crate::stats::ResolutionStats;
use partmap_domain::traits::{Arbitrator, CatalogAccessor};
use partmap_domain::{ExternalReference, MappingResult, MappingStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Keywords marking a line as a shipping or handling charge
pub const CHARGE_KEYWORDS: &[&str] = &[
    "SHIPPING",
    "HANDLING",
    "FREIGHT",
    "DELIVERY",
    "SHIP",
    "S&H",
    "S & H",
    "SHIPPING AND HANDLING",
    "HANDLING CHARGE",
    "FREIGHT CHARGE",
    "DELIVERY CHARGE",
    "SHIP CHARGE",
];

/// Structured purchase order, as produced by an upstream extractor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    /// Customer's PO number
    #[serde(default)]
    pub po_number: Option<String>,

    /// Ordering company
    #[serde(default)]
    pub customer: Option<CustomerBlock>,

    /// Ordered lines
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl PurchaseOrder {
    /// Parse an order document
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Company name and billing address as printed on the order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerBlock {
    /// Company name
    pub name: String,

    /// Billing address block, possibly multi-line
    #[serde(default)]
    pub billing_address: Option<String>,
}

impl CustomerBlock {
    /// Entity reference for this block
    pub fn reference(&self) -> ExternalReference {
        ExternalReference::entity(self.name.clone(), self.billing_address.clone())
    }
}

/// One ordered line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Vendor part number
    #[serde(default)]
    pub part_number: Option<String>,

    /// Line description
    #[serde(default)]
    pub description: Option<String>,

    /// Ordered quantity
    #[serde(default)]
    pub quantity: Option<f64>,

    /// Unit price
    #[serde(default)]
    pub unit_price: Option<f64>,
}

impl LineItem {
    /// Part reference for this line
    pub fn reference(&self) -> ExternalReference {
        ExternalReference::part_with_description(
            self.part_number.clone().unwrap_or_default(),
            self.description.clone(),
        )
    }

    fn has_part_number(&self) -> bool {
        self.part_number.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

/// Recognizes charge lines that carry no part
#[derive(Debug, Clone)]
pub struct LineItemFilter {
    keywords: Vec<String>,
}

impl Default for LineItemFilter {
    fn default() -> Self {
        Self::new(CHARGE_KEYWORDS.iter().map(|k| k.to_string()))
    }
}

impl LineItemFilter {
    /// Filter on custom keywords
    pub fn new(keywords: impl IntoIterator<Item = String>) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| fold(&k)).filter(|k| !k.is_empty()).collect(),
        }
    }

    /// The keyword that marks `item` as a charge, if any
    ///
    /// A line is a charge when its description holds a keyword and it has no
    /// part number or a zero unit price.
    pub fn charge_keyword(&self, item: &LineItem) -> Option<&str> {
        let zero_price = item.unit_price.is_some_and(|p| p == 0.0);
        if item.has_part_number() && !zero_price {
            return None;
        }
        let description = fold(item.description.as_deref().unwrap_or_default());
        self.keywords
            .iter()
            .find(|k| description.contains(k.as_str()))
            .map(String::as_str)
    }
}

/// What happened to one order line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LineOutcome {
    /// Resolved by the engine
    Resolved {
        /// The mapping result
        result: MappingResult,
    },
    /// Engine error
    Failed {
        /// Error message
        error: String,
    },
    /// Batch cancelled before this line ran
    Cancelled,
    /// Charge line, not resolved
    Skipped {
        /// Why the line was skipped
        reason: String,
    },
}

impl From<BatchEntry> for LineOutcome {
    fn from(entry: BatchEntry) -> Self {
        match entry {
            BatchEntry::Resolved { result } => LineOutcome::Resolved { result },
            BatchEntry::Failed { error } => LineOutcome::Failed { error },
            BatchEntry::Cancelled => LineOutcome::Cancelled,
        }
    }
}

/// One order line with its outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
    /// 1-based position on the order
    pub line_number: usize,
    /// The line as extracted
    pub item: LineItem,
    /// Resolution outcome
    pub outcome: LineOutcome,
}

/// Something an operator needs to look at
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewItem {
    /// "customer" or "line N"
    pub subject: String,
    /// Input text as extracted
    pub raw_text: String,
    /// Why it needs review
    pub reason: String,
}

/// Resolution of a whole order
#[derive(Debug, Clone, Serialize)]
pub struct OrderReport {
    /// Batch identifier
    pub batch_id: Uuid,
    /// Customer's PO number
    pub po_number: Option<String>,
    /// Customer outcome; `None` when the order has no customer block
    pub customer: Option<LineOutcome>,
    /// Every line, skipped ones included, in order
    pub lines: Vec<OrderLine>,
    /// Merged statistics
    pub stats: ResolutionStats,
    /// Customer and lines needing an operator
    pub review_items: Vec<ReviewItem>,
}

impl OrderReport {
    /// Whether any part of the order needs an operator
    pub fn requires_review(&self) -> bool {
        !self.review_items.is_empty()
    }

    /// The customer's account key, if auto-mapped
    pub fn customer_key(&self) -> Option<&str> {
        match &self.customer {
            Some(LineOutcome::Resolved { result }) => result.matched_key(),
            _ => None,
        }
    }
}

fn review_reason(outcome: &LineOutcome) -> Option<String> {
    match outcome {
        LineOutcome::Resolved { result } if result.needs_review() => {
            let reason = match result.status() {
                MappingStatus::NotFound => format!("not found: {}", result.reasoning()),
                _ => result.reasoning().to_string(),
            };
            Some(reason)
        }
        LineOutcome::Resolved { .. } | LineOutcome::Skipped { .. } => None,
        LineOutcome::Failed { error } => Some(format!("resolution failed: {}", error)),
        LineOutcome::Cancelled => Some("cancelled before resolution".to_string()),
    }
}

impl<C, A> BatchResolver<C, A>
where
    C: CatalogAccessor + Send + Sync + 'static,
    A: Arbitrator + Send + Sync + 'static,
    A::Error: Into<ArbitrationError>,
{
    /// Resolve an order's customer and line items in one batch
    pub async fn resolve_order(
        &self,
        order: &PurchaseOrder,
        filter: &LineItemFilter,
        cancel: CancelToken,
    ) -> OrderReport {
        let mut references = Vec::new();
        if let Some(customer) = &order.customer {
            references.push(customer.reference());
        }

        // None for skipped lines, else the position in `references`
        let mut slots = Vec::with_capacity(order.line_items.len());
        let mut skipped = Vec::new();
        for item in &order.line_items {
            match filter.charge_keyword(item) {
                Some(keyword) => {
                    skipped.push(format!("charge line ({})", keyword));
                    slots.push(None);
                }
                None => {
                    slots.push(Some(references.len()));
                    references.push(item.reference());
                }
            }
        }
        debug!(
            "Order {:?}: {} lines, {} skipped as charges",
            order.po_number,
            order.line_items.len(),
            skipped.len()
        );

        let report = self.run(references, cancel).await;
        let mut entries = report.entries.into_iter().map(Some).collect::<Vec<_>>();
        let mut take = |index: usize| -> LineOutcome {
            entries
                .get_mut(index)
                .and_then(Option::take)
                .map(LineOutcome::from)
                .unwrap_or(LineOutcome::Cancelled)
        };

        let mut stats = report.stats;
        let mut review_items = Vec::new();

        let customer = order.customer.as_ref().map(|block| {
            let outcome = take(0);
            if let Some(reason) = review_reason(&outcome) {
                review_items.push(ReviewItem {
                    subject: "customer".to_string(),
                    raw_text: block.name.clone(),
                    reason,
                });
            }
            outcome
        });

        let mut skipped = skipped.into_iter();
        let mut lines = Vec::with_capacity(order.line_items.len());
        for (position, (item, slot)) in order.line_items.iter().zip(slots).enumerate() {
            let line_number = position + 1;
            let outcome = match slot {
                Some(index) => take(index),
                None => {
                    stats.record_skip();
                    LineOutcome::Skipped {
                        reason: skipped.next().unwrap_or_default(),
                    }
                }
            };
            if let Some(reason) = review_reason(&outcome) {
                review_items.push(ReviewItem {
                    subject: format!("line {}", line_number),
                    raw_text: item.part_number.clone().or_else(|| item.description.clone()).unwrap_or_default(),
                    reason,
                });
            }
            lines.push(OrderLine {
                line_number,
                item: item.clone(),
                outcome,
            });
        }

        info!(
            "Order {:?} resolved: {} lines, {} need review",
            order.po_number,
            lines.len(),
            review_items.len()
        );

        OrderReport {
            batch_id: report.id,
            po_number: order.po_number.clone(),
            customer,
            lines,
            stats,
            review_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitration::NoArbitrator;
    use crate::batch::BatchConfig;
    use crate::config::PolicyConfig;
    use crate::normalizer::Normalizer;
    use crate::resolver::ResolutionEngine;
    use crate::test_support::sample_catalog;
    use std::sync::Arc;

    fn line(part: Option<&str>, description: &str, price: f64) -> LineItem {
        LineItem {
            part_number: part.map(str::to_string),
            description: Some(description.to_string()),
            quantity: Some(1.0),
            unit_price: Some(price),
        }
    }

    #[test]
    fn test_charge_lines() {
        let filter = LineItemFilter::default();
        assert_eq!(filter.charge_keyword(&line(None, "Freight charge", 25.0)), Some("FREIGHT"));
        assert!(filter.charge_keyword(&line(Some("FRT"), "Shipping", 0.0)).is_some());
        assert!(filter.charge_keyword(&line(Some("103D72"), "Tip, ship with order", 12.5)).is_none());
        assert!(filter.charge_keyword(&line(None, "Cutting tip", 12.5)).is_none());
    }

    #[test]
    fn test_custom_keywords() {
        let filter = LineItemFilter::new(vec!["hazmat".to_string()]);
        assert_eq!(filter.charge_keyword(&line(None, "Hazmat fee", 10.0)), Some("HAZMAT"));
        assert!(filter.charge_keyword(&line(None, "Freight", 10.0)).is_none());
    }

    #[test]
    fn test_parse_order() {
        let json = r#"{
            "po_number": "PO-7781",
            "customer": {"name": "Acme Gas", "billing_address": "400 Industrial Pkwy\nPeoria, IL 61602"},
            "line_items": [{"part_number": "103D7-2", "quantity": 4, "unit_price": 12.5}]
        }"#;
        let order = PurchaseOrder::from_json_str(json).unwrap();
        assert_eq!(order.po_number.as_deref(), Some("PO-7781"));
        assert_eq!(order.line_items[0].description, None);
        assert!(matches!(order.customer.unwrap().reference(), ExternalReference::Entity(_)));
    }

    #[tokio::test]
    async fn test_resolve_order() {
        let engine = Arc::new(ResolutionEngine::new(
            sample_catalog(),
            NoArbitrator,
            Normalizer::with_defaults().unwrap(),
        ));
        let batch = BatchResolver::new(engine, PolicyConfig::default(), BatchConfig::default()).unwrap();
        let order = PurchaseOrder {
            po_number: Some("PO-7781".to_string()),
            customer: Some(CustomerBlock {
                name: "Acme Gas".to_string(),
                billing_address: Some("400 Industrial Parkway\nPeoria, IL 61602".to_string()),
            }),
            line_items: vec![
                line(Some("103D7-2"), "Tip", 12.5),
                line(None, "Shipping and handling", 15.0),
                line(Some("QQQQQQQQQQ"), "Unknown widget", 3.0),
            ],
        };

        let report = batch
            .resolve_order(&order, &LineItemFilter::default(), CancelToken::never())
            .await;

        assert_eq!(report.customer_key(), Some("C1002"));
        assert_eq!(report.lines.len(), 3);
        let LineOutcome::Resolved { result } = &report.lines[0].outcome else {
            panic!("line 1 should resolve");
        };
        assert_eq!(result.matched_key(), Some("103D72"));
        assert!(matches!(report.lines[1].outcome, LineOutcome::Skipped { .. }));

        assert!(report.requires_review());
        assert_eq!(report.review_items.len(), 1);
        assert_eq!(report.review_items[0].subject, "line 3");
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(report.stats.processed, 3);
    }

    #[tokio::test]
    async fn test_order_without_customer() {
        let engine = Arc::new(ResolutionEngine::new(
            sample_catalog(),
            NoArbitrator,
            Normalizer::with_defaults().unwrap(),
        ));
        let batch = BatchResolver::new(engine, PolicyConfig::default(), BatchConfig::default()).unwrap();
        let order = PurchaseOrder {
            line_items: vec![line(Some("103D72"), "Tip", 12.5)],
            ..PurchaseOrder::default()
        };
        let report = batch
            .resolve_order(&order, &LineItemFilter::default(), CancelToken::never())
            .await;
        assert!(report.customer.is_none());
        assert!(!report.requires_review());
    }
}

//! Partmap Resolution Engine
//!
//! Maps noisy external references onto canonical catalog records and decides,
//! per reference, whether to auto-accept, disambiguate, arbitrate or hand the
//! item to an operator.
//!
//! # Architecture
//!
//! - `normalizer`: pure text transforms for part numbers, company names and addresses
//! - `generator`: matching strategies run against a `CatalogAccessor`
//! - `scorer`: unified confidence and deterministic ranking
//! - `disambiguator`: billing-address and region tie breaking for same-name entities
//! - `arbitration`: LLM-backed arbitrator, prompt builder and verdict parser
//! - `policy` / `resolver`: thresholds and the per-reference state machine
//! - `batch` / `order`: bounded worker pool with cancellation, purchase-order reports
//!
//! # Examples
//!
//! ```
//! use partmap_catalog::CatalogSnapshot;
//! use partmap_domain::{ExternalReference, MappingStatus, PartRecord};
//! use partmap_engine::{NoArbitrator, Normalizer, PolicyConfig, ResolutionEngine};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let catalog = CatalogSnapshot::new(
//!     vec![PartRecord { key: "103D72".to_string(), description: "TIP, CUTTING".to_string() }],
//!     Vec::new(),
//! );
//! let engine = ResolutionEngine::new(catalog, NoArbitrator, Normalizer::with_defaults().unwrap());
//!
//! let result = engine
//!     .resolve(&ExternalReference::part("103D7-2"), &PolicyConfig::default())
//!     .await
//!     .unwrap();
//! assert_eq!(result.status(), MappingStatus::Mapped);
//! assert_eq!(result.matched_key(), Some("103D72"));
//! # });
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arbitration;
pub mod batch;
pub mod cancel;
pub mod config;
pub mod disambiguator;
pub mod error;
pub mod generator;
pub mod normalizer;
pub mod order;
pub mod policy;
pub mod resolver;
pub mod scorer;
pub mod stats;

#[cfg(test)]
mod test_support;

pub use arbitration::{ConfiguredArbitrator, LlmArbitrator, NoArbitrator};
pub use batch::{BatchConfig, BatchEntry, BatchReport, BatchResolver};
pub use cancel::{cancellation, CancelHandle, CancelToken};
pub use config::{ExclusionRule, OverrideRule, PolicyConfig};
pub use error::{ArbitrationError, EngineError};
pub use normalizer::{Normalizer, NormalizerRules};
pub use order::{LineItemFilter, OrderReport, PurchaseOrder};
pub use resolver::ResolutionEngine;
pub use stats::ResolutionStats;

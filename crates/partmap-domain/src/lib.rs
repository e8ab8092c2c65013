//! Partmap Domain Layer
//!
//! This crate contains the core domain model for partmap, the identity
//! resolution engine that maps noisy external identifiers onto canonical
//! catalog records. It defines the value objects every other crate shares and
//! the trait interfaces at the infrastructure boundary.
//!
//! ## Key Concepts
//!
//! - **External Reference**: the noisy input (a vendor part number, or a company name plus address)
//! - **Canonical Record**: an authoritative catalog entry with a stable key
//! - **Candidate**: a catalog record proposed as a possible match, tagged by strategy
//! - **Confidence**: a score in [0, 100] expressing how likely a candidate is correct
//! - **Mapping Result**: the final decision (mapped, manual review, not found)
//!
//! ## Architecture
//!
//! - Pure data and invariants only
//! - Catalog storage, LLM transport and resolution logic live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arbitration;
pub mod candidate;
pub mod confidence;
pub mod mapping;
pub mod record;
pub mod reference;
pub mod traits;

// Re-exports for convenience
pub use arbitration::{ArbitrationCandidate, ArbitrationMode, ArbitrationRequest, ArbitrationVerdict};
pub use candidate::{MatchCandidate, MatchStrategy};
pub use confidence::Confidence;
pub use mapping::{CandidateSummary, MappingOrigin, MappingResult, MappingStatus};
pub use record::{CanonicalRecord, EntityRecord, PartRecord};
pub use reference::{CatalogKind, EntityReference, ExternalReference, PartReference};

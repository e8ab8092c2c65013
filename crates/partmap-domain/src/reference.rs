//! External references: the noisy inputs to resolution

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which catalog a reference is resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    /// Part catalog (keys are internal part numbers)
    Parts,
    /// Entity catalog (keys are account numbers)
    Entities,
}

impl CatalogKind {
    /// Lowercase name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Parts => "parts",
            CatalogKind::Entities => "entities",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A part number as it appeared on an external document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartReference {
    /// Raw identifier, exactly as extracted
    pub raw_identifier: String,

    /// Free-text line description, if the document had one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A company name and address as they appeared on an external document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityReference {
    /// Raw company name
    pub raw_name: String,

    /// Raw multi-line address block (billing address)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_address_block: Option<String>,
}

/// The noisy input to a resolution call
///
/// Immutable once created: resolution never rewrites the reference, it only
/// derives normalized forms from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExternalReference {
    /// Resolve against the part catalog
    Part(PartReference),
    /// Resolve against the entity catalog
    Entity(EntityReference),
}

impl ExternalReference {
    /// Build a part reference
    pub fn part(raw_identifier: impl Into<String>) -> Self {
        ExternalReference::Part(PartReference {
            raw_identifier: raw_identifier.into(),
            description: None,
        })
    }

    /// Build a part reference with a line description
    pub fn part_with_description(raw_identifier: impl Into<String>, description: Option<String>) -> Self {
        ExternalReference::Part(PartReference {
            raw_identifier: raw_identifier.into(),
            description,
        })
    }

    /// Build an entity reference
    pub fn entity(raw_name: impl Into<String>, raw_address_block: Option<String>) -> Self {
        ExternalReference::Entity(EntityReference {
            raw_name: raw_name.into(),
            raw_address_block,
        })
    }

    /// Catalog this reference resolves against
    pub fn kind(&self) -> CatalogKind {
        match self {
            ExternalReference::Part(_) => CatalogKind::Parts,
            ExternalReference::Entity(_) => CatalogKind::Entities,
        }
    }

    /// The primary raw text (identifier or name)
    pub fn primary_text(&self) -> &str {
        match self {
            ExternalReference::Part(p) => &p.raw_identifier,
            ExternalReference::Entity(e) => &e.raw_name,
        }
    }

    /// Secondary context (description or address block)
    pub fn context_text(&self) -> Option<&str> {
        match self {
            ExternalReference::Part(p) => p.description.as_deref(),
            ExternalReference::Entity(e) => e.raw_address_block.as_deref(),
        }
    }
}

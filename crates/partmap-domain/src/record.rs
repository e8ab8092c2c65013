//! Canonical catalog records

use crate::reference::CatalogKind;
use serde::{Deserialize, Serialize};

/// An internal part number and its description
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartRecord {
    /// Stable internal part number
    pub key: String,

    /// Catalog description
    #[serde(default)]
    pub description: String,
}

/// A customer account with its billing location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Stable account number
    pub key: String,

    /// Company name as held in the catalog
    pub display_name: String,

    /// Street line of the billing address
    #[serde(default)]
    pub street_address: String,

    /// City
    #[serde(default)]
    pub city: String,

    /// Two-letter state or province code
    #[serde(default)]
    pub region_code: String,

    /// Postal code
    #[serde(default)]
    pub postal_code: String,
}

impl EntityRecord {
    /// Whether any part of the billing address is known
    pub fn has_address(&self) -> bool {
        !self.street_address.trim().is_empty()
    }

    /// Single-line location, e.g. `"12 OAK ST, SPRINGFIELD, IL 62701"`
    pub fn location(&self) -> String {
        let region = [self.region_code.trim(), self.postal_code.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        [self.street_address.trim(), self.city.trim(), region.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// An authoritative catalog entry
///
/// Owned by the catalog; the engine only ever reads snapshots of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CanonicalRecord {
    /// Part catalog entry
    Part(PartRecord),
    /// Entity catalog entry
    Entity(EntityRecord),
}

impl CanonicalRecord {
    /// Stable key
    pub fn key(&self) -> &str {
        match self {
            CanonicalRecord::Part(p) => &p.key,
            CanonicalRecord::Entity(e) => &e.key,
        }
    }

    /// Catalog the record belongs to
    pub fn kind(&self) -> CatalogKind {
        match self {
            CanonicalRecord::Part(_) => CatalogKind::Parts,
            CanonicalRecord::Entity(_) => CatalogKind::Entities,
        }
    }

    /// Human-readable label (description or company name)
    pub fn label(&self) -> &str {
        match self {
            CanonicalRecord::Part(p) => &p.description,
            CanonicalRecord::Entity(e) => &e.display_name,
        }
    }

    /// Label plus location, as shown to reviewers and arbitrators
    pub fn display_text(&self) -> String {
        match self {
            CanonicalRecord::Part(p) if p.description.is_empty() => p.key.clone(),
            CanonicalRecord::Part(p) => format!("{} ({})", p.key, p.description),
            CanonicalRecord::Entity(e) => {
                let location = e.location();
                if location.is_empty() {
                    e.display_name.clone()
                } else {
                    format!("{} | {}", e.display_name, location)
                }
            }
        }
    }

    /// Entity view of the record, if it is one
    pub fn as_entity(&self) -> Option<&EntityRecord> {
        match self {
            CanonicalRecord::Entity(e) => Some(e),
            CanonicalRecord::Part(_) => None,
        }
    }
}

impl From<PartRecord> for CanonicalRecord {
    fn from(record: PartRecord) -> Self {
        CanonicalRecord::Part(record)
    }
}

impl From<EntityRecord> for CanonicalRecord {
    fn from(record: EntityRecord) -> Self {
        CanonicalRecord::Entity(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> EntityRecord {
        EntityRecord {
            key: "C1001".to_string(),
            display_name: "Acme Gas Co.".to_string(),
            street_address: "12 Oak St".to_string(),
            city: "Springfield".to_string(),
            region_code: "IL".to_string(),
            postal_code: "62701".to_string(),
        }
    }

    #[test]
    fn test_entity_location() {
        assert_eq!(acme().location(), "12 Oak St, Springfield, IL 62701");
    }

    #[test]
    fn test_location_skips_missing_fields() {
        let mut e = acme();
        e.city.clear();
        e.postal_code.clear();
        assert_eq!(e.location(), "12 Oak St, IL");
    }

    #[test]
    fn test_display_text() {
        let part = CanonicalRecord::from(PartRecord {
            key: "103D72".to_string(),
            description: "TIP, CUTTING".to_string(),
        });
        assert_eq!(part.display_text(), "103D72 (TIP, CUTTING)");
        assert_eq!(part.kind(), CatalogKind::Parts);

        let entity = CanonicalRecord::from(acme());
        assert_eq!(
            entity.display_text(),
            "Acme Gas Co. | 12 Oak St, Springfield, IL 62701"
        );
        assert_eq!(entity.label(), "Acme Gas Co.");
    }
}

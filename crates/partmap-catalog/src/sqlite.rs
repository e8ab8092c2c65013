//! SQLite catalog source

use crate::error::CatalogError;
use crate::snapshot::{CatalogDocument, CatalogSnapshot};
use crate::SnapshotSource;
use partmap_domain::{CatalogKind, EntityRecord, PartRecord};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::info;

/// SQLite-backed catalog
///
/// The engine never queries SQLite directly; it reads the snapshot produced
/// by [`SqliteCatalog::load_snapshot`].
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should open its own
/// `SqliteCatalog`.
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    /// Open (or create) a catalog database
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use partmap_catalog::SqliteCatalog;
    ///
    /// let catalog = SqliteCatalog::open("catalog.db").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let conn = Connection::open(path)?;
        let catalog = Self { conn };
        catalog.initialize_schema()?;
        Ok(catalog)
    }

    fn initialize_schema(&self) -> Result<(), CatalogError> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    /// Insert or replace a part record
    pub fn upsert_part(&self, part: &PartRecord) -> Result<(), CatalogError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO parts (key, description) VALUES (?1, ?2)",
            params![&part.key, &part.description],
        )?;
        Ok(())
    }

    /// Insert or replace an entity record
    pub fn upsert_entity(&self, entity: &EntityRecord) -> Result<(), CatalogError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO entities (key, display_name, street_address, city, region_code, postal_code)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &entity.key,
                &entity.display_name,
                &entity.street_address,
                &entity.city,
                &entity.region_code,
                &entity.postal_code,
            ],
        )?;
        Ok(())
    }

    /// Import a whole document in one transaction
    ///
    /// Returns the number of records written.
    pub fn import(&mut self, document: &CatalogDocument) -> Result<usize, CatalogError> {
        let tx = self.conn.transaction()?;
        {
            let mut part_stmt =
                tx.prepare("INSERT OR REPLACE INTO parts (key, description) VALUES (?1, ?2)")?;
            for part in &document.parts {
                part_stmt.execute(params![&part.key, &part.description])?;
            }

            let mut entity_stmt = tx.prepare(
                "INSERT OR REPLACE INTO entities (key, display_name, street_address, city, region_code, postal_code)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for entity in &document.entities {
                entity_stmt.execute(params![
                    &entity.key,
                    &entity.display_name,
                    &entity.street_address,
                    &entity.city,
                    &entity.region_code,
                    &entity.postal_code,
                ])?;
            }
        }
        tx.commit()?;

        let written = document.parts.len() + document.entities.len();
        info!("Imported {} catalog records", written);
        Ok(written)
    }

    /// Get a single part by key
    pub fn get_part(&self, key: &str) -> Result<Option<PartRecord>, CatalogError> {
        let part = self
            .conn
            .query_row(
                "SELECT key, description FROM parts WHERE key = ?1",
                params![key],
                |row| {
                    Ok(PartRecord {
                        key: row.get(0)?,
                        description: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(part)
    }

    /// Count records in a table
    pub fn count(&self, kind: CatalogKind) -> Result<usize, CatalogError> {
        let sql = match kind {
            CatalogKind::Parts => "SELECT COUNT(*) FROM parts",
            CatalogKind::Entities => "SELECT COUNT(*) FROM entities",
        };
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| CatalogError::InvalidData(format!("negative count {}", count)))
    }

    fn load_parts(&self) -> Result<Vec<PartRecord>, CatalogError> {
        let mut stmt = self.conn.prepare("SELECT key, description FROM parts ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok(PartRecord {
                key: row.get(0)?,
                description: row.get(1)?,
            })
        })?;

        let mut parts = Vec::new();
        for row in rows {
            parts.push(row?);
        }
        Ok(parts)
    }

    fn load_entities(&self) -> Result<Vec<EntityRecord>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT key, display_name, street_address, city, region_code, postal_code
             FROM entities ORDER BY key",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(EntityRecord {
                key: row.get(0)?,
                display_name: row.get(1)?,
                street_address: row.get(2)?,
                city: row.get(3)?,
                region_code: row.get(4)?,
                postal_code: row.get(5)?,
            })
        })?;

        let mut entities = Vec::new();
        for row in rows {
            entities.push(row?);
        }
        Ok(entities)
    }

    /// Read both tables into an in-memory snapshot
    pub fn load_snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        let parts = self.load_parts()?;
        let entities = self.load_entities()?;
        info!(
            "Loaded catalog from SQLite: {} parts, {} entities",
            parts.len(),
            entities.len()
        );
        Ok(CatalogSnapshot::new(parts, entities))
    }
}

impl SnapshotSource for SqliteCatalog {
    fn load_snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        SqliteCatalog::load_snapshot(self)
    }

    fn describe(&self) -> String {
        self.conn
            .path()
            .map(|p| format!("sqlite:{}", p))
            .unwrap_or_else(|| "sqlite::memory:".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let catalog = SqliteCatalog::open(":memory:").unwrap();
        assert_eq!(catalog.count(CatalogKind::Parts).unwrap(), 0);
        assert_eq!(catalog.count(CatalogKind::Entities).unwrap(), 0);
    }

    #[test]
    fn test_upsert_replaces() {
        let catalog = SqliteCatalog::open(":memory:").unwrap();
        let mut part = PartRecord {
            key: "103D72".to_string(),
            description: "old".to_string(),
        };
        catalog.upsert_part(&part).unwrap();
        part.description = "new".to_string();
        catalog.upsert_part(&part).unwrap();

        assert_eq!(catalog.count(CatalogKind::Parts).unwrap(), 1);
        assert_eq!(catalog.get_part("103D72").unwrap().unwrap().description, "new");
        assert!(catalog.get_part("missing").unwrap().is_none());
    }
}

//! In-memory label maps for lookup tables.
//!
//! Lookup tables are closed enumerations stored as rows. [`LookupCache`]
//! reads each one once into a label → id map so writers can resolve labels
//! such as `"Current"` or `"Shipped"` without a query per row, and reject
//! labels that are not members of the table.

use std::collections::HashMap;

use bookstore_schema_core::Catalog;
use rusqlite::Connection;
use tracing::debug;

use crate::error::{Result, SqliteError};

/// Label → id maps for every lookup table in a catalog.
#[derive(Debug, Clone, Default)]
pub struct LookupCache {
    tables: HashMap<String, HashMap<String, i64>>,
}

impl LookupCache {
    /// Loads every lookup table of `catalog` from the database.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::DatabaseError`] if a lookup table is missing.
    pub fn load(conn: &Connection, prefix: &str, catalog: &Catalog) -> Result<Self> {
        let mut tables = HashMap::new();
        for table in catalog.lookup_tables() {
            let (Some(id), Some(label)) = (table.id_column(), table.label_column.as_deref()) else {
                continue;
            };
            let mut stmt = conn.prepare(&format!(
                "SELECT {id}, {label} FROM {prefix}{}",
                table.name
            ))?;
            let entries = stmt
                .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i64>(0)?)))?
                .collect::<rusqlite::Result<HashMap<_, _>>>()?;
            tables.insert(table.name.clone(), entries);
        }
        debug!(tables = tables.len(), "loaded lookup cache");
        Ok(Self { tables })
    }

    /// Resolves a label to its row id.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::UnknownLookupValue`] if the label is not a
    /// member of the table (or the table is not a lookup table).
    pub fn id(&self, table: &str, label: &str) -> Result<i64> {
        self.tables
            .get(table)
            .and_then(|entries| entries.get(label))
            .copied()
            .ok_or_else(|| SqliteError::UnknownLookupValue {
                table: table.to_string(),
                label: label.to_string(),
            })
    }

    /// Returns the labels of a lookup table, sorted.
    pub fn labels(&self, table: &str) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .tables
            .get(table)
            .map(|entries| entries.keys().map(String::as_str).collect())
            .unwrap_or_default();
        labels.sort_unstable();
        labels
    }
}

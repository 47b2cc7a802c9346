//! Migration lifecycle operations for the SQLite schema.
//!
//! Provides [`Migration`] for creating, dropping, seeding, and refreshing
//! the bookstore tables. All mutation operations use transactions to ensure
//! atomicity.
//!
//! # Example
//!
//! ```no_run
//! use bookstore_schema_core::SeedSet;
//! use bookstore_schema_sqlite::Migration;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("bookstore.db").unwrap();
//! let mut migration = Migration::new(conn, "").unwrap();
//!
//! // Create tables
//! migration.up().unwrap();
//!
//! // Seed the lookup tables
//! migration.seed(&SeedSet::bookstore_defaults()).unwrap();
//!
//! // Check status
//! let status = migration.status().unwrap();
//! assert!(status.tables_exist);
//!
//! // Drop, recreate, and reseed
//! migration.refresh(&SeedSet::bookstore_defaults()).unwrap();
//! ```

use bookstore_schema_core::{Catalog, SeedSet, bookstore_catalog, validate_catalog, validate_seed};
use bookstore_schema_db::{SeedLoader, SeedSource, fingerprint_lines, seed_fingerprint};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, SqliteError};
use crate::schema::{generate_drop_sql, generate_schema_sql, validate_prefix};
use crate::seed::{TableSeedCount, read_canonical_lines, upsert_table};

/// Manages the lifecycle of the bookstore tables on one connection.
///
/// Provides operations to create tables ([`up`](Self::up)), drop them
/// ([`down`](Self::down)), upsert lookup rows ([`seed`](Self::seed)),
/// and check the current state ([`status`](Self::status)).
///
/// Schema creation, seeding, and dropping each run inside a single
/// transaction: either every statement applies or none does.
///
/// # Examples
///
/// ```
/// use bookstore_schema_core::SeedSet;
/// use bookstore_schema_sqlite::Migration;
/// use rusqlite::Connection;
///
/// let conn = Connection::open_in_memory().unwrap();
/// let mut migration = Migration::new(conn, "shop_").unwrap();
/// migration.up().unwrap();
///
/// let report = migration.seed(&SeedSet::bookstore_defaults()).unwrap();
/// assert_eq!(report.inserted(), 20);
///
/// // A second run changes nothing
/// let report = migration.seed(&SeedSet::bookstore_defaults()).unwrap();
/// assert_eq!(report.inserted(), 0);
/// assert_eq!(report.updated(), 20);
/// ```
pub struct Migration {
    conn: Connection,
    prefix: String,
    catalog: Catalog,
}

impl Migration {
    /// Creates a migration manager for the bookstore catalog.
    ///
    /// Enables foreign-key enforcement on the connection.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`] if the prefix contains invalid characters.
    pub fn new(conn: Connection, prefix: impl Into<String>) -> Result<Self> {
        Self::with_catalog(conn, prefix, bookstore_catalog())
    }

    /// Creates a migration manager for an arbitrary catalog.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`] for a bad prefix, or
    /// [`SqliteError::ValidationError`] with the first structural problem
    /// found in `catalog`.
    pub fn with_catalog(conn: Connection, prefix: impl Into<String>, catalog: Catalog) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        if let Some(err) = validate_catalog(&catalog).into_iter().next() {
            return Err(err.into());
        }
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn, prefix, catalog })
    }

    /// Creates all tables and indexes.
    ///
    /// Uses `IF NOT EXISTS` so it is safe to call multiple times.
    pub fn up(&mut self) -> Result<()> {
        let sql = generate_schema_sql(&self.catalog, &self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::MigrationError(format!("failed to create tables: {e}")))?;
        tx.commit()?;
        info!(prefix = %self.prefix, tables = self.catalog.tables.len(), "created schema");
        Ok(())
    }

    /// Drops all tables in reverse dependency order.
    ///
    /// Uses `DROP TABLE IF EXISTS` so it is safe to call even if tables
    /// do not exist.
    pub fn down(&mut self) -> Result<()> {
        let sql = generate_drop_sql(&self.catalog, &self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::MigrationError(format!("failed to drop tables: {e}")))?;
        tx.commit()?;
        info!(prefix = %self.prefix, "dropped schema");
        Ok(())
    }

    /// Reports which tables exist and how many rows each holds.
    pub fn status(&self) -> Result<MigrationStatus> {
        let mut tables = Vec::with_capacity(self.catalog.tables.len());
        for table in &self.catalog.tables {
            let exists = self.table_exists(&table.name)?;
            let rows = if exists { self.count_rows(&table.name)? } else { 0 };
            tables.push(TableStatus {
                name: table.name.clone(),
                exists,
                rows,
            });
        }
        Ok(MigrationStatus {
            tables_exist: tables.iter().all(|t| t.exists),
            tables,
        })
    }

    /// Upserts every row of `seed` into its lookup table.
    ///
    /// Rows are matched on the table's natural key; existing rows keep their
    /// ids and have their other seeded columns overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::ValidationError`] if the seed does not fit the
    /// catalog, or [`SqliteError::MigrationError`] if the tables have not
    /// been created.
    pub fn seed(&mut self, seed: &SeedSet) -> Result<SeedReport> {
        if let Some(err) = validate_seed(&self.catalog, seed).into_iter().next() {
            return Err(err.into());
        }
        self.require_tables()?;

        let tx = self.conn.transaction()?;
        let mut report = SeedReport::default();
        for table in &seed.tables {
            report.tables.push(upsert_table(&tx, &self.prefix, table)?);
        }
        tx.commit()?;

        info!(
            inserted = report.inserted(),
            updated = report.updated(),
            "seeded lookup tables"
        );
        Ok(report)
    }

    /// Loads a seed set through `loader` and applies it.
    ///
    /// The report records which source won the fallback chain.
    pub fn seed_from(&mut self, loader: SeedLoader) -> Result<SeedReport> {
        let loaded = loader.load()?;
        debug!(source = ?loaded.source, rows = loaded.seed.row_count(), "loaded seed");
        let mut report = self.seed(&loaded.seed)?;
        report.source = Some(loaded.source);
        Ok(report)
    }

    /// Drops all tables, recreates them, and seeds them.
    ///
    /// Equivalent to calling [`down`](Self::down), [`up`](Self::up), then
    /// [`seed`](Self::seed) in sequence.
    pub fn refresh(&mut self, seed: &SeedSet) -> Result<SeedReport> {
        self.down()?;
        self.up()?;
        self.seed(seed)
    }

    /// Fingerprint of the lookup rows currently stored, over the tables and
    /// columns `seed` covers.
    ///
    /// Equal to [`seed_fingerprint`] of `seed` exactly when the database holds
    /// the seeded rows and nothing else in those tables.
    pub fn lookup_fingerprint(&self, seed: &SeedSet) -> Result<String> {
        self.require_tables()?;
        let mut lines = Vec::new();
        for table in &seed.tables {
            lines.extend(read_canonical_lines(&self.conn, &self.prefix, table)?);
        }
        Ok(fingerprint_lines(&lines))
    }

    /// Returns `true` if the lookup tables match `seed`.
    pub fn seed_in_sync(&self, seed: &SeedSet) -> Result<bool> {
        Ok(self.lookup_fingerprint(seed)? == seed_fingerprint(seed))
    }

    /// Returns the table prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the catalog this migration manages.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the migration and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    fn require_tables(&self) -> Result<()> {
        for table in &self.catalog.tables {
            if !self.table_exists(&table.name)? {
                return Err(SqliteError::MigrationError(format!(
                    "table {}{} does not exist; run `up` first",
                    self.prefix, table.name
                )));
            }
        }
        Ok(())
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let table_name = format!("{}{}", self.prefix, table);
        let mut stmt = self.conn.prepare(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        )?;
        let count: i64 = stmt.query_row([&table_name], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn count_rows(&self, table: &str) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT COUNT(*) FROM {}{}", self.prefix, table))?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Existence and row count of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStatus {
    /// Unprefixed table name.
    pub name: String,
    pub exists: bool,
    pub rows: usize,
}

/// Snapshot returned by [`Migration::status`].
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Whether every catalog table exists.
    pub tables_exist: bool,
    /// Per-table state, in catalog order.
    pub tables: Vec<TableStatus>,
}

impl MigrationStatus {
    /// Row count of a table, or `None` if it is unknown or missing.
    pub fn rows(&self, table: &str) -> Option<usize> {
        self.tables
            .iter()
            .find(|t| t.name == table && t.exists)
            .map(|t| t.rows)
    }

    /// Names of catalog tables that do not exist.
    pub fn missing_tables(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| !t.exists)
            .map(|t| t.name.as_str())
            .collect()
    }
}

/// Report of a seed operation.
///
/// Returned by [`Migration::seed`], [`Migration::seed_from`], and
/// [`Migration::refresh`].
#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    /// Where the rows came from, when loaded through a [`SeedLoader`].
    pub source: Option<SeedSource>,
    /// Per-table counts, in seed order.
    pub tables: Vec<TableSeedCount>,
}

impl SeedReport {
    /// Total rows inserted across all tables.
    pub fn inserted(&self) -> usize {
        self.tables.iter().map(|t| t.inserted).sum()
    }

    /// Total rows overwritten across all tables.
    pub fn updated(&self) -> usize {
        self.tables.iter().map(|t| t.updated).sum()
    }
}

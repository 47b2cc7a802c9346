//! SQLite backend for the bookstore schema.
//!
//! This crate turns the typed catalog from `bookstore-schema-core` into a
//! live SQLite database: DDL generation, migration lifecycle, idempotent
//! lookup seeding, role enforcement, and the read helpers the store's
//! access patterns need.
//!
//! # Architecture
//!
//! - **`schema`**: `CREATE`/`DROP` SQL generation with table prefixes
//! - **`migration`**: lifecycle operations (up/down/seed/refresh/status)
//! - **`seed`**: per-row upsert of lookup tables by natural key
//! - **`access`**: per-role authorizer on a connection
//! - **`grants`**: `GRANT` scripts for MySQL and PostgreSQL servers
//! - **`lookup`**: label → id maps for lookup tables
//! - **`query`**: read helpers and label-based writes
//!
//! # Quick start: migrations
//!
//! ```no_run
//! use bookstore_schema_core::SeedSet;
//! use bookstore_schema_sqlite::Migration;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("bookstore.db").unwrap();
//! let mut migration = Migration::new(conn, "").unwrap();
//!
//! migration.up().unwrap();
//! migration.seed(&SeedSet::bookstore_defaults()).unwrap();
//!
//! let status = migration.status().unwrap();
//! println!("order statuses: {:?}", status.rows("order_status"));
//! ```
//!
//! # Quick start: roles
//!
//! ```no_run
//! use bookstore_schema_core::Role;
//! use bookstore_schema_sqlite::{CatalogQuery, RoleGuard};
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("bookstore.db").unwrap();
//! RoleGuard::install(&conn, Role::Staff, "").unwrap();
//!
//! let query = CatalogQuery::new(&conn, "").unwrap();
//! query.record_status(42, "Shipped", Some("left warehouse")).unwrap();
//! ```
//!
//! # Table prefix customization
//!
//! All table and index names are prefixed with a configurable string,
//! allowing multiple isolated schema sets within the same SQLite database.
//! Prefixes may be empty and must contain only alphanumeric characters and
//! underscores.

mod access;
mod error;
mod grants;
mod lookup;
mod migration;
mod query;
mod schema;
mod seed;

pub use access::RoleGuard;
pub use error::{Result, SqliteError};
pub use grants::{GrantDialect, generate_grant_sql};
pub use lookup::LookupCache;
pub use migration::{Migration, MigrationStatus, SeedReport, TableStatus};
pub use query::{
    AddressRow, BookRow, CatalogQuery, LanguageCount, OrderLineRow, OrderRow, StatusEntry,
};
pub use schema::{generate_drop_sql, generate_schema_sql};
pub use seed::TableSeedCount;

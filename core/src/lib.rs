//! Core catalog types for the bookstore relational schema.
//!
//! This crate describes the schema as data rather than as SQL text:
//!
//! - [`Catalog`] / [`TableDef`] / [`ColumnDef`] — tables, columns, keys,
//!   and indexes, kept in dependency order.
//! - [`ForeignKeyDef`] with an explicit [`FkAction`] per relationship
//!   (`CASCADE`, `RESTRICT`, or `SET NULL`).
//! - [`bookstore_catalog`] — the fifteen bookstore tables.
//! - [`SeedSet`] — lookup-table rows applied by idempotent upsert.
//! - [`Role`] — the three fixed roles and their per-table [`TableGrant`]s.
//!
//! Validation ([`validate_catalog`], [`validate_seed`]) catches structural
//! errors such as missing primary keys, malformed junction tables, forward
//! references, and seed rows that do not fit their table.
//!
//! # Example
//!
//! ```
//! use bookstore_schema_core::*;
//!
//! let catalog = bookstore_catalog();
//! let book = catalog.table("book").unwrap();
//! assert!(book.is_unique_column("isbn13"));
//!
//! let line = catalog.table("order_line").unwrap();
//! let book_fk = line.foreign_keys.iter().find(|fk| fk.column == "book_id").unwrap();
//! assert_eq!(book_fk.on_delete, FkAction::Restrict);
//!
//! assert!(validate_catalog(&catalog).is_empty());
//! ```

mod catalog;
mod roles;
mod seed;
mod types;
mod validate;

pub use catalog::{bookstore_catalog, tables};
pub use roles::{Privilege, Role, STAFF_ADDRESS_UPDATE_COLUMNS, TableGrant, UnknownRole};
pub use seed::{SeedSet, SeedTable, SeedValue};
pub use types::*;
pub use validate::{ValidationError, validate_catalog, validate_seed};

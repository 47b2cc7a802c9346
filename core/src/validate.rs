//! Catalog and seed validation.
//!
//! Validates structural invariants of a [`Catalog`] and of a [`SeedSet`]
//! against it, catching missing primary keys, malformed junction tables,
//! dangling foreign keys, and seed rows that do not fit their table before
//! any SQL reaches the engine.
//!
//! # Examples
//!
//! ```
//! use bookstore_schema_core::*;
//!
//! let catalog = bookstore_catalog();
//! assert!(validate_catalog(&catalog).is_empty());
//! assert!(validate_seed(&catalog, &SeedSet::bookstore_defaults()).is_empty());
//!
//! // A table without a primary key is rejected.
//! let bad = Catalog::new(vec![
//!     TableDef::new("note", TableKind::Entity)
//!         .with_column(ColumnDef::new("body", ColumnType::Text)),
//! ]);
//! assert!(!validate_catalog(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Catalog, FkAction, SeedSet, TableDef, TableKind};

/// Catalog/seed validation errors.
///
/// Each variant describes a specific structural problem found during
/// validation. The `Display` impl provides a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Table name is empty or whitespace-only.
    #[error("table name cannot be empty")]
    EmptyTableName,
    /// Two tables share a name.
    #[error("duplicate table: {0}")]
    DuplicateTable(String),
    /// Two columns in the same table share a name.
    #[error("duplicate column {table}.{column}")]
    DuplicateColumn { table: String, column: String },
    /// Table declares no primary key.
    #[error("table {0} has no primary key")]
    MissingPrimaryKey(String),
    /// A key, index, or constraint names a column the table does not have.
    #[error("table {table} references unknown column {column}")]
    UnknownColumn { table: String, column: String },
    /// Junction table's primary key is not exactly its two foreign-key columns.
    #[error("junction table {0} must use a composite primary key of its two foreign keys")]
    InvalidJunctionKey(String),
    /// Foreign key targets a table that is not declared before it.
    #[error("foreign key {table}.{column} references {target}, which is not declared earlier")]
    UnresolvedReference {
        table: String,
        column: String,
        target: String,
    },
    /// Foreign key targets a column that is neither the primary key nor unique.
    #[error("foreign key {table}.{column} must reference a unique column, got {target}")]
    NonUniqueReference {
        table: String,
        column: String,
        target: String,
    },
    /// `SET NULL` policy on a column that cannot hold NULL.
    #[error("foreign key {table}.{column} uses SET NULL on a NOT NULL column")]
    SetNullOnRequiredColumn { table: String, column: String },
    /// Seed rows target a table missing from the catalog.
    #[error("seed targets unknown table: {0}")]
    UnknownSeedTable(String),
    /// Seed rows target a table that is not a lookup table.
    #[error("seed targets non-lookup table: {0}")]
    NotALookupTable(String),
    /// Seed conflict key is not a listed, unique column.
    #[error("seed key {table}.{column} must be a listed unique column")]
    InvalidSeedKey { table: String, column: String },
    /// Seed row has the wrong number of values.
    #[error("seed row {row} of {table} has {actual} values, expected {expected}")]
    SeedRowArity {
        table: String,
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Validates a full catalog.
///
/// Stops at the first table with errors, mirroring how creation would fail
/// at that table.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut declared: HashSet<&str> = HashSet::new();

    for table in &catalog.tables {
        let name = table.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::EmptyTableName);
            return errors;
        }
        if !declared.insert(name) {
            errors.push(ValidationError::DuplicateTable(name.to_string()));
            return errors;
        }

        errors.extend(validate_table(table, catalog, &declared));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

fn validate_table(table: &TableDef, catalog: &Catalog, declared: &HashSet<&str>) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let unknown = |column: &str| ValidationError::UnknownColumn {
        table: table.name.clone(),
        column: column.to_string(),
    };

    let mut seen = HashSet::new();
    for column in &table.columns {
        if !seen.insert(column.name.as_str()) {
            errors.push(ValidationError::DuplicateColumn {
                table: table.name.clone(),
                column: column.name.clone(),
            });
            return errors;
        }
    }

    if table.primary_key.is_empty() {
        errors.push(ValidationError::MissingPrimaryKey(table.name.clone()));
        return errors;
    }
    if let Some(missing) = table.primary_key.iter().find(|c| table.column(c).is_none()) {
        errors.push(unknown(missing));
        return errors;
    }

    if table.kind == TableKind::Junction {
        let fk_columns: HashSet<&str> = table.foreign_keys.iter().map(|fk| fk.column.as_str()).collect();
        let pk_is_two_fks = table.primary_key.len() == 2
            && table.primary_key.iter().all(|c| fk_columns.contains(c.as_str()));
        if !pk_is_two_fks {
            errors.push(ValidationError::InvalidJunctionKey(table.name.clone()));
            return errors;
        }
    }

    for fk in &table.foreign_keys {
        let Some(column) = table.column(&fk.column) else {
            errors.push(unknown(&fk.column));
            return errors;
        };

        // Self-references are allowed; anything else must already exist.
        let target = if fk.references_table == table.name {
            Some(table)
        } else if declared.contains(fk.references_table.as_str()) {
            catalog.table(&fk.references_table)
        } else {
            None
        };
        let Some(target) = target else {
            errors.push(ValidationError::UnresolvedReference {
                table: table.name.clone(),
                column: fk.column.clone(),
                target: fk.references_table.clone(),
            });
            return errors;
        };
        if !target.is_unique_column(&fk.references_column) {
            errors.push(ValidationError::NonUniqueReference {
                table: table.name.clone(),
                column: fk.column.clone(),
                target: format!("{}.{}", fk.references_table, fk.references_column),
            });
            return errors;
        }

        let sets_null = fk.on_delete == FkAction::SetNull || fk.on_update == FkAction::SetNull;
        if sets_null && column.not_null {
            errors.push(ValidationError::SetNullOnRequiredColumn {
                table: table.name.clone(),
                column: fk.column.clone(),
            });
            return errors;
        }
    }

    for index in &table.indexes {
        if let Some(missing) = index.columns.iter().find(|c| table.column(c).is_none()) {
            errors.push(unknown(missing));
            return errors;
        }
    }

    if let Some(label) = &table.label_column {
        if table.column(label).is_none() {
            errors.push(unknown(label));
        }
    }

    errors
}

/// Validates seed rows against the catalog they will be applied to.
pub fn validate_seed(catalog: &Catalog, seed: &SeedSet) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for seed_table in &seed.tables {
        let Some(table) = catalog.table(&seed_table.table) else {
            errors.push(ValidationError::UnknownSeedTable(seed_table.table.clone()));
            return errors;
        };
        if table.kind != TableKind::Lookup {
            errors.push(ValidationError::NotALookupTable(table.name.clone()));
            return errors;
        }

        if let Some(missing) = seed_table.columns.iter().find(|c| table.column(c).is_none()) {
            errors.push(ValidationError::UnknownColumn {
                table: table.name.clone(),
                column: missing.clone(),
            });
            return errors;
        }

        let key_listed = seed_table.key_index().is_some();
        if !key_listed || !table.is_unique_column(&seed_table.key) {
            errors.push(ValidationError::InvalidSeedKey {
                table: table.name.clone(),
                column: seed_table.key.clone(),
            });
            return errors;
        }

        for (i, row) in seed_table.rows.iter().enumerate() {
            if row.len() != seed_table.columns.len() {
                errors.push(ValidationError::SeedRowArity {
                    table: table.name.clone(),
                    row: i,
                    expected: seed_table.columns.len(),
                    actual: row.len(),
                });
                return errors;
            }
        }
    }

    errors
}

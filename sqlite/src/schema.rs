//! SQL schema generation with customizable table prefixes.
//!
//! Renders `CREATE TABLE` and `CREATE INDEX` statements from a
//! [`Catalog`]. Every statement is guarded with `IF NOT EXISTS`, so the
//! script is safe to re-run. All table, index, and foreign-key target names
//! are prefixed with a configurable string to allow multiple isolated
//! schema sets in the same database.
//!
//! # Custom prefix
//!
//! Prefixes may be empty (canonical table names) or contain only
//! alphanumeric characters and underscores.

use std::fmt::Write as _;

use bookstore_schema_core::{Catalog, ColumnDef, TableDef};

use crate::error::{Result, SqliteError};

/// Validates that a table prefix contains only alphanumeric characters and underscores.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

fn render_column(column: &ColumnDef) -> String {
    let mut sql = format!("{} {}", column.name, column.column_type);
    if column.not_null {
        sql.push_str(" NOT NULL");
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default {
        let _ = write!(sql, " DEFAULT {default}");
    }
    if let Some(check) = &column.check {
        let _ = write!(sql, " CHECK ({check})");
    }
    sql
}

/// Renders the `CREATE TABLE` statement and index statements for one table.
pub(crate) fn render_table(table: &TableDef, prefix: &str) -> String {
    let mut lines: Vec<String> = table.columns.iter().map(render_column).collect();
    lines.push(format!("PRIMARY KEY ({})", table.primary_key.join(", ")));
    for fk in &table.foreign_keys {
        lines.push(format!(
            "FOREIGN KEY ({}) REFERENCES {prefix}{}({}) ON DELETE {} ON UPDATE {}",
            fk.column, fk.references_table, fk.references_column, fk.on_delete, fk.on_update
        ));
    }

    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {prefix}{} (\n    {}\n);\n",
        table.name,
        lines.join(",\n    ")
    );
    for index in table.index_plan() {
        let _ = writeln!(
            sql,
            "CREATE INDEX IF NOT EXISTS {prefix}{} ON {prefix}{}({});",
            index.name,
            table.name,
            index.columns.join(", ")
        );
    }
    sql
}

/// Generates the complete SQL schema for all tables with the given prefix.
///
/// Tables are emitted in catalog (dependency) order, each followed by its
/// indexes.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix contains characters
/// other than ASCII alphanumerics and underscores.
///
/// # Examples
///
/// ```
/// use bookstore_schema_core::bookstore_catalog;
/// use bookstore_schema_sqlite::generate_schema_sql;
///
/// let sql = generate_schema_sql(&bookstore_catalog(), "").unwrap();
/// assert!(sql.contains("CREATE TABLE IF NOT EXISTS order_line ("));
/// assert!(sql.contains("REFERENCES book(book_id) ON DELETE RESTRICT"));
/// ```
pub fn generate_schema_sql(catalog: &Catalog, prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;
    Ok(catalog
        .tables
        .iter()
        .map(|table| render_table(table, prefix))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Generates SQL to drop all schema tables in reverse dependency order.
///
/// Indexes are dropped implicitly with their tables.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix is invalid.
pub fn generate_drop_sql(catalog: &Catalog, prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;
    let mut sql = String::new();
    for table in catalog.tables.iter().rev() {
        let _ = writeln!(sql, "DROP TABLE IF EXISTS {prefix}{};", table.name);
    }
    Ok(sql)
}

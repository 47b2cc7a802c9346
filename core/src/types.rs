//! Catalog type definitions for relational table modeling.
//!
//! This module defines the data model used to describe tables, columns,
//! keys, and foreign-key propagation policies. The types are plain data
//! and serialize with [`serde`], so a catalog can be rendered to SQL,
//! inspected by tooling, or dumped as JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

/// SQL column type.
///
/// Rendered with the declared type names (`VARCHAR(n)`, `DECIMAL(p,s)`, ...)
/// so the persisted layout keeps the same column types across engines.
/// SQLite maps these onto its affinities.
///
/// # Examples
///
/// ```
/// use bookstore_schema_core::ColumnType;
///
/// assert_eq!(ColumnType::Varchar(13).to_string(), "VARCHAR(13)");
/// assert_eq!(ColumnType::Decimal { precision: 10, scale: 2 }.to_string(), "DECIMAL(10,2)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// 64-bit integer; used for all surrogate keys.
    Integer,
    /// Bounded character data.
    Varchar(u16),
    /// Fixed-point number.
    Decimal { precision: u8, scale: u8 },
    /// Calendar date.
    Date,
    /// Date and time of day.
    DateTime,
    /// Unbounded character data.
    Text,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::Varchar(len) => write!(f, "VARCHAR({len})"),
            ColumnType::Decimal { precision, scale } => write!(f, "DECIMAL({precision},{scale})"),
            ColumnType::Date => write!(f, "DATE"),
            ColumnType::DateTime => write!(f, "DATETIME"),
            ColumnType::Text => write!(f, "TEXT"),
        }
    }
}

/// Propagation policy of a foreign key on parent delete or update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FkAction {
    /// Dependent rows are deleted (or their key updated) with the parent.
    Cascade,
    /// The parent change is rejected while dependents exist.
    Restrict,
    /// The dependent reference is detached.
    SetNull,
}

impl FkAction {
    /// Returns the SQL keyword for this policy.
    pub fn as_sql(self) -> &'static str {
        match self {
            FkAction::Cascade => "CASCADE",
            FkAction::Restrict => "RESTRICT",
            FkAction::SetNull => "SET NULL",
        }
    }
}

impl fmt::Display for FkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A single column definition.
///
/// # Examples
///
/// ```
/// use bookstore_schema_core::{ColumnDef, ColumnType};
///
/// let email = ColumnDef::new("email", ColumnType::Varchar(350)).unique();
/// assert!(email.unique);
/// assert!(!email.not_null);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Declared SQL type.
    pub column_type: ColumnType,
    /// Whether the column rejects NULL.
    #[serde(default)]
    pub not_null: bool,
    /// Whether the column carries a single-column UNIQUE constraint.
    #[serde(default)]
    pub unique: bool,
    /// SQL default expression, rendered verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// SQL CHECK expression over this row, rendered verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
}

impl ColumnDef {
    /// Creates a nullable, non-unique column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            not_null: false,
            unique: false,
            default: None,
            check: None,
        }
    }

    /// Marks the column `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Marks the column `UNIQUE`.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the SQL default expression.
    pub fn default_sql(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    /// Sets the SQL CHECK expression.
    pub fn check(mut self, expr: impl Into<String>) -> Self {
        self.check = Some(expr.into());
        self
    }
}

/// A foreign key from one column to a column of another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    /// Referencing column in the owning table.
    pub column: String,
    /// Referenced (parent) table, unprefixed.
    pub references_table: String,
    /// Referenced column in the parent table.
    pub references_column: String,
    /// Policy applied when the parent row is deleted.
    pub on_delete: FkAction,
    /// Policy applied when the parent key is updated.
    pub on_update: FkAction,
}

impl ForeignKeyDef {
    /// Creates a foreign key with the given delete policy and `ON UPDATE CASCADE`.
    pub fn new(
        column: impl Into<String>,
        references_table: impl Into<String>,
        references_column: impl Into<String>,
        on_delete: FkAction,
    ) -> Self {
        Self {
            column: column.into(),
            references_table: references_table.into(),
            references_column: references_column.into(),
            on_delete,
            on_update: FkAction::Cascade,
        }
    }
}

/// A secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Index name, unprefixed.
    pub name: String,
    /// Indexed columns, in order.
    pub columns: Vec<String>,
}

impl IndexDef {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Role a table plays in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableKind {
    /// A transactional or catalog entity.
    Entity,
    /// A many-to-many link keyed by its two foreign keys.
    Junction,
    /// A closed set of reference values, populated by seeding.
    Lookup,
}

/// A complete table definition.
///
/// # Examples
///
/// ```
/// use bookstore_schema_core::*;
///
/// let table = TableDef::new("country", TableKind::Lookup)
///     .with_column(ColumnDef::new("country_id", ColumnType::Integer))
///     .with_column(ColumnDef::new("country_name", ColumnType::Varchar(200)).not_null().unique())
///     .with_primary_key(&["country_id"])
///     .with_label("country_name");
///
/// assert_eq!(table.primary_key, vec!["country_id"]);
/// assert_eq!(table.label_column.as_deref(), Some("country_name"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    /// Table name, unprefixed.
    pub name: String,
    /// Table role.
    pub kind: TableKind,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Primary key columns; composite for junction tables.
    pub primary_key: Vec<String>,
    /// Outgoing foreign keys.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDef>,
    /// Explicit secondary indexes beyond the per-FK indexes.
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
    /// For lookup tables, the unique column holding the human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_column: Option<String>,
}

impl TableDef {
    pub fn new(name: impl Into<String>, kind: TableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
            label_column: None,
        }
    }

    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_foreign_key(mut self, fk: ForeignKeyDef) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn with_index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_label(mut self, column: impl Into<String>) -> Self {
        self.label_column = Some(column.into());
        self
    }

    /// Finds a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns `true` if `name` is the table's sole primary-key column or
    /// carries a UNIQUE constraint.
    pub fn is_unique_column(&self, name: &str) -> bool {
        (self.primary_key.len() == 1 && self.primary_key[0] == name)
            || self.column(name).is_some_and(|c| c.unique)
    }

    /// Returns the single-column surrogate key, if the table has one.
    pub fn id_column(&self) -> Option<&str> {
        match self.primary_key.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// Returns every secondary index the table needs.
    ///
    /// Each foreign-key column gets an `idx_{table}_{column}` index unless it
    /// already leads the primary key (SQLite's implicit PK index covers it).
    /// Explicit indexes follow.
    pub fn index_plan(&self) -> Vec<IndexDef> {
        let leading_pk = self.primary_key.first().map(String::as_str);
        let mut plan: Vec<IndexDef> = self
            .foreign_keys
            .iter()
            .filter(|fk| Some(fk.column.as_str()) != leading_pk)
            .map(|fk| IndexDef::new(format!("idx_{}_{}", self.name, fk.column), &[&fk.column]))
            .collect();
        plan.extend(self.indexes.iter().cloned());
        plan
    }
}

/// An ordered set of tables.
///
/// Tables are kept in dependency order: every table appears after the tables
/// its foreign keys reference, so creation runs front to back and dropping
/// runs back to front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Catalog {
    pub tables: Vec<TableDef>,
}

impl Catalog {
    pub fn new(tables: Vec<TableDef>) -> Self {
        Self { tables }
    }

    /// Finds a table by unprefixed name.
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Iterates over lookup tables in dependency order.
    pub fn lookup_tables(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.iter().filter(|t| t.kind == TableKind::Lookup)
    }

    /// Iterates over table names in dependency order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_line() -> TableDef {
        TableDef::new("order_line", TableKind::Entity)
            .with_column(ColumnDef::new("line_id", ColumnType::Integer))
            .with_column(ColumnDef::new("order_id", ColumnType::Integer).not_null())
            .with_column(ColumnDef::new("book_id", ColumnType::Integer).not_null())
            .with_primary_key(&["line_id"])
            .with_foreign_key(ForeignKeyDef::new("order_id", "cust_order", "order_id", FkAction::Cascade))
            .with_foreign_key(ForeignKeyDef::new("book_id", "book", "book_id", FkAction::Restrict))
    }

    #[test]
    fn test_index_plan_covers_every_foreign_key() {
        let plan = order_line().index_plan();
        let names: Vec<_> = plan.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["idx_order_line_order_id", "idx_order_line_book_id"]);
    }

    #[test]
    fn test_index_plan_skips_leading_pk_column() {
        let junction = TableDef::new("book_author", TableKind::Junction)
            .with_column(ColumnDef::new("book_id", ColumnType::Integer).not_null())
            .with_column(ColumnDef::new("author_id", ColumnType::Integer).not_null())
            .with_primary_key(&["book_id", "author_id"])
            .with_foreign_key(ForeignKeyDef::new("book_id", "book", "book_id", FkAction::Cascade))
            .with_foreign_key(ForeignKeyDef::new("author_id", "author", "author_id", FkAction::Cascade));

        let plan = junction.index_plan();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].columns, vec!["author_id"]);
    }

    #[test]
    fn test_unique_column_detection() {
        let table = order_line();
        assert!(table.is_unique_column("line_id"));
        assert!(!table.is_unique_column("order_id"));
        assert_eq!(table.id_column(), Some("line_id"));
    }

    #[test]
    fn test_fk_action_sql() {
        assert_eq!(FkAction::SetNull.to_string(), "SET NULL");
        assert_eq!(FkAction::Restrict.as_sql(), "RESTRICT");
    }
}

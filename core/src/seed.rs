//! Seed rows for lookup tables.
//!
//! A [`SeedSet`] lists, per lookup table, the natural key used for conflict
//! detection and the literal rows to upsert. Seeding inserts each row or, on
//! a key conflict, overwrites the row's non-key columns, so repeated runs
//! converge to the same table contents.
//!
//! # Example YAML
//!
//! ```yaml
//! tables:
//!   - table: shipping_method
//!     key: method_name
//!     columns: [method_name, cost]
//!     rows:
//!       - [Standard, 5.00]
//!       - [Express, 15.00]
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::tables;

/// A literal seed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedValue {
    Null,
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl SeedValue {
    /// Canonical textual form used for fingerprints.
    ///
    /// Integers and decimals share one numeric form, since the engine may
    /// store `5.00` as the integer `5` under numeric affinity.
    pub fn canonical(&self) -> String {
        match self {
            SeedValue::Null => "null".to_string(),
            SeedValue::Integer(i) => format!("n:{i}"),
            SeedValue::Decimal(d) if d.fract() == 0.0 && d.abs() < i64::MAX as f64 => {
                format!("n:{}", *d as i64)
            }
            SeedValue::Decimal(d) => format!("n:{d}"),
            SeedValue::Text(s) => format!("s:{s}"),
        }
    }
}

impl fmt::Display for SeedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedValue::Null => write!(f, "NULL"),
            SeedValue::Integer(i) => write!(f, "{i}"),
            SeedValue::Decimal(d) => write!(f, "{d:.2}"),
            SeedValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for SeedValue {
    fn from(value: &str) -> Self {
        SeedValue::Text(value.to_string())
    }
}

impl From<f64> for SeedValue {
    fn from(value: f64) -> Self {
        SeedValue::Decimal(value)
    }
}

impl From<i64> for SeedValue {
    fn from(value: i64) -> Self {
        SeedValue::Integer(value)
    }
}

/// Seed rows for one lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedTable {
    /// Unprefixed table name.
    pub table: String,
    /// Unique column used as the upsert conflict target.
    pub key: String,
    /// Columns supplied by each row, key included.
    pub columns: Vec<String>,
    /// Literal rows, one value per column.
    pub rows: Vec<Vec<SeedValue>>,
}

impl SeedTable {
    pub fn new(table: impl Into<String>, key: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            table: table.into(),
            key: key.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<SeedValue>) -> Self {
        self.rows.push(row);
        self
    }

    /// Columns overwritten on conflict: every listed column except the key.
    pub fn update_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(move |c| *c != self.key)
    }

    /// Position of the key column within each row.
    pub fn key_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| *c == self.key)
    }

    /// Canonical lines for this table, sorted so row order does not matter.
    pub fn canonical_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let cells: Vec<String> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(col, value)| format!("{col}={}", value.canonical()))
                    .collect();
                format!("{}|{}", self.table, cells.join(";"))
            })
            .collect();
        lines.sort();
        lines
    }
}

/// The complete set of lookup rows applied by the seed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SeedSet {
    pub tables: Vec<SeedTable>,
}

impl SeedSet {
    /// The reference data every bookstore database starts with.
    ///
    /// # Examples
    ///
    /// ```
    /// use bookstore_schema_core::SeedSet;
    ///
    /// let seed = SeedSet::bookstore_defaults();
    /// assert_eq!(seed.row_count(), 3 + 4 + 4 + 3 + 6);
    /// ```
    pub fn bookstore_defaults() -> Self {
        let languages = SeedTable::new(
            tables::BOOK_LANGUAGE,
            "language_code",
            &["language_code", "language_name"],
        )
        .with_row(vec!["en".into(), "English".into()])
        .with_row(vec!["es".into(), "Spanish".into()])
        .with_row(vec!["fr".into(), "French".into()]);

        let countries = ["United States", "Canada", "United Kingdom", "Kenya"]
            .into_iter()
            .fold(
                SeedTable::new(tables::COUNTRY, "country_name", &["country_name"]),
                |t, name| t.with_row(vec![name.into()]),
            );

        let address_statuses = ["Current", "Old", "Billing", "Shipping"].into_iter().fold(
            SeedTable::new(tables::ADDRESS_STATUS, "address_status", &["address_status"]),
            |t, label| t.with_row(vec![label.into()]),
        );

        let shipping = SeedTable::new(tables::SHIPPING_METHOD, "method_name", &["method_name", "cost"])
            .with_row(vec!["Standard".into(), SeedValue::Decimal(5.00)])
            .with_row(vec!["Express".into(), SeedValue::Decimal(15.00)])
            .with_row(vec!["Next Day".into(), SeedValue::Decimal(25.00)]);

        let order_statuses = [
            "Pending",
            "Processing",
            "Shipped",
            "Delivered",
            "Cancelled",
            "Returned",
        ]
        .into_iter()
        .fold(
            SeedTable::new(tables::ORDER_STATUS, "status_value", &["status_value"]),
            |t, label| t.with_row(vec![label.into()]),
        );

        Self {
            tables: vec![languages, countries, address_statuses, shipping, order_statuses],
        }
    }

    /// Finds the seed rows for a table.
    pub fn table(&self, name: &str) -> Option<&SeedTable> {
        self.tables.iter().find(|t| t.table == name)
    }

    /// Total number of rows across all tables.
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }

    /// Canonical content of the whole set, independent of row order.
    pub fn canonical_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.tables.iter().flat_map(SeedTable::canonical_lines).collect();
        lines.sort();
        lines
    }
}

//! Upsert of lookup rows and reading lookup content back.
//!
//! Each seed row is written with
//! `INSERT ... ON CONFLICT(key) DO UPDATE SET col = excluded.col`, so an
//! existing row keeps its surrogate id (and every reference to it) while its
//! non-key columns converge to the seeded values.

use bookstore_schema_core::{SeedTable, SeedValue};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, OptionalExtension, params_from_iter};
use tracing::debug;

use crate::error::Result;

/// Rows inserted and updated for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSeedCount {
    /// Unprefixed table name.
    pub table: String,
    /// Rows whose key was not present before.
    pub inserted: usize,
    /// Rows whose key already existed and were overwritten.
    pub updated: usize,
}

fn to_sql_value(value: &SeedValue) -> Value {
    match value {
        SeedValue::Null => Value::Null,
        SeedValue::Integer(i) => Value::Integer(*i),
        SeedValue::Decimal(d) => Value::Real(*d),
        SeedValue::Text(s) => Value::Text(s.clone()),
    }
}

fn from_sql_value(value: ValueRef<'_>) -> SeedValue {
    match value {
        ValueRef::Null => SeedValue::Null,
        ValueRef::Integer(i) => SeedValue::Integer(i),
        ValueRef::Real(d) => SeedValue::Decimal(d),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            SeedValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn upsert_sql(prefix: &str, table: &SeedTable) -> String {
    let placeholders: Vec<String> = (1..=table.columns.len()).map(|i| format!("?{i}")).collect();
    let updates: Vec<String> = table
        .update_columns()
        .map(|col| format!("{col} = excluded.{col}"))
        .collect();
    let action = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };
    format!(
        "INSERT INTO {prefix}{} ({}) VALUES ({}) ON CONFLICT({}) {action}",
        table.table,
        table.columns.join(", "),
        placeholders.join(", "),
        table.key,
    )
}

/// Upserts every row of `table`, returning how many were new.
///
/// The seed table must already have passed validation; a row without its
/// key column is skipped.
pub(crate) fn upsert_table(conn: &Connection, prefix: &str, table: &SeedTable) -> Result<TableSeedCount> {
    let mut counts = TableSeedCount {
        table: table.table.clone(),
        ..Default::default()
    };
    let Some(key_index) = table.key_index() else {
        return Ok(counts);
    };

    let mut exists = conn.prepare(&format!(
        "SELECT 1 FROM {prefix}{} WHERE {} = ?1",
        table.table, table.key
    ))?;
    let mut upsert = conn.prepare(&upsert_sql(prefix, table))?;

    for row in &table.rows {
        let values: Vec<Value> = row.iter().map(to_sql_value).collect();
        let existed = exists
            .query_row([&values[key_index]], |_| Ok(()))
            .optional()?
            .is_some();
        upsert.execute(params_from_iter(values.iter()))?;
        if existed {
            counts.updated += 1;
        } else {
            counts.inserted += 1;
        }
    }

    debug!(
        table = %table.table,
        inserted = counts.inserted,
        updated = counts.updated,
        "seeded lookup table"
    );
    Ok(counts)
}

/// Reads the current contents of the columns `table` seeds, as canonical
/// lines comparable with [`SeedTable::canonical_lines`].
pub(crate) fn read_canonical_lines(conn: &Connection, prefix: &str, table: &SeedTable) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {prefix}{}",
        table.columns.join(", "),
        table.table
    ))?;
    let mut rows = stmt.query([])?;
    let mut current = SeedTable {
        rows: Vec::new(),
        ..table.clone()
    };
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(table.columns.len());
        for i in 0..table.columns.len() {
            values.push(from_sql_value(row.get_ref(i)?));
        }
        current.rows.push(values);
    }
    Ok(current.canonical_lines())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping() -> SeedTable {
        SeedTable::new("shipping_method", "method_name", &["method_name", "cost"])
            .with_row(vec!["Standard".into(), SeedValue::Decimal(5.00)])
    }

    #[test]
    fn test_upsert_sql_updates_non_key_columns() {
        let sql = upsert_sql("t_", &shipping());
        assert_eq!(
            sql,
            "INSERT INTO t_shipping_method (method_name, cost) VALUES (?1, ?2) \
             ON CONFLICT(method_name) DO UPDATE SET cost = excluded.cost"
        );
    }

    #[test]
    fn test_upsert_sql_key_only_table_does_nothing_on_conflict() {
        let table = SeedTable::new("country", "country_name", &["country_name"]);
        assert!(upsert_sql("", &table).ends_with("ON CONFLICT(country_name) DO NOTHING"));
    }

    #[test]
    fn test_upsert_counts_and_overwrites() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE shipping_method (
                method_id INTEGER PRIMARY KEY,
                method_name VARCHAR(100) NOT NULL UNIQUE,
                cost DECIMAL(6,2) NOT NULL DEFAULT 0
            );",
        )
        .unwrap();

        let first = upsert_table(&conn, "", &shipping()).unwrap();
        assert_eq!((first.inserted, first.updated), (1, 0));

        let changed = SeedTable::new("shipping_method", "method_name", &["method_name", "cost"])
            .with_row(vec!["Standard".into(), SeedValue::Decimal(6.50)]);
        let second = upsert_table(&conn, "", &changed).unwrap();
        assert_eq!((second.inserted, second.updated), (0, 1));

        let (id, cost): (i64, f64) = conn
            .query_row("SELECT method_id, cost FROM shipping_method", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(id, 1);
        assert!((cost - 6.50).abs() < 1e-9);
    }

    #[test]
    fn test_read_back_matches_seed_lines() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE shipping_method (
                method_id INTEGER PRIMARY KEY,
                method_name VARCHAR(100) NOT NULL UNIQUE,
                cost DECIMAL(6,2) NOT NULL DEFAULT 0
            );",
        )
        .unwrap();
        upsert_table(&conn, "", &shipping()).unwrap();

        // NUMERIC affinity stores 5.00 as the integer 5
        let lines = read_canonical_lines(&conn, "", &shipping()).unwrap();
        assert_eq!(lines, shipping().canonical_lines());
    }
}

//! Read helpers over the bookstore tables.
//!
//! Provides [`CatalogQuery`] for the store's common access patterns: books
//! by publisher or author, a customer's addresses by status, orders and
//! their lines, the latest status of an order, and per-language counts.
//! Every join follows a foreign key, so each lookup is index-backed.
//!
//! A few writes live here too because they take lookup labels rather than
//! ids: linking a customer to an address, changing the link's status, and
//! appending to an order's history. Labels are resolved through a
//! [`LookupCache`] loaded when the query is created.
//!
//! # Example
//!
//! ```no_run
//! use bookstore_schema_sqlite::CatalogQuery;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("bookstore.db").unwrap();
//! let query = CatalogQuery::new(&conn, "").unwrap();
//!
//! for address in query.current_addresses(1).unwrap() {
//!     println!("{} {}", address.city, address.country);
//! }
//! if let Some(status) = query.latest_status(42).unwrap() {
//!     println!("order 42 is {} since {}", status.status, status.status_date);
//! }
//! ```

use bookstore_schema_core::{bookstore_catalog, tables};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::error::{Result, SqliteError};
use crate::lookup::LookupCache;
use crate::schema::validate_prefix;

const CURRENT_ADDRESS: &str = "Current";

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses an engine timestamp (`CURRENT_TIMESTAMP` or ISO-8601 text).
/// A bare date is read as midnight.
fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| SqliteError::ConversionError(format!("invalid timestamp '{value}'")))
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// A book as listed by publisher or author.
#[derive(Debug, Clone, PartialEq)]
pub struct BookRow {
    pub book_id: i64,
    pub title: String,
    pub isbn13: Option<String>,
    pub price: Option<f64>,
}

/// An address linked to a customer, with its link status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRow {
    pub address_id: i64,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub status: String,
}

/// One order header.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub order_id: i64,
    pub order_date: NaiveDateTime,
    /// `None` once the customer has been deleted.
    pub customer_id: Option<i64>,
    pub shipping_method: Option<String>,
    /// Stored total; see [`CatalogQuery::refresh_order_total`].
    pub total_order_price: f64,
}

/// One line of an order, with the price captured at order time.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineRow {
    pub line_id: i64,
    pub book_id: i64,
    pub title: String,
    pub price: f64,
    pub quantity: i64,
}

/// An order history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub history_id: i64,
    pub status: String,
    pub status_date: NaiveDateTime,
    pub notes: Option<String>,
}

/// Number of books in one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageCount {
    pub language_code: String,
    pub language_name: String,
    pub books: usize,
}

/// Query interface over the bookstore tables.
///
/// # Examples
///
/// ```
/// use bookstore_schema_core::SeedSet;
/// use bookstore_schema_sqlite::{CatalogQuery, Migration};
/// use rusqlite::Connection;
///
/// let mut migration = Migration::new(Connection::open_in_memory().unwrap(), "").unwrap();
/// migration.up().unwrap();
/// migration.seed(&SeedSet::bookstore_defaults()).unwrap();
///
/// let query = CatalogQuery::new(migration.connection(), "").unwrap();
/// let counts = query.book_count_per_language().unwrap();
/// assert_eq!(counts.len(), 3);
/// assert!(counts.iter().all(|c| c.books == 0));
/// ```
pub struct CatalogQuery<'a> {
    conn: &'a Connection,
    prefix: String,
    lookups: LookupCache,
}

impl<'a> CatalogQuery<'a> {
    /// Creates a query interface and loads the lookup tables.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`] if the prefix contains invalid
    /// characters, or a database error if the lookup tables are missing.
    pub fn new(conn: &'a Connection, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let lookups = LookupCache::load(conn, &prefix, &bookstore_catalog())?;
        Ok(Self {
            conn,
            prefix,
            lookups,
        })
    }

    /// The label maps loaded at construction.
    pub fn lookups(&self) -> &LookupCache {
        &self.lookups
    }

    fn table(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    fn books_where(&self, join: &str, filter: &str, value: &str) -> Result<Vec<BookRow>> {
        let sql = format!(
            "SELECT b.book_id, b.title, b.isbn13, b.price FROM {} b {join} WHERE {filter} = ?1 ORDER BY b.title",
            self.table(tables::BOOK)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([value], |row| {
                Ok(BookRow {
                    book_id: row.get(0)?,
                    title: row.get(1)?,
                    isbn13: row.get(2)?,
                    price: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Books from the named publisher, by title.
    pub fn books_by_publisher(&self, publisher_name: &str) -> Result<Vec<BookRow>> {
        let join = format!(
            "JOIN {} p ON p.publisher_id = b.publisher_id",
            self.table(tables::PUBLISHER)
        );
        self.books_where(&join, "p.publisher_name", publisher_name)
    }

    /// Books credited to the named author, by title.
    pub fn books_by_author(&self, author_name: &str) -> Result<Vec<BookRow>> {
        let join = format!(
            "JOIN {} ba ON ba.book_id = b.book_id JOIN {} a ON a.author_id = ba.author_id",
            self.table(tables::BOOK_AUTHOR),
            self.table(tables::AUTHOR)
        );
        self.books_where(&join, "a.author_name", author_name)
    }

    /// A customer's addresses whose link has the given status label.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::UnknownLookupValue`] if `status` is not an
    /// address status.
    pub fn addresses_with_status(&self, customer_id: i64, status: &str) -> Result<Vec<AddressRow>> {
        let status_id = self.lookups.id(tables::ADDRESS_STATUS, status)?;
        let sql = format!(
            "SELECT a.address_id, a.street_number, a.street_name, a.city, a.region, a.postal_code,
                    c.country_name, s.address_status
             FROM {} ca
             JOIN {} a ON a.address_id = ca.address_id
             JOIN {} c ON c.country_id = a.country_id
             JOIN {} s ON s.status_id = ca.status_id
             WHERE ca.customer_id = ?1 AND ca.status_id = ?2
             ORDER BY a.address_id",
            self.table(tables::CUSTOMER_ADDRESS),
            self.table(tables::ADDRESS),
            self.table(tables::COUNTRY),
            self.table(tables::ADDRESS_STATUS),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![customer_id, status_id], |row| {
                Ok(AddressRow {
                    address_id: row.get(0)?,
                    street_number: row.get(1)?,
                    street_name: row.get(2)?,
                    city: row.get(3)?,
                    region: row.get(4)?,
                    postal_code: row.get(5)?,
                    country: row.get(6)?,
                    status: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// A customer's current addresses.
    pub fn current_addresses(&self, customer_id: i64) -> Result<Vec<AddressRow>> {
        self.addresses_with_status(customer_id, CURRENT_ADDRESS)
    }

    /// Links a customer to an address with the given status.
    ///
    /// # Errors
    ///
    /// Fails with a constraint violation if the pair is already linked, and
    /// with [`SqliteError::UnknownLookupValue`] for an unknown status.
    pub fn link_customer_address(&self, customer_id: i64, address_id: i64, status: &str) -> Result<()> {
        let status_id = self.lookups.id(tables::ADDRESS_STATUS, status)?;
        self.conn.execute(
            &format!(
                "INSERT INTO {} (customer_id, address_id, status_id) VALUES (?1, ?2, ?3)",
                self.table(tables::CUSTOMER_ADDRESS)
            ),
            params![customer_id, address_id, status_id],
        )?;
        Ok(())
    }

    /// Changes the status of an existing customer–address link in place.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::NotFound`] if the pair is not linked.
    pub fn set_address_status(&self, customer_id: i64, address_id: i64, status: &str) -> Result<()> {
        let status_id = self.lookups.id(tables::ADDRESS_STATUS, status)?;
        let changed = self.conn.execute(
            &format!(
                "UPDATE {} SET status_id = ?3 WHERE customer_id = ?1 AND address_id = ?2",
                self.table(tables::CUSTOMER_ADDRESS)
            ),
            params![customer_id, address_id, status_id],
        )?;
        if changed == 0 {
            return Err(SqliteError::NotFound(format!(
                "address {address_id} for customer {customer_id}"
            )));
        }
        Ok(())
    }

    fn orders_where(&self, filter: &str, id: i64) -> Result<Vec<OrderRow>> {
        let sql = format!(
            "SELECT o.order_id, o.order_date, o.customer_id, s.method_name, o.total_order_price
             FROM {} o
             LEFT JOIN {} s ON s.method_id = o.shipping_method_id
             WHERE {filter} = ?1
             ORDER BY o.order_date, o.order_id",
            self.table(tables::CUST_ORDER),
            self.table(tables::SHIPPING_METHOD),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let raw = stmt
            .query_map([id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, f64>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raw.into_iter()
            .map(|(order_id, date, customer_id, shipping_method, total)| {
                Ok(OrderRow {
                    order_id,
                    order_date: parse_timestamp(&date)?,
                    customer_id,
                    shipping_method,
                    total_order_price: total,
                })
            })
            .collect()
    }

    /// A customer's orders, oldest first.
    pub fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<OrderRow>> {
        self.orders_where("o.customer_id", customer_id)
    }

    /// One order header, if it exists.
    pub fn order(&self, order_id: i64) -> Result<Option<OrderRow>> {
        Ok(self.orders_where("o.order_id", order_id)?.into_iter().next())
    }

    /// The lines of an order.
    pub fn lines_for_order(&self, order_id: i64) -> Result<Vec<OrderLineRow>> {
        let sql = format!(
            "SELECT l.line_id, l.book_id, b.title, l.price, l.quantity
             FROM {} l
             JOIN {} b ON b.book_id = l.book_id
             WHERE l.order_id = ?1
             ORDER BY l.line_id",
            self.table(tables::ORDER_LINE),
            self.table(tables::BOOK),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([order_id], |row| {
                Ok(OrderLineRow {
                    line_id: row.get(0)?,
                    book_id: row.get(1)?,
                    title: row.get(2)?,
                    price: row.get(3)?,
                    quantity: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Appends a status entry to an order's history and returns its id.
    ///
    /// History is append-only; a new entry never replaces an older one.
    pub fn record_status(&self, order_id: i64, status: &str, notes: Option<&str>) -> Result<i64> {
        let status_id = self.lookups.id(tables::ORDER_STATUS, status)?;
        self.conn.execute(
            &format!(
                "INSERT INTO {} (order_id, status_id, notes) VALUES (?1, ?2, ?3)",
                self.table(tables::ORDER_HISTORY)
            ),
            params![order_id, status_id, notes],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The most recent history entry of an order.
    ///
    /// Entries with the same timestamp are ordered by insertion.
    pub fn latest_status(&self, order_id: i64) -> Result<Option<StatusEntry>> {
        let sql = format!(
            "SELECT h.history_id, s.status_value, h.status_date, h.notes
             FROM {} h
             JOIN {} s ON s.status_id = h.status_id
             WHERE h.order_id = ?1
             ORDER BY h.status_date DESC, h.history_id DESC
             LIMIT 1",
            self.table(tables::ORDER_HISTORY),
            self.table(tables::ORDER_STATUS),
        );
        let raw = self
            .conn
            .query_row(&sql, [order_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .optional()?;

        raw.map(|(history_id, status, date, notes)| {
            Ok(StatusEntry {
                history_id,
                status,
                status_date: parse_timestamp(&date)?,
                notes,
            })
        })
        .transpose()
    }

    /// Book count for every language, including languages with no books.
    pub fn book_count_per_language(&self) -> Result<Vec<LanguageCount>> {
        let sql = format!(
            "SELECT l.language_code, l.language_name, COUNT(b.book_id)
             FROM {} l
             LEFT JOIN {} b ON b.language_id = l.language_id
             GROUP BY l.language_id
             ORDER BY l.language_code",
            self.table(tables::BOOK_LANGUAGE),
            self.table(tables::BOOK),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(LanguageCount {
                    language_code: row.get(0)?,
                    language_name: row.get(1)?,
                    books: row.get::<_, i64>(2)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Sum of line price × quantity plus the shipping cost, rounded to cents.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::NotFound`] if the order does not exist.
    pub fn computed_order_total(&self, order_id: i64) -> Result<f64> {
        let sql = format!(
            "SELECT COALESCE((SELECT SUM(l.price * l.quantity) FROM {} l WHERE l.order_id = o.order_id), 0)
                    + COALESCE(s.cost, 0)
             FROM {} o
             LEFT JOIN {} s ON s.method_id = o.shipping_method_id
             WHERE o.order_id = ?1",
            self.table(tables::ORDER_LINE),
            self.table(tables::CUST_ORDER),
            self.table(tables::SHIPPING_METHOD),
        );
        let total: Option<f64> = self
            .conn
            .query_row(&sql, [order_id], |row| row.get(0))
            .optional()?;
        total
            .map(round_cents)
            .ok_or_else(|| SqliteError::NotFound(format!("order {order_id}")))
    }

    /// Stores the computed total in `cust_order.total_order_price` and
    /// returns it.
    pub fn refresh_order_total(&self, order_id: i64) -> Result<f64> {
        let total = self.computed_order_total(order_id)?;
        self.conn.execute(
            &format!(
                "UPDATE {} SET total_order_price = ?1 WHERE order_id = ?2",
                self.table(tables::CUST_ORDER)
            ),
            params![total, order_id],
        )?;
        debug!(order_id, total, "refreshed order total");
        Ok(total)
    }
}

//! The bookstore catalog: every table, key, and foreign-key policy.
//!
//! Tables are listed in dependency order. Delete policies follow the data
//! retention rules of the store:
//!
//! - `RESTRICT` where removing a parent would orphan order data or a closed
//!   enumeration value (book from order lines, country, address and order
//!   statuses).
//! - `SET NULL` where order history must outlive the referenced row
//!   (customer, shipping method, destination address) or where the reference
//!   is optional metadata (language, publisher).
//! - `CASCADE` for rows owned by their parent (junction links, order lines,
//!   order history).

use crate::types::{
    Catalog, ColumnDef, ColumnType, FkAction, ForeignKeyDef, IndexDef, TableDef, TableKind,
};

/// Unprefixed table names.
pub mod tables {
    pub const BOOK_LANGUAGE: &str = "book_language";
    pub const PUBLISHER: &str = "publisher";
    pub const AUTHOR: &str = "author";
    pub const BOOK: &str = "book";
    pub const BOOK_AUTHOR: &str = "book_author";
    pub const COUNTRY: &str = "country";
    pub const ADDRESS: &str = "address";
    pub const ADDRESS_STATUS: &str = "address_status";
    pub const CUSTOMER: &str = "customer";
    pub const CUSTOMER_ADDRESS: &str = "customer_address";
    pub const SHIPPING_METHOD: &str = "shipping_method";
    pub const CUST_ORDER: &str = "cust_order";
    pub const ORDER_STATUS: &str = "order_status";
    pub const ORDER_LINE: &str = "order_line";
    pub const ORDER_HISTORY: &str = "order_history";
}

use tables::*;

const NON_NEGATIVE_PRICE: &str = "price >= 0";

fn id(name: &str) -> ColumnDef {
    ColumnDef::new(name, ColumnType::Integer)
}

fn fk(column: &str, table: &str, target: &str, on_delete: FkAction) -> ForeignKeyDef {
    ForeignKeyDef::new(column, table, target, on_delete)
}

/// Builds the complete bookstore catalog.
///
/// # Examples
///
/// ```
/// use bookstore_schema_core::{bookstore_catalog, validate_catalog};
///
/// let catalog = bookstore_catalog();
/// assert_eq!(catalog.tables.len(), 15);
/// assert!(validate_catalog(&catalog).is_empty());
/// ```
pub fn bookstore_catalog() -> Catalog {
    Catalog::new(vec![
        TableDef::new(BOOK_LANGUAGE, TableKind::Lookup)
            .with_column(id("language_id"))
            .with_column(ColumnDef::new("language_code", ColumnType::Varchar(8)).not_null().unique())
            .with_column(ColumnDef::new("language_name", ColumnType::Varchar(50)).not_null().unique())
            .with_primary_key(&["language_id"])
            .with_label("language_code"),
        TableDef::new(PUBLISHER, TableKind::Entity)
            .with_column(id("publisher_id"))
            .with_column(ColumnDef::new("publisher_name", ColumnType::Varchar(400)).not_null().unique())
            .with_primary_key(&["publisher_id"]),
        TableDef::new(AUTHOR, TableKind::Entity)
            .with_column(id("author_id"))
            .with_column(ColumnDef::new("author_name", ColumnType::Varchar(400)).not_null())
            .with_primary_key(&["author_id"]),
        TableDef::new(BOOK, TableKind::Entity)
            .with_column(id("book_id"))
            .with_column(ColumnDef::new("title", ColumnType::Varchar(400)).not_null())
            .with_column(ColumnDef::new("isbn13", ColumnType::Varchar(13)).unique())
            .with_column(id("language_id"))
            .with_column(id("num_pages").check("num_pages >= 0"))
            .with_column(ColumnDef::new("publication_date", ColumnType::Date))
            .with_column(id("publisher_id"))
            .with_column(
                ColumnDef::new("price", ColumnType::Decimal { precision: 10, scale: 2 })
                    .check(NON_NEGATIVE_PRICE),
            )
            .with_primary_key(&["book_id"])
            .with_foreign_key(fk("language_id", BOOK_LANGUAGE, "language_id", FkAction::SetNull))
            .with_foreign_key(fk("publisher_id", PUBLISHER, "publisher_id", FkAction::SetNull)),
        TableDef::new(BOOK_AUTHOR, TableKind::Junction)
            .with_column(id("book_id").not_null())
            .with_column(id("author_id").not_null())
            .with_primary_key(&["book_id", "author_id"])
            .with_foreign_key(fk("book_id", BOOK, "book_id", FkAction::Cascade))
            .with_foreign_key(fk("author_id", AUTHOR, "author_id", FkAction::Cascade)),
        TableDef::new(COUNTRY, TableKind::Lookup)
            .with_column(id("country_id"))
            .with_column(ColumnDef::new("country_name", ColumnType::Varchar(200)).not_null().unique())
            .with_primary_key(&["country_id"])
            .with_label("country_name"),
        TableDef::new(ADDRESS, TableKind::Entity)
            .with_column(id("address_id"))
            .with_column(ColumnDef::new("street_number", ColumnType::Varchar(10)))
            .with_column(ColumnDef::new("street_name", ColumnType::Varchar(200)))
            .with_column(ColumnDef::new("city", ColumnType::Varchar(100)).not_null())
            .with_column(ColumnDef::new("region", ColumnType::Varchar(100)))
            .with_column(ColumnDef::new("postal_code", ColumnType::Varchar(20)))
            .with_column(id("country_id").not_null())
            .with_primary_key(&["address_id"])
            .with_foreign_key(fk("country_id", COUNTRY, "country_id", FkAction::Restrict)),
        TableDef::new(ADDRESS_STATUS, TableKind::Lookup)
            .with_column(id("status_id"))
            .with_column(ColumnDef::new("address_status", ColumnType::Varchar(30)).not_null().unique())
            .with_primary_key(&["status_id"])
            .with_label("address_status"),
        TableDef::new(CUSTOMER, TableKind::Entity)
            .with_column(id("customer_id"))
            .with_column(ColumnDef::new("first_name", ColumnType::Varchar(200)).not_null())
            .with_column(ColumnDef::new("last_name", ColumnType::Varchar(200)).not_null())
            .with_column(ColumnDef::new("email", ColumnType::Varchar(350)).unique())
            .with_column(ColumnDef::new("phone", ColumnType::Varchar(30)))
            .with_column(
                ColumnDef::new("created_at", ColumnType::DateTime)
                    .not_null()
                    .default_sql("CURRENT_TIMESTAMP"),
            )
            .with_primary_key(&["customer_id"]),
        TableDef::new(CUSTOMER_ADDRESS, TableKind::Junction)
            .with_column(id("customer_id").not_null())
            .with_column(id("address_id").not_null())
            .with_column(id("status_id").not_null())
            .with_primary_key(&["customer_id", "address_id"])
            .with_foreign_key(fk("customer_id", CUSTOMER, "customer_id", FkAction::Cascade))
            .with_foreign_key(fk("address_id", ADDRESS, "address_id", FkAction::Cascade))
            .with_foreign_key(fk("status_id", ADDRESS_STATUS, "status_id", FkAction::Restrict)),
        TableDef::new(SHIPPING_METHOD, TableKind::Lookup)
            .with_column(id("method_id"))
            .with_column(ColumnDef::new("method_name", ColumnType::Varchar(100)).not_null().unique())
            .with_column(
                ColumnDef::new("cost", ColumnType::Decimal { precision: 6, scale: 2 })
                    .not_null()
                    .default_sql("0")
                    .check("cost >= 0"),
            )
            .with_primary_key(&["method_id"])
            .with_label("method_name"),
        TableDef::new(CUST_ORDER, TableKind::Entity)
            .with_column(id("order_id"))
            .with_column(
                ColumnDef::new("order_date", ColumnType::DateTime)
                    .not_null()
                    .default_sql("CURRENT_TIMESTAMP"),
            )
            .with_column(id("customer_id"))
            .with_column(id("shipping_method_id"))
            .with_column(id("dest_address_id"))
            .with_column(
                ColumnDef::new("total_order_price", ColumnType::Decimal { precision: 10, scale: 2 })
                    .not_null()
                    .default_sql("0")
                    .check("total_order_price >= 0"),
            )
            .with_primary_key(&["order_id"])
            .with_foreign_key(fk("customer_id", CUSTOMER, "customer_id", FkAction::SetNull))
            .with_foreign_key(fk("shipping_method_id", SHIPPING_METHOD, "method_id", FkAction::SetNull))
            .with_foreign_key(fk("dest_address_id", ADDRESS, "address_id", FkAction::SetNull)),
        TableDef::new(ORDER_STATUS, TableKind::Lookup)
            .with_column(id("status_id"))
            .with_column(ColumnDef::new("status_value", ColumnType::Varchar(20)).not_null().unique())
            .with_primary_key(&["status_id"])
            .with_label("status_value"),
        TableDef::new(ORDER_LINE, TableKind::Entity)
            .with_column(id("line_id"))
            .with_column(id("order_id").not_null())
            .with_column(id("book_id").not_null())
            .with_column(
                ColumnDef::new("price", ColumnType::Decimal { precision: 10, scale: 2 })
                    .not_null()
                    .check(NON_NEGATIVE_PRICE),
            )
            .with_column(id("quantity").not_null().default_sql("1").check("quantity > 0"))
            .with_primary_key(&["line_id"])
            .with_foreign_key(fk("order_id", CUST_ORDER, "order_id", FkAction::Cascade))
            .with_foreign_key(fk("book_id", BOOK, "book_id", FkAction::Restrict)),
        TableDef::new(ORDER_HISTORY, TableKind::Entity)
            .with_column(id("history_id"))
            .with_column(id("order_id").not_null())
            .with_column(id("status_id").not_null())
            .with_column(
                ColumnDef::new("status_date", ColumnType::DateTime)
                    .not_null()
                    .default_sql("CURRENT_TIMESTAMP"),
            )
            .with_column(ColumnDef::new("notes", ColumnType::Text))
            .with_primary_key(&["history_id"])
            .with_foreign_key(fk("order_id", CUST_ORDER, "order_id", FkAction::Cascade))
            .with_foreign_key(fk("status_id", ORDER_STATUS, "status_id", FkAction::Restrict))
            .with_index(IndexDef::new(
                "idx_order_history_order_date",
                &["order_id", "status_date"],
            )),
    ])
}

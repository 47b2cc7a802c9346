//! Access-control roles and their static privilege sets.
//!
//! Three roles are layered over the same tables:
//!
//! - [`Role::Admin`]: every privilege on every table, with grant option.
//! - [`Role::Staff`]: read/write on operational tables, insert-only order
//!   history, limited address updates, read-only catalog and lookups.
//! - [`Role::ReadOnly`]: `SELECT` on every table.
//!
//! The mapping is fixed; enforcement belongs to the database engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::tables;
use crate::types::Catalog;

/// A table-level privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Privilege {
    Select,
    Insert,
    Update,
    Delete,
}

impl Privilege {
    pub const ALL: [Privilege; 4] = [
        Privilege::Select,
        Privilege::Insert,
        Privilege::Update,
        Privilege::Delete,
    ];

    pub fn as_sql(self) -> &'static str {
        match self {
            Privilege::Select => "SELECT",
            Privilege::Insert => "INSERT",
            Privilege::Update => "UPDATE",
            Privilege::Delete => "DELETE",
        }
    }
}

/// Tables staff may fully read and write.
const STAFF_READ_WRITE: [&str; 4] = [
    tables::CUSTOMER,
    tables::CUSTOMER_ADDRESS,
    tables::CUST_ORDER,
    tables::ORDER_LINE,
];

/// Address columns staff may update. Keys and the country reference stay fixed.
pub const STAFF_ADDRESS_UPDATE_COLUMNS: [&str; 5] =
    ["street_number", "street_name", "city", "region", "postal_code"];

/// Privileges one role holds on one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableGrant {
    /// Unprefixed table name.
    pub table: String,
    /// Granted privileges, sorted.
    pub privileges: Vec<Privilege>,
    /// When set, `UPDATE` is limited to these columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_columns: Option<Vec<String>>,
    /// Whether the role may pass these privileges on.
    #[serde(default)]
    pub with_grant_option: bool,
}

impl TableGrant {
    fn new(table: &str, privileges: &[Privilege]) -> Self {
        Self {
            table: table.to_string(),
            privileges: privileges.to_vec(),
            update_columns: None,
            with_grant_option: false,
        }
    }

    /// Returns `true` if the grant covers `privilege`, checking the column
    /// restriction for updates.
    ///
    /// # Examples
    ///
    /// ```
    /// use bookstore_schema_core::{bookstore_catalog, Privilege, Role};
    ///
    /// let grants = Role::Staff.grants(&bookstore_catalog());
    /// let address = grants.iter().find(|g| g.table == "address").unwrap();
    /// assert!(address.allows(Privilege::Update, Some("city")));
    /// assert!(!address.allows(Privilege::Update, Some("country_id")));
    /// assert!(!address.allows(Privilege::Delete, None));
    /// ```
    pub fn allows(&self, privilege: Privilege, column: Option<&str>) -> bool {
        if !self.privileges.contains(&privilege) {
            return false;
        }
        match (privilege, &self.update_columns, column) {
            (Privilege::Update, Some(allowed), Some(column)) => allowed.iter().any(|c| c == column),
            _ => true,
        }
    }
}

/// One of the three fixed database roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    #[serde(rename = "readonly")]
    ReadOnly,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Staff, Role::ReadOnly];

    /// The role name as created in the database.
    pub fn name(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::ReadOnly => "readonly",
        }
    }

    /// Returns `true` if the role may run DDL and other structural statements.
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    /// Expands the role into per-table grants over `catalog`.
    ///
    /// Every table in the catalog receives exactly one grant, in catalog order.
    pub fn grants(self, catalog: &Catalog) -> Vec<TableGrant> {
        catalog
            .tables
            .iter()
            .map(|table| match self {
                Role::Admin => TableGrant {
                    with_grant_option: true,
                    ..TableGrant::new(&table.name, &Privilege::ALL)
                },
                Role::ReadOnly => TableGrant::new(&table.name, &[Privilege::Select]),
                Role::Staff => staff_grant(&table.name),
            })
            .collect()
    }
}

fn staff_grant(table: &str) -> TableGrant {
    if STAFF_READ_WRITE.contains(&table) {
        return TableGrant::new(table, &Privilege::ALL);
    }
    match table {
        tables::ADDRESS => TableGrant {
            update_columns: Some(
                STAFF_ADDRESS_UPDATE_COLUMNS
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
            ),
            ..TableGrant::new(
                table,
                &[Privilege::Select, Privilege::Insert, Privilege::Update],
            )
        },
        tables::ORDER_HISTORY => TableGrant::new(table, &[Privilege::Select, Privilege::Insert]),
        _ => TableGrant::new(table, &[Privilege::Select]),
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}': expected admin, staff, or readonly")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "readonly" | "read_only" => Ok(Role::ReadOnly),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

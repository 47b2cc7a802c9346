//! `CREATE ROLE` / `GRANT` scripts for server databases.
//!
//! SQLite enforces roles through [`RoleGuard`](crate::RoleGuard). Server
//! engines enforce them natively, so for those the role table is rendered
//! as SQL: one `GRANT` per role and table, column-level `UPDATE` where a
//! grant is restricted, and `WITH GRANT OPTION` for admin.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use bookstore_schema_core::{Catalog, Privilege, Role, TableGrant};

use crate::error::Result;
use crate::schema::validate_prefix;

/// Target SQL dialect for grant scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantDialect {
    /// MySQL 8 and later.
    MySql,
    /// PostgreSQL.
    Postgres,
}

impl fmt::Display for GrantDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantDialect::MySql => write!(f, "mysql"),
            GrantDialect::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for GrantDialect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(GrantDialect::MySql),
            "postgres" | "postgresql" => Ok(GrantDialect::Postgres),
            _ => Err(format!("unknown dialect '{s}': expected mysql or postgres")),
        }
    }
}

impl GrantDialect {
    fn role_ident(self, role: Role) -> String {
        match self {
            GrantDialect::MySql => format!("'{}'", role.name()),
            GrantDialect::Postgres => role.name().to_string(),
        }
    }

    fn create_role(self, role: Role) -> String {
        match self {
            GrantDialect::MySql => format!("CREATE ROLE IF NOT EXISTS {};", self.role_ident(role)),
            GrantDialect::Postgres => format!(
                "DO $$ BEGIN CREATE ROLE {}; EXCEPTION WHEN duplicate_object THEN NULL; END $$;",
                role.name()
            ),
        }
    }

    fn on_table(self, table: &str) -> String {
        match self {
            GrantDialect::MySql => table.to_string(),
            GrantDialect::Postgres => format!("TABLE {table}"),
        }
    }
}

fn privilege_list(role: Role, grant: &TableGrant) -> String {
    if role.is_admin() {
        return "ALL PRIVILEGES".to_string();
    }
    grant
        .privileges
        .iter()
        .map(|privilege| match (privilege, &grant.update_columns) {
            (Privilege::Update, Some(columns)) => format!("UPDATE ({})", columns.join(", ")),
            _ => privilege.as_sql().to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders the role and grant script for every role over `catalog`.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`](crate::SqliteError::InvalidPrefix)
/// if the prefix is invalid.
///
/// # Examples
///
/// ```
/// use bookstore_schema_core::bookstore_catalog;
/// use bookstore_schema_sqlite::{GrantDialect, generate_grant_sql};
///
/// let sql = generate_grant_sql(&bookstore_catalog(), "", GrantDialect::MySql).unwrap();
/// assert!(sql.contains("GRANT SELECT, INSERT ON order_history TO 'staff';"));
/// assert!(sql.contains("GRANT ALL PRIVILEGES ON book TO 'admin' WITH GRANT OPTION;"));
/// ```
pub fn generate_grant_sql(catalog: &Catalog, prefix: &str, dialect: GrantDialect) -> Result<String> {
    validate_prefix(prefix)?;
    let mut sql = String::new();
    for role in Role::ALL {
        let _ = writeln!(sql, "{}", dialect.create_role(role));
    }
    for role in Role::ALL {
        let _ = writeln!(sql, "\n-- {role}");
        for grant in role.grants(catalog) {
            let _ = writeln!(
                sql,
                "GRANT {} ON {} TO {}{};",
                privilege_list(role, &grant),
                dialect.on_table(&format!("{prefix}{}", grant.table)),
                dialect.role_ident(role),
                if grant.with_grant_option { " WITH GRANT OPTION" } else { "" }
            );
        }
    }
    Ok(sql)
}

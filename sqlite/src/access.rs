//! Role enforcement on SQLite connections.
//!
//! SQLite has no `GRANT`. Instead, [`RoleGuard`] installs an authorizer
//! callback that checks every table access a statement compiles to against
//! the role's [`TableGrant`]s. A denied access fails the statement at
//! prepare time with `SQLITE_AUTH`, so nothing is written.
//!
//! Reads, transactions, and function calls are always allowed. Schema
//! changes, `ATTACH`, and pragma writes are reserved for the admin role,
//! except switching `foreign_keys` on.
//!
//! Foreign-key actions are authorized like any other write, with no
//! accessor to tell them apart from a direct statement. A permitted write
//! on a parent table therefore arms the cascades it triggers, and each
//! armed cascade admits exactly one matching child write.

use std::collections::HashMap;

use bookstore_schema_core::{Catalog, FkAction, Privilege, Role, TableGrant};
use rusqlite::Connection;
use rusqlite::hooks::{AuthAction, AuthContext, Authorization};
use tracing::{debug, info};

use crate::error::Result;
use crate::schema::validate_prefix;

/// A table write, as the authorizer reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TableWrite {
    table: String,
    privilege: Privilege,
    column: Option<String>,
}

impl TableWrite {
    fn new(table: &str, privilege: Privilege, column: Option<&str>) -> Self {
        Self {
            table: table.to_string(),
            privilege,
            column: column.map(str::to_string),
        }
    }
}

/// Child writes the engine performs for a parent write, per the catalog's
/// `ON DELETE` / `ON UPDATE` policies.
fn cascade_plan(catalog: &Catalog, prefix: &str) -> HashMap<TableWrite, Vec<TableWrite>> {
    let mut plan: HashMap<TableWrite, Vec<TableWrite>> = HashMap::new();
    for table in &catalog.tables {
        let child = format!("{prefix}{}", table.name);
        for fk in &table.foreign_keys {
            let parent = format!("{prefix}{}", fk.references_table);
            let delete = TableWrite::new(&parent, Privilege::Delete, None);
            match fk.on_delete {
                FkAction::Cascade => plan
                    .entry(delete)
                    .or_default()
                    .push(TableWrite::new(&child, Privilege::Delete, None)),
                FkAction::SetNull => plan.entry(delete).or_default().push(TableWrite::new(
                    &child,
                    Privilege::Update,
                    Some(&fk.column),
                )),
                FkAction::Restrict => {}
            }
            if fk.on_update != FkAction::Restrict {
                plan.entry(TableWrite::new(
                    &parent,
                    Privilege::Update,
                    Some(&fk.references_column),
                ))
                .or_default()
                .push(TableWrite::new(&child, Privilege::Update, Some(&fk.column)));
            }
        }
    }
    plan
}

fn enables(value: &str) -> bool {
    ["1", "on", "true", "yes"]
        .iter()
        .any(|v| value.eq_ignore_ascii_case(v))
}

/// The access rules of one role over prefixed table names.
#[derive(Debug, Clone)]
pub struct RoleGuard {
    role: Role,
    grants: HashMap<String, TableGrant>,
    cascades: HashMap<TableWrite, Vec<TableWrite>>,
    // state of the statement being prepared
    root: Option<String>,
    armed: Vec<TableWrite>,
}

impl RoleGuard {
    /// Builds the guard for `role` over `catalog`'s tables under `prefix`.
    pub fn new(role: Role, catalog: &Catalog, prefix: &str) -> Result<Self> {
        validate_prefix(prefix)?;
        let grants = role
            .grants(catalog)
            .into_iter()
            .map(|grant| (format!("{prefix}{}", grant.table), grant))
            .collect();
        Ok(Self {
            role,
            grants,
            cascades: cascade_plan(catalog, prefix),
            root: None,
            armed: Vec::new(),
        })
    }

    /// Enforces `role` on `conn` until [`RoleGuard::clear`] is called or
    /// another guard is installed.
    ///
    /// # Examples
    ///
    /// ```
    /// use bookstore_schema_core::Role;
    /// use bookstore_schema_sqlite::{Migration, RoleGuard};
    /// use rusqlite::Connection;
    ///
    /// let mut migration = Migration::new(Connection::open_in_memory().unwrap(), "").unwrap();
    /// migration.up().unwrap();
    ///
    /// let conn = migration.connection();
    /// RoleGuard::install(conn, Role::ReadOnly, "").unwrap();
    /// assert!(conn.execute("INSERT INTO publisher (publisher_name) VALUES ('Tor')", []).is_err());
    /// assert!(conn.query_row("SELECT COUNT(*) FROM publisher", [], |r| r.get::<_, i64>(0)).is_ok());
    /// ```
    pub fn install(conn: &Connection, role: Role, prefix: &str) -> Result<()> {
        let guard = Self::new(role, &bookstore_schema_core::bookstore_catalog(), prefix)?;
        guard.attach(conn);
        Ok(())
    }

    /// Installs this guard as the connection's authorizer.
    pub fn attach(self, conn: &Connection) {
        info!(role = %self.role, tables = self.grants.len(), "installed role guard");
        let mut guard = self;
        conn.authorizer(Some(move |ctx: AuthContext<'_>| guard.authorize(&ctx.action)));
    }

    /// Removes any role enforcement from `conn`.
    pub fn clear(conn: &Connection) {
        conn.authorizer(None::<fn(AuthContext<'_>) -> Authorization>);
        debug!("cleared role guard");
    }

    /// The role this guard enforces.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Decides one action.
    pub fn authorize(&mut self, action: &AuthAction<'_>) -> Authorization {
        let allowed = match action {
            AuthAction::Read { .. }
            | AuthAction::Select
            | AuthAction::Recursive
            | AuthAction::Function { .. } => true,
            AuthAction::Transaction { .. } | AuthAction::Savepoint { .. } => {
                self.disarm();
                true
            }
            AuthAction::Insert { table_name } => self.write(table_name, Privilege::Insert, None),
            AuthAction::Delete { table_name } => self.write(table_name, Privilege::Delete, None),
            AuthAction::Update {
                table_name,
                column_name,
            } => self.write(table_name, Privilege::Update, Some(*column_name)),
            AuthAction::Pragma {
                pragma_name,
                pragma_value,
            } => match pragma_value {
                _ if self.role.is_admin() => true,
                None => true,
                Some(value) => pragma_name.eq_ignore_ascii_case("foreign_keys") && enables(value),
            },
            _ => self.role.is_admin(),
        };

        if allowed {
            Authorization::Allow
        } else {
            debug!(role = %self.role, ?action, "denied");
            self.disarm();
            Authorization::Deny
        }
    }

    fn write(&mut self, table: &str, privilege: Privilege, column: Option<&str>) -> bool {
        let write = TableWrite::new(table, privilege, column);
        if let Some(pos) = self.armed.iter().position(|armed| *armed == write) {
            self.armed.swap_remove(pos);
            debug!(role = %self.role, table, ?privilege, "foreign-key action");
            self.arm(&write);
            return true;
        }
        if !self.allows(table, privilege, column) {
            return false;
        }
        if self.root.as_deref() != Some(table) {
            self.armed.clear();
            self.root = Some(table.to_string());
        }
        self.arm(&write);
        true
    }

    fn arm(&mut self, write: &TableWrite) {
        if let Some(children) = self.cascades.get(write) {
            self.armed.extend(children.iter().cloned());
        }
    }

    fn disarm(&mut self) {
        self.root = None;
        self.armed.clear();
    }

    fn allows(&self, table: &str, privilege: Privilege, column: Option<&str>) -> bool {
        match self.grants.get(table) {
            Some(grant) => grant.allows(privilege, column),
            // sqlite_master and other internal tables
            None => self.role.is_admin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstore_schema_core::bookstore_catalog;

    fn guard(role: Role) -> RoleGuard {
        RoleGuard::new(role, &bookstore_catalog(), "t_").unwrap()
    }

    #[test]
    fn test_readonly_denies_writes() {
        let mut guard = guard(Role::ReadOnly);
        assert_eq!(
            guard.authorize(&AuthAction::Insert { table_name: "t_book" }),
            Authorization::Deny
        );
        assert_eq!(
            guard.authorize(&AuthAction::Read {
                table_name: "t_book",
                column_name: "title",
            }),
            Authorization::Allow
        );
    }

    #[test]
    fn test_staff_address_update_columns() {
        let mut guard = guard(Role::Staff);
        let update = |column_name| AuthAction::Update {
            table_name: "t_address",
            column_name,
        };
        assert_eq!(guard.authorize(&update("city")), Authorization::Allow);
        assert_eq!(guard.authorize(&update("country_id")), Authorization::Deny);
        assert_eq!(
            guard.authorize(&AuthAction::Delete { table_name: "t_address" }),
            Authorization::Deny
        );
    }

    #[test]
    fn test_staff_history_is_append_only() {
        let mut guard = guard(Role::Staff);
        assert_eq!(
            guard.authorize(&AuthAction::Insert { table_name: "t_order_history" }),
            Authorization::Allow
        );
        assert_eq!(
            guard.authorize(&AuthAction::Delete { table_name: "t_order_history" }),
            Authorization::Deny
        );
    }

    #[test]
    fn test_prefix_is_part_of_table_name() {
        let mut guard = guard(Role::Staff);
        // unprefixed name is not a catalog table under this guard
        assert_eq!(
            guard.authorize(&AuthAction::Insert { table_name: "customer" }),
            Authorization::Deny
        );
        assert_eq!(
            guard.authorize(&AuthAction::Insert { table_name: "t_customer" }),
            Authorization::Allow
        );
    }

    #[test]
    fn test_pragma_writes_are_admin_only() {
        let write = AuthAction::Pragma {
            pragma_name: "journal_mode",
            pragma_value: Some("off"),
        };
        let fk = AuthAction::Pragma {
            pragma_name: "foreign_keys",
            pragma_value: Some("ON"),
        };
        let fk_off = AuthAction::Pragma {
            pragma_name: "foreign_keys",
            pragma_value: Some("off"),
        };
        assert_eq!(guard(Role::Staff).authorize(&write), Authorization::Deny);
        assert_eq!(guard(Role::Staff).authorize(&fk), Authorization::Allow);
        assert_eq!(guard(Role::Staff).authorize(&fk_off), Authorization::Deny);
        assert_eq!(guard(Role::Admin).authorize(&write), Authorization::Allow);
        assert_eq!(guard(Role::Admin).authorize(&fk_off), Authorization::Allow);
    }

    #[test]
    fn test_cascade_plan_follows_delete_policies() {
        let plan = cascade_plan(&bookstore_catalog(), "t_");
        let children = &plan[&TableWrite::new("t_cust_order", Privilege::Delete, None)];
        assert!(children.contains(&TableWrite::new("t_order_history", Privilege::Delete, None)));
        assert!(children.contains(&TableWrite::new("t_order_line", Privilege::Delete, None)));

        let children = &plan[&TableWrite::new("t_customer", Privilege::Delete, None)];
        assert!(children.contains(&TableWrite::new(
            "t_cust_order",
            Privilege::Update,
            Some("customer_id")
        )));

        // RESTRICT parents arm nothing
        assert!(!plan.contains_key(&TableWrite::new("t_country", Privilege::Delete, None)));
    }

    #[test]
    fn test_parent_delete_admits_one_cascaded_child_delete() {
        let mut guard = guard(Role::Staff);
        let history = AuthAction::Delete { table_name: "t_order_history" };

        assert_eq!(
            guard.authorize(&AuthAction::Delete { table_name: "t_cust_order" }),
            Authorization::Allow
        );
        assert_eq!(guard.authorize(&history), Authorization::Allow);
        // consumed: a second delete is a direct statement again
        assert_eq!(guard.authorize(&history), Authorization::Deny);
    }

    #[test]
    fn test_transaction_disarms_pending_cascades() {
        let mut guard = guard(Role::Staff);
        guard.authorize(&AuthAction::Delete { table_name: "t_cust_order" });
        guard.authorize(&AuthAction::Transaction {
            operation: rusqlite::hooks::TransactionOperation::Begin,
        });
        assert_eq!(
            guard.authorize(&AuthAction::Delete { table_name: "t_order_history" }),
            Authorization::Deny
        );
    }

    #[test]
    fn test_new_root_write_disarms_previous_statement() {
        let mut guard = guard(Role::Staff);
        guard.authorize(&AuthAction::Delete { table_name: "t_cust_order" });
        guard.authorize(&AuthAction::Insert { table_name: "t_customer" });
        assert_eq!(
            guard.authorize(&AuthAction::Delete { table_name: "t_order_history" }),
            Authorization::Deny
        );
    }

    #[test]
    fn test_install_rejects_bad_prefix() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(RoleGuard::install(&conn, Role::Staff, "a b").is_err());
    }
}

//! Error types for SQLite schema operations.
//!
//! Provides a unified error type covering database access, migration,
//! validation, and lookup failures.

use bookstore_schema_core::ValidationError;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during SQLite schema operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure, including constraint violations.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Stored value could not be converted to its Rust type.
    #[error("conversion error: {0}")]
    ConversionError(String),

    /// Migration lifecycle operation failure.
    #[error("migration error: {0}")]
    MigrationError(String),

    /// Table prefix contains invalid characters.
    #[error("invalid prefix '{0}': must contain only alphanumeric characters and underscores")]
    InvalidPrefix(String),

    /// Catalog or seed set failed structural validation.
    #[error("validation error: {0}")]
    ValidationError(#[from] ValidationError),

    /// A label is not a member of its lookup table.
    #[error("unknown {table} value: {label}")]
    UnknownLookupValue { table: String, label: String },

    /// Requested row was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Error loading seed data.
    #[error("loader error: {0}")]
    LoaderError(#[from] bookstore_schema_db::DatabaseError),
}

impl SqliteError {
    /// Returns `true` for engine-rejected writes: UNIQUE, PRIMARY KEY,
    /// FOREIGN KEY, NOT NULL, and CHECK violations.
    pub fn is_constraint_violation(&self) -> bool {
        self.sqlite_code() == Some(ErrorCode::ConstraintViolation)
    }

    /// Returns `true` when the active role's authorizer denied the statement.
    pub fn is_authorization_denied(&self) -> bool {
        self.sqlite_code() == Some(ErrorCode::AuthorizationForStatementDenied)
    }

    fn sqlite_code(&self) -> Option<ErrorCode> {
        match self {
            SqliteError::DatabaseError(err) => err.sqlite_error_code(),
            _ => None,
        }
    }
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use rusqlite::hooks::{AuthContext, Authorization};

    #[test]
    fn test_authorizer_denial_is_classified() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();
        conn.authorizer(Some(|_: AuthContext<'_>| Authorization::Deny));

        let err = SqliteError::from(conn.execute("INSERT INTO t (id) VALUES (1)", []).unwrap_err());
        assert!(err.is_authorization_denied());
        assert!(!err.is_constraint_violation());
    }

    #[test]
    fn test_constraint_violation_is_classified() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY); INSERT INTO t VALUES (1);")
            .unwrap();

        let err = SqliteError::from(conn.execute("INSERT INTO t (id) VALUES (1)", []).unwrap_err());
        assert!(err.is_constraint_violation());
        assert!(!err.is_authorization_denied());
    }

    #[test]
    fn test_non_engine_errors_are_unclassified() {
        let err = SqliteError::NotFound("order 7".into());
        assert!(!err.is_constraint_violation());
        assert!(!err.is_authorization_denied());
    }
}

//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error              CoreError (checkout, credit math)            │
//! │       │                        │                                        │
//! │       ▼                        ▼                                        │
//! │  DbError (this module) ← constraint classification, CAS conflicts      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (umkm-api) ← HTTP status + JSON envelope                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use umkm_core::CoreError;

/// Message for a write that could not get the database lock in time.
pub const BUSY_MESSAGE: &str = "Database is busy, please retry";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Registering an email that already has an account
    /// - Two products with the same SKU
    #[error("A record with this {field} already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Checkout referencing a customer id that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Optimistic concurrency check failed, or the write lock stayed busy.
    #[error("{0}")]
    Conflict(String),

    /// Business rule rejected the operation inside a repository call.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    /// - Malformed database URL
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed to begin or commit.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
        }
    }

    /// True for errors caused by the caller's input rather than the database.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DbError::NotFound { .. }
                | DbError::UniqueViolation { .. }
                | DbError::ForeignKeyViolation { .. }
                | DbError::Conflict(_)
                | DbError::Domain(_)
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → SQLITE_BUSY → DbError::Conflict,
///                                else analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLITE_BUSY and its extended codes, once busy_timeout ran out
                if matches!(db_err.code().as_deref(), Some("5" | "261" | "517"))
                    || msg.contains("database is locked")
                {
                    return DbError::Conflict(BUSY_MESSAGE.to_string());
                }

                // "UNIQUE constraint failed: users.email"
                if let Some(target) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    let field = target
                        .split(", ")
                        .next()
                        .and_then(|col| col.rsplit('.').next())
                        .unwrap_or("value");
                    DbError::duplicate(field)
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            DbError::not_found("Transaction", "t-9").to_string(),
            "Transaction not found: t-9"
        );
        assert_eq!(
            DbError::duplicate("email").to_string(),
            "A record with this email already exists"
        );
    }

    #[test]
    fn test_domain_errors_pass_through() {
        let err: DbError = CoreError::Overpayment {
            amount: 2,
            remaining: 1,
        }
        .into();
        assert_eq!(err.to_string(), "Payment of 2 exceeds remaining balance (1)");
        assert!(err.is_client_error());
        assert!(!DbError::PoolExhausted.is_client_error());
    }
}

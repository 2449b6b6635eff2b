//! # Store Error Types
//!
//! Error types for store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  PostgreSQL error (sqlx::Error)   MemoryStore   TimedStore deadline    │
//! │       │                               │               │                 │
//! │       └───────────────┬───────────────┴───────────────┘                 │
//! │                       ▼                                                 │
//! │  StoreError (this module) ← SQLSTATE-based categorization              │
//! │       │                                                                 │
//! │       ├── UniqueViolation ──► sequence retry loop (intent-api)         │
//! │       ├── during authorization ──► HTTP 500                            │
//! │       └── during a handler ──► success:false naming the code           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;
use thiserror::Error;

/// SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Store operation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Two writers allocated the same sale or receipt number
    /// - Any UNIQUE index violation
    #[error("Duplicate value violates {constraint} ({code})")]
    UniqueViolation { constraint: String, code: String },

    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Query rejected by the store.
    #[error("Query failed ({code}): {message}")]
    Query { code: String, message: String },

    /// Call exceeded its deadline.
    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Store unreachable or pool exhausted.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Migration failed at startup.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Internal store error.
    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn unique(constraint: impl Into<String>) -> Self {
        StoreError::UniqueViolation {
            constraint: constraint.into(),
            code: UNIQUE_VIOLATION.to_string(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }

    /// Short code shown to callers (SQLSTATE where one exists).
    pub fn code(&self) -> &str {
        match self {
            StoreError::UniqueViolation { code, .. } | StoreError::Query { code, .. } => code.as_str(),
            StoreError::NotFound { .. } => "NOT_FOUND",
            StoreError::Timeout { .. } => "TIMEOUT",
            StoreError::Connection(_) => "CONNECTION",
            StoreError::Migration(_) => "MIGRATION",
            StoreError::Internal(_) => "INTERNAL",
        }
    }
}

/// Convert sqlx errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound        → StoreError::NotFound
/// sqlx::Error::Database (23505)   → StoreError::UniqueViolation
/// sqlx::Error::Database (other)   → StoreError::Query { code: SQLSTATE }
/// PoolTimedOut / PoolClosed / Io  → StoreError::Connection
/// Other                           → StoreError::Internal
/// ```
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
                if code == UNIQUE_VIOLATION {
                    StoreError::UniqueViolation {
                        constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                        code,
                    }
                } else {
                    StoreError::Query {
                        code: if code.is_empty() { "UNKNOWN".to_string() } else { code },
                        message: db_err.message().to_string(),
                    }
                }
            }

            sqlx::Error::PoolTimedOut => StoreError::Connection("Connection pool exhausted".to_string()),

            sqlx::Error::PoolClosed => StoreError::Connection("Pool is closed".to_string()),

            sqlx::Error::Io(io) => StoreError::Connection(io.to_string()),

            _ => StoreError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Migration(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(StoreError::unique("sales_tenant_number").code(), "23505");
        assert!(StoreError::unique("x").is_unique_violation());
        let timeout = StoreError::Timeout {
            operation: "insert_sale",
            after: Duration::from_millis(5000),
        };
        assert_eq!(timeout.code(), "TIMEOUT");
        assert_eq!(timeout.to_string(), "insert_sale timed out after 5000ms");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_pool_timeout_maps_to_connection() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.code(), "CONNECTION");
    }
}

//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule failures (success:false, 200)    │
//! │  └── ValidationError  - Entity validation failures                     │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── StoreError       - Store operation failures                       │
//! │                                                                         │
//! │  intent-api errors (in app)                                            │
//! │  ├── AuthError        - 401 / 403 / 500 before dispatch                │
//! │  └── ApiError         - What the HTTP caller sees                      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → handler outcome → JSON            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every message names the product, customer or amount involved so the chat
//! surface can show it verbatim.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule failures raised by handlers.
///
/// These never become HTTP errors. The router turns them into
/// `success: false` responses with the error's message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Insufficient stock to complete sale.
    ///
    /// ## User Workflow
    /// ```text
    /// record_sale (product: "cement", quantity: 5)
    ///      │
    ///      ▼
    /// reserve_stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Cement (50kg bag)", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Chat shows: "Not enough stock for Cement (50kg bag): only 3 available, 5 requested"
    /// ```
    #[error("Not enough stock for {product}: only {available} available, {requested} requested")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A lookup by name/number found nothing.
    #[error("No {entity} found matching '{key}'")]
    NotFound { entity: &'static str, key: String },

    /// The caller has no employee record to clock against.
    #[error("No employee record is linked to your account")]
    NoEmployeeRecord,

    /// Clock-in while a shift is already open.
    #[error("{employee} is already clocked in since {since}")]
    AlreadyClockedIn { employee: String, since: String },

    /// Clock-out without an open shift.
    #[error("{employee} is not clocked in")]
    NotClockedIn { employee: String },

    /// Task is already completed.
    #[error("Task '{title}' is already completed")]
    TaskAlreadyCompleted { title: String },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Stable machine-readable code for the `error` field of a response.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::NoEmployeeRecord => "NO_EMPLOYEE_RECORD",
            CoreError::AlreadyClockedIn { .. } => "ALREADY_CLOCKED_IN",
            CoreError::NotClockedIn { .. } => "NOT_CLOCKED_IN",
            CoreError::TaskAlreadyCompleted { .. } => "TASK_ALREADY_COMPLETED",
            CoreError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Entity validation errors.
///
/// Raised before any store access; a handler that fails validation performs
/// zero reads and zero writes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// Invalid format (e.g., unparseable amount or date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Cement (50kg bag)".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Not enough stock for Cement (50kg bag): only 3 available, 5 requested"
        );
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "product".to_string(),
        };
        assert_eq!(err.to_string(), "product is required");

        let err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        assert_eq!(err.to_string(), "amount must be greater than zero");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "title".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.code(), "VALIDATION_ERROR");
        assert_eq!(core_err.to_string(), "title is required");
    }
}

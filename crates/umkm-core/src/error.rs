//! # Error Types
//!
//! Domain-specific error types for umkm-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  umkm-core (this file)                                                 │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  umkm-db                                                               │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  umkm-api                                                              │
//! │  └── ApiError         - HTTP status + JSON envelope                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product referenced by a line item does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Transaction id does not exist.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// A credit payment larger than the outstanding balance.
    ///
    /// ## User Workflow
    /// ```text
    /// Transaction total 20000, paid 5000
    ///      │
    ///      ▼
    /// remaining = 15000
    ///      │
    ///      ▼
    /// Pay 16000 → Overpayment { amount: 16000, remaining: 15000 }
    ///      │
    ///      ▼
    /// Client shows: "Payment exceeds remaining balance (15000)"
    /// ```
    #[error("Payment of {amount} exceeds remaining balance ({remaining})")]
    Overpayment { amount: i64, remaining: i64 },

    /// Checkout carries more items than allowed.
    #[error("A transaction cannot have more than {max} items")]
    TooManyItems { max: usize },

    /// AI provider identifier is not one of the supported set.
    #[error("Provider {0} is not supported")]
    UnknownProvider(String),

    /// Report or export type is not recognised.
    #[error("Unknown {kind} type: {value}")]
    UnknownKind { kind: &'static str, value: String },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value does not fit the money range.
    #[error("{field} is too large")]
    OutOfRange { field: String },

    /// Invalid format (bad email, bad date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {}", allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for a missing field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for an amount that overflows.
    pub fn out_of_range(field: impl Into<String>) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

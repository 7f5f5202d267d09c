//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Flow
//! ```text
//! ValidationError → CoreError → (tally-db adds DbError) → UI message
//! ```
//!
//! Every engine operation surfaces one of these variants to the caller; the
//! UI decides how to display them. Nothing here is ever retried implicitly -
//! only storage contention is waited out, inside the storage layer itself.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations and domain failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Stock item cannot be found (unknown id, or soft-deleted).
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Insufficient available stock to satisfy a reservation.
    ///
    /// ## When This Occurs
    /// - Adding or increasing a cart line past available stock
    /// - Editing a completed transaction upward past available stock
    ///
    /// `available` is on-hand minus outstanding reservations; reserving never
    /// clamps, it fails fast and leaves the ledger untouched.
    #[error("Out of stock for {sku}: available {available}, requested {requested}")]
    OutOfStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Quantity outside the accepted range (negative, or beyond the cap).
    #[error("Invalid quantity: {requested}")]
    InvalidQuantity { requested: i64 },

    /// Checkout or hold attempted on a cart with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cash tendered does not cover the final total.
    #[error("Insufficient payment: total {required_cents} cents, tendered {tendered_cents} cents")]
    InsufficientPayment {
        required_cents: i64,
        tendered_cents: i64,
    },

    /// Transaction id does not exist.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Refund attempted on a transaction that was already returned.
    #[error("Transaction {0} has already been returned")]
    AlreadyReturned(String),

    /// Transaction is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Editing or refunding a held transaction
    /// - Resuming a completed transaction
    /// - Administrative delete of a held transaction
    #[error("Transaction {id} is {status}, cannot perform operation")]
    InvalidStatus { id: String, status: String },

    /// The elevated-authorization collaborator rejected the operation.
    #[error("Not authorized: {action}")]
    Unauthorized { action: String },

    /// Underlying storage failed; the operation was rolled back whole.
    #[error("Storage failure: {0}")]
    Storage(String),

    /// Cart has exceeded the maximum allowed number of lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before business logic runs.
#[derive(Debug, Error)]
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
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. malformed manifest entry, bad UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g. duplicate SKU).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
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
        let err = CoreError::OutOfStock {
            sku: "MED001".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Out of stock for MED001: available 3, requested 5"
        );

        let err = CoreError::InsufficientPayment {
            required_cents: 2000,
            tendered_cents: 1500,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient payment: total 2000 cents, tendered 1500 cents"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

//! # Error Types
//!
//! Domain-specific error types for corner-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  corner-core errors (this file)                                         │
//! │  ├── EngineError      - Pricing / settlement / refund rule violations   │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  corner-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  corner-terminal errors                                                 │
//! │  └── ServiceError     - What the frontend sees (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → EngineError → ServiceError → Frontend          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All engine errors are local validation failures returned to the caller
//! for inline display; none are fatal. The calling layer decides how to
//! present each kind.

use thiserror::Error;

// =============================================================================
// Engine Error
// =============================================================================

/// Pricing, settlement, and refund rule violations.
///
/// Every engine operation returns `Result<_, EngineError>`; on failure the
/// cart/settlement state is left unchanged so the user can correct the input
/// and retry.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or out-of-range input. Recoverable by re-prompting.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Inventory insufficient for the requested quantity.
    /// Recoverable by reducing quantity.
    #[error("Out of stock for {name}: available {available}, requested {requested}")]
    OutOfStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Split allocation does not cover the grand total.
    /// Recoverable by adjusting the allocation.
    #[error("Allocation incomplete: {remaining_cents} cents remaining")]
    IncompleteAllocation { remaining_cents: i64 },

    /// Store-credit portion exceeds the customer's available balance.
    ///
    /// Checked again at commit time via a conditional update at the
    /// data-store boundary, since the balance may change concurrently.
    #[error("Insufficient balance: have {balance_cents} cents, requested {requested_cents}")]
    InsufficientBalance {
        balance_cents: i64,
        requested_cents: i64,
    },

    /// Return request exceeds the remaining refundable quantity on a line.
    #[error("Return quantity {requested} exceeds remaining {available} for line {line_id}")]
    ExceedsAvailableQuantity {
        line_id: String,
        available: i64,
        requested: i64,
    },

    /// Input validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl EngineError {
    /// Creates an InvalidInput error from any displayable reason.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when user input doesn't meet requirements, before business
/// logic runs.
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

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

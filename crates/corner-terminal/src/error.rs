//! # Service Error Type
//!
//! Unified error type for till-facing operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Corner POS                             │
//! │                                                                         │
//! │  EngineError (corner-core) ──┐                                          │
//! │  DbError     (corner-db)   ──┼──► ServiceError { code, message } ──►    │
//! │  HardwareError (this crate)──┘         serialized for the frontend      │
//! │                                                                         │
//! │  Every engine error kind keeps its own code so the frontend can         │
//! │  react (re-prompt, reduce quantity, adjust allocation) instead of       │
//! │  showing a generic failure.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use corner_core::EngineError;
use corner_db::DbError;

use crate::hardware::HardwareError;

/// Error returned from till operations.
///
/// ## Serialization
/// What the frontend receives when an operation fails:
/// ```json
/// {
///   "code": "INCOMPLETE_ALLOCATION",
///   "message": "Allocation incomplete: 58 cents remaining"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[error("{message}")]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    /// Machine-readable error code for programmatic handling.
    pub code: ErrorCode,

    /// Human-readable error message for display.
    pub message: String,
}

/// Error codes for service responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found.
    NotFound,

    /// Malformed or out-of-range input.
    InvalidInput,

    /// Inventory insufficient for the requested quantity.
    OutOfStock,

    /// Split allocation does not cover the total owed.
    IncompleteAllocation,

    /// Store-credit portion exceeds the customer's balance.
    InsufficientBalance,

    /// Return quantity exceeds what is still refundable.
    ExceedsAvailableQuantity,

    /// Card terminal declined or failed the charge.
    PaymentError,

    /// Receipt printer failure (non-fatal after commit).
    PrinterError,

    /// Database operation failed.
    DatabaseError,

    /// Anything else.
    Internal,
}

impl ServiceError {
    /// Creates a new service error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError {
            code,
            message: message.into(),
        }
    }

    /// Shorthand for an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Shorthand for a NotFound error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }
}

impl From<EngineError> for ServiceError {
    fn from(err: EngineError) -> Self {
        let code = match &err {
            EngineError::InvalidInput { .. } | EngineError::Validation(_) => {
                ErrorCode::InvalidInput
            }
            EngineError::OutOfStock { .. } => ErrorCode::OutOfStock,
            EngineError::IncompleteAllocation { .. } => ErrorCode::IncompleteAllocation,
            EngineError::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            EngineError::ExceedsAvailableQuantity { .. } => ErrorCode::ExceedsAvailableQuantity,
        };
        ServiceError::new(code, err.to_string())
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        let code = match &err {
            DbError::NotFound { .. } => ErrorCode::NotFound,
            DbError::InsufficientStock { .. } => ErrorCode::OutOfStock,
            DbError::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            _ => ErrorCode::DatabaseError,
        };
        ServiceError::new(code, err.to_string())
    }
}

impl From<HardwareError> for ServiceError {
    fn from(err: HardwareError) -> Self {
        ServiceError::new(ErrorCode::PaymentError, err.to_string())
    }
}

/// Result type for till operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================

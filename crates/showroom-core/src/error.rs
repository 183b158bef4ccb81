//! # Error Types
//!
//! Domain-specific error types for showroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  showroom-core errors (this file)                                      │
//! │  ├── CoreError        - Ledger and state-machine violations            │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  showroom-db errors (separate crate)                                   │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  showroom-api errors                                                   │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant names the offending entity and, for state errors, both the
//! current and the required state.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the ledgers and state machines.
///
/// Any of these aborts the enclosing transaction with no partial effect.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale, redemption request, product, gift, customer or cart line
    /// does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Malformed input (unknown status value, non-positive quantity, ...).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Not enough product or gift stock to cover the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// POST /sales (qty: 5)
    ///      │
    ///      ▼
    /// Inventory debit: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { item_id, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole sale rolled back, no line debited
    /// ```
    #[error("Insufficient stock for {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        available: i64,
        requested: i64,
    },

    /// Customer balance does not cover the points being debited.
    #[error("Insufficient points for customer {customer_id}: available {available}, required {required}")]
    InsufficientPoints {
        customer_id: String,
        available: i64,
        required: i64,
    },

    /// An action was attempted from a state that does not allow it.
    #[error("{entity} {id} is '{current}', operation requires '{required}'")]
    InvalidStateTransition {
        entity: String,
        id: String,
        current: String,
        required: String,
    },

    /// Lost a concurrent update, or the operation can no longer proceed
    /// because the world changed underneath it.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidStateTransition error.
    pub fn invalid_transition(
        entity: impl Into<String>,
        id: impl Into<String>,
        current: impl Into<String>,
        required: impl Into<String>,
    ) -> Self {
        CoreError::InvalidStateTransition {
            entity: entity.into(),
            id: id.into(),
            current: current.into(),
            required: required.into(),
        }
    }

    /// Creates a Conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        CoreError::Conflict(message.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet requirements.
/// Used for early validation before any row is touched.
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

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Same value given twice where it must be unique.
    #[error("{field} '{value}' is duplicated")]
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
        let err = CoreError::InsufficientStock {
            item_id: "prod-1".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for prod-1: available 3, requested 5"
        );

        let err = CoreError::invalid_transition("Redemption", "r-1", "rechazado", "pendiente_aprobacion");
        assert_eq!(
            err.to_string(),
            "Redemption r-1 is 'rechazado', operation requires 'pendiente_aprobacion'"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

//! # Validation Module
//!
//! Input validation for the showroom engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (axum)                                          │
//! │  ├── JSON deserialization (types, unknown status strings)              │
//! │  └── THIS MODULE: field rules before any row is touched                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Ledgers (showroom-db)                                        │
//! │  ├── Conditional UPDATEs (stock >= n, points >= n)                     │
//! │  └── Status-guarded writes                                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (available_points >= 0)                 │
//! │  └── UNIQUE (cart_id, product_id)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use showroom_core::validation::{validate_quantity, validate_discount_cents};
//!
//! validate_quantity(3).unwrap();
//! validate_discount_cents(500).unwrap();
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::{MAX_ADMIN_NOTES_LEN, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  POST /me/cart/items { quantity: 5 }                                   │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → 400 "quantity must be positive"                  │
/// │       │                                                                 │
/// │       ├── qty > 999? → 400 "quantity must be between 1 and 999"        │
/// │       │                                                                 │
/// │       └── OK → upsert cart line                                        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price override in cents.
///
/// ## Example
/// ```rust
/// use showroom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(2000).is_ok());
/// assert!(validate_price_cents(0).is_ok());     // giveaway line
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount amount in cents. The upper bound depends on the
/// sale subtotal and is checked by [`crate::sale::SaleTotals::compute`].
pub fn validate_discount_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "discount_amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a points amount for a ledger credit or debit.
///
/// Zero is allowed (a zero credit is a no-op).
pub fn validate_points(points: i64) -> ValidationResult<()> {
    if points < 0 {
        return Err(ValidationError::OutOfRange {
            field: "points".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates free-text admin notes and returns them trimmed, or `None` when
/// blank.
pub fn validate_admin_notes(notes: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(notes) = notes.map(str::trim) else {
        return Ok(None);
    };

    if notes.is_empty() {
        return Ok(None);
    }

    if notes.chars().count() > MAX_ADMIN_NOTES_LEN {
        return Err(ValidationError::TooLong {
            field: "admin_notes".to_string(),
            max: MAX_ADMIN_NOTES_LEN,
        });
    }

    Ok(Some(notes.to_string()))
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the lines of a new sale, given as `(product_id, quantity)`.
///
/// ## Rules
/// - At least one line
/// - Every quantity is positive; stock is the only upper bound
/// - A product appears at most once
pub fn validate_sale_lines<'a, I>(lines: I) -> ValidationResult<()>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut seen = HashSet::new();

    for (product_id, quantity) in lines {
        if product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            });
        }
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
        if !seen.insert(product_id) {
            return Err(ValidationError::Duplicate {
                field: "product_id".to_string(),
                value: product_id.to_string(),
            });
        }
    }

    if seen.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_money_fields() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
        assert!(validate_discount_cents(500).is_ok());
        assert!(validate_discount_cents(-500).is_err());
    }

    #[test]
    fn test_validate_points() {
        assert!(validate_points(0).is_ok());
        assert!(validate_points(5).is_ok());
        assert!(validate_points(-5).is_err());
    }

    #[test]
    fn test_validate_admin_notes() {
        assert_eq!(validate_admin_notes(None).unwrap(), None);
        assert_eq!(validate_admin_notes(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_admin_notes(Some("  entregar el viernes ")).unwrap(),
            Some("entregar el viernes".to_string())
        );
        assert!(validate_admin_notes(Some(&"x".repeat(MAX_ADMIN_NOTES_LEN + 1))).is_err());
    }

    #[test]
    fn test_validate_sale_lines() {
        assert!(validate_sale_lines([("p1", 3), ("p2", 1)]).is_ok());
        // The cart's per-line cap does not apply to sales
        assert!(validate_sale_lines([("p1", MAX_ITEM_QUANTITY + 1)]).is_ok());

        assert!(matches!(
            validate_sale_lines(std::iter::empty::<(&str, i64)>()),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_sale_lines([("p1", 0)]),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_sale_lines([("p1", 1), ("p1", 2)]),
            Err(ValidationError::Duplicate { .. })
        ));
    }
}

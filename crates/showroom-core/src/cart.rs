//! # Cart Module
//!
//! Pricing and bounds for the per-customer cart.
//!
//! ## Price Snapshot
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_item(product, 2)   list price today: S/ 25.00                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  line { qty 2, price_at_addition S/ 25.00 }                            │
//! │                                                                         │
//! │  ... catalog price changes to S/ 30.00 ...                             │
//! │                                                                         │
//! │  add_item(product, 1)   → line { qty 3, price_at_addition S/ 25.00 }   │
//! │  total_price            → 3 × S/ 25.00 = S/ 75.00                      │
//! │                                                                         │
//! │  Lines with no snapshot fall back to today's list price.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Cart, CartItem};
use crate::validation::{validate_quantity, ValidationResult};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

impl CartItem {
    /// Captured price, or the current list price when nothing was captured.
    #[inline]
    pub fn effective_unit_price(&self) -> Money {
        Money::from_cents(
            self.price_at_addition_cents
                .unwrap_or(self.current_list_price_cents),
        )
    }

    /// `quantity × effective_unit_price`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.effective_unit_price() * self.quantity
    }
}

/// Cart as returned to the customer: header, lines and derived totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartView {
    pub cart: Cart,
    pub items: Vec<CartItem>,
    pub total_items: i64,
    pub total_price_cents: i64,
}

impl CartView {
    /// Builds the view, deriving totals from the lines.
    pub fn new(cart: Cart, items: Vec<CartItem>) -> Self {
        let total_items = items.iter().map(|item| item.quantity).sum();
        let total_price_cents = total_price(&items).cents();
        CartView {
            cart,
            items,
            total_items,
            total_price_cents,
        }
    }

    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

/// Σ quantity × effective price over all lines.
pub fn total_price(items: &[CartItem]) -> Money {
    items.iter().map(CartItem::line_total).sum()
}

/// Checks an `add_item` request against the current cart contents.
///
/// `existing_quantity` is the quantity already on the line for this
/// product (None when the product is not yet in the cart), `line_count`
/// the number of distinct lines in the cart.
pub fn check_add(
    existing_quantity: Option<i64>,
    line_count: usize,
    quantity: i64,
) -> ValidationResult<()> {
    validate_quantity(quantity)?;

    match existing_quantity {
        Some(current) => {
            if current + quantity > MAX_ITEM_QUANTITY {
                return Err(ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: 1,
                    max: MAX_ITEM_QUANTITY - current,
                });
            }
        }
        None => {
            if line_count >= MAX_CART_ITEMS {
                return Err(ValidationError::OutOfRange {
                    field: "cart items".to_string(),
                    min: 0,
                    max: MAX_CART_ITEMS as i64,
                });
            }
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

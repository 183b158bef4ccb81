//! # Sale Lifecycle
//!
//! Pure rules for the sale state machine: which status changes are legal,
//! which ledger effects each one triggers, how unit prices are resolved and
//! how totals and points are computed.
//!
//! ## Transition Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  plan_status_change(current, target) -> StatusChange { next, effects } │
//! │                                                                         │
//! │  current == target           → no effects (repeat PUT is a no-op)      │
//! │  non-terminal → fulfillment  → plain status write                      │
//! │  non-terminal → cobrado      → [CreditPoints]                          │
//! │  non-terminal → cancelado    → [RestockItems]                          │
//! │  terminal → anything else    → InvalidStateTransition                  │
//! │                                                                         │
//! │  Effects only come out of state-changing transitions, so the ledger    │
//! │  side of a sale fires at most once no matter how often a client        │
//! │  repeats the same request.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PointsRate, Sale, SaleItem, SaleStatus};
use crate::validation::{validate_discount_cents, validate_price_cents, validate_sale_lines};

// =============================================================================
// Transition Table
// =============================================================================

/// Ledger side effect emitted by a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleEffect {
    /// Credit `points_earned` to the customer's points account.
    CreditPoints,
    /// Return every line's quantity to product stock.
    RestockItems,
}

/// Outcome of planning a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub previous: SaleStatus,
    pub next: SaleStatus,
    pub effects: Vec<SaleEffect>,
}

impl StatusChange {
    /// True when nothing needs to be written.
    pub fn is_noop(&self) -> bool {
        self.previous == self.next
    }
}

/// Statuses reachable from `from` in one step (excluding staying put).
///
/// Fulfillment statuses can be corrected in either direction; terminal
/// statuses are sticky.
pub fn allowed_targets(from: SaleStatus) -> &'static [SaleStatus] {
    use SaleStatus::*;
    match from {
        PendingPrep => &[Assembled, EnRoute, Delivered, Billed, Cancelled],
        Assembled => &[PendingPrep, EnRoute, Delivered, Billed, Cancelled],
        EnRoute => &[PendingPrep, Assembled, Delivered, Billed, Cancelled],
        Delivered => &[PendingPrep, Assembled, EnRoute, Billed, Cancelled],
        Billed | Cancelled => &[],
    }
}

/// Effects attached to entering `to`.
fn effects_on_entry(to: SaleStatus) -> Vec<SaleEffect> {
    match to {
        SaleStatus::Billed => vec![SaleEffect::CreditPoints],
        SaleStatus::Cancelled => vec![SaleEffect::RestockItems],
        _ => Vec::new(),
    }
}

/// Plans the move of sale `sale_id` from `current` to `target`.
///
/// ## Errors
/// `InvalidStateTransition` when `target` is not reachable from `current`.
///
/// ## Example
/// ```rust
/// use showroom_core::sale::{plan_status_change, SaleEffect};
/// use showroom_core::SaleStatus;
///
/// let change = plan_status_change("s-1", SaleStatus::Delivered, SaleStatus::Billed).unwrap();
/// assert_eq!(change.effects, vec![SaleEffect::CreditPoints]);
///
/// let repeat = plan_status_change("s-1", SaleStatus::Billed, SaleStatus::Billed).unwrap();
/// assert!(repeat.effects.is_empty());
/// ```
pub fn plan_status_change(
    sale_id: &str,
    current: SaleStatus,
    target: SaleStatus,
) -> CoreResult<StatusChange> {
    if current == target {
        return Ok(StatusChange {
            previous: current,
            next: target,
            effects: Vec::new(),
        });
    }

    if !allowed_targets(current).contains(&target) {
        return Err(CoreError::invalid_transition(
            "Sale",
            sale_id,
            current.as_str(),
            "a non-terminal status",
        ));
    }

    Ok(StatusChange {
        previous: current,
        next: target,
        effects: effects_on_entry(target),
    })
}

/// Checks that the discount of sale `sale_id` may still be edited.
pub fn ensure_discount_editable(sale_id: &str, status: SaleStatus) -> CoreResult<()> {
    if status.is_terminal() {
        return Err(CoreError::invalid_transition(
            "Sale",
            sale_id,
            status.as_str(),
            "a non-terminal status",
        ));
    }
    Ok(())
}

// =============================================================================
// Pricing
// =============================================================================

/// Resolves the unit price of a sale line.
///
/// Precedence: explicit override → fair price → list price.
pub fn resolve_unit_price(
    override_price: Option<Money>,
    fair_price: Option<Money>,
    list_price: Money,
) -> Money {
    override_price.or(fair_price).unwrap_or(list_price)
}

/// Totals of a sale, derived from its line subtotals and discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    pub points_earned: i64,
}

impl SaleTotals {
    /// Computes `total = max(0, Σ subtotals − discount)` and
    /// `points_earned = floor(total × rate)`.
    ///
    /// ## Errors
    /// - negative discount
    /// - discount larger than the pre-discount subtotal
    /// - subtotal beyond what fits in `i64` cents
    pub fn compute(subtotals: &[Money], discount: Money, rate: PointsRate) -> CoreResult<Self> {
        if discount.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "discount_amount".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let subtotal = Money::checked_sum(subtotals).ok_or_else(|| ValidationError::OutOfRange {
            field: "subtotal".to_string(),
            min: 0,
            max: i64::MAX,
        })?;
        if discount > subtotal {
            return Err(ValidationError::OutOfRange {
                field: "discount_amount".to_string(),
                min: 0,
                max: subtotal.cents(),
            }
            .into());
        }

        let total = (subtotal - discount).floor_at_zero();
        Ok(SaleTotals {
            subtotal,
            discount,
            total,
            points_earned: total.points_at(rate),
        })
    }
}

// =============================================================================
// Requests
// =============================================================================

/// One line of a sale being created.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleLine {
    pub product_id: String,
    pub quantity: i64,
    /// Explicit unit price; falls back to the fair price, then list price.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

/// A sale to be created (checkout).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub customer_id: String,
    pub items: Vec<NewSaleLine>,
    #[serde(default)]
    pub discount_amount_cents: i64,
}

impl NewSale {
    /// Field-level checks that need no database access.
    pub fn validate(&self) -> CoreResult<()> {
        if self.customer_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "customer_id".to_string(),
            }
            .into());
        }
        validate_sale_lines(
            self.items
                .iter()
                .map(|line| (line.product_id.as_str(), line.quantity)),
        )?;
        for line in &self.items {
            if let Some(price) = line.unit_price_cents {
                validate_price_cents(price)?;
            }
        }
        validate_discount_cents(self.discount_amount_cents)?;
        Ok(())
    }
}

/// Partial update of a sale: discount, status, or both.
///
/// When both are present the discount is applied first, so billing in the
/// same request credits the recomputed points.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleUpdate {
    #[serde(default)]
    pub discount_amount_cents: Option<i64>,
    #[serde(default)]
    pub status: Option<SaleStatus>,
    /// Optimistic concurrency guard; the update fails with `Conflict`
    /// when the stored version differs.
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// A sale together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Unit Tests
// =============================================================================

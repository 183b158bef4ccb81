//! # Redemption Lifecycle
//!
//! Pure rules for gift redemption: the action/state table and the
//! eligibility checks run at request time and again at approval time.
//!
//! ## Approval Is The Checkpoint
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request created (balance 60, gift stock 1)                            │
//! │       │                                                                 │
//! │       │   ... another approval takes the last unit ...                  │
//! │       ▼                                                                 │
//! │  approve ── check_eligibility ──► OutOfStock                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  status → rechazado, note "stock gone", caller gets Conflict           │
//! │  (no points debited, balance stays 60)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::types::{GiftItem, RedemptionStatus};

// =============================================================================
// Actions
// =============================================================================

/// Something an admin or the customer can do to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionAction {
    Approve,
    Reject,
    Deliver,
    CancelByClient,
}

impl RedemptionAction {
    /// The state a request must be in for this action.
    pub const fn required_status(&self) -> RedemptionStatus {
        match self {
            RedemptionAction::Approve
            | RedemptionAction::Reject
            | RedemptionAction::CancelByClient => RedemptionStatus::PendingApproval,
            RedemptionAction::Deliver => RedemptionStatus::ApprovedForDelivery,
        }
    }

    /// The state a request ends in after this action succeeds.
    pub const fn resulting_status(&self) -> RedemptionStatus {
        match self {
            RedemptionAction::Approve => RedemptionStatus::ApprovedForDelivery,
            RedemptionAction::Reject => RedemptionStatus::Rejected,
            RedemptionAction::Deliver => RedemptionStatus::Delivered,
            RedemptionAction::CancelByClient => RedemptionStatus::CancelledByClient,
        }
    }

    /// Whether the action moves points and gift stock.
    pub const fn debits_ledgers(&self) -> bool {
        matches!(self, RedemptionAction::Approve)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            RedemptionAction::Approve => "approve",
            RedemptionAction::Reject => "reject",
            RedemptionAction::Deliver => "deliver",
            RedemptionAction::CancelByClient => "cancel",
        }
    }
}

/// Checks that `action` may run on request `request_id` in `current` state
/// and returns the state it leads to.
///
/// ## Errors
/// `InvalidStateTransition` naming current and required state.
pub fn plan_action(
    request_id: &str,
    current: RedemptionStatus,
    action: RedemptionAction,
) -> CoreResult<RedemptionStatus> {
    let required = action.required_status();
    if current != required {
        return Err(CoreError::invalid_transition(
            "RedemptionRequest",
            request_id,
            current.as_str(),
            required.as_str(),
        ));
    }
    Ok(action.resulting_status())
}

// =============================================================================
// Eligibility
// =============================================================================

/// Why a customer cannot (or can no longer) redeem a gift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligibility {
    GiftInactive,
    OutOfStock,
    InsufficientPoints { available: i64, required: i64 },
}

impl Ineligibility {
    /// Converts to the error reported to the caller.
    pub fn into_error(self, customer_id: &str, gift: &GiftItem) -> CoreError {
        match self {
            Ineligibility::GiftInactive => {
                CoreError::conflict(format!("Gift {} is not active", gift.id))
            }
            Ineligibility::OutOfStock => CoreError::InsufficientStock {
                item_id: gift.id.clone(),
                available: gift.redeemable_stock,
                requested: 1,
            },
            Ineligibility::InsufficientPoints {
                available,
                required,
            } => CoreError::InsufficientPoints {
                customer_id: customer_id.to_string(),
                available,
                required,
            },
        }
    }

    /// System note stored on a request auto-rejected at approval time.
    pub fn rejection_note(&self) -> String {
        format!("Rechazo automático al aprobar: {self}")
    }
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligibility::GiftInactive => f.write_str("gift is no longer active"),
            Ineligibility::OutOfStock => f.write_str("stock gone, no redeemable units left"),
            Ineligibility::InsufficientPoints {
                available,
                required,
            } => write!(
                f,
                "insufficient points (available {available}, required {required})"
            ),
        }
    }
}

/// Checks the three redemption conditions, in a fixed order: active,
/// stock, points. `points_required` is the gift cost at request time and
/// the frozen `points_charged` at approval time.
pub fn check_eligibility(
    gift: &GiftItem,
    available_points: i64,
    points_required: i64,
) -> Result<(), Ineligibility> {
    if !gift.is_active {
        return Err(Ineligibility::GiftInactive);
    }
    if gift.redeemable_stock <= 0 {
        return Err(Ineligibility::OutOfStock);
    }
    if available_points < points_required {
        return Err(Ineligibility::InsufficientPoints {
            available: available_points,
            required: points_required,
        });
    }
    Ok(())
}

/// Builds the frozen product-detail text stored on a new request.
pub fn product_snapshot(gift: &GiftItem) -> String {
    match gift.description.as_deref().map(str::trim) {
        Some(description) if !description.is_empty() => format!(
            "{} ({} pts): {}",
            gift.name, gift.points_cost, description
        ),
        _ => format!("{} ({} pts)", gift.name, gift.points_cost),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

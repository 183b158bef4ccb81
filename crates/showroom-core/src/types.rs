//! # Domain Types
//!
//! Core domain types used throughout the showroom engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │  PointsAccount  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  price tiers    │   │  status         │   │  customer_id    │       │
//! │  │  stock          │   │  total/discount │   │  available_pts  │       │
//! │  │  critical_stock │   │  points_earned  │   │  (never < 0)    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐   ┌───────────────┐    │
//! │  │    GiftItem     │   │  RedemptionRequest   │   │ Cart/CartItem │    │
//! │  │  ─────────────  │   │  ──────────────────  │   │ ───────────── │    │
//! │  │  points_cost    │   │  points_charged (❄)  │   │ one per       │    │
//! │  │  redeemable_stk │   │  product_snapshot(❄) │   │ customer      │    │
//! │  └─────────────────┘   └──────────────────────┘   └───────────────┘    │
//! │                                                                         │
//! │  ❄ = snapshot field, copied at creation, never tracks its source       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Status enums serialize (JSON and SQL) to the persisted Spanish
//! vocabulary; those strings are part of the storage format.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Points Rate
// =============================================================================

/// Loyalty rate represented in basis points of a point per currency unit.
///
/// ## Why Basis Points?
/// 1000 bps = 0.1 points per S/ 1.00. Integer storage keeps the points
/// formula exact (see [`Money::points_at`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PointsRate(u32);

impl PointsRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        PointsRate(bps)
    }

    /// Creates a rate from a fraction, e.g. `0.1` (for configuration input).
    pub fn from_fraction(fraction: f64) -> Self {
        PointsRate((fraction * 10_000.0).round().max(0.0) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }
}

impl Default for PointsRate {
    fn default() -> Self {
        PointsRate(crate::DEFAULT_POINTS_RATE_BPS)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product, as seen by the engine.
///
/// The catalog itself is maintained elsewhere; the engine only reads price
/// tiers and stock, and writes stock deltas.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Catalog ("revista") price.
    pub price_list_cents: i64,
    /// Showroom price, when the showroom sells below list.
    pub price_showroom_cents: Option<i64>,
    /// Price used at fairs and events.
    pub price_fair_cents: Option<i64>,
    /// Units on hand. Never negative.
    pub stock: i64,
    /// Stock level at or below which the product is flagged as critical.
    pub critical_stock: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the list price as Money.
    #[inline]
    pub fn list_price(&self) -> Money {
        Money::from_cents(self.price_list_cents)
    }

    /// Returns the fair price as Money, if set.
    #[inline]
    pub fn fair_price(&self) -> Option<Money> {
        self.price_fair_cents.map(Money::from_cents)
    }

    /// Returns the showroom price as Money, if set.
    #[inline]
    pub fn showroom_price(&self) -> Option<Money> {
        self.price_showroom_cents.map(Money::from_cents)
    }

    /// Whether stock has fallen to the critical threshold.
    pub fn is_critical(&self) -> bool {
        self.stock <= self.critical_stock
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// Fulfillment lifecycle of a sale.
///
/// ```text
/// pendiente_preparacion ─► armado ─► en_camino ─► entregado ─► cobrado
///          │                 │          │            │         (credits
///          └─────────────────┴──────────┴────────────┴──► cancelado  points)
///                                                        (restocks)
/// ```
///
/// Legal moves live in [`crate::sale::plan_status_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum SaleStatus {
    /// Order taken, waiting to be assembled.
    #[serde(rename = "pendiente_preparacion")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pendiente_preparacion"))]
    PendingPrep,
    /// Items picked and packed.
    #[serde(rename = "armado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "armado"))]
    Assembled,
    /// Out for delivery.
    #[serde(rename = "en_camino")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "en_camino"))]
    EnRoute,
    /// Handed to the customer, not yet paid.
    #[serde(rename = "entregado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "entregado"))]
    Delivered,
    /// Paid. Terminal; points are credited on entry.
    #[serde(rename = "cobrado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cobrado"))]
    Billed,
    /// Cancelled. Terminal; stock is restored on entry.
    #[serde(rename = "cancelado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cancelado"))]
    Cancelled,
}

impl SaleStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [SaleStatus; 6] = [
        SaleStatus::PendingPrep,
        SaleStatus::Assembled,
        SaleStatus::EnRoute,
        SaleStatus::Delivered,
        SaleStatus::Billed,
        SaleStatus::Cancelled,
    ];

    /// The persisted string value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::PendingPrep => "pendiente_preparacion",
            SaleStatus::Assembled => "armado",
            SaleStatus::EnRoute => "en_camino",
            SaleStatus::Delivered => "entregado",
            SaleStatus::Billed => "cobrado",
            SaleStatus::Cancelled => "cancelado",
        }
    }

    /// Billed and cancelled sales accept no further changes.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, SaleStatus::Billed | SaleStatus::Cancelled)
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::PendingPrep
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SaleStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: SaleStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale to a showroom customer.
///
/// Never deleted: cancellation is a status.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub customer_id: String,
    pub status: SaleStatus,
    /// `max(0, Σ item subtotals − discount)`.
    pub total_amount_cents: i64,
    pub discount_amount_cents: i64,
    /// `floor(total × rate)`; credited once on entry to `cobrado`.
    pub points_earned: i64,
    /// Optimistic concurrency counter, bumped on every write.
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    /// Returns the discount as Money.
    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_amount_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale. Immutable once the sale exists.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price_cents: i64,
    /// `quantity × unit_price_cents`.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Points Account
// =============================================================================

/// The points balance embedded in a customer profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PointsAccount {
    pub customer_id: String,
    /// Never negative.
    pub available_points: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Gift Item
// =============================================================================

/// A product offered in exchange for points.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct GiftItem {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Points required per unit. Always > 0.
    pub points_cost: i64,
    /// Units still redeemable. Never negative.
    pub redeemable_stock: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Redemption Status
// =============================================================================

/// Lifecycle of a gift redemption request.
///
/// ```text
/// pendiente_aprobacion ──approve──► aprobado_por_entregar ──deliver──► entregado
///        │
///        ├──reject──────► rechazado
///        └──client──────► cancelado_por_cliente
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum RedemptionStatus {
    #[serde(rename = "pendiente_aprobacion")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pendiente_aprobacion"))]
    PendingApproval,
    #[serde(rename = "aprobado_por_entregar")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "aprobado_por_entregar"))]
    ApprovedForDelivery,
    #[serde(rename = "entregado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "entregado"))]
    Delivered,
    #[serde(rename = "rechazado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "rechazado"))]
    Rejected,
    #[serde(rename = "cancelado_por_cliente")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cancelado_por_cliente"))]
    CancelledByClient,
}

impl RedemptionStatus {
    /// Every status.
    pub const ALL: [RedemptionStatus; 5] = [
        RedemptionStatus::PendingApproval,
        RedemptionStatus::ApprovedForDelivery,
        RedemptionStatus::Delivered,
        RedemptionStatus::Rejected,
        RedemptionStatus::CancelledByClient,
    ];

    /// The persisted string value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RedemptionStatus::PendingApproval => "pendiente_aprobacion",
            RedemptionStatus::ApprovedForDelivery => "aprobado_por_entregar",
            RedemptionStatus::Delivered => "entregado",
            RedemptionStatus::Rejected => "rechazado",
            RedemptionStatus::CancelledByClient => "cancelado_por_cliente",
        }
    }
}

impl Default for RedemptionStatus {
    fn default() -> Self {
        RedemptionStatus::PendingApproval
    }
}

impl fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RedemptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RedemptionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: RedemptionStatus::ALL
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Redemption Request
// =============================================================================

/// A customer's request to exchange points for a gift.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RedemptionRequest {
    pub id: String,
    pub customer_id: String,
    pub gift_item_id: String,
    /// Gift cost at request time (frozen).
    pub points_charged: i64,
    /// Human-readable gift details at request time (frozen).
    pub product_snapshot: String,
    pub status: RedemptionStatus,
    pub admin_notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Cart
// =============================================================================

/// A customer's cart header. At most one per customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Cart {
    pub id: String,
    pub customer_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A cart line, joined with the product's current name and list price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartItem {
    pub id: String,
    pub cart_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    /// Price captured when the product was first added (frozen).
    /// `None` for lines whose product had no price at the time.
    pub price_at_addition_cents: Option<i64>,
    /// The product's list price right now.
    pub current_list_price_cents: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_rate_from_fraction() {
        assert_eq!(PointsRate::from_fraction(0.1).bps(), 1000);
        assert_eq!(PointsRate::from_fraction(0.0).bps(), 0);
        assert_eq!(PointsRate::default().bps(), 1000);
    }

    #[test]
    fn test_sale_status_roundtrips_persisted_vocabulary() {
        for status in SaleStatus::ALL {
            assert_eq!(status.as_str().parse::<SaleStatus>().unwrap(), status);
        }
        assert!("completed".parse::<SaleStatus>().is_err());
    }

    #[test]
    fn test_sale_status_serializes_to_spanish() {
        let json = serde_json::to_string(&SaleStatus::Billed).unwrap();
        assert_eq!(json, "\"cobrado\"");
        let parsed: SaleStatus = serde_json::from_str("\"en_camino\"").unwrap();
        assert_eq!(parsed, SaleStatus::EnRoute);
    }

    #[test]
    fn test_redemption_status_parse() {
        assert_eq!(
            "aprobado_por_entregar".parse::<RedemptionStatus>().unwrap(),
            RedemptionStatus::ApprovedForDelivery
        );
        assert!("approved".parse::<RedemptionStatus>().is_err());
    }

    #[test]
    fn test_terminal_sale_statuses() {
        assert!(SaleStatus::Billed.is_terminal());
        assert!(SaleStatus::Cancelled.is_terminal());
        assert!(!SaleStatus::Delivered.is_terminal());
        assert_eq!(SaleStatus::default(), SaleStatus::PendingPrep);
    }
}

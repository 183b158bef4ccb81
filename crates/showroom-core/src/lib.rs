//! # showroom-core: Pure Business Logic for the Showroom Loyalty Engine
//!
//! This crate holds every rule that keeps stock, sale status, loyalty points
//! and gift redemptions consistent, as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Showroom Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 showroom-api (axum HTTP)                        │   │
//! │  │   /sales, /redemption-requests, /me/cart, /admin/...            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ showroom-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌────────────┐ ┌──────────┐        │   │
//! │  │   │  types   │ │   sale   │ │ redemption │ │   cart   │        │   │
//! │  │   │  money   │ │ lifecycle│ │ lifecycle  │ │ pricing  │        │   │
//! │  │   └──────────┘ └──────────┘ └────────────┘ └──────────┘        │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               showroom-db (Database Layer)                      │   │
//! │  │        SQLite transactions, inventory & points ledgers          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, Sale, GiftItem, RedemptionRequest, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`sale`] - Sale lifecycle transition table and totals/points math
//! - [`redemption`] - Redemption lifecycle and eligibility rules
//! - [`cart`] - Cart aggregation and pricing fallback
//! - [`error`] - Domain error taxonomy
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use showroom_core::money::Money;
//! use showroom_core::sale::SaleTotals;
//! use showroom_core::types::PointsRate;
//!
//! let subtotals = [Money::from_cents(6000)];
//! let totals = SaleTotals::compute(&subtotals, Money::from_cents(500), PointsRate::from_bps(1000))
//!     .unwrap();
//!
//! assert_eq!(totals.total.cents(), 5500);
//! assert_eq!(totals.points_earned, 5);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod redemption;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single cart line. Sale lines are bounded by stock only.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Default loyalty rate in basis points: 1000 bps = 0.1 points per currency unit.
pub const DEFAULT_POINTS_RATE_BPS: u32 = 1000;

/// Maximum length of free-text admin notes on a redemption request.
pub const MAX_ADMIN_NOTES_LEN: usize = 500;

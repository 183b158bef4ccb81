//! # showroom-db: Persistence Layer for the Showroom Loyalty Engine
//!
//! SQLite storage through sqlx. Every ledger movement and state transition
//! runs inside a single transaction, so a failed step leaves nothing behind.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  showroom-api (axum handlers)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   showroom-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ sales, carts  │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ redemptions   │    │ 001_init.sql │  │   │
//! │  │   │               │    │ ledgers       │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  showroom-core (transition rules, totals, validation)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use showroom_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("showroom.db")).await?;
//! let detail = db.sales().create_sale(&new_sale).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::cart::CartRepository;
pub use repository::gift::GiftRepository;
pub use repository::inventory::InventoryLedger;
pub use repository::points::PointsLedger;
pub use repository::product::ProductRepository;
pub use repository::redemption::RedemptionRepository;
pub use repository::sale::SaleRepository;

//! # Repository Module
//!
//! Database repositories for the showroom loyalty engine.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │  db.sales().update_sale(id, &update)                            │
//! │       ▼                                                                 │
//! │  SaleRepository / RedemptionRepository / CartRepository                 │
//! │       │  one transaction per operation                                  │
//! │       ▼                                                                 │
//! │  inventory::debit_in / points::credit_in / …   (ledger writes)          │
//! │       │  conditional UPDATE ... WHERE stock >= ?                        │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ledger functions take a `&mut SqliteConnection` so the state machines can
//! run them inside their own transaction; the ledger structs wrap them for
//! standalone use.
//!
//! ## Available Repositories
//!
//! - [`inventory::InventoryLedger`] - Product and gift stock movements
//! - [`points::PointsLedger`] - Customer points balances
//! - [`product::ProductRepository`] - Product catalog
//! - [`gift::GiftRepository`] - Gift catalog
//! - [`sale::SaleRepository`] - Sale lifecycle
//! - [`redemption::RedemptionRepository`] - Redemption request lifecycle
//! - [`cart::CartRepository`] - Per-customer cart

pub mod cart;
pub mod gift;
pub mod inventory;
pub mod points;
pub mod product;
pub mod redemption;
pub mod sale;

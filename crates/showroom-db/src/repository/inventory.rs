//! # Inventory Ledger
//!
//! Atomic debits and credits of product stock and gift stock.
//!
//! ## Check-And-Mutate In One Statement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products SET stock = stock - :qty                              │
//! │  WHERE id = :id AND stock >= :qty                                      │
//! │                                                                         │
//! │  1 row  → debited                                                      │
//! │  0 rows → SELECT stock WHERE id = :id                                  │
//! │           ├── no row   → NotFound                                      │
//! │           └── stock=n  → InsufficientStock { available: n }            │
//! │                                                                         │
//! │  Two sales racing for the last unit cannot both pass the WHERE.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `*_in` functions run on the caller's transaction connection so a
//! failed debit takes the whole operation down with it. The
//! [`InventoryLedger`] methods wrap a single adjustment in its own
//! transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use showroom_core::{CoreError, ValidationError};

use crate::error::{DbError, DbResult};

fn ensure_positive(qty: i64) -> DbResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Debits `qty` units of product `product_id`.
pub async fn debit_in(conn: &mut SqliteConnection, product_id: &str, qty: i64) -> DbResult<()> {
    ensure_positive(qty)?;
    debug!(product_id = %product_id, qty, "Debiting stock");

    let result = sqlx::query(
        "UPDATE products SET stock = stock - ?1, updated_at = ?2 WHERE id = ?3 AND stock >= ?1",
    )
    .bind(qty)
    .bind(Utc::now())
    .bind(product_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

        return Err(match available {
            None => DbError::not_found("Product", product_id),
            Some(available) => CoreError::InsufficientStock {
                item_id: product_id.to_string(),
                available,
                requested: qty,
            }
            .into(),
        });
    }

    Ok(())
}

/// Credits `qty` units back to product `product_id`.
pub async fn credit_in(conn: &mut SqliteConnection, product_id: &str, qty: i64) -> DbResult<()> {
    ensure_positive(qty)?;
    debug!(product_id = %product_id, qty, "Crediting stock");

    let result =
        sqlx::query("UPDATE products SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3")
            .bind(qty)
            .bind(Utc::now())
            .bind(product_id)
            .execute(&mut *conn)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", product_id));
    }

    Ok(())
}

/// Debits one redeemable unit of gift `gift_id`.
pub async fn debit_gift_in(conn: &mut SqliteConnection, gift_id: &str) -> DbResult<()> {
    debug!(gift_id = %gift_id, "Debiting gift stock");

    let result = sqlx::query(
        "UPDATE gift_items SET redeemable_stock = redeemable_stock - 1, updated_at = ?1 \
         WHERE id = ?2 AND redeemable_stock >= 1",
    )
    .bind(Utc::now())
    .bind(gift_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let available: Option<i64> =
            sqlx::query_scalar("SELECT redeemable_stock FROM gift_items WHERE id = ?1")
                .bind(gift_id)
                .fetch_optional(&mut *conn)
                .await?;

        return Err(match available {
            None => DbError::not_found("GiftItem", gift_id),
            Some(available) => CoreError::InsufficientStock {
                item_id: gift_id.to_string(),
                available,
                requested: 1,
            }
            .into(),
        });
    }

    Ok(())
}

/// Standalone stock adjustments, each in its own transaction.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    /// Creates a new InventoryLedger.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLedger { pool }
    }

    /// Debits stock; fails with `InsufficientStock` leaving stock untouched.
    pub async fn debit(&self, product_id: &str, qty: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        debit_in(&mut tx, product_id, qty).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Credits stock.
    pub async fn credit(&self, product_id: &str, qty: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        credit_in(&mut tx, product_id, qty).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Current stock-on-hand of a product.
    pub async fn stock_of(&self, product_id: &str) -> DbResult<i64> {
        sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))
    }
}

//! # Points Ledger
//!
//! Per-customer loyalty balance stored on the customer profile row
//! (`customers.available_points`). The balance is never negative: debits
//! use a conditional UPDATE and the column carries a `CHECK (>= 0)`.
//!
//! Who moves points:
//! - sale → `cobrado` credits `points_earned` (once)
//! - redemption approval debits `points_charged`

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use showroom_core::validation::validate_points;
use showroom_core::{CoreError, PointsAccount};

use crate::error::{DbError, DbResult};

const SELECT_ACCOUNT: &str =
    "SELECT id AS customer_id, available_points, updated_at FROM customers WHERE id = ?1";

/// Reads a customer's balance on the given connection.
pub async fn balance_in(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<i64> {
    sqlx::query_scalar("SELECT available_points FROM customers WHERE id = ?1")
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", customer_id))
}

/// Adds `amount` points. Zero is a no-op.
pub async fn credit_in(conn: &mut SqliteConnection, customer_id: &str, amount: i64) -> DbResult<()> {
    validate_points(amount)?;
    if amount == 0 {
        return Ok(());
    }
    debug!(customer_id = %customer_id, amount, "Crediting points");

    let result = sqlx::query(
        "UPDATE customers SET available_points = available_points + ?1, updated_at = ?2 WHERE id = ?3",
    )
    .bind(amount)
    .bind(Utc::now())
    .bind(customer_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", customer_id));
    }

    Ok(())
}

/// Removes `amount` points, failing with `InsufficientPoints` if the
/// balance does not cover it.
pub async fn debit_in(conn: &mut SqliteConnection, customer_id: &str, amount: i64) -> DbResult<()> {
    validate_points(amount)?;
    if amount == 0 {
        return Ok(());
    }
    debug!(customer_id = %customer_id, amount, "Debiting points");

    let result = sqlx::query(
        "UPDATE customers SET available_points = available_points - ?1, updated_at = ?2 \
         WHERE id = ?3 AND available_points >= ?1",
    )
    .bind(amount)
    .bind(Utc::now())
    .bind(customer_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let available = balance_in(conn, customer_id).await?;
        return Err(CoreError::InsufficientPoints {
            customer_id: customer_id.to_string(),
            available,
            required: amount,
        }
        .into());
    }

    Ok(())
}

/// Points ledger with one transaction per call.
#[derive(Debug, Clone)]
pub struct PointsLedger {
    pool: SqlitePool,
}

impl PointsLedger {
    /// Creates a new PointsLedger.
    pub fn new(pool: SqlitePool) -> Self {
        PointsLedger { pool }
    }

    /// Ensures a profile row exists for `customer_id` and returns its
    /// account. An existing profile keeps its balance.
    pub async fn open_account(
        &self,
        customer_id: &str,
        display_name: Option<&str>,
    ) -> DbResult<PointsAccount> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO customers (id, display_name, available_points, created_at, updated_at) \
             VALUES (?1, ?2, 0, ?3, ?3) ON CONFLICT(id) DO NOTHING",
        )
        .bind(customer_id)
        .bind(display_name)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let account = sqlx::query_as::<_, PointsAccount>(SELECT_ACCOUNT)
            .bind(customer_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if result.rows_affected() > 0 {
            info!(customer_id = %customer_id, "Opened points account");
        }
        Ok(account)
    }

    /// Returns the account of `customer_id`.
    pub async fn account(&self, customer_id: &str) -> DbResult<PointsAccount> {
        sqlx::query_as::<_, PointsAccount>(SELECT_ACCOUNT)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", customer_id))
    }

    /// Returns the available balance of `customer_id`.
    pub async fn balance(&self, customer_id: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        balance_in(&mut conn, customer_id).await
    }

    /// Credits points in a transaction of its own.
    pub async fn credit(&self, customer_id: &str, amount: i64) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;
        credit_in(&mut tx, customer_id, amount).await?;
        let balance = balance_in(&mut tx, customer_id).await?;
        tx.commit().await?;

        info!(customer_id = %customer_id, amount, balance, "Points credited");
        Ok(balance)
    }

    /// Debits points in a transaction of its own.
    pub async fn debit(&self, customer_id: &str, amount: i64) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;
        debit_in(&mut tx, customer_id, amount).await?;
        let balance = balance_in(&mut tx, customer_id).await?;
        tx.commit().await?;

        info!(customer_id = %customer_id, amount, balance, "Points debited");
        Ok(balance)
    }
}

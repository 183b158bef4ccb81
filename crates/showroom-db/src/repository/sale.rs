//! # Sale Repository
//!
//! The sale state machine, persisted. Every public method is one
//! transaction: either all of its rows change or none do.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create_sale()                                                  │
//! │         ├── resolve unit price per line (override → fair → list)       │
//! │         ├── inventory::debit_in() per line  ── InsufficientStock?      │
//! │         ├── SaleTotals::compute()            ── rollback everything    │
//! │         └── INSERT sales + sale_items                                  │
//! │                                                                         │
//! │  2. FULFILL (pendiente_preparacion ↔ armado ↔ en_camino ↔ entregado)   │
//! │     └── update_sale(status) → status write only                        │
//! │                                                                         │
//! │  3. BILL                                                               │
//! │     └── update_sale(cobrado) → points::credit_in(points_earned)        │
//! │                                                                         │
//! │  4. (OPTIONAL) CANCEL                                                  │
//! │     └── cancel_sale() → inventory::credit_in() per line                │
//! │                                                                         │
//! │  Every write bumps `version` with WHERE version = <read version>;      │
//! │  a concurrent writer that got there first turns this into Conflict.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use showroom_core::sale::{
    ensure_discount_editable, plan_status_change, resolve_unit_price, NewSale, SaleDetail,
    SaleEffect, SaleTotals, SaleUpdate,
};
use showroom_core::validation::validate_discount_cents;
use showroom_core::{CoreError, Money, PointsRate, Sale, SaleItem, SaleStatus, ValidationError};

use crate::error::{DbError, DbResult};
use crate::repository::{inventory, points, product};

const SELECT_SALE: &str = r#"
    SELECT
        id, customer_id, status,
        total_amount_cents, discount_amount_cents, points_earned,
        version, created_at, updated_at
    FROM sales
"#;

async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Sale> {
    sqlx::query_as::<_, Sale>(&format!("{SELECT_SALE} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))
}

async fn items_in(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT id, sale_id, product_id, quantity, unit_price_cents, subtotal_cents, created_at
        FROM sale_items
        WHERE sale_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

async fn ensure_customer_in(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<()> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM customers WHERE id = ?1")
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await?;

    match exists {
        Some(_) => Ok(()),
        None => Err(DbError::not_found("Customer", customer_id)),
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    points_rate: PointsRate,
}

impl SaleRepository {
    /// Creates a new SaleRepository pricing points at `points_rate`.
    pub fn new(pool: SqlitePool, points_rate: PointsRate) -> Self {
        SaleRepository { pool, points_rate }
    }

    /// Creates a sale, debiting stock for every line.
    ///
    /// ## Errors
    /// - `Validation`: no lines, non-positive quantity, duplicate product,
    ///   negative price or discount, discount above the subtotal, line or
    ///   sale amounts too large to represent
    /// - `NotFound`: customer or product missing
    /// - `InsufficientStock`: any line short; no line is debited
    pub async fn create_sale(&self, new_sale: &NewSale) -> DbResult<SaleDetail> {
        new_sale.validate()?;

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(
            sale_id = %sale_id,
            customer_id = %new_sale.customer_id,
            lines = new_sale.items.len(),
            "Creating sale"
        );

        let mut tx = self.pool.begin().await?;

        ensure_customer_in(&mut tx, &new_sale.customer_id).await?;

        let mut items = Vec::with_capacity(new_sale.items.len());
        for line in &new_sale.items {
            let product = product::get_in(&mut tx, &line.product_id).await?;
            let unit_price = resolve_unit_price(
                line.unit_price_cents.map(Money::from_cents),
                product.fair_price(),
                product.list_price(),
            );

            let subtotal = unit_price.checked_mul(line.quantity).ok_or_else(|| {
                ValidationError::OutOfRange {
                    field: "unit_price".to_string(),
                    min: 0,
                    max: i64::MAX / line.quantity,
                }
            })?;

            inventory::debit_in(&mut tx, &product.id, line.quantity).await?;

            items.push(SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: product.id,
                quantity: line.quantity,
                unit_price_cents: unit_price.cents(),
                subtotal_cents: subtotal.cents(),
                created_at: now,
            });
        }

        let subtotals: Vec<Money> = items.iter().map(SaleItem::subtotal).collect();
        let totals = SaleTotals::compute(
            &subtotals,
            Money::from_cents(new_sale.discount_amount_cents),
            self.points_rate,
        )?;

        let sale = Sale {
            id: sale_id,
            customer_id: new_sale.customer_id.clone(),
            status: SaleStatus::PendingPrep,
            total_amount_cents: totals.total.cents(),
            discount_amount_cents: totals.discount.cents(),
            points_earned: totals.points_earned,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_id, status,
                total_amount_cents, discount_amount_cents, points_earned,
                version, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(sale.status)
        .bind(sale.total_amount_cents)
        .bind(sale.discount_amount_cents)
        .bind(sale.points_earned)
        .bind(sale.version)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, quantity,
                    unit_price_cents, subtotal_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.subtotal_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            total = %sale.total(),
            points_earned = sale.points_earned,
            "Sale created"
        );

        Ok(SaleDetail { sale, items })
    }

    /// Gets a sale with its lines.
    pub async fn get(&self, id: &str) -> DbResult<SaleDetail> {
        let mut conn = self.pool.acquire().await?;
        let sale = get_in(&mut conn, id).await?;
        let items = items_in(&mut conn, id).await?;
        Ok(SaleDetail { sale, items })
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!("{SELECT_SALE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets all items for a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let mut conn = self.pool.acquire().await?;
        items_in(&mut conn, sale_id).await
    }

    /// Lists a customer's sales, newest first.
    pub async fn list_for_customer(&self, customer_id: &str, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "{SELECT_SALE} WHERE customer_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        ))
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Edits the discount and/or moves the status of a sale.
    ///
    /// ## What This Does
    /// 1. Checks `expected_version` (if given) against the stored version
    /// 2. New discount → recompute total and points from stored subtotals
    /// 3. New status → plan the transition, apply its ledger effects
    /// 4. Writes with `WHERE version = <read version>` and bumps it
    ///
    /// Repeating a request that changes nothing returns the sale unchanged
    /// and touches no ledger.
    pub async fn update_sale(&self, id: &str, update: &SaleUpdate) -> DbResult<SaleDetail> {
        if let Some(discount) = update.discount_amount_cents {
            validate_discount_cents(discount)?;
        }

        let mut tx = self.pool.begin().await?;

        let current = get_in(&mut tx, id).await?;
        if let Some(expected) = update.expected_version {
            if expected != current.version {
                return Err(DbError::conflict(format!(
                    "Sale {id} is at version {}, update expected {expected}",
                    current.version
                )));
            }
        }

        let items = items_in(&mut tx, id).await?;
        let mut next = current.clone();

        if let Some(discount) = update
            .discount_amount_cents
            .filter(|d| *d != current.discount_amount_cents)
        {
            ensure_discount_editable(id, current.status)?;
            let subtotals: Vec<Money> = items.iter().map(SaleItem::subtotal).collect();
            let totals =
                SaleTotals::compute(&subtotals, Money::from_cents(discount), self.points_rate)?;
            next.discount_amount_cents = totals.discount.cents();
            next.total_amount_cents = totals.total.cents();
            next.points_earned = totals.points_earned;
        }

        let change = plan_status_change(id, current.status, update.status.unwrap_or(current.status))?;
        next.status = change.next;

        let changed = next.status != current.status
            || next.discount_amount_cents != current.discount_amount_cents;
        if !changed {
            debug!(sale_id = %id, status = %current.status, "Sale update is a no-op");
            tx.commit().await?;
            return Ok(SaleDetail {
                sale: current,
                items,
            });
        }

        next.version = current.version + 1;
        next.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                status = ?1,
                total_amount_cents = ?2,
                discount_amount_cents = ?3,
                points_earned = ?4,
                version = ?5,
                updated_at = ?6
            WHERE id = ?7 AND version = ?8
            "#,
        )
        .bind(next.status)
        .bind(next.total_amount_cents)
        .bind(next.discount_amount_cents)
        .bind(next.points_earned)
        .bind(next.version)
        .bind(next.updated_at)
        .bind(id)
        .bind(current.version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::conflict(format!(
                "Sale {id} was modified concurrently"
            ))
            .into());
        }

        for effect in &change.effects {
            match effect {
                SaleEffect::CreditPoints => {
                    points::credit_in(&mut tx, &next.customer_id, next.points_earned).await?;
                }
                SaleEffect::RestockItems => {
                    for item in &items {
                        inventory::credit_in(&mut tx, &item.product_id, item.quantity).await?;
                    }
                }
            }
        }

        tx.commit().await?;

        info!(
            sale_id = %id,
            from = %current.status,
            to = %next.status,
            total = %next.total(),
            effects = ?change.effects,
            "Sale updated"
        );

        Ok(SaleDetail { sale: next, items })
    }

    /// Administrative cancel: same as moving the sale to `cancelado`.
    pub async fn cancel_sale(&self, id: &str) -> DbResult<SaleDetail> {
        self.update_sale(
            id,
            &SaleUpdate {
                status: Some(SaleStatus::Cancelled),
                ..SaleUpdate::default()
            },
        )
        .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

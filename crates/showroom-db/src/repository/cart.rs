//! # Cart Repository
//!
//! One cart per customer, created lazily, one line per product. The cart
//! has no ledger effects: stock is only debited when a sale is created.
//!
//! ## Upsert
//! ```text
//! INSERT INTO cart_items (…, quantity, price_at_addition_cents)
//! VALUES (…, :qty, :list_price)
//! ON CONFLICT (cart_id, product_id)
//! DO UPDATE SET quantity = quantity + excluded.quantity
//!               └── price_at_addition_cents is left as first captured
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use showroom_core::cart::{check_add, CartView};
use showroom_core::validation::validate_quantity;
use showroom_core::{Cart, CartItem, CoreError};

use crate::error::{DbError, DbResult};
use crate::repository::product;

const SELECT_CART: &str = "SELECT id, customer_id, created_at, updated_at FROM carts";

async fn find_cart_in(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<Option<Cart>> {
    let cart = sqlx::query_as::<_, Cart>(&format!("{SELECT_CART} WHERE customer_id = ?1"))
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(cart)
}

async fn get_or_create_in(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<Cart> {
    if let Some(cart) = find_cart_in(conn, customer_id).await? {
        return Ok(cart);
    }

    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM customers WHERE id = ?1")
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Err(DbError::not_found("Customer", customer_id));
    }

    let now = Utc::now();
    sqlx::query(
        "INSERT INTO carts (id, customer_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?3) \
         ON CONFLICT(customer_id) DO NOTHING",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(customer_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    debug!(customer_id = %customer_id, "Cart created");

    find_cart_in(conn, customer_id)
        .await?
        .ok_or_else(|| DbError::not_found("Cart", customer_id))
}

async fn items_in(conn: &mut SqliteConnection, cart_id: &str) -> DbResult<Vec<CartItem>> {
    let items = sqlx::query_as::<_, CartItem>(
        r#"
        SELECT
            ci.id,
            ci.cart_id,
            ci.product_id,
            p.name AS product_name,
            ci.quantity,
            ci.price_at_addition_cents,
            p.price_list_cents AS current_list_price_cents,
            ci.added_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = ?1
        ORDER BY ci.added_at, ci.rowid
        "#,
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

async fn touch_in(conn: &mut SqliteConnection, cart_id: &str) -> DbResult<()> {
    sqlx::query("UPDATE carts SET updated_at = ?1 WHERE id = ?2")
        .bind(Utc::now())
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Repository for the per-customer cart.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Returns the customer's cart header, creating it on first use.
    pub async fn get_or_create(&self, customer_id: &str) -> DbResult<Cart> {
        let mut tx = self.pool.begin().await?;
        let cart = get_or_create_in(&mut tx, customer_id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Returns the customer's cart with lines and totals.
    pub async fn view(&self, customer_id: &str) -> DbResult<CartView> {
        let mut tx = self.pool.begin().await?;
        let cart = get_or_create_in(&mut tx, customer_id).await?;
        let items = items_in(&mut tx, &cart.id).await?;
        tx.commit().await?;
        Ok(CartView::new(cart, items))
    }

    /// Adds `quantity` of a product. An existing line grows and keeps its
    /// captured price; a new line captures the current list price.
    pub async fn add_item(&self, customer_id: &str, product_id: &str, quantity: i64) -> DbResult<CartView> {
        validate_quantity(quantity)?;
        let mut tx = self.pool.begin().await?;

        let cart = get_or_create_in(&mut tx, customer_id).await?;
        let product = product::get_in(&mut tx, product_id).await?;
        if !product.is_active {
            return Err(CoreError::conflict(format!("Product {product_id} is not available")).into());
        }

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM cart_items WHERE cart_id = ?1 AND product_id = ?2",
        )
        .bind(&cart.id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;
        let line_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE cart_id = ?1")
            .bind(&cart.id)
            .fetch_one(&mut *tx)
            .await?;

        check_add(existing, line_count as usize, quantity)?;

        sqlx::query(
            r#"
            INSERT INTO cart_items (id, cart_id, product_id, quantity, price_at_addition_cents, added_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = quantity + excluded.quantity
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&cart.id)
        .bind(product_id)
        .bind(quantity)
        .bind(product.price_list_cents)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        touch_in(&mut tx, &cart.id).await?;
        let items = items_in(&mut tx, &cart.id).await?;
        tx.commit().await?;

        info!(customer_id = %customer_id, product_id = %product_id, quantity, "Cart item added");
        Ok(CartView::new(cart, items))
    }

    /// Replaces the quantity of an existing line. The captured price stays.
    pub async fn set_quantity(
        &self,
        customer_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<CartView> {
        validate_quantity(quantity)?;
        let mut tx = self.pool.begin().await?;

        let cart = get_or_create_in(&mut tx, customer_id).await?;
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = ?1 WHERE cart_id = ?2 AND product_id = ?3",
        )
        .bind(quantity)
        .bind(&cart.id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CartItem", product_id));
        }

        touch_in(&mut tx, &cart.id).await?;
        let items = items_in(&mut tx, &cart.id).await?;
        tx.commit().await?;

        debug!(customer_id = %customer_id, product_id = %product_id, quantity, "Cart quantity set");
        Ok(CartView::new(cart, items))
    }

    /// Removes a line.
    pub async fn remove_item(&self, customer_id: &str, product_id: &str) -> DbResult<CartView> {
        let mut tx = self.pool.begin().await?;

        let cart = get_or_create_in(&mut tx, customer_id).await?;
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1 AND product_id = ?2")
            .bind(&cart.id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CartItem", product_id));
        }

        touch_in(&mut tx, &cart.id).await?;
        let items = items_in(&mut tx, &cart.id).await?;
        tx.commit().await?;

        debug!(customer_id = %customer_id, product_id = %product_id, "Cart item removed");
        Ok(CartView::new(cart, items))
    }

    /// Empties the cart.
    pub async fn clear(&self, customer_id: &str) -> DbResult<CartView> {
        let mut tx = self.pool.begin().await?;

        let cart = get_or_create_in(&mut tx, customer_id).await?;
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;
        touch_in(&mut tx, &cart.id).await?;
        tx.commit().await?;

        info!(customer_id = %customer_id, removed = result.rows_affected(), "Cart cleared");
        Ok(CartView::new(cart, Vec::new()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

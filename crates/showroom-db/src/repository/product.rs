//! # Product Repository
//!
//! Catalog accessor. The catalog is managed elsewhere; the engine reads
//! price tiers and stock, and moves stock through the inventory ledger.
//!
//! ## Price Tiers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products row                                                          │
//! │  ├── price_list_cents      catalog price, always set                   │
//! │  ├── price_showroom_cents  optional                                    │
//! │  └── price_fair_cents      optional, preferred for sale lines          │
//! │                                                                         │
//! │  Sale line unit price:  override → fair → list                         │
//! │  Cart line snapshot:    list                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use showroom_core::Product;

use crate::error::{DbError, DbResult};
use crate::repository::inventory;

const SELECT_PRODUCT: &str = r#"
    SELECT
        id, name,
        price_list_cents, price_showroom_cents, price_fair_cents,
        stock, critical_stock, is_active,
        created_at, updated_at
    FROM products
"#;

/// Loads a product on the given connection.
pub async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Product> {
    sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let product = db.products().get_by_id("uuid-here").await?;
/// db.products().apply_stock_delta(&product.id, -2).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists active products by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE is_active = 1 ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a product (seed tool and tests; the catalog owns real data).
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name,
                price_list_cents, price_showroom_cents, price_fair_cents,
                stock, critical_stock, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_list_cents)
        .bind(product.price_showroom_cents)
        .bind(product.price_fair_cents)
        .bind(product.stock)
        .bind(product.critical_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Moves stock by a signed delta: negative debits (and can fail with
    /// `InsufficientStock`), positive credits, zero does nothing.
    pub async fn apply_stock_delta(&self, id: &str, delta: i64) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;

        match delta {
            d if d < 0 => inventory::debit_in(&mut tx, id, -d).await?,
            d if d > 0 => inventory::credit_in(&mut tx, id, d).await?,
            _ => {}
        }
        let product = get_in(&mut tx, id).await?;

        tx.commit().await?;

        info!(id = %id, delta, stock = product.stock, "Stock adjusted");
        Ok(product)
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Builds a product row with the given list price and stock, stamped now.
pub fn new_product(name: &str, price_list_cents: i64, stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        price_list_cents,
        price_showroom_cents: None,
        price_fair_cents: None,
        stock,
        critical_stock: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use showroom_core::CoreError;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut product = new_product("Perfume Ekos", 8990, 4);
        product.price_fair_cents = Some(7990);
        db.products().insert(&product).await.unwrap();

        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Perfume Ekos");
        assert_eq!(loaded.fair_price().map(|m| m.cents()), Some(7990));
        assert!(db.products().get_by_id("missing").await.unwrap().is_none());
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stock_delta() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = new_product("Crema Chronos", 4500, 10);
        db.products().insert(&product).await.unwrap();

        let after = db.products().apply_stock_delta(&product.id, -3).await.unwrap();
        assert_eq!(after.stock, 7);

        let after = db.products().apply_stock_delta(&product.id, 3).await.unwrap();
        assert_eq!(after.stock, 10);
    }

    #[tokio::test]
    async fn test_debit_beyond_stock_changes_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = new_product("Crema Chronos", 4500, 2);
        db.products().insert(&product).await.unwrap();

        let err = db.inventory().debit(&product.id, 3).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            })
        ));
        assert_eq!(db.inventory().stock_of(&product.id).await.unwrap(), 2);
    }
}

//! # Gift Repository
//!
//! Gift catalog: products offered in exchange for points. Redeemable stock
//! only moves through [`crate::repository::inventory::debit_gift_in`] at
//! redemption approval.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use showroom_core::{GiftItem, ValidationError};

use crate::error::{DbError, DbResult};

const SELECT_GIFT: &str = r#"
    SELECT
        id, product_id, name, description,
        points_cost, redeemable_stock, is_active,
        created_at, updated_at
    FROM gift_items
"#;

/// Loads a gift on the given connection.
pub async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<GiftItem> {
    sqlx::query_as::<_, GiftItem>(&format!("{SELECT_GIFT} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("GiftItem", id))
}

/// Repository for gift catalog operations.
#[derive(Debug, Clone)]
pub struct GiftRepository {
    pool: SqlitePool,
}

impl GiftRepository {
    /// Creates a new GiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        GiftRepository { pool }
    }

    /// Gets a gift by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<GiftItem>> {
        let gift = sqlx::query_as::<_, GiftItem>(&format!("{SELECT_GIFT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(gift)
    }

    /// Lists gifts a customer can currently ask for, cheapest first.
    pub async fn list_active(&self) -> DbResult<Vec<GiftItem>> {
        let gifts = sqlx::query_as::<_, GiftItem>(&format!(
            "{SELECT_GIFT} WHERE is_active = 1 AND redeemable_stock > 0 ORDER BY points_cost, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(gifts)
    }

    /// Inserts a gift.
    pub async fn insert(&self, gift: &GiftItem) -> DbResult<()> {
        if gift.points_cost <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "points_cost".to_string(),
            }
            .into());
        }
        debug!(id = %gift.id, name = %gift.name, "Inserting gift");

        sqlx::query(
            r#"
            INSERT INTO gift_items (
                id, product_id, name, description,
                points_cost, redeemable_stock, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&gift.id)
        .bind(&gift.product_id)
        .bind(&gift.name)
        .bind(&gift.description)
        .bind(gift.points_cost)
        .bind(gift.redeemable_stock)
        .bind(gift.is_active)
        .bind(gift.created_at)
        .bind(gift.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sets a gift's redeemable stock (catalog maintenance).
    pub async fn set_redeemable_stock(&self, id: &str, stock: i64) -> DbResult<()> {
        if stock < 0 {
            return Err(ValidationError::OutOfRange {
                field: "redeemable_stock".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let result = sqlx::query(
            "UPDATE gift_items SET redeemable_stock = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(stock)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("GiftItem", id));
        }

        Ok(())
    }
}

/// Builds an active gift row for `product_id`, stamped now.
pub fn new_gift(product_id: &str, name: &str, points_cost: i64, redeemable_stock: i64) -> GiftItem {
    let now = Utc::now();
    GiftItem {
        id: Uuid::new_v4().to_string(),
        product_id: product_id.to_string(),
        name: name.to_string(),
        description: None,
        points_cost,
        redeemable_stock,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::new_product;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_list_active_hides_inactive_and_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = new_product("Neceser", 3500, 5);
        db.products().insert(&product).await.unwrap();

        let available = new_gift(&product.id, "Neceser chico", 50, 2);
        let empty = new_gift(&product.id, "Neceser grande", 80, 0);
        let mut retired = new_gift(&product.id, "Neceser 2023", 30, 4);
        retired.is_active = false;
        for gift in [&available, &empty, &retired] {
            db.gifts().insert(gift).await.unwrap();
        }

        let listed = db.gifts().list_active().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, available.id);

        db.gifts().set_redeemable_stock(&empty.id, 3).await.unwrap();
        assert_eq!(db.gifts().list_active().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_points_cost_must_be_positive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = new_product("Neceser", 3500, 5);
        db.products().insert(&product).await.unwrap();

        let err = db.gifts().insert(&new_gift(&product.id, "Gratis", 0, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }
}

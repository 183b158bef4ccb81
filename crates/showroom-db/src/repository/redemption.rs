//! # Redemption Repository
//!
//! The redemption state machine, persisted.
//!
//! ## Approval Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  approve(id)                                                           │
//! │  BEGIN                                                                 │
//! │  ├── load request        status must be pendiente_aprobacion           │
//! │  ├── load gift + balance                                               │
//! │  ├── check_eligibility(gift, balance, points_charged)                  │
//! │  │     │                                                                │
//! │  │     ├── ✗ → status = rechazado, note = reason  → COMMIT             │
//! │  │     │       caller gets Conflict, no points or stock moved          │
//! │  │     │                                                                │
//! │  │     └── ✓ → points::debit_in(points_charged)                        │
//! │  │             inventory::debit_gift_in(gift)                          │
//! │  │             status = aprobado_por_entregar  (WHERE status = pend.)  │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Status writes carry `WHERE status = <required>`, so two admins acting on
//! the same request cannot both succeed.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use showroom_core::redemption::{check_eligibility, plan_action, product_snapshot, RedemptionAction};
use showroom_core::validation::validate_admin_notes;
use showroom_core::{CoreError, RedemptionRequest, RedemptionStatus};

use crate::error::{DbError, DbResult};
use crate::repository::{gift, inventory, points};

const SELECT_REQUEST: &str = r#"
    SELECT
        id, customer_id, gift_item_id,
        points_charged, product_snapshot,
        status, admin_notes,
        created_at, updated_at
    FROM redemption_requests
"#;

async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<RedemptionRequest> {
    sqlx::query_as::<_, RedemptionRequest>(&format!("{SELECT_REQUEST} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("RedemptionRequest", id))
}

/// Moves request `id` from `from` to `to`, replacing the notes when given.
///
/// Zero rows means someone else moved it first; the error names the state
/// found now.
async fn write_status_in(
    conn: &mut SqliteConnection,
    id: &str,
    from: RedemptionStatus,
    to: RedemptionStatus,
    admin_notes: Option<&str>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE redemption_requests SET
            status = ?1,
            admin_notes = COALESCE(?2, admin_notes),
            updated_at = ?3
        WHERE id = ?4 AND status = ?5
        "#,
    )
    .bind(to)
    .bind(admin_notes)
    .bind(Utc::now())
    .bind(id)
    .bind(from)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let current = get_in(conn, id).await?;
        return Err(CoreError::invalid_transition(
            "RedemptionRequest",
            id,
            current.status.as_str(),
            from.as_str(),
        )
        .into());
    }

    Ok(())
}

/// Repository for redemption requests.
#[derive(Debug, Clone)]
pub struct RedemptionRepository {
    pool: SqlitePool,
}

impl RedemptionRepository {
    /// Creates a new RedemptionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RedemptionRepository { pool }
    }

    /// Files a request for one unit of `gift_item_id`.
    ///
    /// Nothing is debited yet; `points_charged` and the product snapshot
    /// are frozen here.
    ///
    /// ## Errors
    /// - `NotFound`: gift or customer missing
    /// - `Conflict`: gift inactive
    /// - `InsufficientStock`: no redeemable units left
    /// - `InsufficientPoints`: balance below the gift cost
    pub async fn create(&self, customer_id: &str, gift_item_id: &str) -> DbResult<RedemptionRequest> {
        debug!(customer_id = %customer_id, gift_item_id = %gift_item_id, "Creating redemption request");

        let mut tx = self.pool.begin().await?;

        let gift = gift::get_in(&mut tx, gift_item_id).await?;
        let balance = points::balance_in(&mut tx, customer_id).await?;

        check_eligibility(&gift, balance, gift.points_cost)
            .map_err(|reason| DbError::from(reason.into_error(customer_id, &gift)))?;

        let now = Utc::now();
        let request = RedemptionRequest {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            gift_item_id: gift.id.clone(),
            points_charged: gift.points_cost,
            product_snapshot: product_snapshot(&gift),
            status: RedemptionStatus::PendingApproval,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO redemption_requests (
                id, customer_id, gift_item_id,
                points_charged, product_snapshot,
                status, admin_notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&request.id)
        .bind(&request.customer_id)
        .bind(&request.gift_item_id)
        .bind(request.points_charged)
        .bind(&request.product_snapshot)
        .bind(request.status)
        .bind(&request.admin_notes)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            request_id = %request.id,
            customer_id = %customer_id,
            points_charged = request.points_charged,
            "Redemption requested"
        );
        Ok(request)
    }

    /// Approves a pending request: debits points and one gift unit.
    ///
    /// If the customer or gift no longer qualifies, the request is moved to
    /// `rechazado` with a note naming the reason, that change is committed,
    /// and `Conflict` is returned.
    pub async fn approve(&self, id: &str, admin_notes: Option<&str>) -> DbResult<RedemptionRequest> {
        let notes = validate_admin_notes(admin_notes)?;
        let mut tx = self.pool.begin().await?;

        let request = get_in(&mut tx, id).await?;
        let next = plan_action(id, request.status, RedemptionAction::Approve)?;

        let gift = gift::get_in(&mut tx, &request.gift_item_id).await?;
        let balance = points::balance_in(&mut tx, &request.customer_id).await?;

        if let Err(reason) = check_eligibility(&gift, balance, request.points_charged) {
            let note = reason.rejection_note();
            write_status_in(
                &mut tx,
                id,
                request.status,
                RedemptionStatus::Rejected,
                Some(&note),
            )
            .await?;
            tx.commit().await?;

            warn!(request_id = %id, reason = %reason, "Redemption auto-rejected at approval");
            return Err(DbError::conflict(format!(
                "Redemption request {id} was rejected: {reason}"
            )));
        }

        points::debit_in(&mut tx, &request.customer_id, request.points_charged).await?;
        inventory::debit_gift_in(&mut tx, &gift.id).await?;
        write_status_in(&mut tx, id, request.status, next, notes.as_deref()).await?;

        let approved = get_in(&mut tx, id).await?;
        tx.commit().await?;

        info!(
            request_id = %id,
            customer_id = %approved.customer_id,
            points_debited = approved.points_charged,
            "Redemption approved"
        );
        Ok(approved)
    }

    /// Rejects a pending request. No ledger effects.
    pub async fn reject(&self, id: &str, admin_notes: Option<&str>) -> DbResult<RedemptionRequest> {
        self.transition(id, RedemptionAction::Reject, admin_notes, None)
            .await
    }

    /// Marks an approved request as handed over. No ledger effects.
    pub async fn deliver(&self, id: &str, admin_notes: Option<&str>) -> DbResult<RedemptionRequest> {
        self.transition(id, RedemptionAction::Deliver, admin_notes, None)
            .await
    }

    /// Withdraws a pending request on behalf of its owner. Requests owned
    /// by someone else are reported as not found.
    pub async fn cancel_by_client(&self, id: &str, customer_id: &str) -> DbResult<RedemptionRequest> {
        self.transition(id, RedemptionAction::CancelByClient, None, Some(customer_id))
            .await
    }

    async fn transition(
        &self,
        id: &str,
        action: RedemptionAction,
        admin_notes: Option<&str>,
        owner: Option<&str>,
    ) -> DbResult<RedemptionRequest> {
        debug_assert!(!action.debits_ledgers());
        let notes = validate_admin_notes(admin_notes)?;
        let mut tx = self.pool.begin().await?;

        let request = get_in(&mut tx, id).await?;
        if owner.is_some_and(|owner| owner != request.customer_id) {
            return Err(DbError::not_found("RedemptionRequest", id));
        }

        let next = plan_action(id, request.status, action)?;
        write_status_in(&mut tx, id, request.status, next, notes.as_deref()).await?;

        let updated = get_in(&mut tx, id).await?;
        tx.commit().await?;

        info!(
            request_id = %id,
            action = action.as_str(),
            from = %request.status,
            to = %updated.status,
            "Redemption updated"
        );
        Ok(updated)
    }

    /// Gets a request by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<RedemptionRequest>> {
        let request =
            sqlx::query_as::<_, RedemptionRequest>(&format!("{SELECT_REQUEST} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(request)
    }

    /// A customer's own requests, newest first.
    pub async fn list_for_customer(
        &self,
        customer_id: &str,
        limit: u32,
    ) -> DbResult<Vec<RedemptionRequest>> {
        let requests = sqlx::query_as::<_, RedemptionRequest>(&format!(
            "{SELECT_REQUEST} WHERE customer_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        ))
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Admin listing, optionally filtered by status, oldest first so the
    /// approval queue reads in arrival order.
    pub async fn list(
        &self,
        status: Option<RedemptionStatus>,
        limit: u32,
    ) -> DbResult<Vec<RedemptionRequest>> {
        let requests = match status {
            Some(status) => {
                sqlx::query_as::<_, RedemptionRequest>(&format!(
                    "{SELECT_REQUEST} WHERE status = ?1 ORDER BY created_at, rowid LIMIT ?2"
                ))
                .bind(status)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, RedemptionRequest>(&format!(
                    "{SELECT_REQUEST} ORDER BY created_at, rowid LIMIT ?1"
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(requests)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::gift::new_gift;
    use crate::repository::product::new_product;
    use crate::{Database, DbConfig};

    /// Customer with `balance` points and a 50-point gift with `gift_stock` units.
    async fn setup(balance: i64, gift_stock: i64) -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.points().open_account("cust-1", Some("Lucía")).await.unwrap();
        db.points().credit("cust-1", balance).await.unwrap();

        let product = new_product("Neceser", 3500, 10);
        db.products().insert(&product).await.unwrap();
        let gift = new_gift(&product.id, "Neceser Natura", 50, gift_stock);
        db.gifts().insert(&gift).await.unwrap();

        (db, gift.id)
    }

    async fn gift_stock(db: &Database, gift_id: &str) -> i64 {
        db.gifts().get_by_id(gift_id).await.unwrap().unwrap().redeemable_stock
    }

    #[tokio::test]
    async fn test_low_balance_stores_nothing() {
        let (db, gift_id) = setup(40, 3).await;

        let err = db.redemptions().create("cust-1", &gift_id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientPoints { available: 40, required: 50, .. })
        ));
        assert!(db.redemptions().list(None, 10).await.unwrap().is_empty());
        assert_eq!(db.points().balance("cust-1").await.unwrap(), 40);
    }

    #[tokio::test]
    async fn test_create_snapshots_cost_without_debiting() {
        let (db, gift_id) = setup(60, 1).await;

        let request = db.redemptions().create("cust-1", &gift_id).await.unwrap();
        assert_eq!(request.status, RedemptionStatus::PendingApproval);
        assert_eq!(request.points_charged, 50);
        assert!(request.product_snapshot.contains("Neceser Natura"));
        assert_eq!(db.points().balance("cust-1").await.unwrap(), 60);
        assert_eq!(gift_stock(&db, &gift_id).await, 1);
    }

    #[tokio::test]
    async fn test_approve_debits_points_and_gift_stock() {
        let (db, gift_id) = setup(60, 2).await;
        let request = db.redemptions().create("cust-1", &gift_id).await.unwrap();

        let approved = db
            .redemptions()
            .approve(&request.id, Some("retira el sábado"))
            .await
            .unwrap();

        assert_eq!(approved.status, RedemptionStatus::ApprovedForDelivery);
        assert_eq!(approved.admin_notes.as_deref(), Some("retira el sábado"));
        assert_eq!(db.points().balance("cust-1").await.unwrap(), 10);
        assert_eq!(gift_stock(&db, &gift_id).await, 1);

        let delivered = db.redemptions().deliver(&request.id, None).await.unwrap();
        assert_eq!(delivered.status, RedemptionStatus::Delivered);
        assert_eq!(delivered.admin_notes.as_deref(), Some("retira el sábado"));
    }

    #[tokio::test]
    async fn test_approval_auto_rejects_when_stock_is_gone() {
        let (db, gift_id) = setup(60, 1).await;
        let request = db.redemptions().create("cust-1", &gift_id).await.unwrap();

        db.gifts().set_redeemable_stock(&gift_id, 0).await.unwrap();

        let err = db.redemptions().approve(&request.id, None).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Conflict(_))));

        let stored = db.redemptions().get_by_id(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RedemptionStatus::Rejected);
        assert!(stored.admin_notes.unwrap_or_default().contains("stock"));
        assert_eq!(db.points().balance("cust-1").await.unwrap(), 60);
    }

    #[tokio::test]
    async fn test_approval_auto_rejects_when_points_were_spent() {
        let (db, gift_id) = setup(60, 5).await;
        let request = db.redemptions().create("cust-1", &gift_id).await.unwrap();
        db.points().debit("cust-1", 20).await.unwrap();

        let err = db.redemptions().approve(&request.id, None).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Conflict(_))));
        assert_eq!(gift_stock(&db, &gift_id).await, 5);
        assert_eq!(db.points().balance("cust-1").await.unwrap(), 40);
    }

    #[tokio::test]
    async fn test_second_approval_is_invalid_transition() {
        let (db, gift_id) = setup(200, 5).await;
        let request = db.redemptions().create("cust-1", &gift_id).await.unwrap();
        db.redemptions().approve(&request.id, None).await.unwrap();

        let err = db.redemptions().approve(&request.id, None).await.unwrap_err();
        match err {
            DbError::Domain(CoreError::InvalidStateTransition { current, required, .. }) => {
                assert_eq!(current, "aprobado_por_entregar");
                assert_eq!(required, "pendiente_aprobacion");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(db.points().balance("cust-1").await.unwrap(), 150);
    }

    #[tokio::test]
    async fn test_reject_and_client_cancel() {
        let (db, gift_id) = setup(200, 5).await;
        let first = db.redemptions().create("cust-1", &gift_id).await.unwrap();
        let second = db.redemptions().create("cust-1", &gift_id).await.unwrap();

        let rejected = db.redemptions().reject(&first.id, Some("sin stock físico")).await.unwrap();
        assert_eq!(rejected.status, RedemptionStatus::Rejected);
        assert!(db.redemptions().deliver(&first.id, None).await.is_err());

        let err = db.redemptions().cancel_by_client(&second.id, "someone-else").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));

        let cancelled = db.redemptions().cancel_by_client(&second.id, "cust-1").await.unwrap();
        assert_eq!(cancelled.status, RedemptionStatus::CancelledByClient);
        assert_eq!(db.points().balance("cust-1").await.unwrap(), 200);
    }

    #[tokio::test]
    async fn test_listings() {
        let (db, gift_id) = setup(200, 5).await;
        let first = db.redemptions().create("cust-1", &gift_id).await.unwrap();
        let second = db.redemptions().create("cust-1", &gift_id).await.unwrap();
        db.redemptions().reject(&first.id, None).await.unwrap();

        let mine = db.redemptions().list_for_customer("cust-1", 10).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, second.id);

        let pending = db
            .redemptions()
            .list(Some(RedemptionStatus::PendingApproval), 10)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.id);

        assert_eq!(db.redemptions().list(None, 10).await.unwrap().len(), 2);
    }
}

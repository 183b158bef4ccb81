//! Concurrent writers against a file-backed database.
//!
//! The in-memory configuration has a single connection, so these tests use a
//! WAL file with several pooled connections and a short busy timeout. Writers
//! that lose the race must fail cleanly and the ledgers must never go below
//! zero.

use std::time::Duration;

use showroom_core::sale::{NewSale, NewSaleLine};
use showroom_core::{CoreError, RedemptionStatus};
use showroom_db::repository::{gift::new_gift, product::new_product};
use showroom_db::{Database, DbConfig, DbError};
use tempfile::TempDir;

async fn file_db(dir: &TempDir) -> Database {
    let config = DbConfig::new(dir.path().join("showroom.db"))
        .max_connections(8)
        .busy_timeout(Duration::from_millis(100));
    Database::new(config).await.unwrap()
}

fn is_lost_race(err: &DbError) -> bool {
    matches!(
        err,
        DbError::Domain(
            CoreError::Conflict(_)
                | CoreError::InvalidStateTransition { .. }
                | CoreError::InsufficientStock { .. }
                | CoreError::InsufficientPoints { .. }
        )
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn approvals_racing_for_the_last_gift_unit() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir).await;

    let product = new_product("Perfume Essencial", 2000, 10);
    db.products().insert(&product).await.unwrap();
    let gift = new_gift(&product.id, "Neceser", 50, 1);
    db.gifts().insert(&gift).await.unwrap();

    let mut request_ids = Vec::new();
    for n in 0..6 {
        let customer = format!("cliente-{n}");
        db.points().open_account(&customer, None).await.unwrap();
        db.points().credit(&customer, 60).await.unwrap();
        request_ids.push(db.redemptions().create(&customer, &gift.id).await.unwrap().id);
    }

    let handles: Vec<_> = request_ids
        .iter()
        .cloned()
        .map(|id| {
            let db = db.clone();
            tokio::spawn(async move { db.redemptions().approve(&id, None).await })
        })
        .collect();

    let mut approved = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(request) => {
                assert_eq!(request.status, RedemptionStatus::ApprovedForDelivery);
                approved += 1;
            }
            Err(err) => assert!(is_lost_race(&err), "unexpected error: {err}"),
        }
    }

    assert!(approved <= 1);
    let stock = db.gifts().get_by_id(&gift.id).await.unwrap().unwrap().redeemable_stock;
    assert_eq!(stock, 1 - approved);

    let mut debited = 0;
    for n in 0..6 {
        let balance = db.points().balance(&format!("cliente-{n}")).await.unwrap();
        assert!(balance == 60 || balance == 10, "balance {balance}");
        if balance == 10 {
            debited += 1;
        }
    }
    assert_eq!(debited, approved);

    let approved_rows = db
        .redemptions()
        .list(Some(RedemptionStatus::ApprovedForDelivery), 50)
        .await
        .unwrap();
    assert_eq!(approved_rows.len() as i64, approved);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_admins_approving_the_same_request_debit_once() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir).await;

    let product = new_product("Crema Chronos", 4500, 10);
    db.products().insert(&product).await.unwrap();
    let gift = new_gift(&product.id, "Bolso", 50, 5);
    db.gifts().insert(&gift).await.unwrap();
    db.points().open_account("cliente-1", Some("Lucía")).await.unwrap();
    db.points().credit("cliente-1", 500).await.unwrap();
    let request = db.redemptions().create("cliente-1", &gift.id).await.unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let db = db.clone();
            let id = request.id.clone();
            tokio::spawn(async move { db.redemptions().approve(&id, None).await })
        })
        .collect();

    let mut approved = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => approved += 1,
            Err(err) => assert!(is_lost_race(&err), "unexpected error: {err}"),
        }
    }

    assert!(approved <= 1);
    assert_eq!(db.points().balance("cliente-1").await.unwrap(), 500 - 50 * approved);
    let stock = db.gifts().get_by_id(&gift.id).await.unwrap().unwrap().redeemable_stock;
    assert_eq!(stock, 5 - approved);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_never_oversell() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir).await;

    let product = new_product("Kaiak Aventura", 2000, 10);
    db.products().insert(&product).await.unwrap();
    db.points().open_account("cliente-1", None).await.unwrap();

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let db = db.clone();
            let sale = NewSale {
                customer_id: "cliente-1".to_string(),
                items: vec![NewSaleLine {
                    product_id: product.id.clone(),
                    quantity: 3,
                    unit_price_cents: None,
                }],
                discount_amount_cents: 0,
            };
            tokio::spawn(async move { db.sales().create_sale(&sale).await })
        })
        .collect();

    let mut sold = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => sold += 1,
            Err(err) => assert!(is_lost_race(&err), "unexpected error: {err}"),
        }
    }

    assert!(sold <= 3);
    let stock = db.inventory().stock_of(&product.id).await.unwrap();
    assert_eq!(stock, 10 - 3 * sold);
    assert!(stock >= 0);
    assert_eq!(
        db.sales().list_for_customer("cliente-1", 50).await.unwrap().len() as i64,
        sold
    );
}

#[tokio::test]
async fn held_write_lock_surfaces_as_conflict() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir).await;

    let product = new_product("Labial Mate", 1500, 10);
    db.products().insert(&product).await.unwrap();
    let gift = new_gift(&product.id, "Espejo", 20, 3);
    db.gifts().insert(&gift).await.unwrap();
    db.points().open_account("cliente-1", None).await.unwrap();
    db.points().credit("cliente-1", 100).await.unwrap();
    let request = db.redemptions().create("cliente-1", &gift.id).await.unwrap();

    // Another writer takes the database write lock and keeps it
    let mut holder = db.pool().begin().await.unwrap();
    sqlx::query("UPDATE gift_items SET redeemable_stock = redeemable_stock WHERE id = ?1")
        .bind(&gift.id)
        .execute(&mut *holder)
        .await
        .unwrap();

    let err = db.redemptions().approve(&request.id, None).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::Conflict(_))), "got {err}");
    holder.rollback().await.unwrap();

    // Nothing moved while the lock was held
    assert_eq!(db.points().balance("cliente-1").await.unwrap(), 100);
    let pending = db.redemptions().get_by_id(&request.id).await.unwrap().unwrap();
    assert_eq!(pending.status, RedemptionStatus::PendingApproval);

    let approved = db.redemptions().approve(&request.id, None).await.unwrap();
    assert_eq!(approved.status, RedemptionStatus::ApprovedForDelivery);
    assert_eq!(db.points().balance("cliente-1").await.unwrap(), 80);
}

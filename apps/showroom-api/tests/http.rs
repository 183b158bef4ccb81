//! HTTP integration tests.
//!
//! Starts the axum server on an ephemeral port over an in-memory database
//! and exercises it with reqwest.

use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use showroom_api::{router, ApiConfig, AppState, Authenticator};
use showroom_db::repository::{gift::new_gift, product::new_product};
use showroom_db::{Database, DbConfig};

const SECRET: &str = "integration-secret";

struct TestApp {
    base: String,
    db: Database,
    client: Client,
    admin_token: String,
    customer_token: String,
    product_id: String,
    gift_id: String,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = self.client.request(method, self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.unwrap();
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn as_admin(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, path, &self.admin_token, body).await
    }

    async fn as_customer(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, path, &self.customer_token, body).await
    }
}

/// Seeds one customer with `points`, a product (stock 10, S/ 20.00) and a
/// gift (50 pts, 1 unit), then serves the router on 127.0.0.1:0.
async fn start_app(points: i64) -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    db.points().open_account("cliente-1", Some("Lucía")).await.unwrap();
    db.points().open_account("cliente-2", None).await.unwrap();
    db.points().credit("cliente-1", points).await.unwrap();

    let product = new_product("Perfume Essencial", 2000, 10);
    db.products().insert(&product).await.unwrap();
    let gift = new_gift(&product.id, "Neceser", 50, 1);
    db.gifts().insert(&gift).await.unwrap();

    let config = ApiConfig {
        jwt_secret: SECRET.to_string(),
        ..ApiConfig::default()
    };
    let app = router(AppState::new(db.clone(), config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let auth = Authenticator::new(SECRET);
    TestApp {
        base: format!("http://{addr}"),
        db,
        client: Client::new(),
        admin_token: auth.issue("admin-1", true, 3600).unwrap(),
        customer_token: auth.issue("cliente-1", false, 3600).unwrap(),
        product_id: product.id,
        gift_id: gift.id,
    }
}

#[tokio::test]
async fn health_check() {
    let app = start_app(0).await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn auth_is_enforced() {
    let app = start_app(0).await;

    let resp = app.client.get(app.url("/me/points")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.send(Method::GET, "/me/points", "not-a-jwt", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .as_customer(Method::POST, "/sales", Some(json!({ "customer_id": "cliente-1", "items": [] })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn sale_lifecycle() {
    let app = start_app(0).await;

    let (status, sale) = app
        .as_admin(
            Method::POST,
            "/sales",
            Some(json!({
                "customer_id": "cliente-1",
                "items": [{ "product_id": app.product_id, "quantity": 3 }],
                "discount_amount_cents": 500
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sale["status"], "pendiente_preparacion");
    assert_eq!(sale["total_amount_cents"], 5500);
    assert_eq!(sale["items"].as_array().unwrap().len(), 1);
    assert_eq!(app.db.inventory().stock_of(&app.product_id).await.unwrap(), 7);

    let sale_id = sale["id"].as_str().unwrap().to_string();
    let path = format!("/sales/{sale_id}");

    // Bill twice: points are credited once
    for _ in 0..2 {
        let (status, billed) = app
            .as_admin(Method::PUT, &path, Some(json!({ "status": "cobrado" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(billed["status"], "cobrado");
        assert_eq!(billed["points_earned"], 5);
    }

    let (status, account) = app.as_customer(Method::GET, "/me/points", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["available_points"], 5);

    // Billed is terminal
    let (status, body) = app.as_admin(Method::DELETE, &path, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE_TRANSITION");

    let (status, history) = app.as_customer(Method::GET, "/me/sales", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);

    let (status, history) = app
        .as_admin(Method::GET, "/customers/cliente-1/sales?limit=5", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history[0]["id"], sale_id.as_str());
}

#[tokio::test]
async fn cancel_restores_stock() {
    let app = start_app(0).await;

    let (_, sale) = app
        .as_admin(
            Method::POST,
            "/sales",
            Some(json!({
                "customer_id": "cliente-1",
                "items": [{ "product_id": app.product_id, "quantity": 4 }]
            })),
        )
        .await;
    let path = format!("/sales/{}", sale["id"].as_str().unwrap());
    assert_eq!(app.db.inventory().stock_of(&app.product_id).await.unwrap(), 6);

    let (status, cancelled) = app.as_admin(Method::DELETE, &path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelado");
    assert_eq!(app.db.inventory().stock_of(&app.product_id).await.unwrap(), 10);
}

#[tokio::test]
async fn sale_errors_map_to_status_codes() {
    let app = start_app(0).await;

    let (status, body) = app
        .as_admin(
            Method::POST,
            "/sales",
            Some(json!({
                "customer_id": "cliente-1",
                "items": [{ "product_id": app.product_id, "quantity": 11 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    let (status, body) = app
        .as_admin(Method::POST, "/sales", Some(json!({ "customer_id": "cliente-1", "items": [] })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // Line subtotal would not fit in i64 cents
    let (status, body) = app
        .as_admin(
            Method::POST,
            "/sales",
            Some(json!({
                "customer_id": "cliente-1",
                "items": [{
                    "product_id": app.product_id,
                    "quantity": 3,
                    "unit_price_cents": 4611686018427387904_i64
                }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(app.db.inventory().stock_of(&app.product_id).await.unwrap(), 10);

    let (status, body) = app.as_admin(Method::GET, "/sales/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = app
        .as_admin(Method::PUT, "/sales/missing", Some(json!({ "status": "completed" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn redemption_needs_enough_points() {
    let app = start_app(40).await;

    let (status, body) = app
        .as_customer(
            Method::POST,
            "/redemption-requests",
            Some(json!({ "gift_item_id": app.gift_id })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INSUFFICIENT_POINTS");

    let (_, mine) = app.as_customer(Method::GET, "/me/redemption-requests", None).await;
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn redemption_flow() {
    let app = start_app(60).await;

    let (status, gifts) = app.as_customer(Method::GET, "/gift-items", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gifts.as_array().unwrap().len(), 1);

    let (status, request) = app
        .as_customer(
            Method::POST,
            "/redemption-requests",
            Some(json!({ "gift_item_id": app.gift_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pendiente_aprobacion");
    assert_eq!(request["points_charged"], 50);
    let id = request["id"].as_str().unwrap().to_string();

    let (status, pending) = app
        .as_admin(Method::GET, "/admin/redemption-requests?status=pendiente_aprobacion", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, approved) = app
        .as_admin(
            Method::POST,
            &format!("/admin/redemption-requests/{id}/approve"),
            Some(json!({ "admin_notes": "Entregar el sábado" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "aprobado_por_entregar");
    assert_eq!(approved["admin_notes"], "Entregar el sábado");
    assert_eq!(app.db.points().balance("cliente-1").await.unwrap(), 10);

    // Approving twice debits nothing more
    let (status, body) = app
        .as_admin(Method::POST, &format!("/admin/redemption-requests/{id}/approve"), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE_TRANSITION");
    assert_eq!(app.db.points().balance("cliente-1").await.unwrap(), 10);

    let (status, delivered) = app
        .as_admin(Method::POST, &format!("/admin/redemption-requests/{id}/deliver"), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delivered["status"], "entregado");

    // Gift stock is now 0, so the catalog hides it
    let (_, gifts) = app.as_customer(Method::GET, "/gift-items", None).await;
    assert!(gifts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admin_transitions_accept_a_missing_body() {
    let app = start_app(60).await;
    let request_body = json!({ "gift_item_id": app.gift_id });

    let (_, first) = app
        .as_customer(Method::POST, "/redemption-requests", Some(request_body.clone()))
        .await;
    let first_id = first["id"].as_str().unwrap().to_string();
    let (status, rejected) = app
        .as_admin(Method::POST, &format!("/admin/redemption-requests/{first_id}/reject"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "rechazado");
    assert!(rejected["admin_notes"].is_null());

    let (_, second) = app
        .as_customer(Method::POST, "/redemption-requests", Some(request_body))
        .await;
    let second_id = second["id"].as_str().unwrap().to_string();
    let (status, approved) = app
        .as_admin(Method::POST, &format!("/admin/redemption-requests/{second_id}/approve"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "aprobado_por_entregar");
    assert_eq!(app.db.points().balance("cliente-1").await.unwrap(), 10);

    // A body that is present must still be valid JSON
    let resp = app
        .client
        .post(app.url(&format!("/admin/redemption-requests/{second_id}/deliver")))
        .bearer_auth(&app.admin_token)
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (status, delivered) = app
        .as_admin(Method::POST, &format!("/admin/redemption-requests/{second_id}/deliver"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delivered["status"], "entregado");
}

#[tokio::test]
async fn approval_auto_rejects_when_stock_is_gone() {
    let app = start_app(60).await;

    let (_, request) = app
        .as_customer(
            Method::POST,
            "/redemption-requests",
            Some(json!({ "gift_item_id": app.gift_id })),
        )
        .await;
    let id = request["id"].as_str().unwrap().to_string();

    app.db.gifts().set_redeemable_stock(&app.gift_id, 0).await.unwrap();

    let (status, body) = app
        .as_admin(Method::POST, &format!("/admin/redemption-requests/{id}/approve"), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(app.db.points().balance("cliente-1").await.unwrap(), 60);

    let (_, mine) = app.as_customer(Method::GET, "/me/redemption-requests", None).await;
    assert_eq!(mine[0]["status"], "rechazado");
    assert!(mine[0]["admin_notes"].as_str().unwrap().contains("stock"));
}

#[tokio::test]
async fn client_cancel_is_owner_only() {
    let app = start_app(60).await;

    let (_, request) = app
        .as_customer(
            Method::POST,
            "/redemption-requests",
            Some(json!({ "gift_item_id": app.gift_id })),
        )
        .await;
    let path = format!("/me/redemption-requests/{}/cancel", request["id"].as_str().unwrap());

    let other = Authenticator::new(SECRET).issue("cliente-2", false, 3600).unwrap();
    let (status, _) = app.send(Method::POST, &path, &other, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, cancelled) = app.as_customer(Method::POST, &path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelado_por_cliente");

    let (status, body) = app.as_customer(Method::POST, &path, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE_TRANSITION");
}

#[tokio::test]
async fn cart_flow() {
    let app = start_app(0).await;

    let (status, cart) = app.as_customer(Method::GET, "/me/cart", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total_items"], 0);

    let (status, cart) = app
        .as_customer(
            Method::POST,
            "/me/cart/items",
            Some(json!({ "product_id": app.product_id, "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total_items"], 2);
    assert_eq!(cart["total_price_cents"], 4000);

    let item_path = format!("/me/cart/items/{}", app.product_id);
    let (status, cart) = app
        .as_customer(Method::PUT, &item_path, Some(json!({ "quantity": 5 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total_price_cents"], 10000);

    let (status, body) = app
        .as_customer(Method::PUT, &item_path, Some(json!({ "quantity": 0 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, cart) = app.as_customer(Method::DELETE, &item_path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["items"].as_array().unwrap().is_empty());

    let (status, _) = app.as_customer(Method::DELETE, &item_path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.as_customer(
        Method::POST,
        "/me/cart/items",
        Some(json!({ "product_id": app.product_id, "quantity": 1 })),
    )
    .await;
    let (status, cart) = app.as_customer(Method::DELETE, "/me/cart", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total_items"], 0);

    // The cart never reserves stock
    assert_eq!(app.db.inventory().stock_of(&app.product_id).await.unwrap(), 10);
}

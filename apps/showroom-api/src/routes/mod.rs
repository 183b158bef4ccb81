//! Route table.
//!
//! | Method & path | Who |
//! |---|---|
//! | `GET /health` | any |
//! | `POST /sales`, `GET/PUT/DELETE /sales/{id}` | admin |
//! | `GET /customers/{id}/sales` | admin |
//! | `GET /me/sales`, `GET /me/points`, `GET /gift-items` | customer |
//! | `POST /redemption-requests`, `GET /me/redemption-requests` | customer |
//! | `POST /me/redemption-requests/{id}/cancel` | customer |
//! | `GET /admin/redemption-requests?status=` | admin |
//! | `POST /admin/redemption-requests/{id}/{approve,reject,deliver}` | admin |
//! | `/me/cart`, `/me/cart/items[/{product_id}]` | customer |

pub mod cart;
pub mod redemptions;
pub mod sales;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::SharedState;

/// `?limit=` on listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
}

/// Builds the application router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Sales
        .route("/sales", post(sales::create_sale))
        .route(
            "/sales/{id}",
            get(sales::get_sale)
                .put(sales::update_sale)
                .delete(sales::cancel_sale),
        )
        .route("/customers/{id}/sales", get(sales::customer_sales))
        .route("/me/sales", get(sales::my_sales))
        // Points and redemptions
        .route("/me/points", get(redemptions::my_points))
        .route("/gift-items", get(redemptions::list_gifts))
        .route("/redemption-requests", post(redemptions::create_request))
        .route("/me/redemption-requests", get(redemptions::my_requests))
        .route(
            "/me/redemption-requests/{id}/cancel",
            post(redemptions::cancel_request),
        )
        .route("/admin/redemption-requests", get(redemptions::admin_list))
        .route(
            "/admin/redemption-requests/{id}/approve",
            post(redemptions::approve),
        )
        .route(
            "/admin/redemption-requests/{id}/reject",
            post(redemptions::reject),
        )
        .route(
            "/admin/redemption-requests/{id}/deliver",
            post(redemptions::deliver),
        )
        // Cart
        .route("/me/cart", get(cart::view_cart).delete(cart::clear_cart))
        .route("/me/cart/items", post(cart::add_item))
        .route(
            "/me/cart/items/{product_id}",
            put(cart::set_quantity).delete(cart::remove_item),
        )
        .with_state(state)
}

/// `GET /health`
async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
    }
}

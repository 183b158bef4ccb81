//! Cart handlers. Every route acts on the caller's own cart.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use showroom_core::cart::CartView;

use crate::auth::CurrentCustomer;
use crate::error::ApiResult;
use crate::{ApiJson, SharedState};

#[derive(Debug, Deserialize)]
pub struct AddItem {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantity {
    pub quantity: i64,
}

/// `GET /me/cart`
pub async fn view_cart(
    State(state): State<SharedState>,
    caller: CurrentCustomer,
) -> ApiResult<Json<CartView>> {
    Ok(Json(state.db.carts().view(&caller.id).await?))
}

/// `POST /me/cart/items`
pub async fn add_item(
    State(state): State<SharedState>,
    caller: CurrentCustomer,
    ApiJson(body): ApiJson<AddItem>,
) -> ApiResult<Json<CartView>> {
    let view = state
        .db
        .carts()
        .add_item(&caller.id, &body.product_id, body.quantity)
        .await?;
    Ok(Json(view))
}

/// `PUT /me/cart/items/{product_id}`
pub async fn set_quantity(
    State(state): State<SharedState>,
    caller: CurrentCustomer,
    Path(product_id): Path<String>,
    ApiJson(body): ApiJson<SetQuantity>,
) -> ApiResult<Json<CartView>> {
    let view = state
        .db
        .carts()
        .set_quantity(&caller.id, &product_id, body.quantity)
        .await?;
    Ok(Json(view))
}

/// `DELETE /me/cart/items/{product_id}`
pub async fn remove_item(
    State(state): State<SharedState>,
    caller: CurrentCustomer,
    Path(product_id): Path<String>,
) -> ApiResult<Json<CartView>> {
    Ok(Json(
        state.db.carts().remove_item(&caller.id, &product_id).await?,
    ))
}

/// `DELETE /me/cart`
pub async fn clear_cart(
    State(state): State<SharedState>,
    caller: CurrentCustomer,
) -> ApiResult<Json<CartView>> {
    Ok(Json(state.db.carts().clear(&caller.id).await?))
}

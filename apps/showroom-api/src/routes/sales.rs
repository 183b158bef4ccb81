//! Sale handlers. Staff operate sales; customers only read their history.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use showroom_core::sale::{NewSale, SaleDetail, SaleUpdate};
use showroom_core::Sale;
use tracing::info;

use super::PageQuery;
use crate::auth::{AdminUser, CurrentCustomer};
use crate::error::ApiResult;
use crate::{ApiJson, ApiQuery, SharedState};

/// `POST /sales`
pub async fn create_sale(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    ApiJson(body): ApiJson<NewSale>,
) -> ApiResult<(StatusCode, Json<SaleDetail>)> {
    let detail = state.db.sales().create_sale(&body).await?;
    info!(sale_id = %detail.sale.id, by = %admin.id, "Sale created via API");
    Ok((StatusCode::CREATED, Json(detail)))
}

/// `GET /sales/{id}`
pub async fn get_sale(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDetail>> {
    Ok(Json(state.db.sales().get(&id).await?))
}

/// `PUT /sales/{id}`
pub async fn update_sale(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<SaleUpdate>,
) -> ApiResult<Json<SaleDetail>> {
    let detail = state.db.sales().update_sale(&id, &body).await?;
    info!(
        sale_id = %id,
        status = %detail.sale.status.as_str(),
        by = %admin.id,
        "Sale updated via API"
    );
    Ok(Json(detail))
}

/// `DELETE /sales/{id}`
pub async fn cancel_sale(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDetail>> {
    let detail = state.db.sales().cancel_sale(&id).await?;
    info!(sale_id = %id, by = %admin.id, "Sale cancelled via API");
    Ok(Json(detail))
}

/// `GET /customers/{id}/sales`
pub async fn customer_sales(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(customer_id): Path<String>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<Vec<Sale>>> {
    let limit = state.config.page_limit(page.limit);
    Ok(Json(state.db.sales().list_for_customer(&customer_id, limit).await?))
}

/// `GET /me/sales`
pub async fn my_sales(
    State(state): State<SharedState>,
    caller: CurrentCustomer,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<Vec<Sale>>> {
    let limit = state.config.page_limit(page.limit);
    Ok(Json(state.db.sales().list_for_customer(&caller.id, limit).await?))
}

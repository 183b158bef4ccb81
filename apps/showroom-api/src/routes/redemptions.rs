//! Points, gift catalog and redemption request handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use showroom_core::{GiftItem, PointsAccount, RedemptionRequest, RedemptionStatus};
use tracing::info;

use crate::auth::{AdminUser, CurrentCustomer};
use crate::error::ApiResult;
use crate::{ApiJson, ApiJsonOrDefault, ApiQuery, SharedState};

/// Body of `POST /redemption-requests`.
#[derive(Debug, Deserialize)]
pub struct CreateRedemption {
    pub gift_item_id: String,
}

/// Body of the admin transition endpoints. The body itself may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct AdminNotes {
    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// `?status=&limit=` on the admin listing.
#[derive(Debug, Default, Deserialize)]
pub struct AdminListQuery {
    pub status: Option<RedemptionStatus>,
    pub limit: Option<u32>,
}

/// `GET /me/points`
pub async fn my_points(
    State(state): State<SharedState>,
    caller: CurrentCustomer,
) -> ApiResult<Json<PointsAccount>> {
    Ok(Json(state.db.points().account(&caller.id).await?))
}

/// `GET /gift-items`
pub async fn list_gifts(
    State(state): State<SharedState>,
    _caller: CurrentCustomer,
) -> ApiResult<Json<Vec<GiftItem>>> {
    Ok(Json(state.db.gifts().list_active().await?))
}

/// `POST /redemption-requests`
pub async fn create_request(
    State(state): State<SharedState>,
    caller: CurrentCustomer,
    ApiJson(body): ApiJson<CreateRedemption>,
) -> ApiResult<(StatusCode, Json<RedemptionRequest>)> {
    let request = state
        .db
        .redemptions()
        .create(&caller.id, &body.gift_item_id)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// `GET /me/redemption-requests`
pub async fn my_requests(
    State(state): State<SharedState>,
    caller: CurrentCustomer,
    ApiQuery(page): ApiQuery<super::PageQuery>,
) -> ApiResult<Json<Vec<RedemptionRequest>>> {
    let limit = state.config.page_limit(page.limit);
    Ok(Json(
        state.db.redemptions().list_for_customer(&caller.id, limit).await?,
    ))
}

/// `POST /me/redemption-requests/{id}/cancel`
pub async fn cancel_request(
    State(state): State<SharedState>,
    caller: CurrentCustomer,
    Path(id): Path<String>,
) -> ApiResult<Json<RedemptionRequest>> {
    let request = state.db.redemptions().cancel_by_client(&id, &caller.id).await?;
    Ok(Json(request))
}

/// `GET /admin/redemption-requests?status=`
pub async fn admin_list(
    State(state): State<SharedState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<AdminListQuery>,
) -> ApiResult<Json<Vec<RedemptionRequest>>> {
    let limit = state.config.page_limit(query.limit);
    Ok(Json(state.db.redemptions().list(query.status, limit).await?))
}

/// `POST /admin/redemption-requests/{id}/approve`
pub async fn approve(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ApiJsonOrDefault(body): ApiJsonOrDefault<AdminNotes>,
) -> ApiResult<Json<RedemptionRequest>> {
    let request = state
        .db
        .redemptions()
        .approve(&id, body.admin_notes.as_deref())
        .await?;
    info!(request_id = %id, by = %admin.id, "Redemption approved via API");
    Ok(Json(request))
}

/// `POST /admin/redemption-requests/{id}/reject`
pub async fn reject(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ApiJsonOrDefault(body): ApiJsonOrDefault<AdminNotes>,
) -> ApiResult<Json<RedemptionRequest>> {
    let request = state
        .db
        .redemptions()
        .reject(&id, body.admin_notes.as_deref())
        .await?;
    info!(request_id = %id, by = %admin.id, "Redemption rejected via API");
    Ok(Json(request))
}

/// `POST /admin/redemption-requests/{id}/deliver`
pub async fn deliver(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ApiJsonOrDefault(body): ApiJsonOrDefault<AdminNotes>,
) -> ApiResult<Json<RedemptionRequest>> {
    let request = state
        .db
        .redemptions()
        .deliver(&id, body.admin_notes.as_deref())
        .await?;
    info!(request_id = %id, by = %admin.id, "Redemption delivered via API");
    Ok(Json(request))
}

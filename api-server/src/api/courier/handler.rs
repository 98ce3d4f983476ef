//! Courier API Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use serde::Deserialize;

use shared::models::{CourierProfile, CourierProfileUpdate, Order, OrderStatus, VerificationUpdate};
use shared::util::now_millis;
use shared::{ApiResponse, AppError, AppResult, Paginated};

use crate::audit::{AuditAction, AuditRecord, diff_changes};
use crate::auth::CurrentUser;
use crate::core::ServerState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierOrderQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/courier/orders - 指派给当前快递员的订单
pub async fn my_orders(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<CourierOrderQuery>,
) -> AppResult<Json<Paginated<Order>>> {
    let orders = state.orders.list(&current_user, query.status).await?;
    Ok(Json(Paginated::from_items(
        orders,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(20).clamp(1, 100),
    )))
}

/// POST /api/courier/orders/{id}/accept - assigned → in_progress
pub async fn accept(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.orders.accept(&current_user, id).await?;
    tracing::info!(order_id = order.id, courier_id = current_user.id, "order accepted");
    Ok(Json(ApiResponse::ok(order)))
}

/// POST /api/courier/orders/{id}/complete - in_progress → completed
pub async fn complete(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.orders.complete(&current_user, id).await?;
    tracing::info!(order_id = order.id, courier_id = current_user.id, "order completed");
    Ok(Json(ApiResponse::ok(order)))
}

/// GET /api/courier/profile
pub async fn profile(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<CourierProfile>>> {
    let profile = state
        .store
        .courier_profile(current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("courier profile"))?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// PATCH /api/courier/profile - 自助修改接单状态
pub async fn update_profile(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<CourierProfileUpdate>,
) -> AppResult<Json<ApiResponse<CourierProfile>>> {
    let mut profile = state
        .store
        .courier_profile(current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("courier profile"))?;

    if let Some(availability) = payload.availability_status {
        profile.availability_status = availability;
    }
    profile.updated_at = now_millis();
    let profile = state.store.put_courier_profile(&profile).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// PATCH /api/courier/{id}/verification - 资质审核裁决（staff）
pub async fn set_verification(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<VerificationUpdate>,
) -> AppResult<Json<ApiResponse<CourierProfile>>> {
    let mut profile = state
        .store
        .courier_profile(id)
        .await?
        .ok_or_else(|| AppError::not_found("courier profile"))?;

    let before = profile.clone();
    profile.verification_status = payload.verification_status;
    profile.updated_at = now_millis();
    let profile = state.store.put_courier_profile(&profile).await?;

    let changes = diff_changes(&before, &profile);
    if !changes.is_empty() {
        state
            .audit
            .log(
                Some(&current_user),
                AuditRecord::new(AuditAction::CourierVerificationChanged, "courier", id)
                    .with_changes(changes),
            )
            .await;
    }
    tracing::info!(
        courier_id = id,
        operator_id = current_user.id,
        "courier verification updated"
    );
    Ok(Json(ApiResponse::ok(profile)))
}

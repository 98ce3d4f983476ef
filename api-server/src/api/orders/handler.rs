//! Orders API Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use validator::Validate;

use shared::models::{
    AssignRequest, CancelRequest, Order, OrderCreate, OrderEvent, OrderPatch, OrderStatus,
};
use shared::{ApiResponse, AppResult, Paginated};

use crate::auth::CurrentUser;
use crate::core::ServerState;

/// Query filter for order listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// POST /api/orders - 创建订单（client）
pub async fn create(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    payload.validate()?;
    let order = state.orders.create(&current_user, payload).await?;
    tracing::info!(order_id = order.id, client_id = current_user.id, "order created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(order))))
}

/// GET /api/orders - 本人参与的订单；`orders.read_all` 可见全部
pub async fn list(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<Paginated<Order>>> {
    let orders = state.orders.list(&current_user, query.status).await?;
    Ok(Json(Paginated::from_items(
        orders,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(20).clamp(1, 100),
    )))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.orders.get(&current_user, id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// PATCH /api/orders/{id} - 排期字段与表内状态流转
pub async fn patch(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderPatch>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.orders.patch(&current_user, id, payload).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// POST /api/orders/{id}/assign - 指派快递员（须 `orders.assign`）
pub async fn assign(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<AssignRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.orders.assign(&current_user, id, payload).await?;
    tracing::info!(
        order_id = order.id,
        courier_id = ?order.courier_id,
        operator_id = current_user.id,
        "order assigned"
    );
    Ok(Json(ApiResponse::ok(order)))
}

/// POST /api/orders/{id}/cancel - 所有者或 `orders.manage`
pub async fn cancel(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<CancelRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.orders.cancel(&current_user, id, payload).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// GET /api/orders/{id}/events - 订单时间线
pub async fn events(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<OrderEvent>>>> {
    let events = state.orders.timeline(&current_user, id).await?;
    Ok(Json(ApiResponse::ok(events)))
}

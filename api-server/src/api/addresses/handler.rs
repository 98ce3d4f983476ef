//! Addresses API Handlers
//!
//! 全部按所有者裁决：他人的地址一律视同不存在。

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use validator::Validate;

use shared::models::{Address, AddressCreate, AddressUpdate};
use shared::util::{now_millis, snowflake_id};
use shared::{ApiResponse, AppError, AppResult};

use crate::auth::CurrentUser;
use crate::core::ServerState;

async fn owned_address(
    state: &ServerState,
    user_id: i64,
    id: i64,
) -> AppResult<Address> {
    state
        .store
        .address_by_id(id)
        .await?
        .filter(|a| a.user_id == user_id && !a.is_deleted())
        .ok_or_else(|| AppError::not_found("address"))
}

/// POST /api/addresses
pub async fn create(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<AddressCreate>,
) -> AppResult<(StatusCode, Json<ApiResponse<Address>>)> {
    payload.validate()?;
    let address = Address {
        id: snowflake_id(),
        user_id: current_user.id,
        label: payload.label,
        line: payload.line,
        city: payload.city,
        comment: payload.comment,
        created_at: now_millis(),
        deleted_at: None,
    };
    let address = state.store.create_address(address).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(address))))
}

/// GET /api/addresses - 本人未删除的地址
pub async fn list(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<Vec<Address>>>> {
    let addresses = state.store.list_addresses(current_user.id, false).await?;
    Ok(Json(ApiResponse::ok(addresses)))
}

/// PATCH /api/addresses/{id}
pub async fn update(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<AddressUpdate>,
) -> AppResult<Json<ApiResponse<Address>>> {
    let mut address = owned_address(&state, current_user.id, id).await?;
    if let Some(label) = payload.label {
        address.label = Some(label);
    }
    if let Some(line) = payload.line {
        address.line = line;
    }
    if let Some(city) = payload.city {
        address.city = Some(city);
    }
    if let Some(comment) = payload.comment {
        address.comment = Some(comment);
    }
    let address = state.store.update_address(&address).await?;
    Ok(Json(ApiResponse::ok(address)))
}

/// DELETE /api/addresses/{id} - 软删除
pub async fn delete(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let address = owned_address(&state, current_user.id, id).await?;
    state.store.soft_delete_address(address.id, now_millis()).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Users API Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;

use shared::models::{Role, User, UserStatus, UserUpdate};
use shared::util::now_millis;
use shared::{ApiResponse, AppError, AppResult, ErrorCode, Paginated};

use crate::audit::{AuditAction, AuditRecord, diff_changes};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::security_log;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub include_deleted: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub role_id: i64,
}

async fn load_user(state: &ServerState, id: i64) -> AppResult<User> {
    state
        .store
        .user_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))
}

/// GET /api/users
pub async fn list(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<Paginated<User>>> {
    let users = state
        .store
        .list_users(query.include_deleted.unwrap_or(false))
        .await?;
    Ok(Json(Paginated::from_items(
        users,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(20).clamp(1, 100),
    )))
}

/// PATCH /api/users/{id} - 封禁/解封/改邮箱
///
/// 封禁立即吊销目标用户全部会话。
pub async fn update(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<ApiResponse<User>>> {
    let before = load_user(&state, id).await?;
    if before.is_deleted() {
        return Err(AppError::new(ErrorCode::AlreadyDeleted));
    }

    let mut after = before.clone();
    if let Some(status) = payload.status {
        after.status = status;
    }
    if let Some(email) = payload.email {
        after.email = Some(email);
    }
    after.updated_at = now_millis();
    let after = state.store.update_user(&after).await?;

    let status_changed = before.status != after.status;
    if status_changed && after.status == UserStatus::Blocked {
        let revoked = state.sessions.revoke_all(after.id).await?;
        security_log!(
            WARN,
            "users.blocked",
            user_id = after.id,
            operator_id = current_user.id,
            sessions_revoked = revoked
        );
    }

    let changes = diff_changes(&before, &after);
    if !changes.is_empty() {
        let action = match (status_changed, after.status) {
            (true, UserStatus::Blocked) => AuditAction::UserBlocked,
            (true, UserStatus::Active) => AuditAction::UserUnblocked,
            _ => AuditAction::UserUpdated,
        };
        state
            .audit
            .log(
                Some(&current_user),
                AuditRecord::new(action, "user", after.id).with_changes(changes),
            )
            .await;
    }

    Ok(Json(ApiResponse::ok(after)))
}

/// DELETE /api/users/{id} - 软删除（吊销全部会话）
pub async fn delete(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let user = load_user(&state, id).await?;
    if user.is_deleted() {
        return Err(AppError::new(ErrorCode::AlreadyDeleted));
    }

    state.store.soft_delete_user(id, now_millis()).await?;
    state.sessions.revoke_all(id).await?;

    state
        .audit
        .log(
            Some(&current_user),
            AuditRecord::new(AuditAction::UserDeleted, "user", id)
                .with_metadata(json!({"phone": user.phone})),
        )
        .await;
    security_log!(WARN, "users.soft_deleted", user_id = id, operator_id = current_user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/users/{id}/roles - 授予角色
pub async fn assign_role(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<RoleAssignment>,
) -> AppResult<Json<ApiResponse<Vec<Role>>>> {
    let user = load_user(&state, id).await?;
    if user.is_deleted() {
        return Err(AppError::new(ErrorCode::AlreadyDeleted));
    }
    state.store.assign_user_role(user.id, payload.role_id).await?;

    state
        .audit
        .log(
            Some(&current_user),
            AuditRecord::new(AuditAction::UserRoleAssigned, "user", user.id)
                .with_metadata(json!({"roleId": payload.role_id})),
        )
        .await;

    let roles = state.store.user_roles(user.id).await?;
    Ok(Json(ApiResponse::ok(roles)))
}

/// DELETE /api/users/{id}/roles/{role_id} - 回收角色
///
/// 下一次鉴权即生效，无需等待令牌过期。
pub async fn revoke_role(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path((id, role_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    if !state.store.revoke_user_role(id, role_id).await? {
        return Err(AppError::not_found("role assignment"));
    }
    state
        .audit
        .log(
            Some(&current_user),
            AuditRecord::new(AuditAction::UserRoleRevoked, "user", id)
                .with_metadata(json!({"roleId": role_id})),
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}

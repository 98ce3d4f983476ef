//! Auth API Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use shared::models::{CourierProfile, Session, User, UserStatus, UserType};
use shared::util::{now_millis, snowflake_id};
use shared::{ApiResponse, AppError, AppResult, ErrorCode, MessageKey};

use crate::auth::{CurrentUser, TokenPair, password};
use crate::core::ServerState;
use crate::security_log;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
    pub device_id: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// 注册/登录的响应载荷：用户 + 令牌对
fn auth_payload(user: &User, tokens: TokenPair) -> serde_json::Value {
    json!({
        "user": user,
        "tokens": tokens,
    })
}

/// POST /api/auth/register - 注册 client 或 courier 账户
pub async fn register(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<shared::models::RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<serde_json::Value>>)> {
    payload.validate()?;

    let user_type = payload.user_type.unwrap_or(UserType::Client);
    if user_type == UserType::Staff {
        // staff 账户只能由 staff 创建
        return Err(AppError::validation("type", "staff accounts cannot self-register"));
    }

    if state.store.user_by_phone(&payload.phone).await?.is_some() {
        return Err(AppError::new(ErrorCode::PhoneTaken));
    }
    if let Some(email) = &payload.email {
        if state.store.user_by_email(email).await?.is_some() {
            return Err(AppError::new(ErrorCode::EmailTaken));
        }
    }

    let now = now_millis();
    let user = User {
        id: snowflake_id(),
        phone: payload.phone,
        email: payload.email,
        user_type,
        status: UserStatus::Active,
        password_hash: password::hash_password(&payload.password)?,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };
    let user = state.store.create_user(user).await?;

    if user_type == UserType::Courier {
        state
            .store
            .put_courier_profile(&CourierProfile::new(user.id, now))
            .await?;
    }

    let tokens = state
        .sessions
        .issue_for_user(&user, payload.device_id, payload.platform)
        .await?;

    tracing::info!(user_id = user.id, user_type = %user.user_type, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            auth_payload(&user, tokens),
            MessageKey::new("message.auth.registered"),
        )),
    ))
}

/// POST /api/auth/login - 手机号 + 密码
///
/// 错误凭据与不存在的账户返回同一个 `INVALID_CREDENTIALS`。
pub async fn login(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let user = state
        .store
        .user_by_phone(&payload.phone)
        .await?
        .filter(|u| !u.is_deleted());

    let Some(user) = user else {
        security_log!(WARN, "auth.login_unknown_phone", phone = %payload.phone);
        return Err(AppError::invalid_credentials());
    };
    if !password::verify_password(&payload.password, &user.password_hash) {
        security_log!(WARN, "auth.login_bad_password", user_id = user.id);
        return Err(AppError::invalid_credentials());
    }
    if user.is_blocked() {
        security_log!(WARN, "auth.login_blocked", user_id = user.id);
        return Err(AppError::new(ErrorCode::AccountBlocked));
    }

    let tokens = state
        .sessions
        .issue_for_user(&user, payload.device_id, payload.platform)
        .await?;

    tracing::info!(user_id = user.id, "login succeeded");
    Ok(Json(ApiResponse::ok(auth_payload(&user, tokens))))
}

/// POST /api/auth/refresh - 刷新令牌对（单次使用轮换）
pub async fn refresh(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let tokens = state.sessions.refresh(&payload.refresh_token).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

/// POST /api/auth/logout - 登出当前设备（幂等）
pub async fn logout(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.sessions.revoke_by_token(&payload.refresh_token).await?;
    Ok(Json(ApiResponse::message(MessageKey::new(
        "message.auth.logged_out",
    ))))
}

/// POST /api/auth/logout-all - 吊销全部会话
pub async fn logout_all(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let revoked = state.sessions.revoke_all(current_user.id).await?;
    security_log!(INFO, "auth.logout_all", user_id = current_user.id, revoked = revoked);
    Ok(Json(ApiResponse::ok(json!({ "revoked": revoked }))))
}

/// GET /api/auth/sessions - 当前用户的活跃会话
pub async fn list_sessions(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<Vec<Session>>>> {
    let sessions = state.sessions.list_sessions(current_user.id).await?;
    Ok(Json(ApiResponse::ok(sessions)))
}

/// DELETE /api/auth/sessions/{id} - 吊销指定会话
pub async fn revoke_session(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.sessions.revoke_session(current_user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me - 当前用户详情（含角色与有效权限）
pub async fn me(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let user = state
        .store
        .user_by_id(current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    let roles = state.store.user_roles(current_user.id).await?;

    Ok(Json(ApiResponse::ok(json!({
        "user": user,
        "roles": roles,
        "permissions": current_user.permissions,
    }))))
}

//! Auth API Module
//!
//! 公开组（register/login/refresh/logout）挂限流，不经认证中间件；
//! 会话组（me/sessions/logout-all）由外层 `require_auth` 保护。

mod handler;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::{Router, middleware};

use crate::core::ServerState;
use crate::middleware::rate_limit::auth_rate_limit;

/// 无需认证的凭据接口（限流）
pub fn public_router(state: Arc<ServerState>) -> Router<Arc<ServerState>> {
    Router::new()
        .route("/api/auth/register", post(handler::register))
        .route("/api/auth/login", post(handler::login))
        .route("/api/auth/refresh", post(handler::refresh))
        .route("/api/auth/logout", post(handler::logout))
        .layer(middleware::from_fn_with_state(state, auth_rate_limit))
}

/// 已认证用户的会话管理接口
pub fn session_router() -> Router<Arc<ServerState>> {
    Router::new()
        .route("/api/auth/logout-all", post(handler::logout_all))
        .route("/api/auth/sessions", get(handler::list_sessions))
        .route("/api/auth/sessions/{id}", delete(handler::revoke_session))
        .route("/api/auth/me", get(handler::me))
}

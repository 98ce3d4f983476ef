//! 路由装配
//!
//! 中间件链顺序（外→内）：
//! 请求日志 → trace → request-id → CORS/压缩 → 语言协商 → 沙箱守卫 →
//! 认证（仅受保护组）→ 幂等 → 路由级权限 gate → handler。

use std::sync::Arc;

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::api;
use crate::auth::require_auth;
use crate::core::ServerState;
use crate::middleware::{idempotency_layer, log_request, negotiate_language, sandbox_guard};

pub mod router_ext;
pub use router_ext::{OneshotResult, OneshotRouter};

/// Custom request ID generator — 客户端没带 x-request-id 时生成
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// 注册全部路由（认证边界在此划分，通用层在 build_app 统一挂）
pub fn build_router(state: Arc<ServerState>) -> Router<Arc<ServerState>> {
    // 公开组：健康检查 + 凭据接口（自带限流）
    let public = Router::new()
        .merge(api::health::router())
        .merge(api::auth::public_router(state.clone()));

    // 受保护组：require_auth 注入 CurrentUser，幂等层在其内侧
    let protected = Router::new()
        .merge(api::auth::session_router())
        .merge(api::orders::router())
        .merge(api::courier::router())
        .merge(api::addresses::router())
        .merge(api::users::router())
        .merge(api::roles::router())
        .merge(api::audit_logs::router())
        .merge(api::webhooks::router())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            idempotency_layer,
        ))
        .layer(axum_middleware::from_fn_with_state(state, require_auth));

    public.merge(protected)
}

/// Build a fully configured application with all middleware and state
///
/// HTTP 服务与 oneshot 测试共用同一装配。
pub fn build_app(state: Arc<ServerState>) -> Router {
    build_router(state.clone())
        // ========== Application Middleware ==========
        // 沙箱标记 + 写守卫
        .layer(axum_middleware::from_fn(sandbox_guard))
        // 语言协商（Accept-Language → Content-Language）
        .layer(axum_middleware::from_fn(negotiate_language))
        // Request ID - 复用/生成并回传
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        // ========== Tower HTTP Middleware ==========
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Request logging - outermost, executed first
        .layer(axum_middleware::from_fn(log_request))
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        .with_state(state)
}

//! 沙箱中间件
//!
//! `X-Sandbox: true` 的请求打上请求级标记（扩展，不用全局量），
//! 写守卫把沙箱下的变更请求限制在允许路径前缀内，越界一律 403。
//! GET/HEAD/OPTIONS 不受限。

use axum::extract::Request;
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;

use shared::{AppError, ErrorCode};

use crate::security_log;

/// 沙箱允许发生写操作的路径前缀
const SANDBOX_WRITE_ALLOWLIST: &[&str] = &[
    "/api/auth",
    "/api/orders",
    "/api/courier",
    "/api/addresses",
    "/api/bonus",
    "/api/subscriptions",
];

/// 请求级沙箱标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxFlag(pub bool);

/// GET/HEAD/OPTIONS 之外皆视为变更
pub fn is_request_mutating(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn write_allowed(path: &str) -> bool {
    SANDBOX_WRITE_ALLOWLIST
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// 沙箱标记 + 写守卫
pub async fn sandbox_guard(mut req: Request, next: Next) -> Result<Response, AppError> {
    let sandboxed = req
        .headers()
        .get("X-Sandbox")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    req.extensions_mut().insert(SandboxFlag(sandboxed));

    if sandboxed && is_request_mutating(req.method()) && !write_allowed(req.uri().path()) {
        security_log!(
            WARN,
            "sandbox.write_blocked",
            method = %req.method(),
            path = req.uri().path()
        );
        return Err(AppError::new(ErrorCode::SandboxWriteBlocked));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowlist_prefix_match() {
        assert!(write_allowed("/api/orders"));
        assert!(write_allowed("/api/orders/42/assign"));
        assert!(!write_allowed("/api/users/42"));
        assert!(!write_allowed("/api/webhooks"));
    }

    #[test]
    fn test_read_methods_not_mutating() {
        assert!(!is_request_mutating(&Method::GET));
        assert!(!is_request_mutating(&Method::HEAD));
        assert!(!is_request_mutating(&Method::OPTIONS));
        assert!(is_request_mutating(&Method::POST));
        assert!(is_request_mutating(&Method::PATCH));
        assert!(is_request_mutating(&Method::DELETE));
    }
}

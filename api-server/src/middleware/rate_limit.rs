//! 认证接口限流
//!
//! 固定窗口计数，按 `(客户端标识, 路径)` 维度。只挂在 /api/auth 的
//! 凭据接口上，阻断口令爆破；超限返回 429。
//! 客户端标识优先取 `X-Forwarded-For` 首跳，退化为连接地址。

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;

use shared::util::now_millis;
use shared::{AppError, ErrorCode};

use crate::core::ServerState;
use crate::security_log;

/// Fixed-window request counter
pub struct RateLimiter {
    windows: DashMap<(String, String), Window>,
    limit: u32,
    window_ms: i64,
}

struct Window {
    started_at: i64,
    count: u32,
}

impl RateLimiter {
    pub fn new(limit: u32, window_ms: i64) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window_ms,
        }
    }

    /// 记一次请求；超限返回 false
    pub fn check(&self, client: &str, path: &str) -> bool {
        let now = now_millis();
        let mut window = self
            .windows
            .entry((client.to_string(), path.to_string()))
            .or_insert(Window {
                started_at: now,
                count: 0,
            });
        if now - window.started_at >= self.window_ms {
            window.started_at = now;
            window.count = 0;
        }
        window.count += 1;
        window.count <= self.limit
    }

    /// 丢弃已滚动过去的窗口（维护循环周期调用）
    pub fn purge_expired(&self) {
        let now = now_millis();
        self.windows
            .retain(|_, w| now - w.started_at < self.window_ms);
    }

    /// 当前在追踪的窗口数
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// 认证路由限流中间件
pub async fn auth_rate_limit(
    State(state): State<Arc<ServerState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string());

    let path = req.uri().path().to_string();
    if !state.rate_limiter.check(&client, &path) {
        security_log!(WARN, "auth.rate_limited", client = %client, path = %path);
        return Err(AppError::new(ErrorCode::RateLimited));
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_enforced_within_window() {
        let limiter = RateLimiter::new(3, 60_000);
        for _ in 0..3 {
            assert!(limiter.check("1.2.3.4", "/api/auth/login"));
        }
        assert!(!limiter.check("1.2.3.4", "/api/auth/login"));
    }

    #[test]
    fn test_clients_counted_separately() {
        let limiter = RateLimiter::new(1, 60_000);
        assert!(limiter.check("1.2.3.4", "/api/auth/login"));
        assert!(limiter.check("5.6.7.8", "/api/auth/login"));
        assert!(!limiter.check("1.2.3.4", "/api/auth/login"));
    }

    #[test]
    fn test_window_rolls_over() {
        let limiter = RateLimiter::new(1, 0);
        assert!(limiter.check("1.2.3.4", "/api/auth/login"));
        // 零长窗口：下一次即新窗口
        assert!(limiter.check("1.2.3.4", "/api/auth/login"));
    }
}

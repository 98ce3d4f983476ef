//! 请求日志中间件
//!
//! 每个请求一条结构化日志：方法、路径、状态码、耗时、请求 ID。
//! 4xx 记 warn、5xx 记 error，便于按级别聚合。

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Request-level structured logging
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let started = Instant::now();
    let response = next.run(req).await;
    let elapsed_ms = started.elapsed().as_millis();
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        tracing::error!(%method, %path, status, elapsed_ms, request_id, "request failed");
    } else if response.status().is_client_error() {
        tracing::warn!(%method, %path, status, elapsed_ms, request_id, "request rejected");
    } else {
        tracing::info!(%method, %path, status, elapsed_ms, request_id, "request completed");
    }
    response
}

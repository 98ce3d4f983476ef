//! Router extension for oneshot calls
//!
//! 不经网络栈直接驱动完整中间件链，集成测试的唯一入口。

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::body::Body;
use http::{Request, Response};
use tower::Service;

use crate::core::ServerState;
use crate::routes::build_app;

/// Result type for oneshot API calls
pub type OneshotResult = Result<Response<Body>>;

/// Extension trait for ServerState to support oneshot calls
///
/// # Example
///
/// ```ignore
/// let state = ServerState::initialize(&config).await?;
/// let response = state
///     .oneshot(Request::builder().uri("/api/health").body(Body::empty())?)
///     .await?;
/// ```
#[async_trait::async_trait]
pub trait OneshotRouter {
    /// Process a request through the fully assembled app
    async fn oneshot(self: &Arc<Self>, request: Request<Body>) -> OneshotResult;
}

#[async_trait::async_trait]
impl OneshotRouter for ServerState {
    async fn oneshot(self: &Arc<Self>, request: Request<Body>) -> OneshotResult {
        let mut app: Router = build_app(self.clone());
        let response = app.call(request).await?;
        Ok(response)
    }
}

//! HTTP 服务器启动与优雅关停

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use shared::{AppError, AppResult};

use super::config::Config;
use super::state::ServerState;
use crate::routes::build_app;

/// 幂等缓存 / 限流窗口的清理周期
const MAINTENANCE_PERIOD: Duration = Duration::from_secs(60);

/// HTTP server bootstrap
pub struct Server {
    config: Config,
    state: Arc<ServerState>,
}

impl Server {
    pub fn with_state(config: Config, state: Arc<ServerState>) -> Self {
        Self { config, state }
    }

    /// 绑定端口并服务到 ctrl-c
    pub async fn run(self) -> AppResult<()> {
        let maintenance = self.state.start_maintenance(MAINTENANCE_PERIOD);
        let app = build_app(self.state.clone());
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("bind {addr} failed: {e}")))?;
        tracing::info!(
            environment = %self.config.environment,
            "API server listening on {}",
            addr
        );

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("server error: {e}")))?;

        maintenance.abort();
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("shutdown signal listener failed: {}", e);
        return;
    }
    tracing::info!("shutdown signal received");
}

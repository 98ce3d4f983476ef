//! Audit Logs API Module — 只读，挂 `audit.read`

mod handler;

use std::sync::Arc;

use axum::routing::get;
use axum::{Router, middleware};

use crate::auth::require_permissions;
use crate::core::ServerState;

pub fn router() -> Router<Arc<ServerState>> {
    Router::new()
        .route("/api/audit-logs", get(handler::list))
        .route("/api/audit-logs/verify", get(handler::verify))
        .route_layer(middleware::from_fn(require_permissions(&["audit.read"])))
}

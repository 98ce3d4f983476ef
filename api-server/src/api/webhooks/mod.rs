//! Webhooks API Module — 订阅管理，挂 `webhooks.manage`

mod handler;

use std::sync::Arc;

use axum::routing::get;
use axum::{Router, middleware};

use crate::auth::require_permissions;
use crate::core::ServerState;

pub fn router() -> Router<Arc<ServerState>> {
    Router::new()
        .route("/api/webhooks", get(handler::list).post(handler::create))
        .route(
            "/api/webhooks/{id}",
            axum::routing::patch(handler::update).delete(handler::delete),
        )
        .route("/api/webhooks/{id}/deliveries", get(handler::deliveries))
        .route_layer(middleware::from_fn(require_permissions(&["webhooks.manage"])))
}

//! Orders API Module
//!
//! 创建/查看/取消按参与者规则在服务层裁决；指派单独挂
//! `orders.assign` route_layer。

mod handler;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Router, middleware};

use crate::auth::require_permissions;
use crate::core::ServerState;

pub fn router() -> Router<Arc<ServerState>> {
    let participant_routes = Router::new()
        .route("/api/orders", post(handler::create).get(handler::list))
        .route(
            "/api/orders/{id}",
            get(handler::get_by_id).patch(handler::patch),
        )
        .route("/api/orders/{id}/cancel", post(handler::cancel))
        .route("/api/orders/{id}/events", get(handler::events));

    let dispatch_routes = Router::new()
        .route("/api/orders/{id}/assign", post(handler::assign))
        .route_layer(middleware::from_fn(require_permissions(&["orders.assign"])));

    participant_routes.merge(dispatch_routes)
}

//! Roles API Module
//!
//! 权限目录读取与角色 CRUD，整组挂 `roles.manage`。

mod handler;

use std::sync::Arc;

use axum::routing::get;
use axum::{Router, middleware};

use crate::auth::require_permissions;
use crate::core::ServerState;

pub fn router() -> Router<Arc<ServerState>> {
    Router::new()
        .route("/api/roles", get(handler::list).post(handler::create))
        .route(
            "/api/roles/{id}",
            axum::routing::patch(handler::update).delete(handler::delete),
        )
        .route("/api/permissions", get(handler::all_permissions))
        .route_layer(middleware::from_fn(require_permissions(&["roles.manage"])))
}

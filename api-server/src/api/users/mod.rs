//! Users API Module — staff 用户管理
//!
//! 账户状态/软删走 `users.manage`；用户-角色授权边走 `roles.manage`。

mod handler;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::{Router, middleware};

use crate::auth::require_permissions;
use crate::core::ServerState;

pub fn router() -> Router<Arc<ServerState>> {
    let account_routes = Router::new()
        .route("/api/users", get(handler::list))
        .route(
            "/api/users/{id}",
            axum::routing::patch(handler::update).delete(handler::delete),
        )
        .route_layer(middleware::from_fn(require_permissions(&["users.manage"])));

    let role_edge_routes = Router::new()
        .route("/api/users/{id}/roles", post(handler::assign_role))
        .route(
            "/api/users/{id}/roles/{role_id}",
            delete(handler::revoke_role),
        )
        .route_layer(middleware::from_fn(require_permissions(&["roles.manage"])));

    account_routes.merge(role_edge_routes)
}

//! Courier API Module — 快递员专属路由 + staff 资质审核

mod handler;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::{Router, middleware};

use crate::auth::{require_permissions, require_user_type};
use crate::core::ServerState;
use shared::models::UserType;

pub fn router() -> Router<Arc<ServerState>> {
    let courier_routes = Router::new()
        .route("/api/courier/orders", get(handler::my_orders))
        .route("/api/courier/orders/{id}/accept", post(handler::accept))
        .route("/api/courier/orders/{id}/complete", post(handler::complete))
        .route("/api/courier/profile", patch(handler::update_profile).get(handler::profile))
        .route_layer(middleware::from_fn(require_user_type(&[UserType::Courier])));

    // 审核端点由权限而非身份类型把关
    let verification_routes = Router::new()
        .route("/api/courier/{id}/verification", patch(handler::set_verification))
        .route_layer(middleware::from_fn(require_permissions(&["couriers.verify"])));

    courier_routes.merge(verification_routes)
}

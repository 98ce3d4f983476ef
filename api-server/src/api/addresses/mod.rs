//! Addresses API Module — client 自有取件地址

mod handler;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch};

use crate::core::ServerState;

pub fn router() -> Router<Arc<ServerState>> {
    Router::new()
        .route("/api/addresses", get(handler::list).post(handler::create))
        .route(
            "/api/addresses/{id}",
            patch(handler::update).delete(handler::delete),
        )
}

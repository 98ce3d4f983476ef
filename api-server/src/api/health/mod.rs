//! Health API Module

mod handler;

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<Arc<ServerState>> {
    Router::new().route("/api/health", get(handler::health))
}

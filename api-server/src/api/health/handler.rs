//! Health API Handlers

use axum::Json;
use serde_json::json;

use shared::ApiResponse;
use shared::util::now_millis;

/// GET /api/health - 存活探针（无需认证）
pub async fn health() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::ok(json!({
        "service": "haul-api",
        "time": now_millis(),
    })))
}

//! Webhooks API Handlers
//!
//! `secret` 只写不读：创建后任何响应都不再携带。

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use serde_json::json;
use validator::Validate;

use shared::models::{Webhook, WebhookCreate, WebhookDelivery, WebhookUpdate};
use shared::util::{now_millis, snowflake_id};
use shared::{ApiResponse, AppError, AppResult};

use crate::audit::{AuditAction, AuditRecord, snapshot_changes};
use crate::auth::CurrentUser;
use crate::core::ServerState;

async fn load_webhook(state: &ServerState, id: i64) -> AppResult<Webhook> {
    state
        .store
        .webhook_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("webhook"))
}

/// GET /api/webhooks
pub async fn list(
    State(state): State<Arc<ServerState>>,
) -> AppResult<Json<ApiResponse<Vec<Webhook>>>> {
    Ok(Json(ApiResponse::ok(state.store.list_webhooks().await?)))
}

/// POST /api/webhooks
pub async fn create(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<WebhookCreate>,
) -> AppResult<(StatusCode, Json<ApiResponse<Webhook>>)> {
    payload.validate()?;

    let webhook = Webhook {
        id: snowflake_id(),
        url: payload.url,
        secret: payload.secret,
        events: payload.events,
        is_active: true,
        created_at: now_millis(),
    };
    let webhook = state.store.create_webhook(webhook).await?;

    state
        .audit
        .log(
            Some(&current_user),
            // 快照式 diff：secret 不序列化，永不入审计
            AuditRecord::new(AuditAction::WebhookCreated, "webhook", webhook.id)
                .with_changes(snapshot_changes(&webhook)),
        )
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(webhook))))
}

/// PATCH /api/webhooks/{id}
pub async fn update(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<WebhookUpdate>,
) -> AppResult<Json<ApiResponse<Webhook>>> {
    let mut webhook = load_webhook(&state, id).await?;
    if let Some(url) = payload.url {
        webhook.url = url;
    }
    if let Some(events) = payload.events {
        webhook.events = events;
    }
    if let Some(is_active) = payload.is_active {
        webhook.is_active = is_active;
    }
    let webhook = state.store.update_webhook(&webhook).await?;

    state
        .audit
        .log(
            Some(&current_user),
            AuditRecord::new(AuditAction::WebhookUpdated, "webhook", webhook.id)
                .with_metadata(json!({"url": webhook.url, "isActive": webhook.is_active})),
        )
        .await;
    Ok(Json(ApiResponse::ok(webhook)))
}

/// DELETE /api/webhooks/{id}
pub async fn delete(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let webhook = load_webhook(&state, id).await?;
    state.store.delete_webhook(id).await?;

    state
        .audit
        .log(
            Some(&current_user),
            AuditRecord::new(AuditAction::WebhookDeleted, "webhook", id)
                .with_metadata(json!({"url": webhook.url})),
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/webhooks/{id}/deliveries - 投递记录
pub async fn deliveries(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<WebhookDelivery>>>> {
    load_webhook(&state, id).await?;
    let deliveries = state.store.webhook_deliveries(id).await?;
    Ok(Json(ApiResponse::ok(deliveries)))
}

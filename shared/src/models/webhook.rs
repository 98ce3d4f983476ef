//! Webhook subscription and delivery models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Outbound webhook subscription
///
/// `secret` 用于 HMAC-SHA256 签名，创建后不再返回给客户端。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: i64,
    pub url: String,
    /// Per-subscription HMAC key — write-only
    #[serde(skip_serializing, default)]
    pub secret: String,
    /// Subscribed event types, e.g. ["order.created", "order.completed"]
    pub events: Vec<String>,
    pub is_active: bool,
    pub created_at: i64,
}

impl Webhook {
    pub fn subscribes_to(&self, event_type: &str) -> bool {
        self.is_active && self.events.iter().any(|e| e == event_type)
    }
}

/// Create webhook payload
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WebhookCreate {
    #[validate(url)]
    pub url: String,
    #[validate(length(min = 16, max = 128))]
    pub secret: String,
    #[validate(length(min = 1))]
    pub events: Vec<String>,
}

/// Update webhook payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookUpdate {
    pub url: Option<String>,
    pub events: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Delivery attempt record — persisted regardless of outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookDelivery {
    pub id: i64,
    pub webhook_id: i64,
    /// Domain event id (uuid) — matches the X-Event-Id header
    pub event_id: String,
    pub event_type: String,
    /// Final HTTP status, None if the request never completed
    pub status_code: Option<u16>,
    /// First bytes of the subscriber's response body
    pub response_snippet: Option<String>,
    pub attempts: u32,
    pub success: bool,
    pub created_at: i64,
}

//! Webhook 投递器
//!
//! ```text
//! 订单服务 → emit() → mpsc → worker → 匹配订阅 → POST (签名) → 投递记录
//! ```
//!
//! 每个事件对每个匹配订阅最多尝试 `max_attempts` 次，线性退避
//! （第 n 次重试前等待 n * backoff）。2xx 即成功；其余状态码与网络
//! 错误重试。无论成败都写一条投递记录。

use std::sync::Arc;
use std::time::Duration;

use ring::hmac;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use shared::models::{Webhook, WebhookDelivery};
use shared::util::{now_millis, snowflake_id};

use crate::core::Config;
use crate::store::Store;

/// 出站领域事件
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    /// 事件唯一 ID — 订阅方据此去重
    pub id: String,
    /// 事件类型，如 "order.assigned"
    pub event: String,
    /// Unix 毫秒
    pub timestamp: i64,
    pub data: Value,
}

impl DomainEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event: event.into(),
            timestamp: now_millis(),
            data,
        }
    }
}

/// hex(HMAC-SHA256(secret, raw_body)) — `X-Webhook-Signature` 的值
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hex::encode(hmac::sign(&key, body).as_ref())
}

/// Webhook dispatcher — 请求路径只做入队
#[derive(Clone)]
pub struct WebhookDispatcher {
    tx: mpsc::UnboundedSender<DomainEvent>,
}

impl WebhookDispatcher {
    /// 创建投递器并启动后台 worker
    pub fn start(store: Arc<dyn Store>, config: &Config) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = DeliveryWorker {
            store,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.webhook_timeout_secs))
                .build()
                .unwrap_or_default(),
            max_attempts: config.webhook_max_attempts,
            backoff: Duration::from_millis(config.webhook_backoff_ms),
        };
        tokio::spawn(worker.run(rx));
        Self { tx }
    }

    /// 发布事件 — 永不失败、永不阻塞
    pub fn emit(&self, event: DomainEvent) {
        if self.tx.send(event).is_err() {
            // worker 已退出（仅发生在关停期间）
            tracing::warn!("webhook worker unavailable, event dropped");
        }
    }
}

/// 第 n 次重试前的等待：n * backoff
fn retry_delay(backoff: Duration, attempt: u32) -> Duration {
    backoff * attempt
}

struct DeliveryWorker {
    store: Arc<dyn Store>,
    client: reqwest::Client,
    max_attempts: u32,
    backoff: Duration,
}

impl DeliveryWorker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<DomainEvent>) {
        tracing::info!("webhook delivery worker started");
        while let Some(event) = rx.recv().await {
            let subscriptions = match self.store.list_webhooks().await {
                Ok(hooks) => hooks,
                Err(e) => {
                    tracing::error!("webhook subscription load failed: {}", e);
                    continue;
                }
            };
            for hook in subscriptions
                .into_iter()
                .filter(|h| h.subscribes_to(&event.event))
            {
                self.deliver(&hook, &event).await;
            }
        }
        tracing::info!("webhook delivery worker stopped");
    }

    async fn deliver(&self, hook: &Webhook, event: &DomainEvent) {
        let body = match serde_json::to_vec(event) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("webhook payload serialization failed: {}", e);
                return;
            }
        };
        let signature = sign_payload(&hook.secret, &body);

        let mut status_code: Option<u16> = None;
        let mut snippet: Option<String> = None;
        let mut success = false;
        let mut attempts = 0u32;

        for attempt in 1..=self.max_attempts {
            attempts = attempt;
            let result = self
                .client
                .post(&hook.url)
                .header("Content-Type", "application/json")
                .header("X-Webhook-Signature", &signature)
                .header("X-Event-Id", &event.id)
                .header("X-Event-Type", &event.event)
                .body(body.clone())
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    status_code = Some(status.as_u16());
                    snippet = response
                        .text()
                        .await
                        .ok()
                        .map(|t| t.chars().take(256).collect());
                    if status.is_success() {
                        success = true;
                        break;
                    }
                    tracing::warn!(
                        webhook_id = hook.id,
                        event = %event.event,
                        status = status.as_u16(),
                        attempt,
                        "webhook delivery rejected"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        webhook_id = hook.id,
                        event = %event.event,
                        attempt,
                        "webhook delivery failed: {}",
                        e
                    );
                }
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(retry_delay(self.backoff, attempt)).await;
            }
        }

        let delivery = WebhookDelivery {
            id: snowflake_id(),
            webhook_id: hook.id,
            event_id: event.id.clone(),
            event_type: event.event.clone(),
            status_code,
            response_snippet: snippet,
            attempts,
            success,
            created_at: now_millis(),
        };
        if let Err(e) = self.store.record_delivery(delivery).await {
            tracing::error!("webhook delivery record failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signature_is_deterministic_per_secret() {
        let body = br#"{"event":"order.created"}"#;
        let a = sign_payload("secret-one-0123456789abcdef", body);
        let b = sign_payload("secret-one-0123456789abcdef", body);
        let c = sign_payload("secret-two-0123456789abcdef", body);
        assert_eq!(a, b);
        assert_ne!(a, c);
        // hex(SHA256) 长度
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_retry_backoff_is_linear() {
        let step = Duration::from_millis(2000);
        assert_eq!(retry_delay(step, 1), Duration::from_millis(2000));
        assert_eq!(retry_delay(step, 2), Duration::from_millis(4000));
        assert_eq!(retry_delay(step, 3), Duration::from_millis(6000));
    }

    #[test]
    fn test_event_envelope_shape() {
        let event = DomainEvent::new("order.completed", json!({"orderId": 1}));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "order.completed");
        assert!(value["id"].as_str().unwrap().len() >= 32);
        assert!(value["timestamp"].as_i64().unwrap() > 0);
        assert_eq!(value["data"]["orderId"], 1);
    }
}

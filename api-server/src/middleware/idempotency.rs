//! 幂等中间件
//!
//! 变更请求携带 `Idempotency-Key` 时，以 `(user_id, method+path, key)`
//! 为缓存键。首次执行把状态码与响应体存入缓存（24h TTL），
//! 重复请求原样重放，不再触达处理器。
//!
//! 并发首次调用通过 in-flight 标记去重：后到者挂在 `Notify` 上等待
//! 先行者完成，随后重放其结果 — 变更至多执行一次。

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode, header::CONTENT_TYPE};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Notify;

use shared::util::now_millis;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::middleware::sandbox;

/// (user_id, "METHOD /path", idempotency key)
type CacheKey = (i64, String, String);

/// 已完成请求的可重放快照
#[derive(Debug, Clone)]
pub struct StoredResponse {
    pub status: u16,
    pub body: Bytes,
    pub stored_at: i64,
}

enum CacheSlot {
    /// 首次调用执行中；后到者在此等待
    InFlight(Arc<Notify>),
    Done(StoredResponse),
}

/// `begin` 的裁决结果
pub enum BeginOutcome {
    /// 本请求是首次调用，执行变更
    Execute,
    /// 命中缓存，原样重放
    Replay(StoredResponse),
    /// 首次调用尚在执行，等待后重试
    Wait(Arc<Notify>),
}

/// Idempotency response cache
pub struct IdempotencyCache {
    entries: DashMap<CacheKey, CacheSlot>,
    ttl_ms: i64,
}

impl IdempotencyCache {
    pub fn new(ttl_ms: i64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_ms,
        }
    }

    fn is_fresh(&self, stored: &StoredResponse) -> bool {
        now_millis() - stored.stored_at < self.ttl_ms
    }

    /// 认领缓存键；Execute 的调用方必须以 `complete` 或 `abort` 收尾
    pub fn begin(&self, key: CacheKey) -> BeginOutcome {
        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(CacheSlot::InFlight(Arc::new(Notify::new())));
                BeginOutcome::Execute
            }
            Entry::Occupied(mut slot) => match slot.get() {
                CacheSlot::Done(stored) if self.is_fresh(stored) => {
                    BeginOutcome::Replay(stored.clone())
                }
                CacheSlot::Done(_) => {
                    // TTL 过期：本请求成为新的首次调用
                    slot.insert(CacheSlot::InFlight(Arc::new(Notify::new())));
                    BeginOutcome::Execute
                }
                CacheSlot::InFlight(notify) => BeginOutcome::Wait(notify.clone()),
            },
        }
    }

    /// 首次调用完成：写入快照并唤醒等待者
    pub fn complete(&self, key: &CacheKey, stored: StoredResponse) {
        if let Some(mut slot) = self.entries.get_mut(key) {
            let notify = match &*slot {
                CacheSlot::InFlight(n) => Some(n.clone()),
                CacheSlot::Done(_) => None,
            };
            *slot = CacheSlot::Done(stored);
            drop(slot);
            if let Some(notify) = notify {
                notify.notify_waiters();
            }
        }
    }

    /// 首次调用以 5xx 失败：移除标记，放行重试
    pub fn abort(&self, key: &CacheKey) {
        if let Some((_, CacheSlot::InFlight(notify))) = self.entries.remove(key) {
            notify.notify_waiters();
        }
    }

    /// 清理过期条目（维护循环周期调用）
    pub fn purge_expired(&self) {
        self.entries.retain(|_, slot| match slot {
            CacheSlot::InFlight(_) => true,
            CacheSlot::Done(stored) => self.is_fresh(stored),
        });
    }

    /// 当前缓存条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 幂等中间件 — 置于认证之后（需要 CurrentUser）
pub async fn idempotency_layer(
    State(state): State<Arc<ServerState>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(key_header) = req
        .headers()
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
    else {
        return next.run(req).await;
    };
    if !sandbox::is_request_mutating(req.method()) {
        return next.run(req).await;
    }
    let Some(user) = req.extensions().get::<CurrentUser>() else {
        // 未认证路径（如 /api/auth/*）不做幂等缓存
        return next.run(req).await;
    };

    let key: CacheKey = (
        user.id,
        format!("{} {}", req.method(), req.uri().path()),
        key_header,
    );

    loop {
        match state.idempotency.begin(key.clone()) {
            BeginOutcome::Execute => {
                let response = next.run(req).await;
                return buffer_and_store(&state, &key, response).await;
            }
            BeginOutcome::Replay(stored) => return replay(stored),
            BeginOutcome::Wait(notify) => {
                let notified = notify.notified();
                // future 建立后重查，避免错过完成通知
                if let BeginOutcome::Replay(stored) = state.idempotency.begin(key.clone()) {
                    return replay(stored);
                }
                notified.await;
            }
        }
    }
}

async fn buffer_and_store(state: &ServerState, key: &CacheKey, response: Response) -> Response {
    let status = response.status();
    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("idempotency buffering failed: {}", e);
            state.idempotency.abort(key);
            return Response::from_parts(parts, Body::empty());
        }
    };

    if status.is_server_error() {
        // 5xx 不缓存：允许客户端用同一个 key 重试
        state.idempotency.abort(key);
    } else {
        state.idempotency.complete(
            key,
            StoredResponse {
                status: status.as_u16(),
                body: bytes.clone(),
                stored_at: now_millis(),
            },
        );
    }
    Response::from_parts(parts, Body::from(bytes))
}

fn replay(stored: StoredResponse) -> Response {
    let mut response = Response::new(Body::from(stored.body));
    *response.status_mut() =
        StatusCode::from_u16(stored.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u32) -> CacheKey {
        (1, "POST /api/orders".to_string(), format!("key-{n}"))
    }

    fn stored(body: &str) -> StoredResponse {
        StoredResponse {
            status: 201,
            body: Bytes::from(body.to_string()),
            stored_at: now_millis(),
        }
    }

    #[test]
    fn test_first_call_executes_second_replays() {
        let cache = IdempotencyCache::new(60_000);
        assert!(matches!(cache.begin(key(1)), BeginOutcome::Execute));
        cache.complete(&key(1), stored(r#"{"status":"success"}"#));

        match cache.begin(key(1)) {
            BeginOutcome::Replay(s) => {
                assert_eq!(s.status, 201);
                assert_eq!(&s.body[..], br#"{"status":"success"}"#);
            }
            _ => panic!("expected replay"),
        }
    }

    #[test]
    fn test_concurrent_first_calls_share_one_execution() {
        let cache = IdempotencyCache::new(60_000);
        assert!(matches!(cache.begin(key(2)), BeginOutcome::Execute));
        // 第二个并发者拿到等待标记而非 Execute
        assert!(matches!(cache.begin(key(2)), BeginOutcome::Wait(_)));

        cache.complete(&key(2), stored("{}"));
        assert!(matches!(cache.begin(key(2)), BeginOutcome::Replay(_)));
    }

    #[test]
    fn test_distinct_keys_do_not_collide() {
        let cache = IdempotencyCache::new(60_000);
        assert!(matches!(cache.begin(key(3)), BeginOutcome::Execute));
        assert!(matches!(cache.begin(key(4)), BeginOutcome::Execute));
        // 不同用户同 key 也是独立条目
        let other_user = (2, "POST /api/orders".to_string(), "key-3".to_string());
        assert!(matches!(cache.begin(other_user), BeginOutcome::Execute));
    }

    #[test]
    fn test_expired_entry_reexecutes() {
        let cache = IdempotencyCache::new(0);
        assert!(matches!(cache.begin(key(5)), BeginOutcome::Execute));
        cache.complete(
            &key(5),
            StoredResponse {
                status: 201,
                body: Bytes::new(),
                stored_at: now_millis() - 10,
            },
        );
        assert!(matches!(cache.begin(key(5)), BeginOutcome::Execute));
    }

    #[test]
    fn test_abort_releases_key() {
        let cache = IdempotencyCache::new(60_000);
        assert!(matches!(cache.begin(key(6)), BeginOutcome::Execute));
        cache.abort(&key(6));
        assert!(matches!(cache.begin(key(6)), BeginOutcome::Execute));
    }

    #[test]
    fn test_purge_keeps_inflight() {
        let cache = IdempotencyCache::new(0);
        assert!(matches!(cache.begin(key(7)), BeginOutcome::Execute));
        cache.purge_expired();
        // in-flight 标记不可清
        assert!(matches!(cache.begin(key(7)), BeginOutcome::Wait(_)));
    }
}

//! 服务器状态管理
//!
//! [`ServerState`] 聚合全部共享服务，经 `Arc` 注入路由。
//! `initialize` 负责首启播种：默认角色目录与初始 staff 账户。

use std::sync::Arc;

use shared::models::{Role, User, UserStatus, UserType};
use shared::util::{now_millis, snowflake_id};
use shared::{AppError, AppResult};

use crate::audit::AuditService;
use crate::auth::permissions::DEFAULT_ROLES;
use crate::auth::{JwtService, SessionService, password};
use crate::middleware::{IdempotencyCache, RateLimiter};
use crate::orders::OrderService;
use crate::store::{MemoryStore, Store};
use crate::webhooks::WebhookDispatcher;

use super::config::Config;

/// 全局共享状态
pub struct ServerState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub jwt: Arc<JwtService>,
    pub sessions: SessionService,
    pub orders: OrderService,
    pub audit: Arc<AuditService>,
    pub events: WebhookDispatcher,
    pub idempotency: IdempotencyCache,
    pub rate_limiter: RateLimiter,
}

impl ServerState {
    /// 生产入口：内存后端 + 播种
    pub async fn initialize(config: &Config) -> AppResult<Arc<Self>> {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        Self::with_store(config.clone(), store).await
    }

    /// 注入任意存储后端（测试复用同一装配路径）
    pub async fn with_store(config: Config, store: Arc<dyn Store>) -> AppResult<Arc<Self>> {
        let jwt = Arc::new(JwtService::with_config(config.jwt.clone()));
        let sessions = SessionService::new(store.clone(), jwt.clone());
        let audit = Arc::new(AuditService::new(store.clone()));
        let events = WebhookDispatcher::start(store.clone(), &config);
        let orders = OrderService::new(store.clone(), audit.clone(), events.clone());

        let state = Self {
            idempotency: IdempotencyCache::new(config.idempotency_ttl_ms),
            rate_limiter: RateLimiter::new(config.auth_rate_limit, config.auth_rate_window_ms),
            store,
            jwt,
            sessions,
            orders,
            audit,
            events,
            config,
        };
        state.seed().await?;
        Ok(Arc::new(state))
    }

    /// 启动后台维护循环：周期清理幂等缓存与限流窗口的过期条目
    pub fn start_maintenance(self: &Arc<Self>, period: std::time::Duration) -> tokio::task::JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // 首个 tick 立即到期，跳过
            ticker.tick().await;
            loop {
                ticker.tick().await;
                state.idempotency.purge_expired();
                state.rate_limiter.purge_expired();
            }
        })
    }

    /// 首启播种：默认角色 + 初始 staff（admin）
    ///
    /// 幂等：已存在的角色/账户跳过。
    async fn seed(&self) -> AppResult<()> {
        let now = now_millis();
        for (name, description, permissions) in DEFAULT_ROLES {
            if self.store.role_by_name(name).await?.is_some() {
                continue;
            }
            self.store
                .create_role(
                    Role {
                        id: snowflake_id(),
                        name: name.to_string(),
                        description: Some(description.to_string()),
                        created_at: now,
                    },
                    permissions.iter().map(|p| p.to_string()).collect(),
                )
                .await?;
            tracing::info!(role = name, "seeded default role");
        }

        if self
            .store
            .user_by_phone(&self.config.bootstrap_staff_phone)
            .await?
            .is_none()
        {
            let staff = User {
                id: snowflake_id(),
                phone: self.config.bootstrap_staff_phone.clone(),
                email: None,
                user_type: UserType::Staff,
                status: UserStatus::Active,
                password_hash: password::hash_password(&self.config.bootstrap_staff_password)?,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };
            let staff = self.store.create_user(staff).await?;
            let admin = self
                .store
                .role_by_name("admin")
                .await?
                .ok_or_else(|| AppError::internal("admin role missing after seed"))?;
            self.store.assign_user_role(staff.id, admin.id).await?;
            tracing::info!(phone = %staff.phone, "seeded bootstrap staff account");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::effective_permissions;

    #[tokio::test]
    async fn test_seed_creates_roles_and_staff() {
        let state = ServerState::initialize(&Config::for_tests()).await.unwrap();

        assert_eq!(state.store.list_roles().await.unwrap().len(), 3);
        let staff = state
            .store
            .user_by_phone("+10000000000")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(staff.user_type, UserType::Staff);

        // 初始 staff 持有全部权限
        let perms = effective_permissions(&state.store, staff.id).await.unwrap();
        assert!(perms.contains("users.manage"));
        assert!(perms.contains("webhooks.manage"));
    }

    #[tokio::test]
    async fn test_maintenance_loop_purges_expired_entries() {
        let mut config = Config::for_tests();
        config.idempotency_ttl_ms = 0;
        config.auth_rate_window_ms = 0;
        let state = ServerState::with_store(config, Arc::new(MemoryStore::new()))
            .await
            .unwrap();

        let key = (1, "POST /api/orders".to_string(), "k-1".to_string());
        state.idempotency.begin(key.clone());
        state.idempotency.complete(
            &key,
            crate::middleware::idempotency::StoredResponse {
                status: 201,
                body: axum::body::Bytes::new(),
                stored_at: shared::util::now_millis() - 10,
            },
        );
        state.rate_limiter.check("1.2.3.4", "/api/auth/login");
        assert_eq!(state.idempotency.len(), 1);
        assert_eq!(state.rate_limiter.len(), 1);

        let handle = state.start_maintenance(std::time::Duration::from_millis(10));
        tokio::time::sleep(std::time::Duration::from_millis(80)).await;
        handle.abort();

        assert!(state.idempotency.is_empty());
        assert!(state.rate_limiter.is_empty());
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let config = Config::for_tests();
        ServerState::with_store(config.clone(), store.clone())
            .await
            .unwrap();
        ServerState::with_store(config, store.clone()).await.unwrap();

        assert_eq!(store.list_roles().await.unwrap().len(), 3);
        assert_eq!(store.list_users(false).await.unwrap().len(), 1);
    }
}

//! Storage Abstraction
//!
//! 所有持久化状态的唯一写入路径。组件不得绕过 [`Store`] 直接改动实体，
//! 也不得跨请求缓存可变副本 — 每次鉴权/流转决策都重新读取当前状态。
//!
//! 后端可互换：本仓库内置 [`MemoryStore`]；关系型后端按同一契约实现。
//! 软删除返回墓碑实体而非物理删除；列表操作默认排除已删除记录。

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::audit::{AuditEntry, AuditQuery};
use shared::AppError;
use shared::models::{
    Address, CourierProfile, FinanceSnapshot, Order, OrderEvent, OrderStatus, Role, Session, User,
    Webhook, WebhookDelivery,
};

/// Storage error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// CAS 前置条件不满足（如订单状态已被并发修改）
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Internal(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(resource) => AppError::not_found(resource),
            StoreError::Duplicate(resource) => {
                AppError::new(shared::ErrorCode::AlreadyExists).with_param("resource", resource)
            }
            StoreError::Conflict(detail) => {
                AppError::new(shared::ErrorCode::AlreadyExists).with_detail(detail)
            }
            StoreError::Internal(detail) => AppError::storage(detail),
        }
    }
}

/// Order listing filter
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub client_id: Option<i64>,
    pub courier_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub include_deleted: bool,
}

/// 与状态 CAS 一并原子应用的字段
#[derive(Debug, Clone, Default)]
pub struct OrderTransition {
    pub to: Option<OrderStatus>,
    /// 指派时设置 courier_id（仅允许从 None 设置一次）
    pub set_courier: Option<i64>,
    pub completed_at: Option<i64>,
    pub finance: Option<FinanceSnapshot>,
}

impl OrderTransition {
    pub fn to(status: OrderStatus) -> Self {
        Self {
            to: Some(status),
            ..Default::default()
        }
    }
}

/// Storage contract — CRUD + filtered lists per entity
///
/// 实现要求：
/// - `transition_order` 必须对 `(status == from)` 做原子比较交换，
///   失败返回 [`StoreError::Conflict`] 且不产生任何写入。
/// - `soft_delete_*` 返回带 `deleted_at` 的墓碑实体。
/// - 审计与订单事件只增不改。
#[async_trait]
pub trait Store: Send + Sync {
    // ==================== Users ====================
    async fn create_user(&self, user: User) -> StoreResult<User>;
    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    async fn user_by_phone(&self, phone: &str) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self, include_deleted: bool) -> StoreResult<Vec<User>>;
    async fn update_user(&self, user: &User) -> StoreResult<User>;
    async fn soft_delete_user(&self, id: i64, at: i64) -> StoreResult<User>;

    // ==================== Roles & edges ====================
    async fn create_role(&self, role: Role, permissions: Vec<String>) -> StoreResult<Role>;
    async fn role_by_id(&self, id: i64) -> StoreResult<Option<Role>>;
    async fn role_by_name(&self, name: &str) -> StoreResult<Option<Role>>;
    async fn list_roles(&self) -> StoreResult<Vec<Role>>;
    async fn update_role(&self, role: &Role) -> StoreResult<Role>;
    async fn delete_role(&self, id: i64) -> StoreResult<bool>;

    async fn role_permissions(&self, role_id: i64) -> StoreResult<Vec<String>>;
    async fn set_role_permissions(&self, role_id: i64, permissions: Vec<String>)
    -> StoreResult<()>;

    async fn assign_user_role(&self, user_id: i64, role_id: i64) -> StoreResult<()>;
    async fn revoke_user_role(&self, user_id: i64, role_id: i64) -> StoreResult<bool>;
    async fn user_roles(&self, user_id: i64) -> StoreResult<Vec<Role>>;

    // ==================== Sessions ====================
    async fn create_session(&self, session: Session) -> StoreResult<Session>;
    async fn session_by_id(&self, id: i64) -> StoreResult<Option<Session>>;
    async fn session_by_token_hash(&self, hash: &str) -> StoreResult<Option<Session>>;
    async fn update_session(&self, session: &Session) -> StoreResult<Session>;
    async fn delete_session(&self, id: i64) -> StoreResult<bool>;
    async fn delete_user_sessions(&self, user_id: i64) -> StoreResult<u64>;
    async fn list_user_sessions(&self, user_id: i64) -> StoreResult<Vec<Session>>;

    // ==================== Addresses ====================
    async fn create_address(&self, address: Address) -> StoreResult<Address>;
    /// 返回包括软删除在内的记录（订单详情渲染需要）；可见性由调用方裁决
    async fn address_by_id(&self, id: i64) -> StoreResult<Option<Address>>;
    async fn list_addresses(&self, user_id: i64, include_deleted: bool)
    -> StoreResult<Vec<Address>>;
    async fn update_address(&self, address: &Address) -> StoreResult<Address>;
    async fn soft_delete_address(&self, id: i64, at: i64) -> StoreResult<Address>;

    // ==================== Courier profiles ====================
    async fn put_courier_profile(&self, profile: &CourierProfile) -> StoreResult<CourierProfile>;
    async fn courier_profile(&self, user_id: i64) -> StoreResult<Option<CourierProfile>>;
    /// 单调递增，返回新值
    async fn increment_completed_orders(&self, user_id: i64) -> StoreResult<u32>;

    // ==================== Orders ====================
    async fn create_order(&self, order: Order) -> StoreResult<Order>;
    async fn order_by_id(&self, id: i64) -> StoreResult<Option<Order>>;
    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;
    /// 非状态字段更新（schedule、time window）
    async fn update_order(&self, order: &Order) -> StoreResult<Order>;
    /// 状态流转 CAS：`status == from` 时原子应用 `transition`
    async fn transition_order(
        &self,
        id: i64,
        from: OrderStatus,
        transition: OrderTransition,
    ) -> StoreResult<Order>;

    // ==================== Order events ====================
    async fn append_order_event(&self, event: OrderEvent) -> StoreResult<OrderEvent>;
    async fn order_events(&self, order_id: i64) -> StoreResult<Vec<OrderEvent>>;

    // ==================== Audit log ====================
    async fn append_audit(&self, entry: AuditEntry) -> StoreResult<AuditEntry>;
    /// 最后一条的 (sequence, curr_hash)，空链为 None
    async fn last_audit_meta(&self) -> StoreResult<Option<(u64, String)>>;
    async fn query_audit(&self, query: &AuditQuery) -> StoreResult<(Vec<AuditEntry>, u64)>;
    /// 按序列号升序返回指定时间范围的条目（链验证用）
    async fn audit_chain(&self, from: Option<i64>, to: Option<i64>)
    -> StoreResult<Vec<AuditEntry>>;

    // ==================== Webhooks ====================
    async fn create_webhook(&self, webhook: Webhook) -> StoreResult<Webhook>;
    async fn webhook_by_id(&self, id: i64) -> StoreResult<Option<Webhook>>;
    async fn list_webhooks(&self) -> StoreResult<Vec<Webhook>>;
    async fn update_webhook(&self, webhook: &Webhook) -> StoreResult<Webhook>;
    async fn delete_webhook(&self, id: i64) -> StoreResult<bool>;
    async fn record_delivery(&self, delivery: WebhookDelivery) -> StoreResult<WebhookDelivery>;
    async fn webhook_deliveries(&self, webhook_id: i64) -> StoreResult<Vec<WebhookDelivery>>;
}

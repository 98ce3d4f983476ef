//! In-memory storage backend
//!
//! DashMap 分片表 + 唯一索引。CAS 依赖 `get_mut` 持有的分片写锁：
//! 检查与写入在同一锁内完成，锁内无 await。
//! 审计链由单把写锁保护，保证序列号与 prev_hash 的全序。

use std::collections::BTreeSet;
use std::sync::RwLock;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use shared::models::{
    Address, CourierProfile, Order, OrderEvent, Role, Session, User, Webhook, WebhookDelivery,
};
use shared::util::now_millis;

use super::{OrderFilter, OrderTransition, Store, StoreError, StoreResult};
use crate::audit::{AuditEntry, AuditQuery};
use shared::models::OrderStatus;

/// In-memory store — the default backend
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<i64, User>,
    /// phone → user_id；手机号终身唯一（软删除不释放）
    phone_index: DashMap<String, i64>,
    email_index: DashMap<String, i64>,

    roles: DashMap<i64, Role>,
    role_name_index: DashMap<String, i64>,
    role_perms: DashMap<i64, Vec<String>>,
    /// user_id → 角色 id 集合
    user_role_edges: DashMap<i64, BTreeSet<i64>>,

    sessions: DashMap<i64, Session>,
    session_token_index: DashMap<String, i64>,

    addresses: DashMap<i64, Address>,
    courier_profiles: DashMap<i64, CourierProfile>,

    orders: DashMap<i64, Order>,
    order_events: DashMap<i64, Vec<OrderEvent>>,

    /// append-only；锁保证 sequence 全序
    audit_log: RwLock<Vec<AuditEntry>>,

    webhooks: DashMap<i64, Webhook>,
    deliveries: DashMap<i64, Vec<WebhookDelivery>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    // ==================== Users ====================

    async fn create_user(&self, user: User) -> StoreResult<User> {
        match self.phone_index.entry(user.phone.clone()) {
            Entry::Occupied(_) => return Err(StoreError::Duplicate("phone".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }
        if let Some(email) = &user.email {
            match self.email_index.entry(email.clone()) {
                Entry::Occupied(_) => {
                    // 回滚 phone 占位
                    self.phone_index.remove(&user.phone);
                    return Err(StoreError::Duplicate("email".to_string()));
                }
                Entry::Vacant(slot) => {
                    slot.insert(user.id);
                }
            }
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn user_by_phone(&self, phone: &str) -> StoreResult<Option<User>> {
        let Some(id) = self.phone_index.get(phone).map(|e| *e) else {
            return Ok(None);
        };
        self.user_by_id(id).await
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let Some(id) = self.email_index.get(email).map(|e| *e) else {
            return Ok(None);
        };
        self.user_by_id(id).await
    }

    async fn list_users(&self, include_deleted: bool) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|u| include_deleted || u.deleted_at.is_none())
            .map(|u| u.clone())
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> StoreResult<User> {
        let mut existing = self
            .users
            .get_mut(&user.id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user.id)))?;
        // email 唯一索引维护
        if existing.email != user.email {
            if let Some(new_email) = &user.email {
                match self.email_index.entry(new_email.clone()) {
                    Entry::Occupied(e) if *e.get() != user.id => {
                        return Err(StoreError::Duplicate("email".to_string()));
                    }
                    Entry::Occupied(_) => {}
                    Entry::Vacant(slot) => {
                        slot.insert(user.id);
                    }
                }
            }
            if let Some(old_email) = &existing.email {
                self.email_index
                    .remove_if(old_email, |_, id| *id == user.id);
            }
        }
        *existing = user.clone();
        Ok(user.clone())
    }

    async fn soft_delete_user(&self, id: i64, at: i64) -> StoreResult<User> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        if user.deleted_at.is_none() {
            user.deleted_at = Some(at);
            user.updated_at = at;
        }
        Ok(user.clone())
    }

    // ==================== Roles & edges ====================

    async fn create_role(&self, role: Role, permissions: Vec<String>) -> StoreResult<Role> {
        match self.role_name_index.entry(role.name.clone()) {
            Entry::Occupied(_) => return Err(StoreError::Duplicate("role name".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(role.id);
            }
        }
        self.role_perms.insert(role.id, permissions);
        self.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn role_by_id(&self, id: i64) -> StoreResult<Option<Role>> {
        Ok(self.roles.get(&id).map(|r| r.clone()))
    }

    async fn role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        let Some(id) = self.role_name_index.get(name).map(|e| *e) else {
            return Ok(None);
        };
        self.role_by_id(id).await
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.roles.iter().map(|r| r.clone()).collect();
        roles.sort_by_key(|r| r.id);
        Ok(roles)
    }

    async fn update_role(&self, role: &Role) -> StoreResult<Role> {
        let mut existing = self
            .roles
            .get_mut(&role.id)
            .ok_or_else(|| StoreError::NotFound(format!("role {}", role.id)))?;
        if existing.name != role.name {
            match self.role_name_index.entry(role.name.clone()) {
                Entry::Occupied(_) => return Err(StoreError::Duplicate("role name".to_string())),
                Entry::Vacant(slot) => {
                    slot.insert(role.id);
                }
            }
            self.role_name_index
                .remove_if(&existing.name, |_, id| *id == role.id);
        }
        *existing = role.clone();
        Ok(role.clone())
    }

    async fn delete_role(&self, id: i64) -> StoreResult<bool> {
        let Some((_, role)) = self.roles.remove(&id) else {
            return Ok(false);
        };
        self.role_name_index.remove(&role.name);
        self.role_perms.remove(&id);
        // 级联清除授权边
        for mut edges in self.user_role_edges.iter_mut() {
            edges.remove(&id);
        }
        Ok(true)
    }

    async fn role_permissions(&self, role_id: i64) -> StoreResult<Vec<String>> {
        Ok(self
            .role_perms
            .get(&role_id)
            .map(|p| p.clone())
            .unwrap_or_default())
    }

    async fn set_role_permissions(
        &self,
        role_id: i64,
        permissions: Vec<String>,
    ) -> StoreResult<()> {
        if !self.roles.contains_key(&role_id) {
            return Err(StoreError::NotFound(format!("role {role_id}")));
        }
        self.role_perms.insert(role_id, permissions);
        Ok(())
    }

    async fn assign_user_role(&self, user_id: i64, role_id: i64) -> StoreResult<()> {
        if !self.roles.contains_key(&role_id) {
            return Err(StoreError::NotFound(format!("role {role_id}")));
        }
        self.user_role_edges
            .entry(user_id)
            .or_default()
            .insert(role_id);
        Ok(())
    }

    async fn revoke_user_role(&self, user_id: i64, role_id: i64) -> StoreResult<bool> {
        Ok(self
            .user_role_edges
            .get_mut(&user_id)
            .map(|mut edges| edges.remove(&role_id))
            .unwrap_or(false))
    }

    async fn user_roles(&self, user_id: i64) -> StoreResult<Vec<Role>> {
        let Some(edges) = self.user_role_edges.get(&user_id).map(|e| e.clone()) else {
            return Ok(Vec::new());
        };
        let mut roles: Vec<Role> = edges
            .iter()
            .filter_map(|id| self.roles.get(id).map(|r| r.clone()))
            .collect();
        roles.sort_by_key(|r| r.id);
        Ok(roles)
    }

    // ==================== Sessions ====================

    async fn create_session(&self, session: Session) -> StoreResult<Session> {
        self.session_token_index
            .insert(session.refresh_token_hash.clone(), session.id);
        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn session_by_id(&self, id: i64) -> StoreResult<Option<Session>> {
        Ok(self.sessions.get(&id).map(|s| s.clone()))
    }

    async fn session_by_token_hash(&self, hash: &str) -> StoreResult<Option<Session>> {
        let Some(id) = self.session_token_index.get(hash).map(|e| *e) else {
            return Ok(None);
        };
        self.session_by_id(id).await
    }

    async fn update_session(&self, session: &Session) -> StoreResult<Session> {
        let mut existing = self
            .sessions
            .get_mut(&session.id)
            .ok_or_else(|| StoreError::NotFound(format!("session {}", session.id)))?;
        // 轮换时换索引键，旧 refresh token 立刻失效
        if existing.refresh_token_hash != session.refresh_token_hash {
            self.session_token_index
                .remove_if(&existing.refresh_token_hash, |_, id| *id == session.id);
            self.session_token_index
                .insert(session.refresh_token_hash.clone(), session.id);
        }
        *existing = session.clone();
        Ok(session.clone())
    }

    async fn delete_session(&self, id: i64) -> StoreResult<bool> {
        let Some((_, session)) = self.sessions.remove(&id) else {
            return Ok(false);
        };
        self.session_token_index
            .remove_if(&session.refresh_token_hash, |_, sid| *sid == id);
        Ok(true)
    }

    async fn delete_user_sessions(&self, user_id: i64) -> StoreResult<u64> {
        let ids: Vec<i64> = self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.id)
            .collect();
        let mut removed = 0u64;
        for id in ids {
            if self.delete_session(id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn list_user_sessions(&self, user_id: i64) -> StoreResult<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.clone())
            .collect();
        sessions.sort_by_key(|s| s.id);
        Ok(sessions)
    }

    // ==================== Addresses ====================

    async fn create_address(&self, address: Address) -> StoreResult<Address> {
        self.addresses.insert(address.id, address.clone());
        Ok(address)
    }

    async fn address_by_id(&self, id: i64) -> StoreResult<Option<Address>> {
        Ok(self.addresses.get(&id).map(|a| a.clone()))
    }

    async fn list_addresses(
        &self,
        user_id: i64,
        include_deleted: bool,
    ) -> StoreResult<Vec<Address>> {
        let mut addresses: Vec<Address> = self
            .addresses
            .iter()
            .filter(|a| a.user_id == user_id && (include_deleted || a.deleted_at.is_none()))
            .map(|a| a.clone())
            .collect();
        addresses.sort_by_key(|a| a.id);
        Ok(addresses)
    }

    async fn update_address(&self, address: &Address) -> StoreResult<Address> {
        let mut existing = self
            .addresses
            .get_mut(&address.id)
            .ok_or_else(|| StoreError::NotFound(format!("address {}", address.id)))?;
        *existing = address.clone();
        Ok(address.clone())
    }

    async fn soft_delete_address(&self, id: i64, at: i64) -> StoreResult<Address> {
        let mut address = self
            .addresses
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("address {id}")))?;
        if address.deleted_at.is_none() {
            address.deleted_at = Some(at);
        }
        Ok(address.clone())
    }

    // ==================== Courier profiles ====================

    async fn put_courier_profile(&self, profile: &CourierProfile) -> StoreResult<CourierProfile> {
        self.courier_profiles
            .insert(profile.user_id, profile.clone());
        Ok(profile.clone())
    }

    async fn courier_profile(&self, user_id: i64) -> StoreResult<Option<CourierProfile>> {
        Ok(self.courier_profiles.get(&user_id).map(|p| p.clone()))
    }

    async fn increment_completed_orders(&self, user_id: i64) -> StoreResult<u32> {
        let mut profile = self
            .courier_profiles
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("courier profile {user_id}")))?;
        profile.completed_orders_count += 1;
        profile.updated_at = now_millis();
        Ok(profile.completed_orders_count)
    }

    // ==================== Orders ====================

    async fn create_order(&self, order: Order) -> StoreResult<Order> {
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn order_by_id(&self, id: i64) -> StoreResult<Option<Order>> {
        Ok(self.orders.get(&id).map(|o| o.clone()))
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| {
                (filter.include_deleted || o.deleted_at.is_none())
                    && filter.client_id.is_none_or(|id| o.client_id == id)
                    && filter.courier_id.is_none_or(|id| o.courier_id == Some(id))
                    && filter.status.is_none_or(|s| o.status == s)
            })
            .map(|o| o.clone())
            .collect();
        // 新订单在前
        orders.sort_by_key(|o| std::cmp::Reverse((o.created_at, o.id)));
        Ok(orders)
    }

    async fn update_order(&self, order: &Order) -> StoreResult<Order> {
        let mut existing = self
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::NotFound(format!("order {}", order.id)))?;
        *existing = order.clone();
        Ok(order.clone())
    }

    async fn transition_order(
        &self,
        id: i64,
        from: OrderStatus,
        transition: OrderTransition,
    ) -> StoreResult<Order> {
        // get_mut 持有分片写锁：比较与写入不可分割
        let mut order = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;
        if order.deleted_at.is_some() {
            return Err(StoreError::NotFound(format!("order {id}")));
        }
        if order.status != from {
            return Err(StoreError::Conflict(format!(
                "order {id} is {}, expected {from}",
                order.status
            )));
        }
        if let Some(courier_id) = transition.set_courier {
            if order.courier_id.is_some() {
                return Err(StoreError::Conflict(format!(
                    "order {id} already has a courier"
                )));
            }
            order.courier_id = Some(courier_id);
        }
        if let Some(to) = transition.to {
            order.status = to;
        }
        if transition.completed_at.is_some() {
            order.completed_at = transition.completed_at;
        }
        if transition.finance.is_some() {
            order.finance = transition.finance;
        }
        order.updated_at = now_millis();
        Ok(order.clone())
    }

    // ==================== Order events ====================

    async fn append_order_event(&self, event: OrderEvent) -> StoreResult<OrderEvent> {
        self.order_events
            .entry(event.order_id)
            .or_default()
            .push(event.clone());
        Ok(event)
    }

    async fn order_events(&self, order_id: i64) -> StoreResult<Vec<OrderEvent>> {
        Ok(self
            .order_events
            .get(&order_id)
            .map(|e| e.clone())
            .unwrap_or_default())
    }

    // ==================== Audit log ====================

    async fn append_audit(&self, entry: AuditEntry) -> StoreResult<AuditEntry> {
        let mut log = self
            .audit_log
            .write()
            .map_err(|_| StoreError::Internal("audit log lock poisoned".to_string()))?;
        log.push(entry.clone());
        Ok(entry)
    }

    async fn last_audit_meta(&self) -> StoreResult<Option<(u64, String)>> {
        let log = self
            .audit_log
            .read()
            .map_err(|_| StoreError::Internal("audit log lock poisoned".to_string()))?;
        Ok(log.last().map(|e| (e.sequence, e.curr_hash.clone())))
    }

    async fn query_audit(&self, query: &AuditQuery) -> StoreResult<(Vec<AuditEntry>, u64)> {
        let log = self
            .audit_log
            .read()
            .map_err(|_| StoreError::Internal("audit log lock poisoned".to_string()))?;
        let matched: Vec<AuditEntry> = log
            .iter()
            .filter(|e| {
                query.from.is_none_or(|t| e.timestamp >= t)
                    && query.to.is_none_or(|t| e.timestamp <= t)
                    && query.action.is_none_or(|a| e.action == a)
                    && query.operator_id.is_none_or(|id| e.operator_id == Some(id))
                    && query
                        .entity_type
                        .as_deref()
                        .is_none_or(|t| e.entity_type == t)
            })
            .cloned()
            .collect();
        let total = matched.len() as u64;

        let page = query.page.unwrap_or(1).max(1) as usize;
        let per_page = query.per_page.unwrap_or(50).clamp(1, 200) as usize;
        // 新条目在前
        let items: Vec<AuditEntry> = matched
            .into_iter()
            .rev()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();
        Ok((items, total))
    }

    async fn audit_chain(
        &self,
        from: Option<i64>,
        to: Option<i64>,
    ) -> StoreResult<Vec<AuditEntry>> {
        let log = self
            .audit_log
            .read()
            .map_err(|_| StoreError::Internal("audit log lock poisoned".to_string()))?;
        Ok(log
            .iter()
            .filter(|e| {
                from.is_none_or(|t| e.timestamp >= t) && to.is_none_or(|t| e.timestamp <= t)
            })
            .cloned()
            .collect())
    }

    // ==================== Webhooks ====================

    async fn create_webhook(&self, webhook: Webhook) -> StoreResult<Webhook> {
        self.webhooks.insert(webhook.id, webhook.clone());
        Ok(webhook)
    }

    async fn webhook_by_id(&self, id: i64) -> StoreResult<Option<Webhook>> {
        Ok(self.webhooks.get(&id).map(|w| w.clone()))
    }

    async fn list_webhooks(&self) -> StoreResult<Vec<Webhook>> {
        let mut webhooks: Vec<Webhook> = self.webhooks.iter().map(|w| w.clone()).collect();
        webhooks.sort_by_key(|w| w.id);
        Ok(webhooks)
    }

    async fn update_webhook(&self, webhook: &Webhook) -> StoreResult<Webhook> {
        let mut existing = self
            .webhooks
            .get_mut(&webhook.id)
            .ok_or_else(|| StoreError::NotFound(format!("webhook {}", webhook.id)))?;
        *existing = webhook.clone();
        Ok(webhook.clone())
    }

    async fn delete_webhook(&self, id: i64) -> StoreResult<bool> {
        Ok(self.webhooks.remove(&id).is_some())
    }

    async fn record_delivery(&self, delivery: WebhookDelivery) -> StoreResult<WebhookDelivery> {
        self.deliveries
            .entry(delivery.webhook_id)
            .or_default()
            .push(delivery.clone());
        Ok(delivery)
    }

    async fn webhook_deliveries(&self, webhook_id: i64) -> StoreResult<Vec<WebhookDelivery>> {
        Ok(self
            .deliveries
            .get(&webhook_id)
            .map(|d| d.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{UserStatus, UserType};
    use shared::util::snowflake_id;

    fn make_user(phone: &str) -> User {
        let now = now_millis();
        User {
            id: snowflake_id(),
            phone: phone.to_string(),
            email: None,
            user_type: UserType::Client,
            status: UserStatus::Active,
            password_hash: "x".to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn make_order(client_id: i64, status: OrderStatus) -> Order {
        let now = now_millis();
        Order {
            id: snowflake_id(),
            client_id,
            courier_id: None,
            address_id: 1,
            status,
            price: rust_decimal::Decimal::new(1000, 2),
            scheduled_at: None,
            time_window: None,
            completed_at: None,
            finance: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_phone_uniqueness_survives_soft_delete() {
        let store = MemoryStore::new();
        let user = store.create_user(make_user("+10000000001")).await.unwrap();
        store
            .soft_delete_user(user.id, now_millis())
            .await
            .unwrap();

        let err = store.create_user(make_user("+10000000001")).await;
        assert!(matches!(err, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_soft_deleted_user_excluded_from_default_list() {
        let store = MemoryStore::new();
        let user = store.create_user(make_user("+10000000002")).await.unwrap();
        store
            .soft_delete_user(user.id, now_millis())
            .await
            .unwrap();

        assert!(store.list_users(false).await.unwrap().is_empty());
        assert_eq!(store.list_users(true).await.unwrap().len(), 1);
        // 墓碑仍可按 id 取到
        let tombstone = store.user_by_id(user.id).await.unwrap().unwrap();
        assert!(tombstone.is_deleted());
    }

    #[tokio::test]
    async fn test_transition_cas_rejects_stale_from() {
        let store = MemoryStore::new();
        let order = store
            .create_order(make_order(1, OrderStatus::Created))
            .await
            .unwrap();

        let updated = store
            .transition_order(
                order.id,
                OrderStatus::Created,
                OrderTransition::to(OrderStatus::Cancelled),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Cancelled);

        // 第二个并发者携带过期的 from 必须失败
        let err = store
            .transition_order(
                order.id,
                OrderStatus::Created,
                OrderTransition::to(OrderStatus::Assigned),
            )
            .await;
        assert!(matches!(err, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_assign_sets_courier_exactly_once() {
        let store = MemoryStore::new();
        let order = store
            .create_order(make_order(1, OrderStatus::Created))
            .await
            .unwrap();

        let mut t = OrderTransition::to(OrderStatus::Assigned);
        t.set_courier = Some(42);
        store
            .transition_order(order.id, OrderStatus::Created, t)
            .await
            .unwrap();

        // courier 已设置，二次指派被拒
        let mut t2 = OrderTransition::default();
        t2.set_courier = Some(43);
        let err = store
            .transition_order(order.id, OrderStatus::Assigned, t2)
            .await;
        assert!(matches!(err, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_session_rotation_invalidates_old_hash() {
        let store = MemoryStore::new();
        let now = now_millis();
        let mut session = Session {
            id: snowflake_id(),
            user_id: 1,
            refresh_token_hash: "old-hash".to_string(),
            device_id: None,
            platform: None,
            created_at: now,
            last_seen_at: now,
            expires_at: now + 1000,
        };
        store.create_session(session.clone()).await.unwrap();

        session.refresh_token_hash = "new-hash".to_string();
        store.update_session(&session).await.unwrap();

        assert!(
            store
                .session_by_token_hash("old-hash")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .session_by_token_hash("new-hash")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_role_delete_cascades_edges() {
        let store = MemoryStore::new();
        let now = now_millis();
        let role = store
            .create_role(
                Role {
                    id: snowflake_id(),
                    name: "ops".to_string(),
                    description: None,
                    created_at: now,
                },
                vec!["orders.read_all".to_string()],
            )
            .await
            .unwrap();
        store.assign_user_role(7, role.id).await.unwrap();
        assert_eq!(store.user_roles(7).await.unwrap().len(), 1);

        assert!(store.delete_role(role.id).await.unwrap());
        assert!(store.user_roles(7).await.unwrap().is_empty());
        assert!(store.role_permissions(role.id).await.unwrap().is_empty());
    }
}

//! 订单流转服务
//!
//! 所有订单变更的唯一入口。每次流转的固定顺序：
//! 1. 参与者/可见性检查
//! 2. 静态流转表校验（[`can_transition`]）
//! 3. 存储层 CAS（并发竞争在此裁决，输家拿到 409）
//! 4. 副作用：订单事件（必写）→ 审计（特权路径）→ webhook（异步）
//!
//! 副作用失败不回滚已提交的流转。

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::json;

use shared::models::{
    AssignRequest, CancelRequest, FinanceSnapshot, Order, OrderCreate, OrderEvent, OrderEventType,
    OrderPatch, OrderStatus, UserType,
};
use shared::util::{now_millis, snowflake_id};
use shared::{AppError, AppResult, ErrorCode};

use super::state_machine::can_transition;
use crate::audit::{AuditAction, AuditRecord, AuditService};
use crate::auth::CurrentUser;
use crate::store::{OrderFilter, OrderTransition, Store, StoreError};
use crate::webhooks::{DomainEvent, WebhookDispatcher};

/// 平台抽成比例（快递员得 80%）
const PLATFORM_FEE_RATE: &str = "0.20";

/// Order lifecycle service
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
    audit: Arc<AuditService>,
    events: WebhookDispatcher,
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>, audit: Arc<AuditService>, events: WebhookDispatcher) -> Self {
        Self {
            store,
            audit,
            events,
        }
    }

    // ==================== 查询与可见性 ====================

    /// 订单可见性：所有者、被指派快递员、或持 `orders.read_all`
    pub fn can_view(user: &CurrentUser, order: &Order) -> bool {
        order.client_id == user.id
            || order.courier_id == Some(user.id)
            || user.has_permission("orders.read_all")
    }

    pub async fn get(&self, user: &CurrentUser, order_id: i64) -> AppResult<Order> {
        let order = self
            .store
            .order_by_id(order_id)
            .await?
            .filter(|o| o.deleted_at.is_none())
            .ok_or_else(|| AppError::not_found("order"))?;
        if !Self::can_view(user, &order) {
            // 不可见即不存在，避免探测订单号
            return Err(AppError::not_found("order"));
        }
        Ok(order)
    }

    /// 列表：非特权用户自动收窄到本人参与的订单
    pub async fn list(
        &self,
        user: &CurrentUser,
        status: Option<OrderStatus>,
    ) -> AppResult<Vec<Order>> {
        let mut filter = OrderFilter {
            status,
            ..Default::default()
        };
        if !user.has_permission("orders.read_all") {
            match user.user_type {
                UserType::Courier => filter.courier_id = Some(user.id),
                _ => filter.client_id = Some(user.id),
            }
        }
        Ok(self.store.list_orders(&filter).await?)
    }

    pub async fn timeline(&self, user: &CurrentUser, order_id: i64) -> AppResult<Vec<OrderEvent>> {
        // 可见性检查复用 get
        self.get(user, order_id).await?;
        Ok(self.store.order_events(order_id).await?)
    }

    // ==================== 创建 ====================

    /// 创建订单（client 专属）
    ///
    /// 地址必须属于下单人且未删除。
    pub async fn create(&self, user: &CurrentUser, req: OrderCreate) -> AppResult<Order> {
        let address = self
            .store
            .address_by_id(req.address_id)
            .await?
            .filter(|a| a.user_id == user.id && !a.is_deleted())
            .ok_or_else(|| AppError::not_found("address"))?;

        let price = Decimal::from_f64(req.price)
            .ok_or_else(|| AppError::validation("price", "not a finite number"))?;

        let now = now_millis();
        let order = Order {
            id: snowflake_id(),
            client_id: user.id,
            courier_id: None,
            address_id: address.id,
            status: OrderStatus::Created,
            price,
            scheduled_at: req.scheduled_at,
            time_window: req.time_window,
            completed_at: None,
            finance: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let order = self.store.create_order(order).await?;

        self.record_event(&order, OrderEventType::Created, Some(user.id), json!({}))
            .await;
        self.events.emit(DomainEvent::new(
            "order.created",
            json!({"orderId": order.id, "clientId": order.client_id}),
        ));
        Ok(order)
    }

    // ==================== 流转 ====================

    /// 指派快递员（dispatcher 路径，须 `orders.assign`）
    pub async fn assign(
        &self,
        operator: &CurrentUser,
        order_id: i64,
        req: AssignRequest,
    ) -> AppResult<Order> {
        let order = self.load_for_transition(order_id).await?;

        // 候选人必须是未删除的 courier
        let candidate = self
            .store
            .user_by_id(req.courier_id)
            .await?
            .filter(|u| !u.is_deleted())
            .ok_or_else(|| AppError::not_found("courier"))?;
        if candidate.user_type != UserType::Courier {
            return Err(AppError::new(ErrorCode::CandidateNotCourier));
        }

        if order.courier_id.is_some() {
            return Err(AppError::new(ErrorCode::CourierAlreadyAssigned));
        }
        self.check_table(&order, OrderStatus::Assigned)?;

        let mut transition = OrderTransition::to(OrderStatus::Assigned);
        transition.set_courier = Some(candidate.id);
        let updated = self
            .apply_cas(order.id, order.status, transition, OrderStatus::Assigned)
            .await?;

        self.record_event(
            &updated,
            OrderEventType::Assigned,
            Some(operator.id),
            json!({"courierId": candidate.id}),
        )
        .await;
        self.audit
            .log(
                Some(operator),
                AuditRecord::new(AuditAction::OrderAssigned, "order", updated.id)
                    .with_metadata(json!({"courierId": candidate.id})),
            )
            .await;
        self.events.emit(DomainEvent::new(
            "order.assigned",
            json!({"orderId": updated.id, "courierId": candidate.id}),
        ));
        Ok(updated)
    }

    /// 快递员接单：assigned → in_progress，仅限被指派者本人
    pub async fn accept(&self, courier: &CurrentUser, order_id: i64) -> AppResult<Order> {
        let order = self.load_for_transition(order_id).await?;
        self.ensure_assigned_courier(courier, &order)?;
        self.check_table(&order, OrderStatus::InProgress)?;

        let updated = self
            .apply_cas(
                order.id,
                order.status,
                OrderTransition::to(OrderStatus::InProgress),
                OrderStatus::InProgress,
            )
            .await?;

        self.record_event(&updated, OrderEventType::Started, Some(courier.id), json!({}))
            .await;
        Ok(updated)
    }

    /// 完成订单：in_progress → completed，仅限被指派者本人
    ///
    /// 完成时固化财务快照并 +1 快递员完成数。
    pub async fn complete(&self, courier: &CurrentUser, order_id: i64) -> AppResult<Order> {
        let order = self.load_for_transition(order_id).await?;
        self.ensure_assigned_courier(courier, &order)?;
        self.check_table(&order, OrderStatus::Completed)?;

        let now = now_millis();
        let mut transition = OrderTransition::to(OrderStatus::Completed);
        transition.completed_at = Some(now);
        transition.finance = Some(finance_snapshot(order.price));
        let updated = self
            .apply_cas(order.id, order.status, transition, OrderStatus::Completed)
            .await?;

        self.record_event(
            &updated,
            OrderEventType::Completed,
            Some(courier.id),
            json!({"completedAt": now}),
        )
        .await;
        self.finalize_completion(&updated).await;
        Ok(updated)
    }

    /// 取消订单：所有者或持 `orders.manage` 者
    pub async fn cancel(
        &self,
        user: &CurrentUser,
        order_id: i64,
        req: CancelRequest,
    ) -> AppResult<Order> {
        let order = self.load_for_transition(order_id).await?;

        let privileged = user.has_permission("orders.manage");
        if order.client_id != user.id && !privileged {
            if !Self::can_view(user, &order) {
                return Err(AppError::not_found("order"));
            }
            return Err(AppError::new(ErrorCode::NotOwner));
        }
        self.check_table(&order, OrderStatus::Cancelled)?;

        let updated = self
            .apply_cas(
                order.id,
                order.status,
                OrderTransition::to(OrderStatus::Cancelled),
                OrderStatus::Cancelled,
            )
            .await?;

        self.record_event(
            &updated,
            OrderEventType::Cancelled,
            Some(user.id),
            json!({"reason": req.reason}),
        )
        .await;
        if privileged && order.client_id != user.id {
            self.audit
                .log(
                    Some(user),
                    AuditRecord::new(AuditAction::OrderCancelled, "order", updated.id)
                        .with_metadata(json!({"reason": req.reason})),
                )
                .await;
        }
        self.events.emit(DomainEvent::new(
            "order.cancelled",
            json!({"orderId": updated.id, "reason": req.reason}),
        ));
        Ok(updated)
    }

    /// 通用 PATCH：排期字段 + 可选状态流转
    ///
    /// 状态变更仍走流转表与参与者规则；`orders.manage` 可代为流转，
    /// 但同样不能离开终态。
    pub async fn patch(
        &self,
        user: &CurrentUser,
        order_id: i64,
        req: OrderPatch,
    ) -> AppResult<Order> {
        let order = self.load_for_transition(order_id).await?;
        let privileged = user.has_permission("orders.manage");
        if order.client_id != user.id && order.courier_id != Some(user.id) && !privileged {
            return Err(AppError::not_found("order"));
        }

        if let Some(to) = req.status {
            return match to {
                OrderStatus::Cancelled => {
                    self.cancel(user, order_id, CancelRequest { reason: None }).await
                }
                OrderStatus::InProgress if !privileged => self.accept(user, order_id).await,
                OrderStatus::Completed if !privileged => self.complete(user, order_id).await,
                _ if privileged => self.privileged_transition(user, order, to).await,
                _ => Err(AppError::permission_denied(&["orders.manage"])),
            };
        }

        // 排期字段只有所有者（或特权）在非终态可改
        if order.client_id != user.id && !privileged {
            return Err(AppError::new(ErrorCode::NotOwner));
        }
        if order.status.is_terminal() {
            return Err(AppError::validation("scheduledAt", "order is terminal"));
        }
        let mut updated = order;
        if req.scheduled_at.is_some() {
            updated.scheduled_at = req.scheduled_at;
        }
        if req.time_window.is_some() {
            updated.time_window = req.time_window;
        }
        updated.updated_at = now_millis();
        Ok(self.store.update_order(&updated).await?)
    }

    /// `orders.manage` 驱动的任意表内流转（审计必写）
    async fn privileged_transition(
        &self,
        operator: &CurrentUser,
        order: Order,
        to: OrderStatus,
    ) -> AppResult<Order> {
        self.check_table(&order, to)?;
        if to == OrderStatus::Assigned {
            // 指派必须走 assign 以提供 courier
            return Err(AppError::validation("status", "assignment requires a courier"));
        }

        let mut transition = OrderTransition::to(to);
        if to == OrderStatus::Completed {
            transition.completed_at = Some(now_millis());
            transition.finance = Some(finance_snapshot(order.price));
        }
        let updated = self.apply_cas(order.id, order.status, transition, to).await?;

        self.record_event(
            &updated,
            OrderEventType::StatusChanged,
            Some(operator.id),
            json!({"from": order.status, "to": to}),
        )
        .await;
        self.audit
            .log(
                Some(operator),
                AuditRecord::new(AuditAction::OrderStatusChanged, "order", updated.id)
                    .with_metadata(json!({"from": order.status, "to": to})),
            )
            .await;
        if to == OrderStatus::Completed {
            self.finalize_completion(&updated).await;
        }
        Ok(updated)
    }

    // ==================== 内部 ====================

    /// 完成态的固定副作用：完成数 +1、`order.completed` 事件
    ///
    /// 绑定在流转本身，与驱动端点无关。完成数失败只记日志，
    /// 不影响已提交的流转。
    async fn finalize_completion(&self, order: &Order) {
        if let Some(courier_id) = order.courier_id {
            if let Err(e) = self.store.increment_completed_orders(courier_id).await {
                tracing::error!(courier_id, "completed count increment failed: {}", e);
            }
        }
        self.events.emit(DomainEvent::new(
            "order.completed",
            json!({"orderId": order.id, "courierId": order.courier_id}),
        ));
    }

    async fn load_for_transition(&self, order_id: i64) -> AppResult<Order> {
        self.store
            .order_by_id(order_id)
            .await?
            .filter(|o| o.deleted_at.is_none())
            .ok_or_else(|| AppError::not_found("order"))
    }

    fn ensure_assigned_courier(&self, user: &CurrentUser, order: &Order) -> AppResult<()> {
        if order.courier_id != Some(user.id) {
            // 未被指派者视同不可见
            return Err(AppError::not_found("order"));
        }
        Ok(())
    }

    fn check_table(&self, order: &Order, to: OrderStatus) -> AppResult<()> {
        if !can_transition(order.status, to) {
            return Err(AppError::invalid_transition(order.status.as_str(), to.as_str()));
        }
        Ok(())
    }

    /// CAS 应用；输掉竞争时按最新状态报告非法流转（409）
    async fn apply_cas(
        &self,
        order_id: i64,
        from: OrderStatus,
        transition: OrderTransition,
        to: OrderStatus,
    ) -> AppResult<Order> {
        match self.store.transition_order(order_id, from, transition).await {
            Ok(order) => Ok(order),
            Err(StoreError::Conflict(_)) => {
                let current = self
                    .store
                    .order_by_id(order_id)
                    .await?
                    .map(|o| o.status)
                    .unwrap_or(from);
                Err(AppError::invalid_transition(current.as_str(), to.as_str()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn record_event(
        &self,
        order: &Order,
        event_type: OrderEventType,
        performed_by: Option<i64>,
        metadata: serde_json::Value,
    ) {
        let event = OrderEvent {
            id: snowflake_id(),
            order_id: order.id,
            event_type,
            performed_by,
            metadata,
            created_at: now_millis(),
        };
        if let Err(e) = self.store.append_order_event(event).await {
            tracing::error!(order_id = order.id, "order event append failed: {}", e);
        }
    }
}

/// 完成时的财务拆分：快递员 80%、平台 20%
fn finance_snapshot(price: Decimal) -> FinanceSnapshot {
    let fee_rate: Decimal = PLATFORM_FEE_RATE.parse().unwrap_or_default();
    let platform_fee = (price * fee_rate).round_dp(2);
    let courier_payout = price - platform_fee;
    FinanceSnapshot {
        client_price: price,
        courier_payout,
        platform_fee,
        margin: platform_fee,
    }
}

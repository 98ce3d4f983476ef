//! Order Model — the central aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Order lifecycle status
///
/// 合法流转见 api-server 的状态机模块；`Completed` 与 `Cancelled` 为终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time monetary breakdown, recorded at completion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSnapshot {
    pub client_price: Decimal,
    pub courier_payout: Decimal,
    pub platform_fee: Decimal,
    pub margin: Decimal,
}

/// Order entity
///
/// Invariant: `courier_id` is set iff status ∈ {assigned, in_progress,
/// completed} — cancellation may keep the courier reference, but
/// `cancelled` is terminal regardless.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    /// Owner — immutable after creation
    pub client_id: i64,
    /// Set exactly once by assignment
    pub courier_id: Option<i64>,
    /// Must belong to `client_id` at creation time
    pub address_id: i64,
    pub status: OrderStatus,
    pub price: Decimal,
    pub scheduled_at: Option<i64>,
    /// Free-form pickup window, e.g. "09:00-12:00"
    pub time_window: Option<String>,
    pub completed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finance: Option<FinanceSnapshot>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

/// Order timeline event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventType {
    Created,
    Assigned,
    StatusChanged,
    Started,
    Completed,
    Cancelled,
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Assigned => "assigned",
            Self::StatusChanged => "status_changed",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Append-only per-order timeline entry — never mutated or deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    pub id: i64,
    pub order_id: i64,
    pub event_type: OrderEventType,
    /// None for system-driven events
    pub performed_by: Option<i64>,
    pub metadata: Value,
    pub created_at: i64,
}

/// Create order payload (`POST /api/orders`)
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    pub address_id: i64,
    #[validate(range(min = 0.0))]
    pub price: f64,
    pub scheduled_at: Option<i64>,
    pub time_window: Option<String>,
}

/// Generic order patch (`PATCH /api/orders/:id`)
///
/// A requested `status` change still goes through the transition table.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub scheduled_at: Option<i64>,
    pub time_window: Option<String>,
}

/// Assignment payload (`POST /api/orders/:id/assign`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub courier_id: i64,
}

/// Cancellation payload (`POST /api/orders/:id/cancel`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub reason: Option<String>,
}

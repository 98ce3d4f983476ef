//! Courier Profile Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    Busy,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

/// One-to-one extension of a courier user
///
/// `completed_orders_count` 单调递增，订单完成时 +1，永不回退。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierProfile {
    pub user_id: i64,
    pub availability_status: AvailabilityStatus,
    pub verification_status: VerificationStatus,
    pub rating: Option<Decimal>,
    pub completed_orders_count: u32,
    pub updated_at: i64,
}

impl CourierProfile {
    /// Fresh profile for a newly registered courier
    pub fn new(user_id: i64, now: i64) -> Self {
        Self {
            user_id,
            availability_status: AvailabilityStatus::Offline,
            verification_status: VerificationStatus::Pending,
            rating: None,
            completed_orders_count: 0,
            updated_at: now,
        }
    }
}

/// Courier self-service profile patch (`PATCH /api/courier/profile`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierProfileUpdate {
    pub availability_status: Option<AvailabilityStatus>,
}

/// 资质审核裁决（`PATCH /api/courier/{id}/verification`，staff 专用）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationUpdate {
    pub verification_status: VerificationStatus,
}

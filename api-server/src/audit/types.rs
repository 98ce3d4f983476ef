//! 审计日志类型定义
//!
//! 所有条目不可变、不可删除，支持 SHA256 哈希链防篡改。

use serde::{Deserialize, Serialize};

use super::diff::FieldChange;

/// 审计操作类型（枚举，非自由文本）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // ═══ 用户管理 ═══
    /// 用户封禁
    UserBlocked,
    /// 用户解封
    UserUnblocked,
    /// 用户更新（状态以外的字段）
    UserUpdated,
    /// 用户软删除
    UserDeleted,
    /// 角色授予
    UserRoleAssigned,
    /// 角色回收
    UserRoleRevoked,

    // ═══ 角色 ═══
    RoleCreated,
    RoleUpdated,
    RoleDeleted,

    // ═══ 快递员 ═══
    /// 资质审核结果变更
    CourierVerificationChanged,

    // ═══ 订单（特权路径）═══
    OrderAssigned,
    OrderStatusChanged,
    OrderCancelled,

    // ═══ 集成 ═══
    WebhookCreated,
    WebhookUpdated,
    WebhookDeleted,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 审计日志条目（不可变）
///
/// 每条记录包含 SHA256 哈希链：
/// - `prev_hash`: 前一条记录的哈希
/// - `curr_hash`: 当前记录的哈希（包含 prev_hash + 所有字段）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// 全局递增序列号（唯一标识）
    pub sequence: u64,
    /// 时间戳（Unix 毫秒）
    pub timestamp: i64,
    /// 操作类型
    pub action: AuditAction,
    /// 实体类型（如 "order", "user", "role"）
    pub entity_type: String,
    /// 实体 ID
    pub entity_id: String,
    /// 操作人 ID（系统事件为 None）
    pub operator_id: Option<i64>,
    /// 操作人标识（手机号）
    pub operator_name: Option<String>,
    /// 字段级差异 — 仅包含实际变化的字段
    pub changes: Vec<FieldChange>,
    /// 结构化详情（JSON）
    pub metadata: serde_json::Value,
    /// 前一条审计日志哈希
    pub prev_hash: String,
    /// 当前记录哈希（SHA256）
    pub curr_hash: String,
}

/// 审计日志查询参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    /// 起始时间（Unix 毫秒，含）
    pub from: Option<i64>,
    /// 截止时间（Unix 毫秒，含）
    pub to: Option<i64>,
    /// 操作类型过滤
    pub action: Option<AuditAction>,
    /// 操作人 ID 过滤
    pub operator_id: Option<i64>,
    /// 实体类型过滤
    pub entity_type: Option<String>,
    /// 分页
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// 审计链验证结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditChainVerification {
    /// 验证的记录总数
    pub total_entries: u64,
    /// 链是否完整
    pub chain_intact: bool,
    /// 断裂点列表
    pub breaks: Vec<AuditChainBreak>,
}

/// 审计链断裂点
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditChainBreak {
    /// 断裂处的序列号
    pub sequence: u64,
    /// 期望的 prev_hash
    pub expected_prev_hash: String,
    /// 实际的 prev_hash
    pub actual_prev_hash: String,
}

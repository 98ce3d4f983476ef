//! Permission Definitions
//!
//! 扁平 RBAC 权限目录：点分能力字符串，无通配符、无角色继承。
//! 用户的有效权限集 = 其所有角色权限的并集，每次鉴权重新计算。

/// 全部可配置权限
pub const ALL_PERMISSIONS: &[&str] = &[
    // === 订单 ===
    "orders.assign",   // 指派快递员
    "orders.manage",   // 任意状态流转 / 取消任意订单
    "orders.read_all", // 查看所有订单（非本人参与）

    // === 用户与角色 ===
    "users.manage", // 封禁/解封/软删用户
    "roles.manage", // 角色与授权边管理

    // === 快递员 ===
    "couriers.verify", // 审核快递员资质

    // === 审计与集成 ===
    "audit.read",      // 审计日志查询
    "webhooks.manage", // Webhook 订阅管理
];

/// 默认角色与权限（首次启动播种）
pub const DEFAULT_ROLES: &[(&str, &str, &[&str])] = &[
    ("admin", "Full platform administration", ALL_PERMISSIONS),
    (
        "dispatcher",
        "Order assignment and courier operations",
        &["orders.assign", "orders.read_all", "couriers.verify"],
    ),
    (
        "support",
        "Read-only incident investigation",
        &["orders.read_all", "audit.read"],
    ),
];

/// Validate if a permission string is known
pub fn is_valid_permission(permission: &str) -> bool {
    ALL_PERMISSIONS.contains(&permission)
}

//! 审计日志模块 — 防篡改的特权操作追踪
//!
//! # 架构
//!
//! ```text
//! 特权操作 → AuditService::log() → Store (audit_log, append-only)
//!
//! SHA256 哈希链: genesis → entry₁ → entry₂ → ... → entryₙ
//! ```
//!
//! # 保证
//!
//! - **SHA256 哈希链**: 每条记录包含前一条的哈希
//! - **Append-only**: 无删除/更新接口
//! - **同步尽力写**: 与变更同一逻辑单元内写入；失败记日志、不回滚变更
//! - **链验证 API**: 可随时验证完整性
//!
//! 与 OrderEvent 的区别：AuditLog 面向合规，按操作者跨实体记录 staff 行为；
//! OrderEvent 是单个订单对参与者可见的业务时间线。

pub mod diff;
pub mod service;
pub mod types;

pub use diff::{FieldChange, diff_changes, snapshot_changes};
pub use service::{AuditRecord, AuditService, GENESIS_HASH};
pub use types::{AuditAction, AuditChainBreak, AuditChainVerification, AuditEntry, AuditQuery};

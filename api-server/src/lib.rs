//! Haul API Server - 上门回收市场平台后端
//!
//! # 架构概述
//!
//! 本模块是市场平台 API 的主入口，提供以下核心功能：
//!
//! - **认证** (`auth`): JWT 双令牌 + Argon2 认证、会话生命周期
//! - **RBAC** (`rbac`): 角色 → 权限扁平授权引擎
//! - **订单** (`orders`): 订单状态机与副作用
//! - **审计** (`audit`): 哈希链审计日志
//! - **Webhook** (`webhooks`): 签名事件推送
//! - **存储** (`store`): 存储抽象与内存后端
//!
//! # 模块结构
//!
//! ```text
//! api-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证、会话、权限
//! ├── rbac/          # 有效权限计算
//! ├── middleware/    # 语言协商、沙箱、幂等、限流
//! ├── orders/        # 订单状态机
//! ├── audit/         # 审计日志
//! ├── webhooks/      # 事件推送
//! ├── store/         # 存储层
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod middleware;
pub mod orders;
pub mod rbac;
pub mod routes;
pub mod store;
pub mod utils;
pub mod webhooks;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use shared::{AppError, AppResult};
pub use store::{MemoryStore, Store};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 字段原样透传，支持 tracing 的 % / ? 说明符
#[macro_export]
macro_rules! security_log {
    (WARN, $event:expr, $($arg:tt)*) => {
        tracing::warn!(
            target: "security",
            event = $event,
            timestamp = chrono::Utc::now().to_rfc3339(),
            level = "WARN",
            $($arg)*
        );
    };
    (ERROR, $event:expr, $($arg:tt)*) => {
        tracing::error!(
            target: "security",
            event = $event,
            timestamp = chrono::Utc::now().to_rfc3339(),
            level = "ERROR",
            $($arg)*
        );
    };
    (INFO, $event:expr, $($arg:tt)*) => {
        tracing::info!(
            target: "security",
            event = $event,
            timestamp = chrono::Utc::now().to_rfc3339(),
            level = "INFO",
            $($arg)*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
    __  __            __
   / / / /___ ___  __/ /
  / /_/ / __ `/ / / / /
 / __  / /_/ / /_/ / /
/_/ /_/\__,_/\__,_/_/
    "#
    );
}

//! HTTP 中间件
//!
//! 七步请求链的横切部分（认证与权限在 `auth::middleware`）：
//! - [`language`] - Accept-Language 协商，向错误信息提供 locale
//! - [`sandbox`] - `X-Sandbox: true` 试运行写隔离
//! - [`idempotency`] - `Idempotency-Key` 响应缓存与并发去重
//! - [`rate_limit`] - 认证接口固定窗口限流
//! - [`logging`] - 请求级结构化日志

pub mod idempotency;
pub mod language;
pub mod logging;
pub mod rate_limit;
pub mod sandbox;

pub use idempotency::{IdempotencyCache, idempotency_layer};
pub use language::{Language, negotiate_language};
pub use logging::log_request;
pub use rate_limit::{RateLimiter, auth_rate_limit};
pub use sandbox::{SandboxFlag, sandbox_guard};

//! 认证授权模块
//!
//! 提供 JWT 双令牌认证、会话生命周期、权限目录和中间件：
//! - [`JwtService`] - 访问/刷新令牌服务
//! - [`SessionService`] - 会话签发、轮换、吊销
//! - [`CurrentUser`] - 当前用户上下文（含逐请求解析的有效权限集）
//! - [`require_auth`] / [`require_permissions`] / [`require_user_type`] - 中间件

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod permissions;
pub mod session;

pub use jwt::{Claims, JwtConfig, JwtError, JwtService, TokenPair, TokenType};
pub use middleware::{CurrentUser, require_auth, require_permissions, require_user_type};
pub use session::SessionService;

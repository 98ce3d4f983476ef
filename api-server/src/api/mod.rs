//! HTTP API 模块
//!
//! 每个领域一个子模块：`mod.rs` 组路由并挂权限 route_layer，
//! `handler.rs` 只做参数校验、调服务、封包响应。

pub mod addresses;
pub mod audit_logs;
pub mod auth;
pub mod courier;
pub mod health;
pub mod orders;
pub mod roles;
pub mod users;
pub mod webhooks;

//! 订单模块 — 状态机、流转服务与副作用
//!
//! 状态流转唯一入口是 [`OrderService`]：先查静态流转表，再做存储层
//! CAS，成功后追加订单事件、写审计（特权路径）、推送 webhook。
//! 副作用不回滚已提交的流转。

pub mod service;
pub mod state_machine;

pub use service::OrderService;
pub use state_machine::can_transition;

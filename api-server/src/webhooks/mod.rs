//! Webhook 事件推送模块
//!
//! 订单副作用以领域事件形式进入 mpsc 队列，由后台 worker 异步投递。
//! 投递绝不阻塞请求路径；失败重试有限次后放弃，结果落投递记录。

pub mod dispatcher;

pub use dispatcher::{DomainEvent, WebhookDispatcher, sign_payload};

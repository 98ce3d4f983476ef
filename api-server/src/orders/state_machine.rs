//! 订单状态机 — 静态流转表
//!
//! ```text
//! created ──→ assigned ──→ in_progress ──→ completed
//!    │            │             │
//!    └────────────┴─────────────┴──→ cancelled
//! ```
//!
//! 终态（completed / cancelled）无出边。表外的一切流转非法，
//! 包括自环与回退。

use shared::models::OrderStatus;

/// 合法流转邻接表
const TRANSITIONS: &[(OrderStatus, &[OrderStatus])] = &[
    (
        OrderStatus::Created,
        &[OrderStatus::Assigned, OrderStatus::Cancelled],
    ),
    (
        OrderStatus::Assigned,
        &[OrderStatus::InProgress, OrderStatus::Cancelled],
    ),
    (
        OrderStatus::InProgress,
        &[OrderStatus::Completed, OrderStatus::Cancelled],
    ),
    (OrderStatus::Completed, &[]),
    (OrderStatus::Cancelled, &[]),
];

/// 查表判断 `from → to` 是否合法
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    TRANSITIONS
        .iter()
        .find(|(status, _)| *status == from)
        .is_some_and(|(_, targets)| targets.contains(&to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_happy_path() {
        assert!(can_transition(Created, Assigned));
        assert!(can_transition(Assigned, InProgress));
        assert!(can_transition(InProgress, Completed));
    }

    #[test]
    fn test_cancellation_from_non_terminal() {
        assert!(can_transition(Created, Cancelled));
        assert!(can_transition(Assigned, Cancelled));
        assert!(can_transition(InProgress, Cancelled));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for to in [Created, Assigned, InProgress, Completed, Cancelled] {
            assert!(!can_transition(Completed, to));
            assert!(!can_transition(Cancelled, to));
        }
    }

    #[test]
    fn test_no_skipping_or_backwards() {
        assert!(!can_transition(Created, InProgress));
        assert!(!can_transition(Created, Completed));
        assert!(!can_transition(Assigned, Created));
        assert!(!can_transition(InProgress, Assigned));
    }

    #[test]
    fn test_no_self_loops() {
        for s in [Created, Assigned, InProgress, Completed, Cancelled] {
            assert!(!can_transition(s, s));
        }
    }
}

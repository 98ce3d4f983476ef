//! 审计日志字段 diff 计算
//!
//! 通过比较更新前后的实体 JSON 值生成变更差异。
//! 只记录实际变化的字段；无变化返回空列表（调用方据此跳过审计条目）。

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// 敏感/噪音字段 — 永不进入审计 diff
const EXCLUDED_FIELDS: &[&str] = &["id", "passwordHash", "refreshTokenHash", "secret", "updatedAt"];

/// 字段变更记录 `{field, from, to}`
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub from: Value,
    pub to: Value,
}

/// 比较两个可序列化实体，产出字段级差异
///
/// 顶层字段逐一比较；嵌套对象/数组按整体值比较。
/// 序列化失败返回空差异（审计为尽力而为，不让 diff 失败阻断变更）。
pub fn diff_changes<T: Serialize>(before: &T, after: &T) -> Vec<FieldChange> {
    let (Ok(before), Ok(after)) = (serde_json::to_value(before), serde_json::to_value(after))
    else {
        return Vec::new();
    };
    diff_values(&before, &after)
}

/// 为新建实体生成快照式变更（from 均为 null）
pub fn snapshot_changes<T: Serialize>(entity: &T) -> Vec<FieldChange> {
    let Ok(value) = serde_json::to_value(entity) else {
        return Vec::new();
    };
    diff_values(&Value::Null, &value)
}

fn diff_values(before: &Value, after: &Value) -> Vec<FieldChange> {
    let empty = serde_json::Map::new();
    let before_obj = before.as_object().unwrap_or(&empty);
    let after_obj = after.as_object().unwrap_or(&empty);

    let mut keys: BTreeSet<&String> = before_obj.keys().collect();
    keys.extend(after_obj.keys());

    let mut changes = Vec::new();
    for key in keys {
        if EXCLUDED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let from = before_obj.get(key).cloned().unwrap_or(Value::Null);
        let to = after_obj.get(key).cloned().unwrap_or(Value::Null);
        if from != to {
            changes.push(FieldChange {
                field: key.clone(),
                from,
                to,
            });
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_noop_update_produces_no_changes() {
        let a = json!({"status": "active", "email": "a@b.c"});
        let changes = diff_values(&a, &a.clone());
        assert!(changes.is_empty());
    }

    #[test]
    fn test_only_changed_fields_recorded() {
        let before = json!({"status": "active", "email": "a@b.c"});
        let after = json!({"status": "blocked", "email": "a@b.c"});
        let changes = diff_values(&before, &after);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "status");
        assert_eq!(changes[0].from, "active");
        assert_eq!(changes[0].to, "blocked");
    }

    #[test]
    fn test_sensitive_fields_excluded() {
        let before = json!({"passwordHash": "x", "status": "active"});
        let after = json!({"passwordHash": "y", "status": "active"});
        assert!(diff_values(&before, &after).is_empty());
    }

    #[test]
    fn test_added_and_removed_fields() {
        let before = json!({"email": "a@b.c"});
        let after = json!({"phone": "+1"});
        let changes = diff_values(&before, &after);
        assert_eq!(changes.len(), 2);
    }
}

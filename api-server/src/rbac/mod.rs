//! RBAC permission resolution
//!
//! 有效权限集 = 用户全部角色权限的并集，从存储实时计算。
//! 结果不缓存、不写入 JWT：角色/授权边变更在下一次检查立即生效。

use std::collections::BTreeSet;
use std::sync::Arc;

use shared::AppResult;

use crate::store::Store;

/// Compute the user's effective permission set
///
/// 无角色用户返回空集（普通 client/courier 的常态，路由按身份类型放行）。
pub async fn effective_permissions(
    store: &Arc<dyn Store>,
    user_id: i64,
) -> AppResult<BTreeSet<String>> {
    let mut permissions = BTreeSet::new();
    for role in store.user_roles(user_id).await? {
        permissions.extend(store.role_permissions(role.id).await?);
    }
    Ok(permissions)
}

/// AND 语义检查：缺一即拒
///
/// 返回缺失的权限列表（空表示全部满足）。错误响应只点名端点要求的权限，
/// 不回显用户实际持有的集合。
pub fn missing_permissions<'a>(
    held: &BTreeSet<String>,
    required: &'a [&'a str],
) -> Vec<&'a str> {
    required
        .iter()
        .filter(|p| !held.contains(**p))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shared::models::Role;
    use shared::util::{now_millis, snowflake_id};

    async fn seed_role(store: &Arc<dyn Store>, name: &str, perms: &[&str]) -> i64 {
        let role = store
            .create_role(
                Role {
                    id: snowflake_id(),
                    name: name.to_string(),
                    description: None,
                    created_at: now_millis(),
                },
                perms.iter().map(|p| p.to_string()).collect(),
            )
            .await
            .unwrap();
        role.id
    }

    #[tokio::test]
    async fn test_union_across_roles() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let a = seed_role(&store, "a", &["orders.assign", "orders.read_all"]).await;
        let b = seed_role(&store, "b", &["orders.read_all", "audit.read"]).await;
        store.assign_user_role(1, a).await.unwrap();
        store.assign_user_role(1, b).await.unwrap();

        let perms = effective_permissions(&store, 1).await.unwrap();
        assert_eq!(perms.len(), 3);
        assert!(perms.contains("audit.read"));
    }

    #[tokio::test]
    async fn test_revocation_is_immediate() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let a = seed_role(&store, "a", &["users.manage"]).await;
        store.assign_user_role(1, a).await.unwrap();
        assert!(
            effective_permissions(&store, 1)
                .await
                .unwrap()
                .contains("users.manage")
        );

        store.revoke_user_role(1, a).await.unwrap();
        assert!(effective_permissions(&store, 1).await.unwrap().is_empty());
    }

    #[test]
    fn test_missing_permissions_names_required_only() {
        let held: BTreeSet<String> = ["orders.read_all".to_string()].into_iter().collect();
        let missing = missing_permissions(&held, &["orders.read_all", "orders.assign"]);
        assert_eq!(missing, vec!["orders.assign"]);
    }
}

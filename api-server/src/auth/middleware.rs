//! 认证中间件
//!
//! `require_auth` 完成七步链中的认证与上下文注入：
//! Bearer 提取 → access token 校验 → 实时加载用户 → 拒绝封禁/已删除 →
//! 重新计算有效权限集 → 写入 [`CurrentUser`] 扩展。
//! 权限/身份检查由 `require_permissions` / `require_user_type` 作为
//! route_layer 叠加，二者只读扩展、不再触存储。

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use shared::AppError;
use shared::models::UserType;

use super::jwt::{JwtService, TokenType};
use crate::core::ServerState;
use crate::rbac::{effective_permissions, missing_permissions};
use crate::security_log;

/// 当前请求的用户上下文
///
/// 由 `require_auth` 在每个请求上新建；权限集来自存储的实时解析，
/// 角色变更在下一个请求立即生效。
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub user_type: UserType,
    pub phone: String,
    pub permissions: BTreeSet<String>,
}

impl CurrentUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn is_staff(&self) -> bool {
        self.user_type == UserType::Staff
    }
}

/// 认证中间件 — 失败一律 401 `NOT_AUTHENTICATED`
pub async fn require_auth(
    State(state): State<Arc<ServerState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(AppError::unauthenticated)?;

    let token = JwtService::extract_from_header(header).ok_or_else(|| {
        security_log!(WARN, "auth.malformed_header", path = req.uri().path());
        AppError::unauthenticated()
    })?;

    let claims = state
        .jwt
        .validate(token, TokenType::Access)
        .map_err(|e| {
            security_log!(WARN, "auth.invalid_token", reason = %e, path = req.uri().path());
            AppError::unauthenticated()
        })?;
    let user_id = claims.user_id().map_err(|_| AppError::unauthenticated())?;

    // 令牌有效不等于账户可用：每个请求都重新取用户
    let user = state
        .store
        .user_by_id(user_id)
        .await?
        .ok_or_else(AppError::unauthenticated)?;

    if user.is_deleted() {
        security_log!(WARN, "auth.deleted_user", user_id = user_id);
        return Err(AppError::unauthenticated());
    }
    if user.is_blocked() {
        security_log!(WARN, "auth.blocked_user", user_id = user_id);
        return Err(AppError::new(shared::ErrorCode::AccountBlocked));
    }

    let permissions = effective_permissions(&state.store, user.id).await?;

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        user_type: user.user_type,
        phone: user.phone,
        permissions,
    });

    Ok(next.run(req).await)
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// 权限检查 route_layer（AND 语义）
///
/// 403 响应只点名端点要求的权限，不回显用户持有的集合。
pub fn require_permissions(
    required: &'static [&'static str],
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(AppError::unauthenticated)?;

            let missing = missing_permissions(&user.permissions, required);
            if !missing.is_empty() {
                security_log!(
                    WARN,
                    "auth.permission_denied",
                    user_id = user.id,
                    required = ?required,
                    path = req.uri().path()
                );
                return Err(AppError::permission_denied(required));
            }
            Ok(next.run(req).await)
        })
    }
}

/// 身份类型检查 route_layer（快递员专属路由等）
pub fn require_user_type(
    allowed: &'static [UserType],
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(AppError::unauthenticated)?;

            if !allowed.contains(&user.user_type) {
                security_log!(
                    WARN,
                    "auth.user_type_denied",
                    user_id = user.id,
                    user_type = %user.user_type,
                    path = req.uri().path()
                );
                let names: Vec<&str> = allowed.iter().map(|t| t.as_str()).collect();
                return Err(AppError::user_type_denied(&names));
            }
            Ok(next.run(req).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(perms: &[&str]) -> CurrentUser {
        CurrentUser {
            id: 1,
            user_type: UserType::Staff,
            phone: "+10000000000".to_string(),
            permissions: perms.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_has_permission() {
        let user = test_user(&["orders.assign"]);
        assert!(user.has_permission("orders.assign"));
        assert!(!user.has_permission("orders.manage"));
    }

    #[test]
    fn test_and_semantics_via_missing() {
        let user = test_user(&["orders.assign"]);
        let missing = missing_permissions(&user.permissions, &["orders.assign", "audit.read"]);
        assert_eq!(missing, vec!["audit.read"]);
    }
}

//! Roles API Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use serde_json::json;
use validator::Validate;

use shared::models::{Role, RoleCreate, RoleUpdate};
use shared::util::{now_millis, snowflake_id};
use shared::{ApiResponse, AppError, AppResult, ErrorCode};

use crate::audit::{AuditAction, AuditRecord};
use crate::auth::CurrentUser;
use crate::auth::permissions::{ALL_PERMISSIONS, is_valid_permission};
use crate::core::ServerState;

/// 权限串必须在目录内
fn validate_permissions(permissions: &[String]) -> AppResult<()> {
    for permission in permissions {
        if !is_valid_permission(permission) {
            return Err(AppError::validation("permissions", format!("unknown: {permission}")));
        }
    }
    Ok(())
}

/// 角色 + 权限边的组合视图
fn role_view(role: &Role, permissions: &[String]) -> serde_json::Value {
    json!({
        "id": role.id,
        "name": role.name,
        "description": role.description,
        "createdAt": role.created_at,
        "permissions": permissions,
    })
}

/// GET /api/permissions - 权限目录
pub async fn all_permissions() -> Json<ApiResponse<Vec<&'static str>>> {
    Json(ApiResponse::ok(ALL_PERMISSIONS.to_vec()))
}

/// GET /api/roles
pub async fn list(
    State(state): State<Arc<ServerState>>,
) -> AppResult<Json<ApiResponse<Vec<serde_json::Value>>>> {
    let roles = state.store.list_roles().await?;
    let mut views = Vec::with_capacity(roles.len());
    for role in &roles {
        let permissions = state.store.role_permissions(role.id).await?;
        views.push(role_view(role, &permissions));
    }
    Ok(Json(ApiResponse::ok(views)))
}

/// POST /api/roles
pub async fn create(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<RoleCreate>,
) -> AppResult<(StatusCode, Json<ApiResponse<serde_json::Value>>)> {
    payload.validate()?;
    validate_permissions(&payload.permissions)?;

    if state.store.role_by_name(&payload.name).await?.is_some() {
        return Err(AppError::new(ErrorCode::AlreadyExists).with_param("resource", "role"));
    }

    let role = state
        .store
        .create_role(
            Role {
                id: snowflake_id(),
                name: payload.name,
                description: payload.description,
                created_at: now_millis(),
            },
            payload.permissions.clone(),
        )
        .await?;

    state
        .audit
        .log(
            Some(&current_user),
            AuditRecord::new(AuditAction::RoleCreated, "role", role.id)
                .with_metadata(json!({"name": role.name, "permissions": payload.permissions})),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(role_view(&role, &payload.permissions))),
    ))
}

/// PATCH /api/roles/{id} - 更名/改描述/整组替换权限边
pub async fn update(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<RoleUpdate>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut role = state
        .store
        .role_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("role"))?;
    let old_permissions = state.store.role_permissions(id).await?;

    if let Some(name) = payload.name {
        role.name = name;
    }
    if let Some(description) = payload.description {
        role.description = Some(description);
    }
    let role = state.store.update_role(&role).await?;

    let permissions = if let Some(new_permissions) = payload.permissions {
        validate_permissions(&new_permissions)?;
        state
            .store
            .set_role_permissions(id, new_permissions.clone())
            .await?;
        new_permissions
    } else {
        old_permissions.clone()
    };

    state
        .audit
        .log(
            Some(&current_user),
            AuditRecord::new(AuditAction::RoleUpdated, "role", role.id).with_metadata(json!({
                "name": role.name,
                "permissionsBefore": old_permissions,
                "permissionsAfter": permissions,
            })),
        )
        .await;

    Ok(Json(ApiResponse::ok(role_view(&role, &permissions))))
}

/// DELETE /api/roles/{id} - 删除角色（级联清授权边）
pub async fn delete(
    State(state): State<Arc<ServerState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let role = state
        .store
        .role_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("role"))?;
    state.store.delete_role(id).await?;

    state
        .audit
        .log(
            Some(&current_user),
            AuditRecord::new(AuditAction::RoleDeleted, "role", id)
                .with_metadata(json!({"name": role.name})),
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}

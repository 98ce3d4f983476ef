//! Audit Logs API Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use shared::{ApiResponse, AppResult, PageMeta, Paginated};

use crate::audit::{AuditChainVerification, AuditEntry, AuditQuery};
use crate::core::ServerState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// GET /api/audit-logs - 分页查询（时间/操作/操作人/实体过滤）
pub async fn list(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<Paginated<AuditEntry>>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(50).clamp(1, 200);
    let (entries, total) = state.audit.query(&query).await?;
    Ok(Json(Paginated {
        data: entries,
        meta: PageMeta::new(page, per_page, total),
    }))
}

/// GET /api/audit-logs/verify - 哈希链完整性验证
pub async fn verify(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<VerifyQuery>,
) -> AppResult<Json<ApiResponse<AuditChainVerification>>> {
    let report = state.audit.verify_chain(query.from, query.to).await?;
    Ok(Json(ApiResponse::ok(report)))
}

//! 审计日志服务
//!
//! 追加与链验证。追加持全局互斥锁以保证 `sequence` 与 `prev_hash`
//! 的全序；锁内只有读尾 + 计算哈希 + 单次写入。
//! 失败时记录日志并返回 None — 审计不得阻断业务变更。

use std::sync::Arc;

use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use shared::AppResult;
use shared::util::now_millis;

use super::diff::FieldChange;
use super::types::{
    AuditAction, AuditChainBreak, AuditChainVerification, AuditEntry, AuditQuery,
};
use crate::auth::CurrentUser;
use crate::store::Store;

/// 创世锚：首条记录的 prev_hash
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// 单条审计写入的输入
pub struct AuditRecord {
    pub action: AuditAction,
    pub entity_type: &'static str,
    pub entity_id: String,
    pub changes: Vec<FieldChange>,
    pub metadata: Value,
}

impl AuditRecord {
    pub fn new(action: AuditAction, entity_type: &'static str, entity_id: impl ToString) -> Self {
        Self {
            action,
            entity_type,
            entity_id: entity_id.to_string(),
            changes: Vec::new(),
            metadata: Value::Null,
        }
    }

    pub fn with_changes(mut self, changes: Vec<FieldChange>) -> Self {
        self.changes = changes;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Audit log service
pub struct AuditService {
    store: Arc<dyn Store>,
    /// 串行化追加，保证链的全序
    append_lock: Mutex<()>,
}

impl AuditService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            append_lock: Mutex::new(()),
        }
    }

    /// 追加一条审计记录（尽力而为）
    ///
    /// 空 diff 的更新类记录跳过写入。失败不向调用方传播。
    pub async fn log(&self, operator: Option<&CurrentUser>, record: AuditRecord) -> Option<AuditEntry> {
        match self.append(operator, record).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::error!("audit append failed: {}", e);
                None
            }
        }
    }

    async fn append(
        &self,
        operator: Option<&CurrentUser>,
        record: AuditRecord,
    ) -> AppResult<Option<AuditEntry>> {
        let _guard = self.append_lock.lock().await;

        let (sequence, prev_hash) = match self.store.last_audit_meta().await? {
            Some((seq, hash)) => (seq + 1, hash),
            None => (1, GENESIS_HASH.to_string()),
        };

        let mut entry = AuditEntry {
            sequence,
            timestamp: now_millis(),
            action: record.action,
            entity_type: record.entity_type.to_string(),
            entity_id: record.entity_id,
            operator_id: operator.map(|u| u.id),
            operator_name: operator.map(|u| u.phone.clone()),
            changes: record.changes,
            metadata: record.metadata,
            prev_hash,
            curr_hash: String::new(),
        };
        entry.curr_hash = compute_hash(&entry);

        let entry = self.store.append_audit(entry).await?;
        Ok(Some(entry))
    }

    /// 分页查询，过滤条件见 [`AuditQuery`]
    pub async fn query(&self, query: &AuditQuery) -> AppResult<(Vec<AuditEntry>, u64)> {
        Ok(self.store.query_audit(query).await?)
    }

    /// 验证哈希链完整性
    ///
    /// 逐条重算 curr_hash 并核对 prev_hash 衔接；
    /// 指定时间范围时首条只重算自身，不回溯范围之前的链。
    pub async fn verify_chain(
        &self,
        from: Option<i64>,
        to: Option<i64>,
    ) -> AppResult<AuditChainVerification> {
        let entries = self.store.audit_chain(from, to).await?;
        let mut breaks = Vec::new();
        let mut expected_prev: Option<String> = None;

        for entry in &entries {
            let recomputed = compute_hash(entry);
            if recomputed != entry.curr_hash {
                breaks.push(AuditChainBreak {
                    sequence: entry.sequence,
                    expected_prev_hash: recomputed,
                    actual_prev_hash: entry.curr_hash.clone(),
                });
            }
            if let Some(expected) = &expected_prev {
                if &entry.prev_hash != expected {
                    breaks.push(AuditChainBreak {
                        sequence: entry.sequence,
                        expected_prev_hash: expected.clone(),
                        actual_prev_hash: entry.prev_hash.clone(),
                    });
                }
            } else if from.is_none() && entry.prev_hash != GENESIS_HASH && entry.sequence == 1 {
                breaks.push(AuditChainBreak {
                    sequence: entry.sequence,
                    expected_prev_hash: GENESIS_HASH.to_string(),
                    actual_prev_hash: entry.prev_hash.clone(),
                });
            }
            expected_prev = Some(entry.curr_hash.clone());
        }

        Ok(AuditChainVerification {
            total_entries: entries.len() as u64,
            chain_intact: breaks.is_empty(),
            breaks,
        })
    }
}

/// SHA256(sequence | timestamp | action | entity | operator | changes | metadata | prev_hash)
fn compute_hash(entry: &AuditEntry) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entry.sequence.to_be_bytes());
    hasher.update(entry.timestamp.to_be_bytes());
    hasher.update(entry.action.to_string().as_bytes());
    hasher.update(entry.entity_type.as_bytes());
    hasher.update(entry.entity_id.as_bytes());
    if let Some(id) = entry.operator_id {
        hasher.update(id.to_be_bytes());
    }
    if let Ok(changes) = serde_json::to_vec(&entry.changes) {
        hasher.update(&changes);
    }
    if let Ok(metadata) = serde_json::to_vec(&entry.metadata) {
        hasher.update(&metadata);
    }
    hasher.update(entry.prev_hash.as_bytes());
    hex::encode(hasher.finalize())
}

//! Session Model

use serde::{Deserialize, Serialize};

/// Device session — one per authenticated device
///
/// 只保存 refresh token 的 sha256 哈希，原始 token 不落库。
/// 删除会话即作废对应的 refresh token（即使其签名尚未过期）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    /// sha256(refresh token), hex — never the raw token
    #[serde(skip_serializing, default)]
    pub refresh_token_hash: String,
    pub device_id: Option<String>,
    pub platform: Option<String>,
    pub created_at: i64,
    /// Refreshed on every token rotation
    pub last_seen_at: i64,
    /// Session is dead past this point even if the row survives
    pub expires_at: i64,
}

impl Session {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

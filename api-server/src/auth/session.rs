//! 会话服务 — 设备会话与 refresh token 轮换
//!
//! 每个已认证设备对应一条会话行，只落库 refresh token 的 sha256。
//! 刷新是单次使用：成功即轮换哈希，旧 token 立刻作废；
//! 任何失败（未知哈希、过期、用户不可用）对外一律 `NOT_AUTHENTICATED`，
//! 细节只进服务端日志。

use std::sync::Arc;

use sha2::{Digest, Sha256};

use shared::models::{Session, User, UserStatus};
use shared::util::{now_millis, snowflake_id};
use shared::{AppError, AppResult};

use super::jwt::{JwtService, TokenPair, TokenType};
use crate::store::Store;

/// hex(sha256(token)) — 会话行中唯一的 token 形态
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Session lifecycle service
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn Store>,
    jwt: Arc<JwtService>,
}

impl SessionService {
    pub fn new(store: Arc<dyn Store>, jwt: Arc<JwtService>) -> Self {
        Self { store, jwt }
    }

    /// 签发令牌对并创建会话行（注册/登录共用）
    pub async fn issue_for_user(
        &self,
        user: &User,
        device_id: Option<String>,
        platform: Option<String>,
    ) -> AppResult<TokenPair> {
        let pair = self
            .jwt
            .issue_pair(user.id, user.user_type)
            .map_err(|e| AppError::internal(e.to_string()))?;

        let now = now_millis();
        let session = Session {
            id: snowflake_id(),
            user_id: user.id,
            refresh_token_hash: hash_token(&pair.refresh_token),
            device_id,
            platform,
            created_at: now,
            last_seen_at: now,
            expires_at: now + self.jwt.config.refresh_days * 24 * 60 * 60 * 1000,
        };
        self.store.create_session(session).await?;
        Ok(pair)
    }

    /// 刷新令牌对（单次使用轮换）
    ///
    /// 校验顺序：签名/类型 → 会话行存在 → 会话未过期 → 用户可用。
    /// 每步失败都折叠为同一个外部错误，避免探测账户状态。
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self
            .jwt
            .validate(refresh_token, TokenType::Refresh)
            .map_err(|e| {
                tracing::debug!("refresh rejected: {}", e);
                AppError::unauthenticated()
            })?;
        let user_id = claims.user_id().map_err(|_| AppError::unauthenticated())?;

        let hash = hash_token(refresh_token);
        let Some(mut session) = self.store.session_by_token_hash(&hash).await? else {
            // 已轮换或已吊销的 token 被重放
            tracing::warn!(user_id, "refresh token replay or revoked session");
            return Err(AppError::unauthenticated());
        };

        let now = now_millis();
        if session.is_expired(now) {
            self.store.delete_session(session.id).await?;
            return Err(AppError::unauthenticated());
        }

        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .filter(|u| !u.is_deleted() && u.status == UserStatus::Active)
            .ok_or_else(|| {
                tracing::warn!(user_id, "refresh for unavailable user");
                AppError::unauthenticated()
            })?;

        let pair = self
            .jwt
            .issue_pair(user.id, user.user_type)
            .map_err(|e| AppError::internal(e.to_string()))?;

        session.refresh_token_hash = hash_token(&pair.refresh_token);
        session.last_seen_at = now;
        session.expires_at = now + self.jwt.config.refresh_days * 24 * 60 * 60 * 1000;
        self.store.update_session(&session).await?;

        Ok(pair)
    }

    /// 登出当前设备：按 refresh token 定位并删除会话
    ///
    /// 未知 token 静默成功 — 登出是幂等的。
    pub async fn revoke_by_token(&self, refresh_token: &str) -> AppResult<()> {
        let hash = hash_token(refresh_token);
        if let Some(session) = self.store.session_by_token_hash(&hash).await? {
            self.store.delete_session(session.id).await?;
        }
        Ok(())
    }

    /// 删除指定会话（须属于该用户）
    pub async fn revoke_session(&self, user_id: i64, session_id: i64) -> AppResult<()> {
        let session = self
            .store
            .session_by_id(session_id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| AppError::not_found("session"))?;
        self.store.delete_session(session.id).await?;
        Ok(())
    }

    /// 全设备登出：吊销用户全部会话，返回删除数
    pub async fn revoke_all(&self, user_id: i64) -> AppResult<u64> {
        Ok(self.store.delete_user_sessions(user_id).await?)
    }

    /// 当前用户活跃会话列表
    pub async fn list_sessions(&self, user_id: i64) -> AppResult<Vec<Session>> {
        let now = now_millis();
        let sessions = self
            .store
            .list_user_sessions(user_id)
            .await?
            .into_iter()
            .filter(|s| !s.is_expired(now))
            .collect();
        Ok(sessions)
    }
}

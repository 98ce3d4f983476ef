//! Error codes and their wire-level mapping
//!
//! Each [`ErrorCode`] maps to a stable i18n key and an HTTP status.
//! Keys are part of the public API contract — never rename a shipped key.

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Error classification by domain
///
/// Used for logging decisions (System errors are logged at `error` level
/// before leaving the process) and coarse client handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Auth,
    Permission,
    Resource,
    Conflict,
    Throttle,
    System,
}

/// Standardized error codes
///
/// 分组与对应 HTTP 状态码：
/// - Validation → 400
/// - Auth → 401
/// - Permission/Sandbox → 403
/// - Resource → 404
/// - Conflict → 409
/// - Throttle → 429
/// - System → 500
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // ═══ Validation (400) ═══
    ValidationFailed,
    /// 指派候选人不是 courier 类型
    CandidateNotCourier,

    // ═══ Authentication (401) ═══
    /// 缺失、无效或过期的凭证 — 对外统一一个 key（防止 oracle 攻击）
    NotAuthenticated,
    InvalidCredentials,

    // ═══ Permission (403) ═══
    PermissionDenied,
    UserTypeDenied,
    NotOwner,
    AccountBlocked,
    SandboxWriteBlocked,

    // ═══ Resource (404) ═══
    NotFound,

    // ═══ Conflict (409) ═══
    AlreadyExists,
    AlreadyDeleted,
    PhoneTaken,
    EmailTaken,
    InvalidTransition,
    CourierAlreadyAssigned,

    // ═══ Throttle (429) ═══
    RateLimited,

    // ═══ System (500) ═══
    InternalError,
    StorageError,
}

impl ErrorCode {
    /// Stable machine-readable key for client-side localization
    pub fn key(&self) -> &'static str {
        match self {
            Self::ValidationFailed => "error.validation.failed",
            Self::CandidateNotCourier => "error.order.candidate_not_courier",
            Self::NotAuthenticated => "error.auth.unauthenticated",
            Self::InvalidCredentials => "error.auth.invalid_credentials",
            Self::PermissionDenied => "error.auth.permission_denied",
            Self::UserTypeDenied => "error.auth.user_type_denied",
            Self::NotOwner => "error.auth.not_owner",
            Self::AccountBlocked => "error.auth.account_blocked",
            Self::SandboxWriteBlocked => "error.sandbox.write_blocked",
            Self::NotFound => "error.resource.not_found",
            Self::AlreadyExists => "error.resource.already_exists",
            Self::AlreadyDeleted => "error.resource.already_deleted",
            Self::PhoneTaken => "error.user.phone_taken",
            Self::EmailTaken => "error.user.email_taken",
            Self::InvalidTransition => "error.order.invalid_transition",
            Self::CourierAlreadyAssigned => "error.order.courier_already_assigned",
            Self::RateLimited => "error.throttle.rate_limited",
            Self::InternalError => "error.system.internal",
            Self::StorageError => "error.system.storage",
        }
    }

    /// HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::Auth => StatusCode::UNAUTHORIZED,
            ErrorCategory::Permission => StatusCode::FORBIDDEN,
            ErrorCategory::Resource => StatusCode::NOT_FOUND,
            ErrorCategory::Conflict => StatusCode::CONFLICT,
            ErrorCategory::Throttle => StatusCode::TOO_MANY_REQUESTS,
            ErrorCategory::System => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationFailed | Self::CandidateNotCourier => ErrorCategory::Validation,
            Self::NotAuthenticated | Self::InvalidCredentials => ErrorCategory::Auth,
            Self::PermissionDenied
            | Self::UserTypeDenied
            | Self::NotOwner
            | Self::AccountBlocked
            | Self::SandboxWriteBlocked => ErrorCategory::Permission,
            Self::NotFound => ErrorCategory::Resource,
            Self::AlreadyExists
            | Self::AlreadyDeleted
            | Self::PhoneTaken
            | Self::EmailTaken
            | Self::InvalidTransition
            | Self::CourierAlreadyAssigned => ErrorCategory::Conflict,
            Self::RateLimited => ErrorCategory::Throttle,
            Self::InternalError | Self::StorageError => ErrorCategory::System,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

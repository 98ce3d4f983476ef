//! [`AppError`] and the error envelope

use super::codes::{ErrorCategory, ErrorCode};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Application error with structured error code and params
///
/// `params` are interpolated client-side into the localized message for
/// `code.key()`. `detail` is internal context for logs — it never crosses
/// the HTTP boundary.
#[derive(Debug, Clone, Error)]
#[error("{}", self.code.key())]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Interpolation params for the localized message
    pub params: Map<String, Value>,
    /// Internal detail, logged but never serialized outward
    pub detail: Option<String>,
}

impl AppError {
    /// Create a new error without params
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            params: Map::new(),
            detail: None,
        }
    }

    /// Add an interpolation param
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Attach internal detail (logs only)
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    // ==================== Convenience constructors ====================

    /// Validation error for a single field
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed)
            .with_param("field", field.into())
            .with_param("reason", reason.into())
    }

    /// Missing / soft-deleted resource
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound).with_param("resource", resource.into())
    }

    /// Missing or invalid credential (generic on purpose)
    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Wrong phone/password combination
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    /// Missing permission(s) — names only what was *required*
    pub fn permission_denied(required: &[&str]) -> Self {
        Self::new(ErrorCode::PermissionDenied).with_param(
            "required",
            Value::Array(required.iter().map(|p| Value::from(*p)).collect()),
        )
    }

    /// Wrong user type — names only what was *required*
    pub fn user_type_denied(required: &[&str]) -> Self {
        Self::new(ErrorCode::UserTypeDenied).with_param(
            "required",
            Value::Array(required.iter().map(|t| Value::from(*t)).collect()),
        )
    }

    /// Actor does not own the resource
    pub fn not_owner(resource: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotOwner).with_param("resource", resource.into())
    }

    /// Illegal state-machine transition, naming from/to
    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTransition)
            .with_param("from", from.into())
            .with_param("to", to.into())
    }

    /// Unexpected failure — detail kept for logs
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError).with_detail(detail)
    }

    /// Storage-layer failure — detail kept for logs
    pub fn storage(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError).with_detail(detail)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Map::new();
        for (field, errs) in errors.field_errors() {
            let codes: Vec<Value> = errs.iter().map(|e| Value::from(e.code.as_ref())).collect();
            fields.insert(field.to_string(), Value::Array(codes));
        }
        Self::new(ErrorCode::ValidationFailed).with_param("fields", Value::Object(fields))
    }
}

/// Wire-level error envelope: `{"error":{"key":…,"params":…}}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorInfo,
}

#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub key: &'static str,
    pub params: Map<String, Value>,
}

impl ErrorBody {
    pub fn from_error(err: &AppError) -> Self {
        Self {
            error: ErrorInfo {
                key: err.code.key(),
                params: err.params.clone(),
            },
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        // System errors are logged here, once, with internal detail
        if self.code.category() == ErrorCategory::System {
            tracing::error!(
                key = %self.code,
                detail = self.detail.as_deref().unwrap_or(""),
                "System error occurred"
            );
        }

        let status = self.code.http_status();
        (status, Json(ErrorBody::from_error(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_builder() {
        let err = AppError::invalid_transition("completed", "cancelled");
        assert_eq!(err.code, ErrorCode::InvalidTransition);
        assert_eq!(err.params.get("from").unwrap(), "completed");
        assert_eq!(err.params.get("to").unwrap(), "cancelled");
    }

    #[test]
    fn test_permission_denied_names_required_only() {
        let err = AppError::permission_denied(&["orders.assign"]);
        let required = err.params.get("required").unwrap();
        assert_eq!(required, &serde_json::json!(["orders.assign"]));
    }

    #[test]
    fn test_detail_never_serialized() {
        let err = AppError::internal("connection pool exhausted");
        let body = serde_json::to_value(ErrorBody::from_error(&err)).unwrap();
        assert_eq!(body["error"]["key"], "error.system.internal");
        assert!(
            !body.to_string().contains("connection pool"),
            "internal detail leaked into the envelope"
        );
    }

    #[test]
    fn test_envelope_shape() {
        let err = AppError::not_found("order");
        let body = serde_json::to_value(ErrorBody::from_error(&err)).unwrap();
        assert_eq!(body["error"]["key"], "error.resource.not_found");
        assert_eq!(body["error"]["params"]["resource"], "order");
    }
}

//! Unified error system for the Haul platform
//!
//! Every failure crossing the HTTP boundary is expressed as an [`AppError`]:
//! a stable machine-readable key (for client-side localization) plus
//! structured params for message interpolation. No component formats its own
//! error body; the [`axum::response::IntoResponse`] impl here is the single
//! error-sending path.
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! // Simple error
//! let err = AppError::new(ErrorCode::NotFound);
//!
//! // Error with interpolation params
//! let err = AppError::invalid_transition("completed", "cancelled");
//! assert_eq!(err.code.key(), "error.order.invalid_transition");
//! ```

mod codes;
mod types;

pub use codes::{ErrorCategory, ErrorCode};
pub use types::{AppError, AppResult, ErrorBody};

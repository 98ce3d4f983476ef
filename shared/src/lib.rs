//! Shared types for the Haul marketplace platform
//!
//! Wire-level contracts used by the API server and its clients:
//! - [`error`]: unified error codes and [`AppError`]
//! - [`models`]: entity models and request/response payloads
//! - [`response`]: success / pagination envelopes
//! - [`util`]: id and timestamp helpers

pub mod error;
pub mod models;
pub mod response;
pub mod util;

pub use error::{AppError, AppResult, ErrorCode};
pub use response::{ApiResponse, MessageKey, PageMeta, Paginated};

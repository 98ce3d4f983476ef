//! Address Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Pickup address — owned by exactly one client
///
/// Soft-deletable; an address referenced by an undeleted order stays
/// fetchable by id for order-detail rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub label: Option<String>,
    pub line: String,
    pub city: Option<String>,
    pub comment: Option<String>,
    pub created_at: i64,
    pub deleted_at: Option<i64>,
}

impl Address {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Create address payload
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressCreate {
    pub label: Option<String>,
    #[validate(length(min = 3, max = 256))]
    pub line: String,
    pub city: Option<String>,
    pub comment: Option<String>,
}

/// Update address payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressUpdate {
    pub label: Option<String>,
    pub line: Option<String>,
    pub city: Option<String>,
    pub comment: Option<String>,
}

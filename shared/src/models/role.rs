//! Role Model (RBAC)

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Role entity — a named bundle of permissions
///
/// Permissions are flat dotted capability strings attached through
/// role→permission edges; there is no role nesting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
}

/// Create role payload
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleCreate {
    #[validate(length(min = 2, max = 64))]
    pub name: String,
    pub description: Option<String>,
    /// Initial permission set
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Update role payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Replaces the role's permission edges when present
    pub permissions: Option<Vec<String>>,
}

//! User Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Actor type — determines which routes and transitions a user may drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Client,
    Courier,
    Staff,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Courier => "courier",
            Self::Staff => "staff",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Blocked,
}

/// User entity
///
/// `password_hash` 永不序列化到响应；`deleted_at` 为软删除墓碑。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    /// Unique login key
    pub phone: String,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub status: UserStatus,
    /// Argon2 hash — never leaves the server
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl User {
    pub fn is_blocked(&self) -> bool {
        self.status == UserStatus::Blocked
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Registration payload (`POST /api/auth/register`)
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// E.164-style phone, the login key
    #[validate(length(min = 10, max = 20))]
    pub phone: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(email)]
    pub email: Option<String>,
    /// client (default) or courier — staff accounts are created by staff
    #[serde(rename = "type")]
    pub user_type: Option<UserType>,
    pub device_id: Option<String>,
    pub platform: Option<String>,
}

/// Staff-driven user mutation (`PATCH /api/users/:id`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub status: Option<UserStatus>,
    pub email: Option<String>,
}

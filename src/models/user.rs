//! User domain models

use super::role::{PermissionOverride, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Raw `users` row; the override blob is still untyped here
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub permissions: Option<serde_json::Value>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// User account with its permission override parsed once at load time
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub permissions: Option<PermissionOverride>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let permissions = match row.permissions {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => match PermissionOverride::parse(&value) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    // 覆盖权限无法解析时按无覆盖处理，回落到角色默认权限
                    tracing::warn!(
                        user_id = %row.id,
                        username = %row.username,
                        error = %e,
                        "Ignoring malformed permission override"
                    );
                    None
                }
            },
        };

        Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            full_name: row.full_name,
            email: row.email,
            role: row.role,
            permissions,
            active: row.active,
            created_at: row.created_at,
            created_by: row.created_by,
            updated_at: row.updated_at,
            last_login: row.last_login,
        }
    }
}

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    pub password: String,
    #[validate(length(min = 1, max = 128))]
    pub full_name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub role: String,
    pub permissions: Option<PermissionOverride>,
}

/// Update user request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 128))]
    pub full_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub role: Option<String>,
    pub permissions: Option<PermissionOverride>,
    /// Remove the override so the role defaults apply again
    #[serde(default)]
    pub clear_permissions: bool,
}

/// User response (without sensitive data)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub permissions: Option<PermissionOverride>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            permissions: user.permissions,
            active: user.active,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

//! Authentication-related models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: super::user::UserResponse,
}

/// Admin password re-entered to confirm a destructive operation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeleteConfirmation {
    #[validate(length(min = 1))]
    pub admin_password: String,
}

//! Operator domain models

use super::status::RecordStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Machine operator
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Operator {
    pub id: Uuid,
    pub name: String,
    /// Unique across active and inactive operators
    pub badge: String,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Create operator request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOperatorRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub badge: String,
}

/// Update operator request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateOperatorRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub badge: Option<String>,
}

/// Operator list query
#[derive(Debug, Default, Deserialize)]
pub struct OperatorListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

//! Settings singleton

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Primary key of the only settings row
pub const SETTINGS_ID: &str = "current";

/// Tolerance used when the settings row is missing
pub const DEFAULT_TOLERANCE_PCT: f64 = 10.0;

pub const DEFAULT_COMPANY_NAME: &str = "J-INVESTMENTS";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Settings {
    pub id: String,
    /// Anomaly tolerance in percent, within [0, 50]
    pub tolerance: f64,
    pub company_name: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSettingsRequest {
    #[validate(range(min = 0.0, max = 50.0))]
    pub tolerance: Option<f64>,
    #[validate(length(min = 1, max = 128))]
    pub company_name: Option<String>,
}

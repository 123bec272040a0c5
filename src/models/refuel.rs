//! Refuel log domain models

use crate::services::variance_service::{self, VarianceResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Refuel entry; immutable once written
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefuelEntry {
    pub id: Uuid,
    pub refueled_at: DateTime<Utc>,
    pub machine_id: String,
    pub operator_id: Uuid,
    /// Hours or distance since the previous refuel
    pub usage: f64,
    pub fuel: f64,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Refuel entry joined with the machine and operator it references.
/// Inactive machines still resolve here, so history keeps its rate.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefuelDetail {
    pub id: Uuid,
    pub refueled_at: DateTime<Utc>,
    pub machine_id: String,
    pub machine_model: String,
    pub machine_rate: f64,
    pub operator_id: Uuid,
    pub operator_name: String,
    pub usage: f64,
    pub fuel: f64,
    pub notes: Option<String>,
}

/// Refuel entry with its variance analysis
#[derive(Debug, Clone, Serialize)]
pub struct RefuelView {
    #[serde(flatten)]
    pub entry: RefuelDetail,
    pub variance: VarianceResult,
}

impl RefuelView {
    /// Variance is computed against the machine's current rate
    pub fn new(entry: RefuelDetail, tolerance: f64) -> Self {
        let variance =
            variance_service::analyze(entry.usage, entry.fuel, entry.machine_rate, tolerance);
        Self { entry, variance }
    }
}

/// Create refuel request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRefuelRequest {
    #[validate(length(min = 1, max = 32))]
    pub machine_id: String,
    pub operator_id: Uuid,
    #[validate(range(exclusive_min = 0.0))]
    pub usage: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub fuel: f64,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    /// Defaults to the time of logging
    pub refueled_at: Option<DateTime<Utc>>,
}

/// Variance preview for an entry that has not been logged yet
#[derive(Debug, Deserialize, Validate)]
pub struct VariancePreviewRequest {
    #[validate(length(min = 1, max = 32))]
    pub machine_id: String,
    #[validate(range(exclusive_min = 0.0))]
    pub usage: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub fuel: f64,
}

/// Time window for the refuel log
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RefuelPeriod {
    Today,
    Week,
    All,
}

/// Refuel list query. Without a period or date range only today's entries are listed.
#[derive(Debug, Default, Deserialize)]
pub struct RefuelListQuery {
    pub period: Option<RefuelPeriod>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

//! Machine (fleet asset) domain models

use super::status::RecordStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Fleet machine
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Machine {
    /// User-assigned identifier, e.g. "EX-001"
    pub id: String,
    pub model: String,
    /// Expected fuel per usage unit (hour or distance)
    pub rate: f64,
    pub capacity: f64,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Create machine request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMachineRequest {
    #[validate(length(min = 1, max = 32))]
    pub id: String,
    #[validate(length(min = 1, max = 128))]
    pub model: String,
    #[validate(range(exclusive_min = 0.0))]
    pub rate: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub capacity: f64,
}

impl CreateMachineRequest {
    /// Identifiers are stored trimmed and upper-cased
    pub fn normalized_id(&self) -> String {
        normalize_machine_id(&self.id)
    }
}

pub fn normalize_machine_id(id: &str) -> String {
    id.trim().to_uppercase()
}

/// Update machine request; status is not editable here
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMachineRequest {
    #[validate(length(min = 1, max = 128))]
    pub model: Option<String>,
    #[validate(range(exclusive_min = 0.0))]
    pub rate: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub capacity: Option<f64>,
}

/// Machine list query
#[derive(Debug, Default, Deserialize)]
pub struct MachineListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_id() {
        let req = CreateMachineRequest {
            id: "  ex-001 ".to_string(),
            model: "CAT 320".to_string(),
            rate: 12.5,
            capacity: 400.0,
        };
        assert_eq!(req.normalized_id(), "EX-001");
    }

    #[test]
    fn test_rate_and_capacity_must_be_positive() {
        let mut req = CreateMachineRequest {
            id: "EX-001".to_string(),
            model: "CAT 320".to_string(),
            rate: 0.0,
            capacity: 400.0,
        };
        assert!(req.validate().is_err());

        req.rate = 12.5;
        req.capacity = -1.0;
        assert!(req.validate().is_err());

        req.capacity = 400.0;
        assert!(req.validate().is_ok());
    }
}

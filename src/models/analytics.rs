//! Reporting and dashboard models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inclusive date range; both ends default to the last 30 days
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Headline figures for a date range
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Kpis {
    pub entries: i64,
    pub total_fuel: f64,
    pub expected_fuel: f64,
    pub total_usage: f64,
    pub anomalies: i64,
    /// Mean of per-entry efficiency, skipping entries without one
    pub average_efficiency: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyFuel {
    pub date: NaiveDate,
    pub fuel: f64,
    pub expected_fuel: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MachineBreakdown {
    pub machine_id: String,
    pub model: String,
    pub entries: i64,
    pub fuel: f64,
    pub usage: f64,
    pub expected_fuel: f64,
    pub efficiency: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OperatorBreakdown {
    pub operator_id: Uuid,
    pub operator_name: String,
    pub entries: i64,
    pub fuel: f64,
    pub usage: f64,
    pub expected_fuel: f64,
    pub efficiency: Option<f64>,
}

/// Dashboard payload
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub tolerance: f64,
    pub kpis: Kpis,
    pub daily: Vec<DailyFuel>,
    /// Sorted by fuel, descending
    pub machines: Vec<MachineBreakdown>,
    /// Sorted by fuel, descending
    pub operators: Vec<OperatorBreakdown>,
}

/// One detailed line of the export
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub refueled_at: DateTime<Utc>,
    pub machine_id: String,
    pub machine_model: String,
    pub operator_name: String,
    pub usage: f64,
    pub fuel: f64,
    pub rate: f64,
    pub expected_fuel: f64,
    pub variance: f64,
    pub variance_pct: Option<f64>,
    pub is_anomaly: bool,
}

/// Per-machine totals in the export
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MachineVarianceSummary {
    pub machine_id: String,
    pub fuel: f64,
    pub expected_fuel: f64,
    pub variance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub company_name: String,
    pub generated_at: DateTime<Utc>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub tolerance: f64,
    pub rows: Vec<ExportRow>,
    pub machine_summary: Vec<MachineVarianceSummary>,
}

/// Record counts shown on the system page
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SystemInfo {
    pub active_machines: i64,
    pub active_operators: i64,
    pub refuel_entries: i64,
    pub active_users: i64,
}

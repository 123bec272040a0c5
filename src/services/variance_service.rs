//! 油耗偏差分析
//!
//! 所有报表（单条记录、汇总分析、导出）都通过这里计算期望油耗、偏差和效率，
//! 保证各处数值一致。

use crate::error::AppError;
use serde::Serialize;

/// Classification of a single variance result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VarianceStatus {
    Normal,
    Anomaly,
    /// Expected consumption is zero, so no percentage exists
    Indeterminate,
}

/// Result of comparing dispensed fuel against expected consumption
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VarianceResult {
    pub expected: f64,
    pub variance: f64,
    /// Rounded to 2 decimals; `None` when indeterminate
    pub variance_pct: Option<f64>,
    pub is_anomaly: bool,
    pub status: VarianceStatus,
}

impl VarianceResult {
    /// Variance percentage, or `IndeterminateVariance` when expected is zero
    pub fn require_pct(&self) -> Result<f64, AppError> {
        self.variance_pct.ok_or(AppError::IndeterminateVariance)
    }
}

/// 计算单条加油记录的偏差
///
/// - expected = usage * rate
/// - variance = fuel - expected
/// - variance_pct = variance / expected * 100，保留两位小数
/// - is_anomaly = |variance_pct| > tolerance_pct
///
/// expected 为 0（或非有限值）时结果为 Indeterminate，且不会被标记为异常。
pub fn analyze(usage: f64, fuel: f64, rate: f64, tolerance_pct: f64) -> VarianceResult {
    let expected = usage * rate;
    let variance = fuel - expected;
    let variance_pct = percentage(variance, expected);

    let is_anomaly = variance_pct.is_some_and(|pct| pct.abs() > tolerance_pct);
    let status = match variance_pct {
        None => VarianceStatus::Indeterminate,
        Some(_) if is_anomaly => VarianceStatus::Anomaly,
        Some(_) => VarianceStatus::Normal,
    };

    VarianceResult {
        expected,
        variance,
        variance_pct,
        is_anomaly,
        status,
    }
}

/// 燃油效率 = expected / fuel * 100，保留两位小数；fuel 为 0 时返回 None
pub fn efficiency(expected: f64, fuel: f64) -> Option<f64> {
    percentage(expected, fuel)
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percentage(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return None;
    }

    let pct = numerator / denominator * 100.0;
    pct.is_finite().then(|| round2(pct))
}

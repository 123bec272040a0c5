//! 报表与统计服务
//!
//! 所有偏差和效率数值都来自 variance_service，与加油记录列表一致。

use crate::{
    error::AppError,
    models::analytics::*,
    models::refuel::{RefuelDetail, RefuelView},
    models::role::{Action, Resource},
    models::user::User,
    repository::{refuel_repo::RefuelRepository, report_repo::ReportRepository},
    services::permission_service::require_permission,
    services::refuel_service::start_of_day,
    services::settings_service::SettingsService,
    services::variance_service::{efficiency, round2},
};
use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// 默认统计最近 30 天
pub const DEFAULT_RANGE_DAYS: i64 = 30;

pub struct AnalyticsService {
    db: PgPool,
    settings_service: Arc<SettingsService>,
}

impl AnalyticsService {
    pub fn new(db: PgPool, settings_service: Arc<SettingsService>) -> Self {
        Self { db, settings_service }
    }

    async fn load(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<(Vec<RefuelView>, f64, String), AppError> {
        let settings = self.settings_service.current().await?;
        let details = RefuelRepository::new(self.db.clone())
            .list_details(Some(start_of_day(from)), to.succ_opt().map(start_of_day))
            .await?;

        let views = details
            .into_iter()
            .map(|detail| RefuelView::new(detail, settings.tolerance))
            .collect();

        Ok((views, settings.tolerance, settings.company_name))
    }

    /// 仪表盘汇总
    pub async fn summary(&self, actor: &User, query: &AnalyticsQuery) -> Result<AnalyticsSummary, AppError> {
        require_permission(actor, Resource::Reports, Action::Read)?;

        let (from, to) = resolve_range(query, Utc::now().date_naive())?;
        // 区间内没有记录时返回全零汇总，不回退到全部数据
        let (views, tolerance, _) = self.load(from, to).await?;

        tracing::debug!(%from, %to, entries = views.len(), "Building analytics summary");
        Ok(summarize(&views, tolerance, from, to))
    }

    /// 导出数据：明细行 + 按设备汇总
    pub async fn export(&self, actor: &User, query: &AnalyticsQuery) -> Result<ExportReport, AppError> {
        require_permission(actor, Resource::Reports, Action::Read)?;

        let (from, to) = resolve_range(query, Utc::now().date_naive())?;
        let (views, tolerance, company_name) = self.load(from, to).await?;

        tracing::info!(actor = %actor.username, %from, %to, rows = views.len(), "Report exported");
        Ok(build_export(&views, tolerance, company_name, from, to))
    }

    /// 系统信息
    pub async fn system_info(&self, actor: &User) -> Result<SystemInfo, AppError> {
        require_permission(actor, Resource::Settings, Action::Read)?;
        ReportRepository::new(self.db.clone()).system_info().await
    }
}

/// 解析日期区间（包含两端），缺省为最近 30 天
pub fn resolve_range(query: &AnalyticsQuery, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), AppError> {
    let to = query.to.unwrap_or(today);
    let from = query
        .from
        .unwrap_or_else(|| to - Duration::days(DEFAULT_RANGE_DAYS));

    if from > to {
        return Err(AppError::validation("'from' must not be after 'to'"));
    }

    Ok((from, to))
}

#[derive(Default)]
struct Totals {
    entries: i64,
    fuel: f64,
    usage: f64,
    expected: f64,
}

impl Totals {
    fn add(&mut self, entry: &RefuelDetail, expected: f64) {
        self.entries += 1;
        self.fuel += entry.fuel;
        self.usage += entry.usage;
        self.expected += expected;
    }

    fn efficiency(&self) -> Option<f64> {
        efficiency(self.expected, self.fuel)
    }
}

/// 汇总统计（纯函数）
pub fn summarize(views: &[RefuelView], tolerance: f64, from: NaiveDate, to: NaiveDate) -> AnalyticsSummary {
    let mut overall = Totals::default();
    let mut anomalies = 0;
    let mut entry_efficiencies = Vec::new();
    let mut daily: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    let mut machines: BTreeMap<&str, (&str, Totals)> = BTreeMap::new();
    let mut operators: BTreeMap<Uuid, (&str, Totals)> = BTreeMap::new();

    for view in views {
        let entry = &view.entry;
        let expected = view.variance.expected;

        overall.add(entry, expected);
        if view.variance.is_anomaly {
            anomalies += 1;
        }
        if let Some(value) = efficiency(expected, entry.fuel) {
            entry_efficiencies.push(value);
        }

        let day = daily.entry(entry.refueled_at.date_naive()).or_default();
        day.0 += entry.fuel;
        day.1 += expected;

        machines
            .entry(entry.machine_id.as_str())
            .or_insert_with(|| (entry.machine_model.as_str(), Totals::default()))
            .1
            .add(entry, expected);
        operators
            .entry(entry.operator_id)
            .or_insert_with(|| (entry.operator_name.as_str(), Totals::default()))
            .1
            .add(entry, expected);
    }

    let average_efficiency = (!entry_efficiencies.is_empty())
        .then(|| round2(entry_efficiencies.iter().sum::<f64>() / entry_efficiencies.len() as f64));

    let mut machines: Vec<MachineBreakdown> = machines
        .into_iter()
        .map(|(machine_id, (model, totals))| MachineBreakdown {
            machine_id: machine_id.to_string(),
            model: model.to_string(),
            entries: totals.entries,
            fuel: round2(totals.fuel),
            usage: round2(totals.usage),
            expected_fuel: round2(totals.expected),
            efficiency: totals.efficiency(),
        })
        .collect();
    machines.sort_by(|a, b| b.fuel.total_cmp(&a.fuel));

    let mut operators: Vec<OperatorBreakdown> = operators
        .into_iter()
        .map(|(operator_id, (name, totals))| OperatorBreakdown {
            operator_id,
            operator_name: name.to_string(),
            entries: totals.entries,
            fuel: round2(totals.fuel),
            usage: round2(totals.usage),
            expected_fuel: round2(totals.expected),
            efficiency: totals.efficiency(),
        })
        .collect();
    operators.sort_by(|a, b| b.fuel.total_cmp(&a.fuel));

    AnalyticsSummary {
        from,
        to,
        tolerance,
        kpis: Kpis {
            entries: overall.entries,
            total_fuel: round2(overall.fuel),
            expected_fuel: round2(overall.expected),
            total_usage: round2(overall.usage),
            anomalies,
            average_efficiency,
        },
        daily: daily
            .into_iter()
            .map(|(date, (fuel, expected))| DailyFuel {
                date,
                fuel: round2(fuel),
                expected_fuel: round2(expected),
            })
            .collect(),
        machines,
        operators,
    }
}

/// 构建导出数据（纯函数）
pub fn build_export(
    views: &[RefuelView],
    tolerance: f64,
    company_name: String,
    from: NaiveDate,
    to: NaiveDate,
) -> ExportReport {
    let mut per_machine: BTreeMap<&str, (f64, f64, f64)> = BTreeMap::new();

    let rows = views
        .iter()
        .map(|view| {
            let entry = &view.entry;
            let sums = per_machine.entry(entry.machine_id.as_str()).or_default();
            sums.0 += entry.fuel;
            sums.1 += view.variance.expected;
            sums.2 += view.variance.variance;

            ExportRow {
                refueled_at: entry.refueled_at,
                machine_id: entry.machine_id.clone(),
                machine_model: entry.machine_model.clone(),
                operator_name: entry.operator_name.clone(),
                usage: entry.usage,
                fuel: entry.fuel,
                rate: entry.machine_rate,
                expected_fuel: round2(view.variance.expected),
                variance: round2(view.variance.variance),
                variance_pct: view.variance.variance_pct,
                is_anomaly: view.variance.is_anomaly,
            }
        })
        .collect();

    let machine_summary = per_machine
        .into_iter()
        .map(|(machine_id, (fuel, expected, variance))| MachineVarianceSummary {
            machine_id: machine_id.to_string(),
            fuel: round2(fuel),
            expected_fuel: round2(expected),
            variance: round2(variance),
        })
        .collect();

    ExportReport {
        company_name,
        generated_at: Utc::now(),
        from,
        to,
        tolerance,
        rows,
        machine_summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn view(machine: &str, operator: Uuid, day: u32, usage: f64, fuel: f64, rate: f64) -> RefuelView {
        RefuelView::new(
            RefuelDetail {
                id: Uuid::new_v4(),
                refueled_at: Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap(),
                machine_id: machine.to_string(),
                machine_model: format!("{} model", machine),
                machine_rate: rate,
                operator_id: operator,
                operator_name: format!("op-{}", &operator.to_string()[..4]),
                usage,
                fuel,
                notes: None,
            },
            10.0,
        )
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_default_range_is_last_30_days() {
        let (from, to) = resolve_range(&AnalyticsQuery::default(), date(31)).unwrap();
        assert_eq!(to, date(31));
        assert_eq!(from, date(1));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let query = AnalyticsQuery {
            from: Some(date(10)),
            to: Some(date(5)),
        };
        assert!(resolve_range(&query, date(31)).is_err());
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[], 10.0, date(1), date(31));
        assert_eq!(summary.kpis, Kpis::default());
        assert!(summary.daily.is_empty());
        assert!(summary.machines.is_empty());
        assert!(summary.operators.is_empty());
    }

    #[test]
    fn test_summary_totals_and_ordering() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let views = vec![
            view("EX-001", alice, 1, 10.0, 100.0, 10.0), // 0%
            view("EX-001", bob, 1, 10.0, 120.0, 10.0),   // +20% anomaly
            view("TR-002", bob, 2, 5.0, 40.0, 10.0),     // -20% anomaly
        ];

        let summary = summarize(&views, 10.0, date(1), date(2));
        assert_eq!(summary.kpis.entries, 3);
        assert_eq!(summary.kpis.total_fuel, 260.0);
        assert_eq!(summary.kpis.expected_fuel, 250.0);
        assert_eq!(summary.kpis.total_usage, 25.0);
        assert_eq!(summary.kpis.anomalies, 2);
        // (100 + 83.33 + 125) / 3
        assert_eq!(summary.kpis.average_efficiency, Some(102.78));

        assert_eq!(summary.daily.len(), 2);
        assert_eq!(summary.daily[0].date, date(1));
        assert_eq!(summary.daily[0].fuel, 220.0);

        assert_eq!(summary.machines[0].machine_id, "EX-001");
        assert_eq!(summary.machines[0].entries, 2);
        assert_eq!(summary.machines[0].efficiency, Some(90.91));

        assert_eq!(summary.operators[0].operator_id, bob);
        assert_eq!(summary.operators[0].fuel, 160.0);
        assert_eq!(summary.operators[1].operator_id, alice);
    }

    #[test]
    fn test_export_matches_per_entry_variance() {
        let op = Uuid::new_v4();
        let views = vec![
            view("EX-001", op, 1, 10.0, 120.0, 10.0),
            view("EX-001", op, 2, 10.0, 90.0, 10.0),
        ];

        let report = build_export(&views, 10.0, "J-INVESTMENTS".to_string(), date(1), date(2));
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].variance_pct, views[0].variance.variance_pct);
        assert!(report.rows[0].is_anomaly);
        assert_eq!(
            report.machine_summary,
            vec![MachineVarianceSummary {
                machine_id: "EX-001".to_string(),
                fuel: 210.0,
                expected_fuel: 200.0,
                variance: 10.0,
            }]
        );
    }
}

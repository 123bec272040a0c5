//! 加油记录服务

use crate::{
    error::AppError,
    models::machine::normalize_machine_id,
    models::refuel::*,
    models::role::{Action, Resource},
    models::user::User,
    repository::{
        machine_repo::MachineRepository, operator_repo::OperatorRepository,
        refuel_repo::RefuelRepository,
    },
    services::audit_service::{AuditAction, AuditEntry, AuditService},
    services::auth_service::AuthService,
    services::permission_service::require_permission,
    services::settings_service::SettingsService,
    services::variance_service::{self, VarianceResult},
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 尚未记录的加油数据的偏差预览
#[derive(Debug, Clone, Serialize)]
pub struct VariancePreview {
    pub machine_id: String,
    pub rate: f64,
    pub tolerance: f64,
    #[serde(flatten)]
    pub result: VarianceResult,
}

pub struct RefuelService {
    db: PgPool,
    audit_service: Arc<AuditService>,
    auth_service: Arc<AuthService>,
    settings_service: Arc<SettingsService>,
}

impl RefuelService {
    pub fn new(
        db: PgPool,
        audit_service: Arc<AuditService>,
        auth_service: Arc<AuthService>,
        settings_service: Arc<SettingsService>,
    ) -> Self {
        Self {
            db,
            audit_service,
            auth_service,
            settings_service,
        }
    }

    fn repo(&self) -> RefuelRepository {
        RefuelRepository::new(self.db.clone())
    }

    /// 记录加油；设备和操作员必须存在且启用
    pub async fn create(&self, actor: &User, req: CreateRefuelRequest) -> Result<RefuelView, AppError> {
        require_permission(actor, Resource::Refuels, Action::Write)?;
        req.validate()?;

        let machine_id = normalize_machine_id(&req.machine_id);
        let machine = MachineRepository::new(self.db.clone())
            .find_by_id(&machine_id)
            .await?
            .ok_or_else(|| {
                AppError::ReferentialIntegrity(format!("Machine {} does not exist", machine_id))
            })?;
        if !machine.status.is_active() {
            return Err(AppError::Validation(format!("Machine {} is inactive", machine.id)));
        }

        let operator = OperatorRepository::new(self.db.clone())
            .find_by_id(req.operator_id)
            .await?
            .ok_or_else(|| {
                AppError::ReferentialIntegrity(format!("Operator {} does not exist", req.operator_id))
            })?;
        if !operator.status.is_active() {
            return Err(AppError::Validation(format!("Operator {} is inactive", operator.name)));
        }

        let tolerance = self.settings_service.current().await?.tolerance;
        let refueled_at = req.refueled_at.unwrap_or_else(Utc::now);

        let mut tx = self.db.begin().await?;
        let entry = RefuelRepository::insert(&mut *tx, &machine.id, &req, refueled_at, actor.id).await?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(actor, AuditAction::Create)
                    .entity(Resource::Refuels, entry.id)
                    .details(format!(
                        "Machine {}, operator {}, usage {}, fuel {}",
                        machine.id, operator.name, entry.usage, entry.fuel
                    )),
            )
            .await?;
        tx.commit().await?;

        let view = RefuelView::new(
            RefuelDetail {
                id: entry.id,
                refueled_at: entry.refueled_at,
                machine_id: machine.id,
                machine_model: machine.model,
                machine_rate: machine.rate,
                operator_id: operator.id,
                operator_name: operator.name,
                usage: entry.usage,
                fuel: entry.fuel,
                notes: entry.notes,
            },
            tolerance,
        );

        if view.variance.is_anomaly {
            metrics::counter!("refuel_anomalies_total").increment(1);
            tracing::warn!(
                refuel_id = %view.entry.id,
                machine_id = %view.entry.machine_id,
                variance_pct = ?view.variance.variance_pct,
                tolerance,
                "Fuel consumption anomaly"
            );
        }

        tracing::info!(actor = %actor.username, refuel_id = %view.entry.id, "Refuel logged");
        Ok(view)
    }

    /// 按时间窗口列出加油记录，附带当前容差下的偏差
    pub async fn list(&self, actor: &User, query: &RefuelListQuery) -> Result<Vec<RefuelView>, AppError> {
        require_permission(actor, Resource::Refuels, Action::Read)?;

        let (from, to) = resolve_window(query, Utc::now())?;
        let tolerance = self.settings_service.current().await?.tolerance;
        let details = self.repo().list_details(from, to).await?;

        Ok(details
            .into_iter()
            .map(|detail| RefuelView::new(detail, tolerance))
            .collect())
    }

    pub async fn get(&self, actor: &User, id: Uuid) -> Result<RefuelView, AppError> {
        require_permission(actor, Resource::Refuels, Action::Read)?;

        let detail = self
            .repo()
            .find_detail(id)
            .await?
            .ok_or_else(|| AppError::not_found("refuel entry"))?;
        let tolerance = self.settings_service.current().await?.tolerance;

        Ok(RefuelView::new(detail, tolerance))
    }

    /// 录入前预览偏差
    pub async fn preview(&self, actor: &User, req: VariancePreviewRequest) -> Result<VariancePreview, AppError> {
        require_permission(actor, Resource::Refuels, Action::Read)?;
        req.validate()?;

        let machine_id = normalize_machine_id(&req.machine_id);
        let machine = MachineRepository::new(self.db.clone())
            .find_by_id(&machine_id)
            .await?
            .ok_or_else(|| {
                AppError::ReferentialIntegrity(format!("Machine {} does not exist", machine_id))
            })?;

        let tolerance = self.settings_service.current().await?.tolerance;
        let result = variance_service::analyze(req.usage, req.fuel, machine.rate, tolerance);
        result.require_pct()?;

        Ok(VariancePreview {
            machine_id: machine.id,
            rate: machine.rate,
            tolerance,
            result,
        })
    }

    /// 物理删除加油记录；需要管理员密码二次确认
    pub async fn delete(&self, actor: &User, id: Uuid, admin_password: &str) -> Result<(), AppError> {
        require_permission(actor, Resource::Refuels, Action::Delete)?;
        self.auth_service
            .verify_admin_password(actor, admin_password)
            .await?;

        let mut tx = self.db.begin().await?;
        let entry = RefuelRepository::delete(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("refuel entry"))?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(actor, AuditAction::Delete)
                    .entity(Resource::Refuels, entry.id)
                    .details(format!(
                        "Deleted refuel for machine {} ({} fuel, {})",
                        entry.machine_id,
                        entry.fuel,
                        entry.refueled_at.format("%Y-%m-%d %H:%M")
                    )),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(actor = %actor.username, refuel_id = %id, "Refuel deleted");
        Ok(())
    }
}

/// 一天的起点（UTC）
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// 将 period 与可选日期区间合并为 [from, to) 时间窗口
pub fn resolve_window(
    query: &RefuelListQuery,
    now: DateTime<Utc>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), AppError> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(AppError::validation("'from' must not be after 'to'"));
        }
    }

    let period = query.period.unwrap_or(if query.from.is_none() && query.to.is_none() {
        RefuelPeriod::Today
    } else {
        RefuelPeriod::All
    });

    let period_start = match period {
        RefuelPeriod::Today => Some(start_of_day(now.date_naive())),
        RefuelPeriod::Week => Some(now - Duration::days(7)),
        RefuelPeriod::All => None,
    };
    let range_start = query.from.map(start_of_day);

    let from = match (period_start, range_start) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    let to = query
        .to
        .and_then(|date| date.succ_opt())
        .map(start_of_day);

    Ok((from, to))
}

//! 系统设置服务（单行配置，后写覆盖）

use crate::{
    error::AppError,
    models::role::{Action, Resource},
    models::settings::*,
    models::user::User,
    repository::settings_repo::SettingsRepository,
    services::audit_service::{AuditAction, AuditEntry, AuditService},
    services::permission_service::require_permission,
};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use validator::Validate;

pub struct SettingsService {
    db: PgPool,
    audit_service: Arc<AuditService>,
}

impl SettingsService {
    pub fn new(db: PgPool, audit_service: Arc<AuditService>) -> Self {
        Self { db, audit_service }
    }

    /// 当前设置；行缺失时返回默认值（不写库）
    pub async fn current(&self) -> Result<Settings, AppError> {
        let settings = SettingsRepository::new(self.db.clone()).get().await?;

        Ok(settings.unwrap_or_else(|| {
            tracing::warn!("Settings row missing, using defaults");
            Settings {
                id: SETTINGS_ID.to_string(),
                tolerance: DEFAULT_TOLERANCE_PCT,
                company_name: DEFAULT_COMPANY_NAME.to_string(),
                updated_at: Utc::now(),
                updated_by: None,
            }
        }))
    }

    pub async fn get(&self, actor: &User) -> Result<Settings, AppError> {
        require_permission(actor, Resource::Settings, Action::Read)?;
        self.current().await
    }

    pub async fn update(&self, actor: &User, req: UpdateSettingsRequest) -> Result<Settings, AppError> {
        require_permission(actor, Resource::Settings, Action::Write)?;
        req.validate()?;

        let company_name = req.company_name.as_deref().map(str::trim);
        if company_name.is_some_and(str::is_empty) {
            return Err(AppError::validation("Company name must not be blank"));
        }

        let mut tx = self.db.begin().await?;
        let settings = SettingsRepository::upsert(&mut *tx, req.tolerance, company_name, actor.id).await?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(actor, AuditAction::Update)
                    .entity(Resource::Settings, &settings.id)
                    .details(format!(
                        "Tolerance {}%, company {}",
                        settings.tolerance, settings.company_name
                    )),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(
            actor = %actor.username,
            tolerance = settings.tolerance,
            "Settings updated"
        );
        Ok(settings)
    }
}

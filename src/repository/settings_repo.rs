//! Settings repository

use crate::{
    error::AppError,
    models::settings::{Settings, DEFAULT_COMPANY_NAME, DEFAULT_TOLERANCE_PCT, SETTINGS_ID},
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub struct SettingsRepository {
    db: PgPool,
}

impl SettingsRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get(&self) -> Result<Option<Settings>, AppError> {
        let settings = sqlx::query_as::<_, Settings>("SELECT * FROM settings WHERE id = $1")
            .bind(SETTINGS_ID)
            .fetch_optional(&self.db)
            .await?;

        Ok(settings)
    }

    /// 后写覆盖；行不存在时以默认值补齐
    pub async fn upsert(
        conn: &mut PgConnection,
        tolerance: Option<f64>,
        company_name: Option<&str>,
        updated_by: Uuid,
    ) -> Result<Settings, AppError> {
        let settings = sqlx::query_as::<_, Settings>(
            r#"
            INSERT INTO settings (id, tolerance, company_name, updated_at, updated_by)
            VALUES ($1, COALESCE($2, $4), COALESCE($3, $5), NOW(), $6)
            ON CONFLICT (id) DO UPDATE SET
                tolerance = COALESCE($2, settings.tolerance),
                company_name = COALESCE($3, settings.company_name),
                updated_at = NOW(),
                updated_by = $6
            RETURNING *
            "#,
        )
        .bind(SETTINGS_ID)
        .bind(tolerance)
        .bind(company_name)
        .bind(DEFAULT_TOLERANCE_PCT)
        .bind(DEFAULT_COMPANY_NAME)
        .bind(updated_by)
        .fetch_one(conn)
        .await?;

        Ok(settings)
    }
}

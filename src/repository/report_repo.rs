//! Aggregate counts for the system page

use crate::{error::AppError, models::analytics::SystemInfo};
use sqlx::PgPool;

pub struct ReportRepository {
    db: PgPool,
}

impl ReportRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn system_info(&self) -> Result<SystemInfo, AppError> {
        let info = sqlx::query_as::<_, SystemInfo>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM machines WHERE status = 'active') AS active_machines,
                (SELECT COUNT(*) FROM operators WHERE status = 'active') AS active_operators,
                (SELECT COUNT(*) FROM refuels) AS refuel_entries,
                (SELECT COUNT(*) FROM users WHERE active) AS active_users
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(info)
    }
}

//! Refuel repository (加油记录数据访问)

use crate::{error::AppError, models::refuel::*};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// 加油记录与设备、操作员的关联查询（不过滤停用状态，历史记录始终可解析）
const DETAIL_SELECT: &str = r#"
    SELECT
        r.id,
        r.refueled_at,
        r.machine_id,
        m.model AS machine_model,
        m.rate AS machine_rate,
        r.operator_id,
        o.name AS operator_name,
        r.usage,
        r.fuel,
        r.notes
    FROM refuels r
    JOIN machines m ON m.id = r.machine_id
    JOIN operators o ON o.id = r.operator_id
"#;

pub struct RefuelRepository {
    db: PgPool,
}

impl RefuelRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn find_detail(&self, id: Uuid) -> Result<Option<RefuelDetail>, AppError> {
        let query = format!("{DETAIL_SELECT} WHERE r.id = $1");
        let detail = sqlx::query_as::<_, RefuelDetail>(&query)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(detail)
    }

    /// 时间区间 [from, to)，任一端为空表示不限制；按时间倒序
    pub async fn list_details(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<RefuelDetail>, AppError> {
        let query = format!(
            "{DETAIL_SELECT}
            WHERE ($1::timestamptz IS NULL OR r.refueled_at >= $1)
              AND ($2::timestamptz IS NULL OR r.refueled_at < $2)
            ORDER BY r.refueled_at DESC, r.created_at DESC"
        );
        let details = sqlx::query_as::<_, RefuelDetail>(&query)
            .bind(from)
            .bind(to)
            .fetch_all(&self.db)
            .await?;

        Ok(details)
    }

    pub async fn insert(
        conn: &mut PgConnection,
        machine_id: &str,
        req: &CreateRefuelRequest,
        refueled_at: DateTime<Utc>,
        created_by: Uuid,
    ) -> Result<RefuelEntry, AppError> {
        let entry = sqlx::query_as::<_, RefuelEntry>(
            r#"
            INSERT INTO refuels (refueled_at, machine_id, operator_id, usage, fuel, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(refueled_at)
        .bind(machine_id)
        .bind(req.operator_id)
        .bind(req.usage)
        .bind(req.fuel)
        .bind(req.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()))
        .bind(created_by)
        .fetch_one(conn)
        .await?;

        Ok(entry)
    }

    /// 物理删除
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<Option<RefuelEntry>, AppError> {
        let entry = sqlx::query_as::<_, RefuelEntry>("DELETE FROM refuels WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(entry)
    }
}

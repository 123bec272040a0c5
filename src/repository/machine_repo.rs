//! Machine repository (车辆/设备数据访问)

use crate::{error::AppError, models::machine::*};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub struct MachineRepository {
    db: PgPool,
}

impl MachineRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 根据 ID 查找设备（包括已停用的）
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Machine>, AppError> {
        let machine = sqlx::query_as::<_, Machine>("SELECT * FROM machines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(machine)
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Machine>, AppError> {
        let machines = sqlx::query_as::<_, Machine>(
            r#"
            SELECT * FROM machines
            WHERE $1 OR status = 'active'
            ORDER BY id
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        Ok(machines)
    }

    /// 创建设备，`id` 必须已规范化
    pub async fn insert(
        conn: &mut PgConnection,
        id: &str,
        req: &CreateMachineRequest,
        created_by: Uuid,
    ) -> Result<Machine, AppError> {
        let machine = sqlx::query_as::<_, Machine>(
            r#"
            INSERT INTO machines (id, model, rate, capacity, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(req.model.trim())
        .bind(req.rate)
        .bind(req.capacity)
        .bind(created_by)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Machine ID already exists"))?;

        Ok(machine)
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: &str,
        req: &UpdateMachineRequest,
    ) -> Result<Option<Machine>, AppError> {
        let machine = sqlx::query_as::<_, Machine>(
            r#"
            UPDATE machines
            SET
                model = COALESCE($2, model),
                rate = COALESCE($3, rate),
                capacity = COALESCE($4, capacity),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(req.model.as_deref().map(str::trim))
        .bind(req.rate)
        .bind(req.capacity)
        .fetch_optional(conn)
        .await?;

        Ok(machine)
    }

    /// 软删除：状态改为 inactive
    pub async fn deactivate(conn: &mut PgConnection, id: &str) -> Result<Option<Machine>, AppError> {
        let machine = sqlx::query_as::<_, Machine>(
            r#"
            UPDATE machines
            SET status = 'inactive', updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(machine)
    }
}

//! Operator repository (操作员数据访问)

use crate::{error::AppError, models::operator::*};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub struct OperatorRepository {
    db: PgPool,
}

impl OperatorRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Operator>, AppError> {
        let operator = sqlx::query_as::<_, Operator>("SELECT * FROM operators WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(operator)
    }

    /// 工号在启用和停用的操作员之间都唯一
    pub async fn find_by_badge(&self, badge: &str) -> Result<Option<Operator>, AppError> {
        let operator = sqlx::query_as::<_, Operator>("SELECT * FROM operators WHERE badge = $1")
            .bind(badge)
            .fetch_optional(&self.db)
            .await?;

        Ok(operator)
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Operator>, AppError> {
        let operators = sqlx::query_as::<_, Operator>(
            r#"
            SELECT * FROM operators
            WHERE $1 OR status = 'active'
            ORDER BY name
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        Ok(operators)
    }

    pub async fn insert(
        conn: &mut PgConnection,
        name: &str,
        badge: &str,
        created_by: Uuid,
    ) -> Result<Operator, AppError> {
        let operator = sqlx::query_as::<_, Operator>(
            r#"
            INSERT INTO operators (name, badge, created_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(badge)
        .bind(created_by)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Badge number already exists"))?;

        Ok(operator)
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        name: Option<&str>,
        badge: Option<&str>,
    ) -> Result<Option<Operator>, AppError> {
        let operator = sqlx::query_as::<_, Operator>(
            r#"
            UPDATE operators
            SET
                name = COALESCE($2, name),
                badge = COALESCE($3, badge),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(badge)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Badge number already exists"))?;

        Ok(operator)
    }

    /// 软删除：状态改为 inactive
    pub async fn deactivate(conn: &mut PgConnection, id: Uuid) -> Result<Option<Operator>, AppError> {
        let operator = sqlx::query_as::<_, Operator>(
            r#"
            UPDATE operators
            SET status = 'inactive', updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(operator)
    }
}

//! Audit repository (审计数据访问)

use crate::{error::AppError, models::audit::*};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// 待写入的审计记录
#[derive(Debug, Clone)]
pub struct NewAuditLog<'a> {
    pub actor_id: Uuid,
    pub actor_name: &'a str,
    pub action: &'a str,
    pub entity_type: Option<&'a str>,
    pub entity_id: Option<String>,
    pub details: Option<String>,
}

pub struct AuditRepository {
    db: PgPool,
}

impl AuditRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 追加审计日志（只插入，从不更新或删除）
    pub async fn insert(conn: &mut PgConnection, log: &NewAuditLog<'_>) -> Result<AuditLog, AppError> {
        let entry = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (actor_id, actor_name, action, entity_type, entity_id, details)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(log.actor_id)
        .bind(log.actor_name)
        .bind(log.action)
        .bind(log.entity_type)
        .bind(&log.entity_id)
        .bind(&log.details)
        .fetch_one(conn)
        .await?;

        Ok(entry)
    }

    /// 查询审计日志，最新的在前
    pub async fn query(&self, filters: &AuditLogFilters) -> Result<Vec<AuditLog>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM audit_logs WHERE 1=1");

        if let Some(actor_id) = filters.actor_id {
            builder.push(" AND actor_id = ").push_bind(actor_id);
        }
        if let Some(action) = &filters.action {
            builder.push(" AND action = ").push_bind(action.clone());
        }
        if let Some(entity_type) = &filters.entity_type {
            builder.push(" AND entity_type = ").push_bind(entity_type.clone());
        }
        if let Some(entity_id) = &filters.entity_id {
            builder.push(" AND entity_id = ").push_bind(entity_id.clone());
        }

        builder
            .push(" ORDER BY occurred_at DESC, id DESC LIMIT ")
            .push_bind(filters.limit.clamp(1, 500));

        let logs = builder
            .build_query_as::<AuditLog>()
            .fetch_all(&self.db)
            .await?;

        Ok(logs)
    }
}

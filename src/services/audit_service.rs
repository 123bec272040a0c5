//! 审计日志服务
//!
//! 审计记录只追加，写入必须与对应的业务写操作处于同一事务。

use crate::{
    error::AppError,
    models::{audit::*, role::Resource, user::User},
    repository::audit_repo::{AuditRepository, NewAuditLog},
};
use sqlx::{PgConnection, PgPool};
use std::fmt;
use uuid::Uuid;

/// 审计操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
    SystemInitialized,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
            AuditAction::SystemInitialized => "system_initialized",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一条审计记录，actor 总是显式传入
#[derive(Debug, Clone)]
pub struct AuditEntry<'a> {
    pub actor_id: Uuid,
    pub actor_name: &'a str,
    pub action: AuditAction,
    pub entity: Option<(Resource, String)>,
    pub details: Option<String>,
}

impl<'a> AuditEntry<'a> {
    pub fn new(actor: &'a User, action: AuditAction) -> Self {
        Self {
            actor_id: actor.id,
            actor_name: &actor.username,
            action,
            entity: None,
            details: None,
        }
    }

    pub fn entity(mut self, resource: Resource, id: impl ToString) -> Self {
        self.entity = Some((resource, id.to_string()));
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub struct AuditService {
    db: PgPool,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 在调用方的事务中追加审计日志
    pub async fn record(
        &self,
        conn: &mut PgConnection,
        entry: AuditEntry<'_>,
    ) -> Result<AuditLog, AppError> {
        let (entity_type, entity_id) = match entry.entity {
            Some((resource, id)) => (Some(resource.as_str()), Some(id)),
            None => (None, None),
        };

        let log = AuditRepository::insert(
            conn,
            &NewAuditLog {
                actor_id: entry.actor_id,
                actor_name: entry.actor_name,
                action: entry.action.as_str(),
                entity_type,
                entity_id,
                details: entry.details,
            },
        )
        .await?;

        tracing::debug!(
            actor = %log.actor_name,
            action = %log.action,
            entity_type = ?log.entity_type,
            entity_id = ?log.entity_id,
            "Audit entry recorded"
        );

        Ok(log)
    }

    /// 查询审计日志（最新在前）
    pub async fn query_logs(&self, filters: &AuditLogFilters) -> Result<Vec<AuditLog>, AppError> {
        AuditRepository::new(self.db.clone()).query(filters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(AuditAction::Create.as_str(), "create");
        assert_eq!(AuditAction::SystemInitialized.to_string(), "system_initialized");
    }
}

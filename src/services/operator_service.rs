//! 操作员管理服务

use crate::{
    error::AppError,
    models::operator::*,
    models::role::{Action, Resource},
    models::user::User,
    repository::operator_repo::OperatorRepository,
    services::audit_service::{AuditAction, AuditEntry, AuditService},
    services::auth_service::AuthService,
    services::permission_service::require_permission,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct OperatorService {
    db: PgPool,
    audit_service: Arc<AuditService>,
    auth_service: Arc<AuthService>,
}

impl OperatorService {
    pub fn new(db: PgPool, audit_service: Arc<AuditService>, auth_service: Arc<AuthService>) -> Self {
        Self {
            db,
            audit_service,
            auth_service,
        }
    }

    fn repo(&self) -> OperatorRepository {
        OperatorRepository::new(self.db.clone())
    }

    pub async fn list(&self, actor: &User, query: &OperatorListQuery) -> Result<Vec<Operator>, AppError> {
        require_permission(actor, Resource::Operators, Action::Read)?;
        self.repo().list(query.include_inactive).await
    }

    pub async fn get(&self, actor: &User, id: Uuid) -> Result<Operator, AppError> {
        require_permission(actor, Resource::Operators, Action::Read)?;
        self.repo()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("operator"))
    }

    /// 创建操作员；工号重复时不写入任何数据或审计
    pub async fn create(&self, actor: &User, req: CreateOperatorRequest) -> Result<Operator, AppError> {
        require_permission(actor, Resource::Operators, Action::Write)?;
        req.validate()?;

        let name = req.name.trim();
        let badge = req.badge.trim();
        if name.is_empty() || badge.is_empty() {
            return Err(AppError::validation("Name and badge number are required"));
        }
        if self.repo().find_by_badge(badge).await?.is_some() {
            return Err(AppError::conflict("Badge number already exists"));
        }

        let mut tx = self.db.begin().await?;
        let operator = OperatorRepository::insert(&mut *tx, name, badge, actor.id).await?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(actor, AuditAction::Create)
                    .entity(Resource::Operators, operator.id)
                    .details(format!("Created operator {} (badge {})", operator.name, operator.badge)),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(actor = %actor.username, operator_id = %operator.id, "Operator created");
        Ok(operator)
    }

    pub async fn update(
        &self,
        actor: &User,
        id: Uuid,
        req: UpdateOperatorRequest,
    ) -> Result<Operator, AppError> {
        require_permission(actor, Resource::Operators, Action::Write)?;
        req.validate()?;

        let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let badge = req.badge.as_deref().map(str::trim).filter(|b| !b.is_empty());

        if let Some(badge) = badge {
            if let Some(other) = self.repo().find_by_badge(badge).await? {
                if other.id != id {
                    return Err(AppError::conflict("Badge number already exists"));
                }
            }
        }

        let mut tx = self.db.begin().await?;
        let operator = OperatorRepository::update(&mut *tx, id, name, badge)
            .await?
            .ok_or_else(|| AppError::not_found("operator"))?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(actor, AuditAction::Update)
                    .entity(Resource::Operators, operator.id)
                    .details(format!("Operator {} (badge {})", operator.name, operator.badge)),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(actor = %actor.username, operator_id = %operator.id, "Operator updated");
        Ok(operator)
    }

    /// 软删除操作员；需要管理员密码二次确认
    pub async fn deactivate(
        &self,
        actor: &User,
        id: Uuid,
        admin_password: &str,
    ) -> Result<Operator, AppError> {
        require_permission(actor, Resource::Operators, Action::Delete)?;
        self.auth_service
            .verify_admin_password(actor, admin_password)
            .await?;

        let existing = self
            .repo()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("operator"))?;
        if !existing.status.is_active() {
            return Err(AppError::conflict("Operator is already inactive"));
        }

        let mut tx = self.db.begin().await?;
        let operator = OperatorRepository::deactivate(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::conflict("Operator is already inactive"))?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(actor, AuditAction::Delete)
                    .entity(Resource::Operators, operator.id)
                    .details(format!("Deactivated operator {}", operator.name)),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(actor = %actor.username, operator_id = %operator.id, "Operator deactivated");
        Ok(operator)
    }
}

//! 设备管理服务

use crate::{
    error::AppError,
    models::machine::*,
    models::role::{Action, Resource},
    models::user::User,
    repository::machine_repo::MachineRepository,
    services::audit_service::{AuditAction, AuditEntry, AuditService},
    services::auth_service::AuthService,
    services::permission_service::require_permission,
};
use sqlx::PgPool;
use std::sync::Arc;
use validator::Validate;

pub struct MachineService {
    db: PgPool,
    audit_service: Arc<AuditService>,
    auth_service: Arc<AuthService>,
}

impl MachineService {
    pub fn new(db: PgPool, audit_service: Arc<AuditService>, auth_service: Arc<AuthService>) -> Self {
        Self {
            db,
            audit_service,
            auth_service,
        }
    }

    fn repo(&self) -> MachineRepository {
        MachineRepository::new(self.db.clone())
    }

    /// 默认只列出启用的设备
    pub async fn list(&self, actor: &User, query: &MachineListQuery) -> Result<Vec<Machine>, AppError> {
        require_permission(actor, Resource::Machines, Action::Read)?;
        self.repo().list(query.include_inactive).await
    }

    pub async fn get(&self, actor: &User, id: &str) -> Result<Machine, AppError> {
        require_permission(actor, Resource::Machines, Action::Read)?;
        self.repo()
            .find_by_id(&normalize_machine_id(id))
            .await?
            .ok_or_else(|| AppError::not_found("machine"))
    }

    pub async fn create(&self, actor: &User, req: CreateMachineRequest) -> Result<Machine, AppError> {
        require_permission(actor, Resource::Machines, Action::Write)?;
        req.validate()?;

        let id = req.normalized_id();
        if id.is_empty() {
            return Err(AppError::validation("Machine ID must not be blank"));
        }
        if self.repo().find_by_id(&id).await?.is_some() {
            return Err(AppError::conflict("Machine ID already exists"));
        }

        let mut tx = self.db.begin().await?;
        let machine = MachineRepository::insert(&mut *tx, &id, &req, actor.id).await?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(actor, AuditAction::Create)
                    .entity(Resource::Machines, &machine.id)
                    .details(format!(
                        "Created machine {} ({}), rate {}",
                        machine.id, machine.model, machine.rate
                    )),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(actor = %actor.username, machine_id = %machine.id, "Machine created");
        Ok(machine)
    }

    pub async fn update(
        &self,
        actor: &User,
        id: &str,
        req: UpdateMachineRequest,
    ) -> Result<Machine, AppError> {
        require_permission(actor, Resource::Machines, Action::Write)?;
        req.validate()?;

        let id = normalize_machine_id(id);

        let mut tx = self.db.begin().await?;
        let machine = MachineRepository::update(&mut *tx, &id, &req)
            .await?
            .ok_or_else(|| AppError::not_found("machine"))?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(actor, AuditAction::Update)
                    .entity(Resource::Machines, &machine.id)
                    .details(format!(
                        "Machine {}: model {}, rate {}, capacity {}",
                        machine.id, machine.model, machine.rate, machine.capacity
                    )),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(actor = %actor.username, machine_id = %machine.id, "Machine updated");
        Ok(machine)
    }

    /// 软删除设备；需要管理员密码二次确认，历史加油记录保留
    pub async fn deactivate(
        &self,
        actor: &User,
        id: &str,
        admin_password: &str,
    ) -> Result<Machine, AppError> {
        require_permission(actor, Resource::Machines, Action::Delete)?;
        self.auth_service
            .verify_admin_password(actor, admin_password)
            .await?;

        let id = normalize_machine_id(id);
        let existing = self
            .repo()
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::not_found("machine"))?;
        if !existing.status.is_active() {
            return Err(AppError::conflict("Machine is already inactive"));
        }

        let mut tx = self.db.begin().await?;
        let machine = MachineRepository::deactivate(&mut *tx, &id)
            .await?
            .ok_or_else(|| AppError::conflict("Machine is already inactive"))?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(actor, AuditAction::Delete)
                    .entity(Resource::Machines, &machine.id)
                    .details(format!("Deactivated machine {}", machine.id)),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(actor = %actor.username, machine_id = %machine.id, "Machine deactivated");
        Ok(machine)
    }
}

//! 用户管理服务

use crate::{
    auth::password::PasswordHasher,
    config::SecurityConfig,
    error::AppError,
    models::role::{Action, Resource, Role},
    models::user::*,
    repository::user_repo::{NewUser, UserChanges, UserRepository},
    services::audit_service::{AuditAction, AuditEntry, AuditService},
    services::permission_service::require_permission,
};
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct UserService {
    db: PgPool,
    audit_service: Arc<AuditService>,
    hasher: PasswordHasher,
    security: SecurityConfig,
}

impl UserService {
    pub fn new(
        db: PgPool,
        audit_service: Arc<AuditService>,
        hasher: PasswordHasher,
        security: SecurityConfig,
    ) -> Self {
        Self {
            db,
            audit_service,
            hasher,
            security,
        }
    }

    fn repo(&self) -> UserRepository {
        UserRepository::new(self.db.clone())
    }

    pub async fn list(&self, actor: &User) -> Result<Vec<User>, AppError> {
        require_permission(actor, Resource::Users, Action::Read)?;
        self.repo().list().await
    }

    pub async fn get(&self, actor: &User, id: Uuid) -> Result<User, AppError> {
        require_permission(actor, Resource::Users, Action::Read)?;
        self.repo()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))
    }

    /// 创建用户
    pub async fn create(&self, actor: &User, req: CreateUserRequest) -> Result<User, AppError> {
        require_permission(actor, Resource::Users, Action::Write)?;
        req.validate()?;

        let role: Role = req.role.parse().map_err(AppError::Validation)?;
        let username = req.username.trim();
        PasswordHasher::validate_password_policy(&req.password, &self.security)?;

        if self.repo().username_exists(username).await? {
            return Err(AppError::conflict("Username already exists"));
        }

        let password_hash = self.hasher.hash(&req.password)?;

        let mut tx = self.db.begin().await?;
        let user = UserRepository::insert(
            &mut *tx,
            &NewUser {
                username,
                password_hash: &password_hash,
                full_name: req.full_name.trim(),
                email: req.email.as_deref(),
                role,
                permissions: req.permissions.as_ref().map(|p| p.to_value()),
                created_by: Some(actor.id),
            },
        )
        .await?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(actor, AuditAction::Create)
                    .entity(Resource::Users, user.id)
                    .details(format!("Created user {} with role {}", user.username, user.role)),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(actor = %actor.username, user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    /// 更新用户资料、角色或覆盖权限
    pub async fn update(&self, actor: &User, id: Uuid, req: UpdateUserRequest) -> Result<User, AppError> {
        require_permission(actor, Resource::Users, Action::Write)?;
        req.validate()?;

        let role = req
            .role
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()
            .map_err(AppError::Validation)?;

        if actor.id == id && role.is_some_and(|role| role != actor.role) {
            return Err(AppError::validation("You cannot change your own role"));
        }

        let changes = UserChanges {
            full_name: req.full_name.as_deref().map(str::trim),
            email: req.email.as_deref(),
            role,
            permissions: req.permissions.as_ref().map(|p| p.to_value()),
            clear_permissions: req.clear_permissions,
        };

        let mut tx = self.db.begin().await?;
        if role.is_some_and(|role| role != Role::Admin) {
            ensure_other_admin_remains(&mut *tx, id).await?;
        }
        let user = UserRepository::update(&mut *tx, id, &changes)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(actor, AuditAction::Update)
                    .entity(Resource::Users, user.id)
                    .details(describe_changes(&changes)),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(actor = %actor.username, user_id = %user.id, "User updated");
        Ok(user)
    }

    /// 停用用户；不能停用自己
    pub async fn deactivate(&self, actor: &User, id: Uuid) -> Result<User, AppError> {
        require_permission(actor, Resource::Users, Action::Delete)?;

        if actor.id == id {
            return Err(AppError::validation("You cannot deactivate your own account"));
        }

        let mut tx = self.db.begin().await?;
        ensure_other_admin_remains(&mut *tx, id).await?;
        let user = UserRepository::deactivate(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("active user"))?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(actor, AuditAction::Delete)
                    .entity(Resource::Users, user.id)
                    .details(format!("Deactivated user {}", user.username)),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(actor = %actor.username, user_id = %user.id, "User deactivated");
        Ok(user)
    }
}

/// 目标是唯一启用的管理员时拒绝降级或停用
async fn ensure_other_admin_remains(conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
    let admins = UserRepository::lock_active_admin_ids(conn).await?;
    if admins == [id] {
        return Err(AppError::conflict("At least one active admin must remain"));
    }
    Ok(())
}

fn describe_changes(changes: &UserChanges<'_>) -> String {
    let mut fields = Vec::new();
    if changes.full_name.is_some() {
        fields.push("full_name".to_string());
    }
    if changes.email.is_some() {
        fields.push("email".to_string());
    }
    if let Some(role) = changes.role {
        fields.push(format!("role={}", role));
    }
    if changes.clear_permissions {
        fields.push("permissions cleared".to_string());
    } else if changes.permissions.is_some() {
        fields.push("permissions".to_string());
    }

    if fields.is_empty() {
        "No fields changed".to_string()
    } else {
        format!("Updated {}", fields.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_changes() {
        let changes = UserChanges {
            role: Some(Role::Manager),
            clear_permissions: true,
            ..Default::default()
        };
        assert_eq!(describe_changes(&changes), "Updated role=manager, permissions cleared");
        assert_eq!(describe_changes(&UserChanges::default()), "No fields changed");
    }
}

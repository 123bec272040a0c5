//! 认证服务：登录、登出、令牌校验、删除二次认证、初始管理员

use crate::{
    auth::jwt::JwtService,
    auth::password::PasswordHasher,
    config::{BootstrapConfig, SecurityConfig},
    error::AppError,
    models::{auth::*, role::Resource, role::Role, user::*},
    repository::user_repo::{NewUser, UserRepository},
    services::audit_service::{AuditAction, AuditEntry, AuditService},
};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use std::sync::Arc;

pub struct AuthService {
    db: PgPool,
    jwt_service: Arc<JwtService>,
    audit_service: Arc<AuditService>,
    hasher: PasswordHasher,
    security: SecurityConfig,
}

impl AuthService {
    pub fn new(
        db: PgPool,
        jwt_service: Arc<JwtService>,
        audit_service: Arc<AuditService>,
        hasher: PasswordHasher,
        security: SecurityConfig,
    ) -> Self {
        Self {
            db,
            jwt_service,
            audit_service,
            hasher,
            security,
        }
    }

    /// 用户登录
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        let user = user_repo
            .find_by_username(req.username.trim())
            .await?
            .filter(|u| u.active)
            .ok_or_else(|| {
                tracing::warn!(username = %req.username, "Login failed: unknown or inactive user");
                AppError::Unauthorized
            })?;

        if !self
            .hasher
            .matches_any(&req.password, vec![user.password_hash.clone()])
            .await?
        {
            tracing::warn!(user_id = %user.id, username = %user.username, "Login failed: wrong password");
            return Err(AppError::Unauthorized);
        }

        let mut tx = self.db.begin().await?;
        UserRepository::touch_last_login(&mut *tx, user.id).await?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(&user, AuditAction::Login).entity(Resource::Users, user.id),
            )
            .await?;
        tx.commit().await?;

        let access_token = self
            .jwt_service
            .generate_access_token(&user.id, &user.username, user.role)?;

        tracing::info!(user_id = %user.id, username = %user.username, "User logged in");

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_exp_secs(),
            user: user.into(),
        })
    }

    /// 登出（令牌本身无状态，只记录审计）
    pub async fn logout(&self, user: &User) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(user, AuditAction::Logout).entity(Resource::Users, user.id),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User logged out");
        Ok(())
    }

    /// 校验访问令牌并重新加载启用的用户
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.jwt_service.validate_access_token(token)?;
        let user_id = claims.user_id()?;

        UserRepository::new(self.db.clone())
            .find_active_by_id(user_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(user_id = %user_id, "Token subject is missing or inactive");
                AppError::Unauthorized
            })
    }

    /// 删除操作的二次认证：密码需与任一启用的管理员匹配
    pub async fn verify_admin_password(&self, actor: &User, password: &str) -> Result<(), AppError> {
        if !password.is_empty() {
            let hashes = UserRepository::new(self.db.clone())
                .list_active_admins()
                .await?
                .into_iter()
                .map(|admin| admin.password_hash)
                .collect();
            if self.hasher.matches_any(password, hashes).await? {
                return Ok(());
            }
        }

        tracing::warn!(
            user_id = %actor.id,
            username = %actor.username,
            "Admin re-authentication failed"
        );
        Err(AppError::ReauthenticationFailed)
    }

    /// 没有启用的管理员且配置了初始密码时创建管理员账户
    pub async fn bootstrap_admin(&self, bootstrap: &BootstrapConfig) -> Result<Option<User>, AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        if !user_repo.list_active_admins().await?.is_empty() {
            return Ok(None);
        }

        let Some(password) = &bootstrap.admin_password else {
            tracing::warn!("No active admin account and no bootstrap password configured");
            return Ok(None);
        };

        PasswordHasher::validate_password_policy(password.expose_secret(), &self.security)?;
        let password_hash = self.hasher.hash(password.expose_secret())?;

        let mut tx = self.db.begin().await?;
        let admin = UserRepository::insert(
            &mut *tx,
            &NewUser {
                username: bootstrap.admin_username.trim(),
                password_hash: &password_hash,
                full_name: &bootstrap.admin_full_name,
                email: bootstrap.admin_email.as_deref(),
                role: Role::Admin,
                permissions: None,
                created_by: None,
            },
        )
        .await?;
        self.audit_service
            .record(
                &mut *tx,
                AuditEntry::new(&admin, AuditAction::SystemInitialized)
                    .entity(Resource::Users, admin.id)
                    .details("Initial admin account created"),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %admin.id, username = %admin.username, "Bootstrap admin created");
        Ok(Some(admin))
    }
}

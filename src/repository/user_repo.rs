//! User repository (用户数据访问)

use crate::{
    error::AppError,
    models::role::Role,
    models::user::{User, UserRow},
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// 新用户数据（密码已哈希）
#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
    pub email: Option<&'a str>,
    pub role: Role,
    pub permissions: Option<serde_json::Value>,
    pub created_by: Option<Uuid>,
}

/// 用户更新字段；`None` 表示保持不变
#[derive(Debug, Default)]
pub struct UserChanges<'a> {
    pub full_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub role: Option<Role>,
    pub permissions: Option<serde_json::Value>,
    pub clear_permissions: bool,
}

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 根据 ID 查找用户
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(User::from))
    }

    /// 根据 ID 查找启用的用户
    pub async fn find_active_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1 AND active")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(User::from))
    }

    /// 根据用户名查找用户
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(User::from))
    }

    /// 所有启用的管理员，用于删除操作的二次认证
    pub async fn list_active_admins(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE role = $1 AND active ORDER BY created_at",
        )
        .bind(Role::Admin)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY username")
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.db)
                .await?;

        Ok(exists)
    }

    /// 创建用户
    pub async fn insert(conn: &mut PgConnection, user: &NewUser<'_>) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password_hash, full_name, email, role, permissions, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(user.username)
        .bind(user.password_hash)
        .bind(user.full_name)
        .bind(user.email)
        .bind(user.role)
        .bind(&user.permissions)
        .bind(user.created_by)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Username already exists"))?;

        Ok(row.into())
    }

    /// 更新用户资料、角色和覆盖权限
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        changes: &UserChanges<'_>,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                permissions = CASE WHEN $6 THEN NULL ELSE COALESCE($5, permissions) END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.full_name)
        .bind(changes.email)
        .bind(changes.role)
        .bind(&changes.permissions)
        .bind(changes.clear_permissions)
        .fetch_optional(conn)
        .await?;

        Ok(row.map(User::from))
    }

    /// 停用用户（从不物理删除）
    pub async fn deactivate(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET active = FALSE, updated_at = NOW()
            WHERE id = $1 AND active
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(row.map(User::from))
    }

    /// 锁定所有启用的管理员行，直到事务结束
    pub async fn lock_active_admin_ids(conn: &mut PgConnection) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE role = $1 AND active ORDER BY id FOR UPDATE",
        )
        .bind(Role::Admin)
        .fetch_all(conn)
        .await?;

        Ok(ids)
    }

    /// 更新最后登录时间
    pub async fn touch_last_login(conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(())
    }
}

//! 权限检查服务
//!
//! 纯函数：根据用户角色和可选的覆盖权限判断 (resource, action) 是否允许。
//! 不访问数据库，调用方必须显式传入已认证的用户。

use crate::{
    error::AppError,
    models::role::{Action, PermissionSummary, Resource, Role},
    models::user::User,
};

/// 角色默认权限表
pub fn role_permissions(role: Role, resource: Resource) -> &'static [Action] {
    use Action::*;
    use Resource::*;

    match (role, resource) {
        (Role::Admin, _) => &[Read, Write, Delete, Admin],

        (Role::Manager, Machines | Operators | Refuels) => &[Read, Write, Delete],
        (Role::Manager, Settings | Users) => &[Read],
        (Role::Manager, Reports) => &[Read, Write],

        (Role::DataEntry, Machines | Operators | Refuels) => &[Read, Write],
        (Role::DataEntry, Settings | Reports) => &[Read],
        (Role::DataEntry, Users) => &[],

        (Role::Viewer, Users) => &[],
        (Role::Viewer, _) => &[Read],
    }
}

/// 检查用户是否拥有权限
///
/// 1. 未认证或已停用的用户一律拒绝
/// 2. admin 角色直接放行（包括其自身的限制性覆盖权限）
/// 3. 存在非空覆盖权限时只看覆盖权限，缺失的资源视为无权限
/// 4. 否则使用角色默认权限表
pub fn is_allowed(user: Option<&User>, resource: Resource, action: Action) -> bool {
    let Some(user) = user else {
        return false;
    };

    if !user.active {
        return false;
    }

    if user.role == Role::Admin {
        return true;
    }

    if let Some(overrides) = user.permissions.as_ref().filter(|p| !p.is_empty()) {
        return overrides.allows(resource, action);
    }

    role_permissions(user.role, resource).contains(&action)
}

/// 检查权限，如果无权限则返回错误
pub fn require_permission(user: &User, resource: Resource, action: Action) -> Result<(), AppError> {
    if is_allowed(Some(user), resource, action) {
        return Ok(());
    }

    tracing::warn!(
        user_id = %user.id,
        username = %user.username,
        role = %user.role,
        resource = %resource,
        action = %action,
        "Permission denied"
    );
    metrics::counter!(
        "permission_denied_total",
        "resource" => resource.as_str(),
        "action" => action.as_str()
    )
    .increment(1);

    Err(AppError::Forbidden)
}

/// 获取用户的有效权限摘要
pub fn effective_permissions(user: &User) -> Vec<PermissionSummary> {
    Resource::ALL
        .iter()
        .map(|&resource| PermissionSummary {
            resource,
            actions: Action::ALL
                .iter()
                .copied()
                .filter(|&action| is_allowed(Some(user), resource, action))
                .collect(),
        })
        .collect()
}

//! 审计日志的 HTTP 处理器

use crate::{
    auth::middleware::CurrentUser,
    error::AppError,
    extract::ApiQuery,
    middleware::AppState,
    models::{
        audit::AuditLogFilters,
        role::{Action, Resource},
    },
    services::permission_service::require_permission,
};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// 最近的审计日志（需要 users 读权限）
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiQuery(filters): ApiQuery<AuditLogFilters>,
) -> Result<impl IntoResponse, AppError> {
    require_permission(&actor, Resource::Users, Action::Read)?;

    let logs = state.audit_service.query_logs(&filters).await?;

    Ok(Json(json!({
        "logs": logs,
        "count": logs.len()
    })))
}

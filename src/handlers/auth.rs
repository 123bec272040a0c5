//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::CurrentUser,
    error::AppError,
    extract::ValidatedJson,
    middleware::AppState,
    models::{auth::LoginRequest, user::UserResponse},
    services::permission_service::effective_permissions,
};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;
    Ok(Json(response))
}

/// 登出
pub async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.logout(&user).await?;
    Ok(Json(json!({ "message": "Logged out" })))
}

/// 当前用户及其有效权限
pub async fn me(CurrentUser(user): CurrentUser) -> Result<impl IntoResponse, AppError> {
    let permissions = effective_permissions(&user);
    Ok(Json(json!({
        "user": UserResponse::from(user),
        "permissions": permissions,
    })))
}

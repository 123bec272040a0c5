//! 用户管理的 HTTP 处理器

use crate::{
    auth::middleware::CurrentUser,
    error::AppError,
    extract::{ApiPath, ValidatedJson},
    middleware::AppState,
    models::user::*,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let users: Vec<UserResponse> = state
        .user_service
        .list(&actor)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(json!({
        "users": users,
        "count": users.len()
    })))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.get(&actor, id).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.create(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.update(&actor, id, req).await?;
    Ok(Json(UserResponse::from(user)))
}

/// 停用用户
pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.deactivate(&actor, id).await?;
    Ok(Json(json!({
        "message": "User deactivated",
        "user": UserResponse::from(user)
    })))
}

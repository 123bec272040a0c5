//! 操作员管理的 HTTP 处理器

use crate::{
    auth::middleware::CurrentUser,
    error::AppError,
    extract::{ApiPath, ApiQuery, ValidatedJson},
    middleware::AppState,
    models::{auth::DeleteConfirmation, operator::*},
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

pub async fn list_operators(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiQuery(query): ApiQuery<OperatorListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let operators = state.operator_service.list(&actor, &query).await?;
    Ok(Json(json!({
        "operators": operators,
        "count": operators.len()
    })))
}

pub async fn get_operator(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let operator = state.operator_service.get(&actor, id).await?;
    Ok(Json(operator))
}

pub async fn create_operator(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateOperatorRequest>,
) -> Result<impl IntoResponse, AppError> {
    let operator = state.operator_service.create(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(operator)))
}

pub async fn update_operator(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateOperatorRequest>,
) -> Result<impl IntoResponse, AppError> {
    let operator = state.operator_service.update(&actor, id, req).await?;
    Ok(Json(operator))
}

/// 软删除操作员（需要管理员密码）
pub async fn deactivate_operator(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(confirmation): ValidatedJson<DeleteConfirmation>,
) -> Result<impl IntoResponse, AppError> {
    let operator = state
        .operator_service
        .deactivate(&actor, id, &confirmation.admin_password)
        .await?;

    Ok(Json(json!({
        "message": "Operator deactivated",
        "operator": operator
    })))
}

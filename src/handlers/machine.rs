//! 设备管理的 HTTP 处理器

use crate::{
    auth::middleware::CurrentUser,
    error::AppError,
    extract::{ApiPath, ApiQuery, ValidatedJson},
    middleware::AppState,
    models::{auth::DeleteConfirmation, machine::*},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

pub async fn list_machines(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiQuery(query): ApiQuery<MachineListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let machines = state.machine_service.list(&actor, &query).await?;
    Ok(Json(json!({
        "machines": machines,
        "count": machines.len()
    })))
}

pub async fn get_machine(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> Result<impl IntoResponse, AppError> {
    let machine = state.machine_service.get(&actor, &id).await?;
    Ok(Json(machine))
}

pub async fn create_machine(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateMachineRequest>,
) -> Result<impl IntoResponse, AppError> {
    let machine = state.machine_service.create(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(machine)))
}

pub async fn update_machine(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<UpdateMachineRequest>,
) -> Result<impl IntoResponse, AppError> {
    let machine = state.machine_service.update(&actor, &id, req).await?;
    Ok(Json(machine))
}

/// 软删除设备（需要管理员密码）
pub async fn deactivate_machine(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<String>,
    ValidatedJson(confirmation): ValidatedJson<DeleteConfirmation>,
) -> Result<impl IntoResponse, AppError> {
    let machine = state
        .machine_service
        .deactivate(&actor, &id, &confirmation.admin_password)
        .await?;

    Ok(Json(json!({
        "message": "Machine deactivated",
        "machine": machine
    })))
}

//! 加油记录的 HTTP 处理器

use crate::{
    auth::middleware::CurrentUser,
    error::AppError,
    extract::{ApiPath, ApiQuery, ValidatedJson},
    middleware::AppState,
    models::{auth::DeleteConfirmation, refuel::*},
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

pub async fn list_refuels(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiQuery(query): ApiQuery<RefuelListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let refuels = state.refuel_service.list(&actor, &query).await?;
    let anomalies = refuels.iter().filter(|r| r.variance.is_anomaly).count();

    Ok(Json(json!({
        "refuels": refuels,
        "count": refuels.len(),
        "anomalies": anomalies
    })))
}

pub async fn get_refuel(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let refuel = state.refuel_service.get(&actor, id).await?;
    Ok(Json(refuel))
}

pub async fn create_refuel(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateRefuelRequest>,
) -> Result<impl IntoResponse, AppError> {
    let refuel = state.refuel_service.create(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(refuel)))
}

/// 偏差预览
pub async fn preview_variance(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ValidatedJson(req): ValidatedJson<VariancePreviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let preview = state.refuel_service.preview(&actor, req).await?;
    Ok(Json(preview))
}

/// 删除加油记录（需要管理员密码）
pub async fn delete_refuel(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(confirmation): ValidatedJson<DeleteConfirmation>,
) -> Result<impl IntoResponse, AppError> {
    state
        .refuel_service
        .delete(&actor, id, &confirmation.admin_password)
        .await?;

    Ok(Json(json!({
        "message": "Refuel entry deleted",
        "id": id
    })))
}

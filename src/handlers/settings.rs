//! 系统设置的 HTTP 处理器

use crate::{
    auth::middleware::CurrentUser, error::AppError, extract::ValidatedJson, middleware::AppState,
    models::settings::UpdateSettingsRequest,
};
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let settings = state.settings_service.get(&actor).await?;
    Ok(Json(settings))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ValidatedJson(req): ValidatedJson<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let settings = state.settings_service.update(&actor, req).await?;
    Ok(Json(settings))
}

/// 系统信息
pub async fn system_info(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let info = state.analytics_service.system_info(&actor).await?;
    Ok(Json(info))
}

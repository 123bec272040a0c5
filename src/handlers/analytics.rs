//! 报表的 HTTP 处理器

use crate::{
    auth::middleware::CurrentUser, error::AppError, extract::ApiQuery, middleware::AppState,
    models::analytics::AnalyticsQuery,
};
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

pub async fn summary(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.analytics_service.summary(&actor, &query).await?;
    Ok(Json(summary))
}

pub async fn export(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = state.analytics_service.export(&actor, &query).await?;
    Ok(Json(report))
}

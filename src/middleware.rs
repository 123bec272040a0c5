//! 应用状态与 HTTP 中间件

use crate::{
    auth::{jwt::JwtService, password::PasswordHasher},
    config::AppConfig,
    error::AppError,
    services::*,
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 服务使用 Arc 包装，在请求之间共享。
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: PgPool,
    pub jwt_service: Arc<JwtService>,
    pub audit_service: Arc<AuditService>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub machine_service: Arc<MachineService>,
    pub operator_service: Arc<OperatorService>,
    pub refuel_service: Arc<RefuelService>,
    pub settings_service: Arc<SettingsService>,
    pub analytics_service: Arc<AnalyticsService>,
}

impl AppState {
    /// 构建所有服务
    pub fn new(config: AppConfig, db: PgPool) -> Result<Self, AppError> {
        let jwt_service = Arc::new(JwtService::from_config(&config.security)?);
        let hasher = PasswordHasher::new()?;

        let audit_service = Arc::new(AuditService::new(db.clone()));
        let auth_service = Arc::new(AuthService::new(
            db.clone(),
            jwt_service.clone(),
            audit_service.clone(),
            hasher.clone(),
            config.security.clone(),
        ));
        let user_service = Arc::new(UserService::new(
            db.clone(),
            audit_service.clone(),
            hasher,
            config.security.clone(),
        ));
        let settings_service = Arc::new(SettingsService::new(db.clone(), audit_service.clone()));
        let machine_service = Arc::new(MachineService::new(
            db.clone(),
            audit_service.clone(),
            auth_service.clone(),
        ));
        let operator_service = Arc::new(OperatorService::new(
            db.clone(),
            audit_service.clone(),
            auth_service.clone(),
        ));
        let refuel_service = Arc::new(RefuelService::new(
            db.clone(),
            audit_service.clone(),
            auth_service.clone(),
            settings_service.clone(),
        ));
        let analytics_service =
            Arc::new(AnalyticsService::new(db.clone(), settings_service.clone()));

        Ok(Self {
            config,
            db,
            jwt_service,
            audit_service,
            auth_service,
            user_service,
            machine_service,
            operator_service,
            refuel_service,
            settings_service,
            analytics_service,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let uri = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();
        let mut response = next.run(req).await;
        let elapsed = start.elapsed();

        let status = response.status();
        metrics::counter!(
            "http_requests_total",
            "method" => method.to_string(),
            "status" => status_class(status.as_u16())
        )
        .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

use crate::{handlers, middleware::AppState};

/// 请求体上限
const MAX_BODY_BYTES: usize = 64 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/api/v1/auth/login", post(handlers::auth::login));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/api/v1/auth/me", get(handlers::auth::me))
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        // 用户管理
        .route(
            "/api/v1/users",
            get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route(
            "/api/v1/users/{id}",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::deactivate_user),
        )
        // 设备
        .route(
            "/api/v1/machines",
            get(handlers::machine::list_machines).post(handlers::machine::create_machine),
        )
        .route(
            "/api/v1/machines/{id}",
            get(handlers::machine::get_machine)
                .put(handlers::machine::update_machine)
                .delete(handlers::machine::deactivate_machine),
        )
        // 操作员
        .route(
            "/api/v1/operators",
            get(handlers::operator::list_operators).post(handlers::operator::create_operator),
        )
        .route(
            "/api/v1/operators/{id}",
            get(handlers::operator::get_operator)
                .put(handlers::operator::update_operator)
                .delete(handlers::operator::deactivate_operator),
        )
        // 加油记录
        .route(
            "/api/v1/refuels",
            get(handlers::refuel::list_refuels).post(handlers::refuel::create_refuel),
        )
        .route("/api/v1/refuels/preview", post(handlers::refuel::preview_variance))
        .route(
            "/api/v1/refuels/{id}",
            get(handlers::refuel::get_refuel).delete(handlers::refuel::delete_refuel),
        )
        // 设置与系统信息
        .route(
            "/api/v1/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route("/api/v1/system/info", get(handlers::settings::system_info))
        // 报表
        .route("/api/v1/analytics/summary", get(handlers::analytics::summary))
        .route("/api/v1/analytics/export", get(handlers::analytics::export))
        // 审计日志
        .route("/api/v1/audit/logs", get(handlers::audit::list_audit_logs))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::middleware::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}

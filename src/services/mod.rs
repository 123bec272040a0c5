//! Business logic services layer

pub mod analytics_service;
pub mod audit_service;
pub mod auth_service;
pub mod machine_service;
pub mod operator_service;
pub mod permission_service;
pub mod refuel_service;
pub mod settings_service;
pub mod user_service;
pub mod variance_service;

pub use analytics_service::AnalyticsService;
pub use audit_service::{AuditAction, AuditEntry, AuditService};
pub use auth_service::AuthService;
pub use machine_service::MachineService;
pub use operator_service::OperatorService;
pub use refuel_service::RefuelService;
pub use settings_service::SettingsService;
pub use user_service::UserService;

//! Database repository layer
//!
//! 读操作直接使用连接池；写操作接收 `&mut PgConnection`，
//! 由服务层在同一事务中同时写入业务数据和审计日志。

pub mod audit_repo;
pub mod machine_repo;
pub mod operator_repo;
pub mod refuel_repo;
pub mod report_repo;
pub mod settings_repo;
pub mod user_repo;

pub use audit_repo::*;
pub use machine_repo::*;
pub use operator_repo::*;
pub use refuel_repo::*;
pub use report_repo::*;
pub use settings_repo::*;
pub use user_repo::*;

//! 数据模型模块

pub mod analytics;
pub mod audit;
pub mod auth;
pub mod machine;
pub mod operator;
pub mod refuel;
pub mod role;
pub mod settings;
pub mod status;
pub mod user;

//! HTTP 处理器模块

pub mod analytics;
pub mod audit;
pub mod auth;
pub mod health;
pub mod machine;
pub mod operator;
pub mod refuel;
pub mod settings;
pub mod user;

//! 业务数据模型
//!
//! 与 `entity` 中的数据库实体分离，对外 JSON 结构以这里为准。

pub mod auth;
pub mod common;
pub mod phases;
pub mod submissions;
pub mod tasks;
pub mod teams;
pub mod users;

pub use common::{ApiResponse, ErrorCode};

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

use serde::Deserialize;
use ts_rs::TS;

// 创建阶段请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "phase.ts")]
pub struct CreatePhaseRequest {
    pub name: String,
    pub description: Option<String>,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
}

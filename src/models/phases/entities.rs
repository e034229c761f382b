use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 比赛阶段
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "phase.ts")]
pub struct Phase {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

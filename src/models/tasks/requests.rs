use serde::Deserialize;
use ts_rs::TS;

// 创建任务请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "task.ts")]
pub struct CreateTaskRequest {
    pub phase_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub deadline: chrono::DateTime<chrono::Utc>,
    pub max_score: f64,
}

// 任务列表查询参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "task.ts")]
pub struct TaskListQuery {
    pub phase_id: Option<i64>,
    #[serde(default)]
    pub active_only: bool,
}

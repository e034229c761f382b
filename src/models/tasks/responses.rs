use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use super::entities::Task;

// 任务响应，附带读取时刻计算的过期标记
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "task.ts")]
pub struct TaskResponse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub task: Task,
    pub is_expired: bool,
}

impl TaskResponse {
    pub fn at(task: Task, now: DateTime<Utc>) -> Self {
        let is_expired = task.is_expired(now);
        Self { task, is_expired }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "task.ts")]
pub struct TaskListResponse {
    pub items: Vec<TaskResponse>,
}

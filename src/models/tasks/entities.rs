use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 截止时间是否已过：严格晚于截止时间才算过期
pub fn is_expired(deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > deadline
}

// 任务实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "task.ts")]
pub struct Task {
    pub id: i64,
    pub phase_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub max_score: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_expired(self.deadline, now)
    }
}

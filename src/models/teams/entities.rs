use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::users::User;

/// 每支队伍的人数上限（含队长）
pub const MAX_TEAM_SIZE: i32 = 5;

// 队伍实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "team.ts")]
pub struct Team {
    pub id: i64,
    pub team_name: String,
    pub team_code: String,
    pub college_name: String,
    pub leader_id: i64,
    pub member_count: i32,
    pub total_points: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Team {
    pub fn is_full(&self) -> bool {
        self.member_count >= MAX_TEAM_SIZE
    }
}

// 队伍详情：成员按用户 ID 排序，队长在前
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "team.ts")]
pub struct TeamDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub team: Team,
    pub members: Vec<User>,
    pub rank: i64,
}

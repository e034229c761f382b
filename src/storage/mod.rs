use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::models::{
    phases::{CreatePhaseRequest, Phase},
    submissions::{ArtifactRef, Submission, UpsertOutcome},
    tasks::{CreateTaskRequest, Task, TaskListQuery},
    teams::Team,
    users::{NewUser, User, UserRole},
};

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过手机号获取用户信息（登录）
    async fn get_user_by_phone(&self, phone: &str) -> Result<Option<User>>;
    // 创建不隶属于队伍的账号（评审、管理员）
    async fn create_staff_user(&self, user: NewUser, role: UserRole) -> Result<User>;
    // 统计某角色的用户数
    async fn count_users_by_role(&self, role: UserRole) -> Result<u64>;

    /// 队伍管理方法
    // 队长注册并创建队伍，返回队长与队伍
    async fn register_leader(
        &self,
        leader: NewUser,
        team_name: &str,
        college_name: &str,
    ) -> Result<(User, Team)>;
    // 队员凭队伍码加入
    async fn join_team(&self, team_code: &str, member: NewUser) -> Result<(User, Team)>;
    async fn get_team_by_id(&self, team_id: i64) -> Result<Option<Team>>;
    async fn get_team_by_code(&self, team_code: &str) -> Result<Option<Team>>;
    // 队伍成员，按用户 ID 升序
    async fn list_team_members(&self, team_id: i64) -> Result<Vec<User>>;
    // 排名 = 1 + 总分严格更高的队伍数
    async fn get_team_rank(&self, team_id: i64) -> Result<Option<i64>>;

    /// 阶段管理方法
    async fn create_phase(&self, req: CreatePhaseRequest) -> Result<Phase>;
    // 原子地切换唯一激活阶段
    async fn activate_phase(&self, phase_id: i64) -> Result<Phase>;
    async fn get_active_phase(&self) -> Result<Option<Phase>>;
    async fn get_phase_by_id(&self, phase_id: i64) -> Result<Option<Phase>>;
    async fn list_phases(&self) -> Result<Vec<Phase>>;

    /// 任务管理方法
    async fn create_task(&self, req: CreateTaskRequest) -> Result<Task>;
    async fn get_task_by_id(&self, task_id: i64) -> Result<Option<Task>>;
    async fn list_tasks(&self, query: TaskListQuery) -> Result<Vec<Task>>;

    /// 提交管理方法
    // 新建或替换提交记录；旧产物路径通过返回值交给调用方清理
    async fn upsert_submission(
        &self,
        team_id: i64,
        task_id: i64,
        artifact: &ArtifactRef,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome>;
    // 评分并重算队伍总分
    async fn grade_submission(
        &self,
        submission_id: i64,
        score: f64,
        remarks: Option<String>,
        grader_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Submission>;
    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>>;
    async fn get_submission_by_team_task(
        &self,
        team_id: i64,
        task_id: i64,
    ) -> Result<Option<Submission>>;
    async fn list_submissions_by_team(&self, team_id: i64) -> Result<Vec<Submission>>;
    // 按提交时间倒序
    async fn list_submissions_by_task(&self, task_id: i64) -> Result<Vec<Submission>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}

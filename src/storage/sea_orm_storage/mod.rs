//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod phases;
mod submissions;
mod tasks;
mod teams;
mod users;

use crate::config::AppConfig;
use crate::errors::{ContestError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config.database.pool_size, config.database.timeout)
                .await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        Self::migrate(&db).await?;
        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    async fn migrate(db: &DatabaseConnection) -> Result<()> {
        Migrator::up(db, None)
            .await
            .map_err(|e| ContestError::database_operation(format!("数据库迁移失败: {e}")))
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    ///
    /// 多连接下写事务必须以写语句开头：先读后写的延迟事务在其他连接提交后
    /// 会直接返回 SQLITE_BUSY，busy_timeout 对此无效。
    async fn connect_sqlite(
        url: &str,
        pool_size: u32,
        timeout_secs: u64,
    ) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| ContestError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(timeout_secs))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| ContestError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(2)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false);

        Database::connect(opt)
            .await
            .map_err(|e| ContestError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(ContestError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }

    /// 测试用的内存 SQLite：单连接，保证所有查询看到同一个库
    #[cfg(test)]
    pub(crate) async fn new_in_memory() -> Result<Self> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| ContestError::database_config(e.to_string()))?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opt)
            .await
            .map_err(|e| ContestError::database_connection(e.to_string()))?;

        let db = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);
        Self::migrate(&db).await?;
        Ok(Self { db })
    }

    /// 测试用的文件 SQLite：与线上相同的 WAL 连接池，用于并发场景
    #[cfg(test)]
    pub(crate) async fn new_file_backed(dir: &std::path::Path) -> Result<Self> {
        let url = format!("sqlite://{}?mode=rwc", dir.join("contest.db").display());
        let db = Self::connect_sqlite(&url, 8, 10).await?;
        Self::migrate(&db).await?;
        Ok(Self { db })
    }
}

/// 唯一约束冲突且涉及指定列
pub(crate) fn is_unique_violation_on(err: &DbErr, column: &str) -> bool {
    matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains(column)
    )
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

// Storage trait 实现
use crate::models::{
    phases::{CreatePhaseRequest, Phase},
    submissions::{ArtifactRef, Submission, UpsertOutcome},
    tasks::{CreateTaskRequest, Task, TaskListQuery},
    teams::Team,
    users::{NewUser, User, UserRole},
};
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_phone(&self, phone: &str) -> Result<Option<User>> {
        self.get_user_by_phone_impl(phone).await
    }

    async fn create_staff_user(&self, user: NewUser, role: UserRole) -> Result<User> {
        self.create_staff_user_impl(user, role).await
    }

    async fn count_users_by_role(&self, role: UserRole) -> Result<u64> {
        self.count_users_by_role_impl(role).await
    }

    // 队伍模块
    async fn register_leader(
        &self,
        leader: NewUser,
        team_name: &str,
        college_name: &str,
    ) -> Result<(User, Team)> {
        self.register_leader_impl(leader, team_name, college_name)
            .await
    }

    async fn join_team(&self, team_code: &str, member: NewUser) -> Result<(User, Team)> {
        self.join_team_impl(team_code, member).await
    }

    async fn get_team_by_id(&self, team_id: i64) -> Result<Option<Team>> {
        self.get_team_by_id_impl(team_id).await
    }

    async fn get_team_by_code(&self, team_code: &str) -> Result<Option<Team>> {
        self.get_team_by_code_impl(team_code).await
    }

    async fn list_team_members(&self, team_id: i64) -> Result<Vec<User>> {
        self.list_team_members_impl(team_id).await
    }

    async fn get_team_rank(&self, team_id: i64) -> Result<Option<i64>> {
        self.get_team_rank_impl(team_id).await
    }

    // 阶段模块
    async fn create_phase(&self, req: CreatePhaseRequest) -> Result<Phase> {
        self.create_phase_impl(req).await
    }

    async fn activate_phase(&self, phase_id: i64) -> Result<Phase> {
        self.activate_phase_impl(phase_id).await
    }

    async fn get_active_phase(&self) -> Result<Option<Phase>> {
        self.get_active_phase_impl().await
    }

    async fn get_phase_by_id(&self, phase_id: i64) -> Result<Option<Phase>> {
        self.get_phase_by_id_impl(phase_id).await
    }

    async fn list_phases(&self) -> Result<Vec<Phase>> {
        self.list_phases_impl().await
    }

    // 任务模块
    async fn create_task(&self, req: CreateTaskRequest) -> Result<Task> {
        self.create_task_impl(req).await
    }

    async fn get_task_by_id(&self, task_id: i64) -> Result<Option<Task>> {
        self.get_task_by_id_impl(task_id).await
    }

    async fn list_tasks(&self, query: TaskListQuery) -> Result<Vec<Task>> {
        self.list_tasks_impl(query).await
    }

    // 提交模块
    async fn upsert_submission(
        &self,
        team_id: i64,
        task_id: i64,
        artifact: &ArtifactRef,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome> {
        self.upsert_submission_impl(team_id, task_id, artifact, now)
            .await
    }

    async fn grade_submission(
        &self,
        submission_id: i64,
        score: f64,
        remarks: Option<String>,
        grader_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Submission> {
        self.grade_submission_impl(submission_id, score, remarks, grader_id, now)
            .await
    }

    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>> {
        self.get_submission_by_id_impl(submission_id).await
    }

    async fn get_submission_by_team_task(
        &self,
        team_id: i64,
        task_id: i64,
    ) -> Result<Option<Submission>> {
        self.get_submission_by_team_task_impl(team_id, task_id)
            .await
    }

    async fn list_submissions_by_team(&self, team_id: i64) -> Result<Vec<Submission>> {
        self.list_submissions_by_team_impl(team_id).await
    }

    async fn list_submissions_by_task(&self, task_id: i64) -> Result<Vec<Submission>> {
        self.list_submissions_by_task_impl(task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url("contest.db").unwrap(),
            "sqlite://contest.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url("postgres://u:p@localhost/contest").unwrap(),
            "postgres://u:p@localhost/contest"
        );
        assert!(SeaOrmStorage::build_database_url("redis://localhost").is_err());
    }
}

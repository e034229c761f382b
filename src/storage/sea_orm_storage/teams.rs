//! 队伍与队员存储操作

use super::{SeaOrmStorage, is_unique_violation_on};
use crate::entity::teams::{ActiveModel, Column, Entity as Teams};
use crate::entity::users::ActiveModel as UserActiveModel;
use crate::errors::{ContestError, Result};
use crate::models::teams::{MAX_TEAM_SIZE, Team};
use crate::models::users::{NewUser, User, UserRole};
use crate::utils::random_code::generate_team_code;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use tracing::debug;

/// 生成队伍码的最大尝试次数
const MAX_CODE_ATTEMPTS: usize = 8;

impl SeaOrmStorage {
    /// 队长注册：同一事务内创建队长、队伍并回写 team_id
    pub async fn register_leader_impl(
        &self,
        leader: NewUser,
        team_name: &str,
        college_name: &str,
    ) -> Result<(User, Team)> {
        // 事务外预检查，给出友好提示；最终由唯一约束兜底
        Self::ensure_user_unique(&self.db, &leader.email, &leader.phone).await?;
        Self::ensure_team_name_free(&self.db, team_name).await?;

        let now = chrono::Utc::now().timestamp();
        let txn = self.db.begin().await?;

        let user = Self::new_user_model(leader, UserRole::Leader, None, now)
            .insert(&txn)
            .await?;

        let team = Self::insert_team_with_code(&txn, team_name, college_name, user.id, now).await?;

        let user = UserActiveModel {
            id: Set(user.id),
            team_id: Set(Some(team.id)),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        txn.commit().await?;
        Ok((user.into_user(), team.into_team()))
    }

    /// 插入队伍行，队伍码冲突时换一个重试
    async fn insert_team_with_code(
        txn: &DatabaseTransaction,
        team_name: &str,
        college_name: &str,
        leader_id: i64,
        now: i64,
    ) -> Result<crate::entity::teams::Model> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_team_code();

            let taken = Teams::find()
                .filter(Column::TeamCode.eq(&code))
                .count(txn)
                .await?
                > 0;
            if taken {
                debug!("Team code {} already taken (attempt {})", code, attempt);
                continue;
            }

            // 每次插入放在保存点里，冲突只回滚这一步
            let savepoint = txn.begin().await?;
            let inserted = ActiveModel {
                team_name: Set(team_name.to_string()),
                team_code: Set(code.clone()),
                college_name: Set(college_name.to_string()),
                leader_id: Set(leader_id),
                member_count: Set(1),
                total_points: Set(0.0),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&savepoint)
            .await;

            match inserted {
                Ok(team) => {
                    savepoint.commit().await?;
                    return Ok(team);
                }
                Err(e) if is_unique_violation_on(&e, "team_code") => {
                    savepoint.rollback().await?;
                    debug!("Team code {} collided on insert (attempt {})", code, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ContestError::database_operation(format!(
            "Failed to allocate a unique team code after {MAX_CODE_ATTEMPTS} attempts"
        )))
    }

    async fn ensure_team_name_free<C: ConnectionTrait>(conn: &C, team_name: &str) -> Result<()> {
        let count = Teams::find()
            .filter(Column::TeamName.eq(team_name))
            .count(conn)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询队伍失败: {e}")))?;
        if count > 0 {
            return Err(ContestError::conflict("Team name already taken"));
        }
        Ok(())
    }

    /// 队员加入：先条件自增人数占位，再插入用户；任一步失败整体回滚
    pub async fn join_team_impl(&self, team_code: &str, member: NewUser) -> Result<(User, Team)> {
        Self::ensure_user_unique(&self.db, &member.email, &member.phone).await?;

        let now = chrono::Utc::now().timestamp();
        let txn = self.db.begin().await?;

        // 先写后读，事务一开始就拿到写锁
        let claimed = Teams::update_many()
            .col_expr(
                Column::MemberCount,
                Expr::col(Column::MemberCount).add(1),
            )
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::TeamCode.eq(team_code))
            .filter(Column::MemberCount.lt(MAX_TEAM_SIZE))
            .exec(&txn)
            .await?;

        let team = Teams::find()
            .filter(Column::TeamCode.eq(team_code))
            .one(&txn)
            .await?
            .ok_or_else(|| ContestError::not_found("Invalid team code"))?;

        if claimed.rows_affected == 0 {
            return Err(ContestError::capacity_exceeded(format!(
                "Team is full (max {MAX_TEAM_SIZE} members)"
            )));
        }

        let mut new_user = member;
        new_user.profile.institute_name = Some(team.college_name.clone());
        let user = Self::new_user_model(new_user, UserRole::Member, Some(team.id), now)
            .insert(&txn)
            .await?;

        txn.commit().await?;
        Ok((user.into_user(), team.into_team()))
    }

    pub async fn get_team_by_id_impl(&self, team_id: i64) -> Result<Option<Team>> {
        let result = Teams::find_by_id(team_id)
            .one(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询队伍失败: {e}")))?;

        Ok(result.map(|m| m.into_team()))
    }

    pub async fn get_team_by_code_impl(&self, team_code: &str) -> Result<Option<Team>> {
        let result = Teams::find()
            .filter(Column::TeamCode.eq(team_code))
            .one(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询队伍失败: {e}")))?;

        Ok(result.map(|m| m.into_team()))
    }

    /// 排名在读取时计算
    pub async fn get_team_rank_impl(&self, team_id: i64) -> Result<Option<i64>> {
        let Some(team) = Teams::find_by_id(team_id)
            .one(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询队伍失败: {e}")))?
        else {
            return Ok(None);
        };

        let ahead = Teams::find()
            .filter(Column::TotalPoints.gt(team.total_points))
            .count(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("计算排名失败: {e}")))?;

        Ok(Some(ahead as i64 + 1))
    }

    /// 用已评分提交的分数之和刷新队伍总分
    pub(crate) async fn recompute_team_points<C: ConnectionTrait>(
        conn: &C,
        team_id: i64,
        now: i64,
    ) -> Result<f64> {
        use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
        use crate::models::submissions::SubmissionStatus;
        use sea_orm::QuerySelect;

        let total: Option<Option<f64>> = Submissions::find()
            .select_only()
            .column_as(SubmissionColumn::Score.sum(), "total")
            .filter(SubmissionColumn::TeamId.eq(team_id))
            .filter(SubmissionColumn::Status.eq(SubmissionStatus::GRADED))
            .into_tuple()
            .one(conn)
            .await?;
        let total = total.flatten().unwrap_or(0.0);

        Teams::update_many()
            .col_expr(Column::TotalPoints, Expr::value(total))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(team_id))
            .exec(conn)
            .await?;

        Ok(total)
    }

    #[cfg(test)]
    pub(crate) async fn member_row_count(&self, team_id: i64) -> u64 {
        use crate::entity::users::{Column as UserColumn, Entity as Users};
        Users::find()
            .filter(UserColumn::TeamId.eq(team_id))
            .count(&self.db)
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::users::tests::new_user;
    use super::*;
    use crate::utils::random_code::{TEAM_CODE_ALPHABET, TEAM_CODE_LEN};

    async fn storage() -> SeaOrmStorage {
        SeaOrmStorage::new_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn register_leader_creates_team_and_links_user() {
        let storage = storage().await;
        let (leader, team) = storage
            .register_leader_impl(new_user("lead", "9100000000"), "Byte Club", "IIT Test")
            .await
            .unwrap();

        assert_eq!(leader.role, UserRole::Leader);
        assert_eq!(leader.team_id, Some(team.id));
        assert_eq!(team.leader_id, leader.id);
        assert_eq!(team.member_count, 1);
        assert_eq!(team.team_code.len(), TEAM_CODE_LEN);
        assert!(
            team.team_code
                .bytes()
                .all(|b| TEAM_CODE_ALPHABET.contains(&b))
        );

        let found = storage
            .get_team_by_code_impl(&team.team_code)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, team.id);
    }

    #[tokio::test]
    async fn duplicate_team_name_conflicts() {
        let storage = storage().await;
        storage
            .register_leader_impl(new_user("a", "9100000001"), "Same", "College")
            .await
            .unwrap();
        let err = storage
            .register_leader_impl(new_user("b", "9100000002"), "Same", "College")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E013");
        // 失败的注册不留下用户
        assert!(
            storage
                .get_user_by_phone_impl("9100000002")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn team_codes_are_unique_across_registrations() {
        let storage = storage().await;
        let mut codes = std::collections::HashSet::new();
        for i in 0..20 {
            let (_, team) = storage
                .register_leader_impl(
                    new_user(&format!("l{i}"), &format!("92000000{i:02}")),
                    &format!("Team {i}"),
                    "College",
                )
                .await
                .unwrap();
            assert!(codes.insert(team.team_code));
        }
    }

    #[tokio::test]
    async fn sixth_member_rejected() {
        let storage = storage().await;
        let (_, team) = storage
            .register_leader_impl(new_user("lead", "9300000000"), "Full House", "College")
            .await
            .unwrap();

        for i in 1..=4 {
            let (member, joined) = storage
                .join_team_impl(
                    &team.team_code,
                    new_user(&format!("m{i}"), &format!("930000000{i}")),
                )
                .await
                .unwrap();
            assert_eq!(member.role, UserRole::Member);
            assert_eq!(member.team_id, Some(team.id));
            assert_eq!(member.profile.institute_name.as_deref(), Some("College"));
            assert_eq!(joined.member_count, 1 + i);
        }

        let err = storage
            .join_team_impl(&team.team_code, new_user("m5", "9300000005"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E014");

        let team = storage.get_team_by_id_impl(team.id).await.unwrap().unwrap();
        assert_eq!(team.member_count, 5);
        assert_eq!(storage.member_row_count(team.id).await, 5);
        assert!(
            storage
                .get_user_by_phone_impl("9300000005")
                .await
                .unwrap()
                .is_none()
        );

        let members = storage.list_team_members_impl(team.id).await.unwrap();
        assert_eq!(members.len(), 5);
        assert_eq!(members[0].id, team.leader_id);
        assert!(members.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn unknown_code_not_found() {
        let storage = storage().await;
        let err = storage
            .join_team_impl("ZZZZZZ", new_user("x", "9400000000"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");
    }

    #[tokio::test]
    async fn duplicate_member_leaves_counter_unchanged() {
        let storage = storage().await;
        let (_, team) = storage
            .register_leader_impl(new_user("lead", "9500000000"), "Rollback", "College")
            .await
            .unwrap();

        let mut dup = new_user("lead", "9500000001");
        dup.email = "lead@example.com".to_string();
        let err = storage.join_team_impl(&team.team_code, dup).await.unwrap_err();
        assert_eq!(err.code(), "E013");

        let team = storage.get_team_by_id_impl(team.id).await.unwrap().unwrap();
        assert_eq!(team.member_count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_joins_never_exceed_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(SeaOrmStorage::new_file_backed(dir.path()).await.unwrap());
        let (_, team) = storage
            .register_leader_impl(new_user("lead", "9600000000"), "Race", "College")
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..10 {
            let storage = storage.clone();
            let code = team.team_code.clone();
            handles.push(tokio::spawn(async move {
                storage
                    .join_team_impl(&code, new_user(&format!("r{i}"), &format!("96000001{i:02}")))
                    .await
            }));
        }

        let mut ok = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) if e.code() == "E014" => full += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(ok, 4);
        assert_eq!(full, 6);
        assert_eq!(storage.member_row_count(team.id).await, 5);
    }

    #[tokio::test]
    async fn rank_counts_teams_strictly_ahead() {
        let storage = storage().await;
        let mut ids = Vec::new();
        for (i, points) in [10.0, 30.0, 30.0, 5.0].into_iter().enumerate() {
            let (_, team) = storage
                .register_leader_impl(
                    new_user(&format!("k{i}"), &format!("970000000{i}")),
                    &format!("Rank {i}"),
                    "College",
                )
                .await
                .unwrap();
            Teams::update_many()
                .col_expr(Column::TotalPoints, Expr::value(points))
                .filter(Column::Id.eq(team.id))
                .exec(&storage.db)
                .await
                .unwrap();
            ids.push(team.id);
        }

        assert_eq!(storage.get_team_rank_impl(ids[1]).await.unwrap(), Some(1));
        assert_eq!(storage.get_team_rank_impl(ids[2]).await.unwrap(), Some(1));
        assert_eq!(storage.get_team_rank_impl(ids[0]).await.unwrap(), Some(3));
        assert_eq!(storage.get_team_rank_impl(ids[3]).await.unwrap(), Some(4));
        assert_eq!(storage.get_team_rank_impl(999).await.unwrap(), None);
    }
}

//! 提交存储操作

use chrono::{DateTime, Utc};

use super::{SeaOrmStorage, is_unique_violation};
use crate::entity::submissions::{ActiveModel, Column, Entity as Submissions, Model};
use crate::entity::tasks::Entity as Tasks;
use crate::entity::teams::{Column as TeamColumn, Entity as Teams};
use crate::errors::{ContestError, Result};
use crate::models::submissions::{ArtifactRef, Submission, SubmissionStatus, UpsertOutcome};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

impl SeaOrmStorage {
    /// 新建或替换 (team, task) 的提交记录
    ///
    /// 替换已评分的提交会将其退回待评分并清空评分信息，队伍总分同步重算。
    pub async fn upsert_submission_impl(
        &self,
        team_id: i64,
        task_id: i64,
        artifact: &ArtifactRef,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome> {
        let ts = now.timestamp();
        let txn = self.db.begin().await?;

        // 以写语句开启事务：SQLite 上立即拿到写锁，其他库上锁住队伍行
        Teams::update_many()
            .col_expr(TeamColumn::UpdatedAt, Expr::value(ts))
            .filter(TeamColumn::Id.eq(team_id))
            .exec(&txn)
            .await?;

        let existing = Self::find_by_team_task(&txn, team_id, task_id).await?;
        let outcome = match existing {
            Some(current) => Self::replace_submission(&txn, current, artifact, ts).await?,
            None => {
                let savepoint = txn.begin().await?;
                let inserted = ActiveModel {
                    team_id: Set(team_id),
                    task_id: Set(task_id),
                    artifact_path: Set(artifact.path.clone()),
                    file_name: Set(artifact.file_name.clone()),
                    file_size: Set(artifact.file_size),
                    status: Set(SubmissionStatus::Pending.to_string()),
                    submitted_at: Set(ts),
                    created_at: Set(ts),
                    ..Default::default()
                }
                .insert(&savepoint)
                .await;

                match inserted {
                    Ok(model) => {
                        savepoint.commit().await?;
                        UpsertOutcome {
                            submission: model.into_submission(),
                            replaced_artifact: None,
                        }
                    }
                    // 其他进程抢先插入了同一 (team, task)，改走替换
                    Err(e) if is_unique_violation(&e) => {
                        savepoint.rollback().await?;
                        let current = Self::find_by_team_task(&txn, team_id, task_id)
                            .await?
                            .ok_or_else(|| {
                                ContestError::database_operation(
                                    "Submission vanished after unique violation",
                                )
                            })?;
                        Self::replace_submission(&txn, current, artifact, ts).await?
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        txn.commit().await?;
        Ok(outcome)
    }

    async fn find_by_team_task(
        txn: &DatabaseTransaction,
        team_id: i64,
        task_id: i64,
    ) -> Result<Option<Model>> {
        Ok(Submissions::find()
            .filter(Column::TeamId.eq(team_id))
            .filter(Column::TaskId.eq(task_id))
            .one(txn)
            .await?)
    }

    async fn replace_submission(
        txn: &DatabaseTransaction,
        current: Model,
        artifact: &ArtifactRef,
        ts: i64,
    ) -> Result<UpsertOutcome> {
        let was_graded = current.status == SubmissionStatus::GRADED;
        let old_path = current.artifact_path.clone();
        let team_id = current.team_id;

        let mut model: ActiveModel = current.into();
        model.artifact_path = Set(artifact.path.clone());
        model.file_name = Set(artifact.file_name.clone());
        model.file_size = Set(artifact.file_size);
        model.submitted_at = Set(ts);
        model.status = Set(SubmissionStatus::Pending.to_string());
        model.score = Set(None);
        model.remarks = Set(None);
        model.graded_by = Set(None);
        model.graded_at = Set(None);
        let updated = model.update(txn).await?;

        if was_graded {
            Self::recompute_team_points(txn, team_id, ts).await?;
        }

        Ok(UpsertOutcome {
            submission: updated.into_submission(),
            replaced_artifact: (old_path != artifact.path).then_some(old_path),
        })
    }

    /// 评分：分数必须落在 [0, max_score]
    pub async fn grade_submission_impl(
        &self,
        submission_id: i64,
        score: f64,
        remarks: Option<String>,
        grader_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Submission> {
        let ts = now.timestamp();
        let txn = self.db.begin().await?;

        // 同样以写语句开头，并与 upsert 一样先锁队伍行
        Teams::update_many()
            .col_expr(TeamColumn::UpdatedAt, Expr::value(ts))
            .filter(
                TeamColumn::Id.in_subquery(
                    Query::select()
                        .column(Column::TeamId)
                        .from(Submissions)
                        .and_where(Column::Id.eq(submission_id))
                        .to_owned(),
                ),
            )
            .exec(&txn)
            .await?;

        let current = Submissions::find_by_id(submission_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ContestError::not_found(format!("Submission {submission_id} not found"))
            })?;

        let task = Tasks::find_by_id(current.task_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ContestError::not_found(format!("Task {} not found", current.task_id)))?;

        if !score.is_finite() || score < 0.0 || score > task.max_score {
            return Err(ContestError::validation(format!(
                "Score must be between 0 and {}",
                task.max_score
            )));
        }

        let team_id = current.team_id;
        let mut model: ActiveModel = current.into();
        model.status = Set(SubmissionStatus::Graded.to_string());
        model.score = Set(Some(score));
        model.remarks = Set(remarks);
        model.graded_by = Set(Some(grader_id));
        model.graded_at = Set(Some(ts));
        let updated = model.update(&txn).await?;

        Self::recompute_team_points(&txn, team_id, ts).await?;

        txn.commit().await?;
        Ok(updated.into_submission())
    }

    pub async fn get_submission_by_id_impl(&self, submission_id: i64) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    pub async fn get_submission_by_team_task_impl(
        &self,
        team_id: i64,
        task_id: i64,
    ) -> Result<Option<Submission>> {
        let result = Submissions::find()
            .filter(Column::TeamId.eq(team_id))
            .filter(Column::TaskId.eq(task_id))
            .one(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    pub async fn list_submissions_by_team_impl(&self, team_id: i64) -> Result<Vec<Submission>> {
        let result = Submissions::find()
            .filter(Column::TeamId.eq(team_id))
            .order_by_desc(Column::SubmittedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询提交列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_submission()).collect())
    }

    /// 按提交时间倒序
    pub async fn list_submissions_by_task_impl(&self, task_id: i64) -> Result<Vec<Submission>> {
        let result = Submissions::find()
            .filter(Column::TaskId.eq(task_id))
            .order_by_desc(Column::SubmittedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询提交列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_submission()).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::super::phases::tests::phase_request;
    use super::super::tasks::tests::task_request;
    use super::super::users::tests::new_user;
    use super::*;

    struct Fixture {
        storage: SeaOrmStorage,
        team_id: i64,
        task_id: i64,
    }

    async fn fixture() -> Fixture {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let (_, team) = storage
            .register_leader_impl(new_user("lead", "9800000000"), "Graders", "College")
            .await
            .unwrap();
        let phase = storage.create_phase_impl(phase_request("P", 0)).await.unwrap();
        let task = storage
            .create_task_impl(task_request(
                phase.id,
                "Essay",
                Utc::now() + Duration::days(1),
            ))
            .await
            .unwrap();
        Fixture {
            storage,
            team_id: team.id,
            task_id: task.id,
        }
    }

    fn artifact(path: &str) -> ArtifactRef {
        ArtifactRef {
            path: path.to_string(),
            file_name: "essay.pdf".to_string(),
            file_size: 128,
        }
    }

    #[tokio::test]
    async fn first_upsert_creates_pending() {
        let f = fixture().await;
        let outcome = f
            .storage
            .upsert_submission_impl(f.team_id, f.task_id, &artifact("submissions/a.pdf"), Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome.submission.status, SubmissionStatus::Pending);
        assert!(outcome.replaced_artifact.is_none());
    }

    #[tokio::test]
    async fn replace_keeps_single_record_and_reports_old_path() {
        let f = fixture().await;
        let first = f
            .storage
            .upsert_submission_impl(f.team_id, f.task_id, &artifact("submissions/a.pdf"), Utc::now())
            .await
            .unwrap();
        let second = f
            .storage
            .upsert_submission_impl(f.team_id, f.task_id, &artifact("submissions/b.pdf"), Utc::now())
            .await
            .unwrap();

        assert_eq!(first.submission.id, second.submission.id);
        assert_eq!(second.submission.artifact_path, "submissions/b.pdf");
        assert_eq!(second.replaced_artifact.as_deref(), Some("submissions/a.pdf"));
        assert_eq!(
            f.storage
                .list_submissions_by_team_impl(f.team_id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn grade_within_range_updates_team_points() {
        let f = fixture().await;
        let outcome = f
            .storage
            .upsert_submission_impl(f.team_id, f.task_id, &artifact("submissions/a.pdf"), Utc::now())
            .await
            .unwrap();

        let graded = f
            .storage
            .grade_submission_impl(outcome.submission.id, 80.0, Some("good".into()), 7, Utc::now())
            .await
            .unwrap();
        assert_eq!(graded.status, SubmissionStatus::Graded);
        assert_eq!(graded.score, Some(80.0));
        assert_eq!(graded.graded_by, Some(7));
        assert!(graded.graded_at.is_some());

        let team = f.storage.get_team_by_id_impl(f.team_id).await.unwrap().unwrap();
        assert_eq!(team.total_points, 80.0);
    }

    #[tokio::test]
    async fn grade_out_of_range_rejected_and_unchanged() {
        let f = fixture().await;
        let outcome = f
            .storage
            .upsert_submission_impl(f.team_id, f.task_id, &artifact("submissions/a.pdf"), Utc::now())
            .await
            .unwrap();

        for bad in [150.0, -1.0, f64::NAN] {
            let err = f
                .storage
                .grade_submission_impl(outcome.submission.id, bad, None, 7, Utc::now())
                .await
                .unwrap_err();
            assert_eq!(err.code(), "E007");
        }

        let current = f
            .storage
            .get_submission_by_id_impl(outcome.submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, SubmissionStatus::Pending);
        assert!(current.score.is_none());
    }

    #[tokio::test]
    async fn grade_missing_submission_not_found() {
        let f = fixture().await;
        let err = f
            .storage
            .grade_submission_impl(404, 10.0, None, 7, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");
    }

    #[tokio::test]
    async fn replacing_graded_submission_resets_grade_and_points() {
        let f = fixture().await;
        let outcome = f
            .storage
            .upsert_submission_impl(f.team_id, f.task_id, &artifact("submissions/a.pdf"), Utc::now())
            .await
            .unwrap();
        f.storage
            .grade_submission_impl(outcome.submission.id, 60.0, Some("ok".into()), 7, Utc::now())
            .await
            .unwrap();

        let replaced = f
            .storage
            .upsert_submission_impl(f.team_id, f.task_id, &artifact("submissions/b.pdf"), Utc::now())
            .await
            .unwrap();
        let s = replaced.submission;
        assert_eq!(s.status, SubmissionStatus::Pending);
        assert!(s.score.is_none());
        assert!(s.remarks.is_none());
        assert!(s.graded_by.is_none());
        assert!(s.graded_at.is_none());

        let team = f.storage.get_team_by_id_impl(f.team_id).await.unwrap().unwrap();
        assert_eq!(team.total_points, 0.0);
    }

    #[tokio::test]
    async fn task_listing_newest_first() {
        let f = fixture().await;
        let (_, other) = f
            .storage
            .register_leader_impl(new_user("other", "9800000001"), "Others", "College")
            .await
            .unwrap();

        let t0 = Utc::now();
        f.storage
            .upsert_submission_impl(f.team_id, f.task_id, &artifact("submissions/a.pdf"), t0)
            .await
            .unwrap();
        f.storage
            .upsert_submission_impl(
                other.id,
                f.task_id,
                &artifact("submissions/b.pdf"),
                t0 + Duration::seconds(5),
            )
            .await
            .unwrap();

        let list = f.storage.list_submissions_by_task_impl(f.task_id).await.unwrap();
        let teams: Vec<i64> = list.iter().map(|s| s.team_id).collect();
        assert_eq!(teams, vec![other.id, f.team_id]);
    }

    /// 文件库 + 连接池，注册 `teams` 支队伍并建一个任务
    async fn pooled_fixture(teams: usize) -> (Arc<SeaOrmStorage>, Vec<i64>, i64, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = SeaOrmStorage::new_file_backed(dir.path()).await.unwrap();
        let phase = storage.create_phase_impl(phase_request("P", 0)).await.unwrap();
        let task = storage
            .create_task_impl(task_request(
                phase.id,
                "Essay",
                Utc::now() + Duration::days(1),
            ))
            .await
            .unwrap();

        let mut team_ids = Vec::with_capacity(teams);
        for i in 0..teams {
            let (_, team) = storage
                .register_leader_impl(
                    new_user(&format!("pool{i}"), &format!("98200000{i:02}")),
                    &format!("Pool {i}"),
                    "College",
                )
                .await
                .unwrap();
            team_ids.push(team.id);
        }
        (Arc::new(storage), team_ids, task.id, dir)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_uploads_from_different_teams_all_succeed() {
        let (storage, team_ids, task_id, _dir) = pooled_fixture(30).await;

        let handles: Vec<_> = team_ids
            .iter()
            .map(|&team_id| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    storage
                        .upsert_submission_impl(
                            team_id,
                            task_id,
                            &artifact(&format!("submissions/{team_id}.pdf")),
                            Utc::now(),
                        )
                        .await
                })
            })
            .collect();

        for handle in handles {
            if let Err(e) = handle.await.unwrap() {
                panic!("upload failed under contention: {e}");
            }
        }
        assert_eq!(
            storage.list_submissions_by_task_impl(task_id).await.unwrap().len(),
            30
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_grades_all_succeed_and_update_points() {
        let (storage, team_ids, task_id, _dir) = pooled_fixture(20).await;

        let mut submission_ids = Vec::new();
        for &team_id in &team_ids {
            let outcome = storage
                .upsert_submission_impl(
                    team_id,
                    task_id,
                    &artifact(&format!("submissions/{team_id}.pdf")),
                    Utc::now(),
                )
                .await
                .unwrap();
            submission_ids.push(outcome.submission.id);
        }

        let handles: Vec<_> = submission_ids
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    storage
                        .grade_submission_impl(id, i as f64, None, 7, Utc::now())
                        .await
                })
            })
            .collect();

        for handle in handles {
            if let Err(e) = handle.await.unwrap() {
                panic!("grading failed under contention: {e}");
            }
        }
        for (i, &team_id) in team_ids.iter().enumerate() {
            let team = storage.get_team_by_id_impl(team_id).await.unwrap().unwrap();
            assert_eq!(team.total_points, i as f64);
        }
    }
}

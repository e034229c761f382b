use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use tracing::{info, warn};

use crate::artifacts::{ArtifactStore, StagedArtifact};
use crate::config::AppConfig;
use crate::errors::{ContestError, Result};
use crate::models::ApiResponse;
use crate::models::submissions::Submission;
use crate::models::tasks::Task;
use crate::services::{current_user, error_response, shared};
use crate::storage::Storage;

use super::{SubmissionLocks, SubmissionService};

const UPLOAD_FIELD: &str = "file";
const MAX_FILE_NAME_LEN: usize = 255;
const DEFAULT_FILE_NAME: &str = "submission.pdf";

/// 任务存在且未过截止时间
pub async fn ensure_task_open(storage: &dyn Storage, task_id: i64, now: DateTime<Utc>) -> Result<Task> {
    let task = storage
        .get_task_by_id(task_id)
        .await?
        .ok_or_else(|| ContestError::not_found(format!("Task {task_id} not found")))?;
    if task.is_expired(now) {
        return Err(ContestError::deadline_expired(format!(
            "The deadline for task '{}' has passed",
            task.title
        )));
    }
    Ok(task)
}

/// 提交或替换产物
///
/// 任何拒绝路径都不会留下产物：暂存文件随 `staged` 析构删除，已落盘但
/// 记录写入失败的新产物会被删除。替换成功后旧产物在事务提交后删除。
pub async fn submit_artifact(
    storage: &dyn Storage,
    artifacts: &dyn ArtifactStore,
    locks: &SubmissionLocks,
    team_id: i64,
    task_id: i64,
    staged: StagedArtifact,
    now: DateTime<Utc>,
) -> Result<Submission> {
    ensure_task_open(storage, task_id, now).await?;

    let _guard = locks.acquire(team_id, task_id).await;

    // 排队等锁期间可能已过截止时间，拿到锁后按当前时间再查一次
    let now = now.max(Utc::now());
    ensure_task_open(storage, task_id, now).await?;

    let artifact = artifacts.persist(staged).await?;
    let outcome = match storage
        .upsert_submission(team_id, task_id, &artifact, now)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            discard_artifact(artifacts, &artifact.path).await;
            return Err(e);
        }
    };

    if let Some(old_path) = outcome.replaced_artifact.as_deref() {
        discard_artifact(artifacts, old_path).await;
    }

    Ok(outcome.submission)
}

/// 尽力删除产物，失败只记录日志
async fn discard_artifact(artifacts: &dyn ArtifactStore, path: &str) {
    match artifacts.delete(path).await {
        Ok(true) => {}
        Ok(false) => warn!("Artifact {} was already missing", path),
        Err(e) => warn!("Failed to delete artifact {}: {}", path, e),
    }
}

/// 只保留最后一段文件名
fn sanitize_file_name(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if name.is_empty() {
        return DEFAULT_FILE_NAME.to_string();
    }
    name.chars().take(MAX_FILE_NAME_LEN).collect()
}

/// 读取 multipart 中唯一的 `file` 字段到暂存产物
pub(crate) async fn read_upload(
    artifacts: &dyn ArtifactStore,
    mut payload: Multipart,
    allowed_types: &[String],
) -> Result<StagedArtifact> {
    let mut staged: Option<StagedArtifact> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ContestError::validation(format!("Invalid multipart payload: {e}")))?
    {
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();

        if name != UPLOAD_FIELD {
            // 其他字段读完丢弃
            while field
                .try_next()
                .await
                .map_err(|e| ContestError::validation(format!("Invalid multipart payload: {e}")))?
                .is_some()
            {}
            continue;
        }

        if staged.is_some() {
            return Err(ContestError::validation(
                "Only one file can be uploaded at a time",
            ));
        }

        let mime = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();
        if !allowed_types.iter().any(|t| t.eq_ignore_ascii_case(&mime)) {
            return Err(ContestError::unsupported_media_type(format!(
                "File type '{mime}' is not allowed"
            )));
        }

        let file_name = sanitize_file_name(
            field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .unwrap_or_default(),
        );

        let mut artifact = artifacts.stage(&mime, &file_name).await?;
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ContestError::validation(format!("Upload interrupted: {e}")))?
        {
            artifact.write_chunk(&chunk).await?;
        }
        staged = Some(artifact);
    }

    staged.ok_or_else(|| ContestError::validation("No file found in upload payload"))
}

pub async fn handle_submit(
    service: &SubmissionService,
    task_id: i64,
    payload: Multipart,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let result: Result<HttpResponse> = async {
        let user = current_user(request)?;
        let team_id = user
            .team_id
            .ok_or_else(|| ContestError::authorization("You must belong to a team to submit"))?;

        let storage = service.get_storage(request)?;
        let artifacts = shared::<dyn ArtifactStore>(request)?;
        let locks = shared::<SubmissionLocks>(request)?;

        // 先做一次截止检查，避免接收注定被拒绝的上传
        ensure_task_open(storage.as_ref(), task_id, Utc::now()).await?;

        let staged = read_upload(
            artifacts.as_ref(),
            payload,
            &AppConfig::get().upload.allowed_types,
        )
        .await?;

        let submission = submit_artifact(
            storage.as_ref(),
            artifacts.as_ref(),
            &locks,
            team_id,
            task_id,
            staged,
            Utc::now(),
        )
        .await?;

        info!(
            "Team {} submitted task {} ({} bytes) by user {}",
            team_id, task_id, submission.file_size, user.id
        );
        Ok(HttpResponse::Created().json(ApiResponse::success(
            submission,
            "Submission uploaded successfully",
        )))
    }
    .await;

    Ok(result.unwrap_or_else(|e| error_response(&e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;

    use chrono::Duration;
    use futures_util::future::join_all;

    use super::*;
    use crate::artifacts::FilesystemArtifactStore;
    use crate::artifacts::filesystem::tests::{PDF, temp_store};
    use crate::models::phases::CreatePhaseRequest;
    use crate::models::submissions::SubmissionStatus;
    use crate::models::tasks::CreateTaskRequest;
    use crate::models::users::{NewUser, UserProfile};
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    pub(crate) struct Fixture {
        pub storage: SeaOrmStorage,
        pub store: FilesystemArtifactStore,
        pub locks: SubmissionLocks,
        pub team_id: i64,
        pub task: Task,
        _dir: tempfile::TempDir,
        _db_dir: Option<tempfile::TempDir>,
    }

    pub(crate) async fn fixture() -> Fixture {
        fixture_on(SeaOrmStorage::new_in_memory().await.unwrap(), None).await
    }

    /// 文件库 + 连接池，并发用例用它才能暴露存储层的竞争
    pub(crate) async fn pooled_fixture() -> Fixture {
        let db_dir = tempfile::tempdir().unwrap();
        let storage = SeaOrmStorage::new_file_backed(db_dir.path()).await.unwrap();
        fixture_on(storage, Some(db_dir)).await
    }

    async fn fixture_on(storage: SeaOrmStorage, db_dir: Option<tempfile::TempDir>) -> Fixture {
        let (_, team) = storage
            .register_leader(
                NewUser {
                    name: "Lead".into(),
                    email: "lead@example.com".into(),
                    phone: "9444444440".into(),
                    password_hash: "x".into(),
                    profile: UserProfile::default(),
                },
                "Uploaders",
                "Institute",
            )
            .await
            .unwrap();
        let now = Utc::now();
        let phase = storage
            .create_phase(CreatePhaseRequest {
                name: "Round 1".into(),
                description: None,
                start_date: now,
                end_date: now + Duration::days(7),
            })
            .await
            .unwrap();
        let task = storage
            .create_task(CreateTaskRequest {
                phase_id: phase.id,
                title: "Report".into(),
                description: None,
                deadline: now + Duration::days(1),
                max_score: 100.0,
            })
            .await
            .unwrap();
        let (store, dir) = temp_store().await;

        Fixture {
            storage,
            store,
            locks: SubmissionLocks::new(),
            team_id: team.id,
            task,
            _dir: dir,
            _db_dir: db_dir,
        }
    }

    impl Fixture {
        pub(crate) async fn staged(&self, name: &str) -> StagedArtifact {
            let mut staged = self.store.stage("application/pdf", name).await.unwrap();
            staged.write_chunk(PDF).await.unwrap();
            staged
        }

        pub(crate) async fn submit(&self, name: &str, now: DateTime<Utc>) -> Result<Submission> {
            let staged = self.staged(name).await;
            submit_artifact(
                &self.storage,
                &self.store,
                &self.locks,
                self.team_id,
                self.task.id,
                staged,
                now,
            )
            .await
        }

        pub(crate) fn before_deadline(&self) -> DateTime<Utc> {
            self.task.deadline - Duration::seconds(1)
        }

        pub(crate) fn file_count(&self, sub: &str) -> usize {
            count_files(&self.store.root().join(sub))
        }
    }

    fn count_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn submit_before_deadline_creates_pending() {
        let f = fixture().await;
        let submission = f.submit("report.pdf", f.before_deadline()).await.unwrap();

        assert_eq!(submission.status, SubmissionStatus::Pending);
        assert_eq!(submission.file_name, "report.pdf");
        assert_eq!(submission.file_size, PDF.len() as i64);
        assert!(f.store.exists(&submission.artifact_path).await.unwrap());
        assert_eq!(f.file_count("submissions"), 1);
        assert_eq!(f.file_count(".tmp"), 0);
    }

    #[tokio::test]
    async fn deadline_instant_is_still_open() {
        let f = fixture().await;
        assert!(f.submit("report.pdf", f.task.deadline).await.is_ok());
    }

    #[tokio::test]
    async fn submit_after_deadline_leaves_nothing() {
        let f = fixture().await;
        let err = f
            .submit("late.pdf", f.task.deadline + Duration::seconds(1))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "E015");
        assert_eq!(f.file_count("submissions"), 0);
        assert_eq!(f.file_count(".tmp"), 0);
        assert!(
            f.storage
                .get_submission_by_team_task(f.team_id, f.task.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn unknown_task_discards_upload() {
        let f = fixture().await;
        let staged = f.staged("x.pdf").await;
        let err = submit_artifact(
            &f.storage,
            &f.store,
            &f.locks,
            f.team_id,
            f.task.id + 50,
            staged,
            Utc::now(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), "E008");
        assert_eq!(f.file_count("submissions"), 0);
        assert_eq!(f.file_count(".tmp"), 0);
    }

    #[tokio::test]
    async fn resubmission_replaces_artifact() {
        let f = fixture().await;
        let first = f.submit("a.pdf", f.before_deadline()).await.unwrap();
        let second = f.submit("b.pdf", f.before_deadline()).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.file_name, "b.pdf");
        assert!(!f.store.exists(&first.artifact_path).await.unwrap());
        assert!(f.store.exists(&second.artifact_path).await.unwrap());
        assert_eq!(f.file_count("submissions"), 1);
    }

    #[tokio::test]
    async fn failed_record_write_removes_new_artifact() {
        let f = fixture().await;
        let staged = f.staged("orphan.pdf").await;
        // 不存在的队伍触发外键错误
        let err = submit_artifact(
            &f.storage,
            &f.store,
            &f.locks,
            f.team_id + 100,
            f.task.id,
            staged,
            f.before_deadline(),
        )
        .await
        .unwrap_err();

        assert!(!err.is_client_error());
        assert_eq!(f.file_count("submissions"), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_submissions_keep_one_record_and_one_artifact() {
        let f = pooled_fixture().await;
        let now = f.before_deadline();
        let names: Vec<String> = (0..4).map(|i| format!("v{i}.pdf")).collect();

        let results = join_all(names.iter().map(|name| f.submit(name, now))).await;
        let ids: Vec<i64> = results.into_iter().map(|r| r.unwrap().id).collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));

        assert_eq!(
            f.storage.list_submissions_by_team(f.team_id).await.unwrap().len(),
            1
        );
        assert_eq!(f.file_count("submissions"), 1);
        assert_eq!(f.file_count(".tmp"), 0);
    }

    #[tokio::test]
    async fn deadline_rechecked_after_waiting_for_lock() {
        let f = fixture().await;
        let task = f
            .storage
            .create_task(CreateTaskRequest {
                phase_id: f.task.phase_id,
                title: "Quick".into(),
                description: None,
                deadline: Utc::now() + Duration::seconds(2),
                max_score: 10.0,
            })
            .await
            .unwrap();

        // 另一个请求占着锁，直到截止时间过去
        let held = f.locks.acquire(f.team_id, task.id).await;
        let staged = f.staged("queued.pdf").await;
        let submit = submit_artifact(
            &f.storage,
            &f.store,
            &f.locks,
            f.team_id,
            task.id,
            staged,
            Utc::now(),
        );
        let release = async {
            tokio::time::sleep(std::time::Duration::from_secs(3)).await;
            drop(held);
        };
        let (result, ()) = tokio::join!(submit, release);

        assert_eq!(result.unwrap_err().code(), "E015");
        assert_eq!(f.file_count("submissions"), 0);
        assert_eq!(f.file_count(".tmp"), 0);
        assert!(
            f.storage
                .get_submission_by_team_task(f.team_id, task.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn file_names_are_reduced_to_basename() {
        assert_eq!(sanitize_file_name("C:\\docs\\report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("  "), DEFAULT_FILE_NAME);
        assert_eq!(sanitize_file_name(&"a".repeat(300)).len(), MAX_FILE_NAME_LEN);
    }
}

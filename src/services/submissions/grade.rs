use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::errors::{ContestError, Result};
use crate::models::ApiResponse;
use crate::models::submissions::{GradeSubmissionRequest, Submission};
use crate::services::{current_user, error_response, shared};
use crate::storage::Storage;

use super::{SubmissionLocks, SubmissionService};

/// 评分，与同一 (team, task) 的提交互斥
pub async fn grade_submission(
    storage: &dyn Storage,
    locks: &SubmissionLocks,
    submission_id: i64,
    req: GradeSubmissionRequest,
    grader_id: i64,
    now: DateTime<Utc>,
) -> Result<Submission> {
    let current = storage
        .get_submission_by_id(submission_id)
        .await?
        .ok_or_else(|| ContestError::not_found(format!("Submission {submission_id} not found")))?;

    let _guard = locks.acquire(current.team_id, current.task_id).await;

    let remarks = req
        .remarks
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    storage
        .grade_submission(submission_id, req.score, remarks, grader_id, now)
        .await
}

pub async fn handle_grade(
    service: &SubmissionService,
    submission_id: i64,
    body: GradeSubmissionRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let result: Result<HttpResponse> = async {
        let grader = current_user(request)?;
        let storage = service.get_storage(request)?;
        let locks = shared::<SubmissionLocks>(request)?;

        let submission = grade_submission(
            storage.as_ref(),
            &locks,
            submission_id,
            body,
            grader.id,
            Utc::now(),
        )
        .await?;

        info!(
            "Submission {} graded {:?} by user {}",
            submission.id, submission.score, grader.id
        );
        Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "Submission graded")))
    }
    .await;

    Ok(result.unwrap_or_else(|e| error_response(&e)))
}

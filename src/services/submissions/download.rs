use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::artifacts::ArtifactStore;
use crate::errors::{ContestError, Result};
use crate::models::submissions::Submission;
use crate::models::users::User;
use crate::services::{current_user, error_response, shared};

use super::SubmissionService;

/// 评审与管理员可下载任意提交，参赛者只能下载本队的
pub fn authorize_download(user: &User, submission: &Submission) -> Result<()> {
    if !user.role.is_participant() || user.team_id == Some(submission.team_id) {
        return Ok(());
    }
    Err(ContestError::authorization(
        "You are not allowed to access this submission",
    ))
}

pub async fn handle_download(
    service: &SubmissionService,
    submission_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let result: Result<HttpResponse> = async {
        let user = current_user(request)?;
        let submission = service
            .get_storage(request)?
            .get_submission_by_id(submission_id)
            .await?
            .ok_or_else(|| ContestError::not_found(format!("Submission {submission_id} not found")))?;
        authorize_download(&user, &submission)?;

        let artifacts = shared::<dyn ArtifactStore>(request)?;
        let data = artifacts.read(&submission.artifact_path).await?;

        Ok(HttpResponse::Ok()
            .insert_header((header::CONTENT_TYPE, "application/octet-stream"))
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{}\"",
                    submission.file_name.replace('"', "")
                ),
            ))
            .body(data))
    }
    .await;

    Ok(result.unwrap_or_else(|e| error_response(&e)))
}

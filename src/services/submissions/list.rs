use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::errors::{ContestError, Result};
use crate::models::ApiResponse;
use crate::models::submissions::SubmissionListResponse;
use crate::services::{current_user, error_response};

use super::SubmissionService;

fn require_team(request: &HttpRequest) -> Result<i64> {
    current_user(request)?
        .team_id
        .ok_or_else(|| ContestError::authorization("You are not a member of any team"))
}

// 本队所有提交
pub async fn handle_list_my(
    service: &SubmissionService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let result: Result<HttpResponse> = async {
        let team_id = require_team(request)?;
        let items = service
            .get_storage(request)?
            .list_submissions_by_team(team_id)
            .await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            SubmissionListResponse { items },
            "Submissions retrieved successfully",
        )))
    }
    .await;

    Ok(result.unwrap_or_else(|e| error_response(&e)))
}

// 本队在某任务下的提交
pub async fn handle_get_my_for_task(
    service: &SubmissionService,
    task_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let result: Result<HttpResponse> = async {
        let team_id = require_team(request)?;
        let submission = service
            .get_storage(request)?
            .get_submission_by_team_task(team_id, task_id)
            .await?
            .ok_or_else(|| ContestError::not_found("No submission for this task yet"))?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            submission,
            "Submission retrieved successfully",
        )))
    }
    .await;

    Ok(result.unwrap_or_else(|e| error_response(&e)))
}

// 评审视角：某任务下全部提交，最新在前
pub async fn handle_list_for_task(
    service: &SubmissionService,
    task_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let result: Result<HttpResponse> = async {
        let storage = service.get_storage(request)?;
        if storage.get_task_by_id(task_id).await?.is_none() {
            return Err(ContestError::not_found(format!("Task {task_id} not found")));
        }
        let items = storage.list_submissions_by_task(task_id).await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            SubmissionListResponse { items },
            "Submissions retrieved successfully",
        )))
    }
    .await;

    Ok(result.unwrap_or_else(|e| error_response(&e)))
}

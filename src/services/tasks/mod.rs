//! 任务服务

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::errors::{ContestError, Result};
use crate::models::ApiResponse;
use crate::models::tasks::{CreateTaskRequest, Task, TaskListQuery, TaskListResponse, TaskResponse};
use crate::storage::Storage;
use crate::utils::validate::validate_name;

use super::error_response;

pub struct TaskService {
    storage: Option<Arc<dyn Storage>>,
}

impl TaskService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::shared::<dyn Storage>(request),
        }
    }

    pub async fn create_task(
        &self,
        body: CreateTaskRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let result: Result<HttpResponse> = async {
            let task = create_task(self.get_storage(request)?.as_ref(), body).await?;
            info!(
                "Task '{}' ({}) created in phase {}",
                task.title, task.id, task.phase_id
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                TaskResponse::at(task, Utc::now()),
                "Task created",
            )))
        }
        .await;

        Ok(result.unwrap_or_else(|e| error_response(&e)))
    }

    pub async fn list_tasks(
        &self,
        query: TaskListQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let result: Result<HttpResponse> = async {
            let tasks = self.get_storage(request)?.list_tasks(query).await?;
            let now = Utc::now();
            let items = tasks
                .into_iter()
                .map(|task| TaskResponse::at(task, now))
                .collect();
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                TaskListResponse { items },
                "Tasks retrieved successfully",
            )))
        }
        .await;

        Ok(result.unwrap_or_else(|e| error_response(&e)))
    }

    pub async fn get_task(&self, task_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let result: Result<HttpResponse> = async {
            let task = self
                .get_storage(request)?
                .get_task_by_id(task_id)
                .await?
                .ok_or_else(|| ContestError::not_found(format!("Task {task_id} not found")))?;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                TaskResponse::at(task, Utc::now()),
                "Task retrieved successfully",
            )))
        }
        .await;

        Ok(result.unwrap_or_else(|e| error_response(&e)))
    }
}

/// 校验标题与满分后创建任务；所属阶段不存在时由存储层返回 NotFound
pub async fn create_task(storage: &dyn Storage, mut req: CreateTaskRequest) -> Result<Task> {
    req.title = validate_name("Task title", &req.title)
        .map_err(ContestError::validation)?
        .to_string();
    if !req.max_score.is_finite() || req.max_score <= 0.0 {
        return Err(ContestError::validation(
            "Max score must be a positive number",
        ));
    }
    storage.create_task(req).await
}

//! 提交服务：上传、替换、评分与查询

pub mod download;
pub mod grade;
pub mod list;
pub mod locks;
pub mod submit;

pub use locks::SubmissionLocks;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::Result;
use crate::models::submissions::GradeSubmissionRequest;
use crate::storage::Storage;

pub struct SubmissionService {
    storage: Option<Arc<dyn Storage>>,
}

impl SubmissionService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::shared::<dyn Storage>(request),
        }
    }

    // 上传或替换本队在某任务下的提交
    pub async fn submit(
        &self,
        task_id: i64,
        payload: Multipart,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        submit::handle_submit(self, task_id, payload, request).await
    }

    pub async fn list_my(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::handle_list_my(self, request).await
    }

    pub async fn get_my_for_task(
        &self,
        task_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::handle_get_my_for_task(self, task_id, request).await
    }

    pub async fn list_for_task(
        &self,
        task_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::handle_list_for_task(self, task_id, request).await
    }

    pub async fn grade(
        &self,
        submission_id: i64,
        body: GradeSubmissionRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        grade::handle_grade(self, submission_id, body, request).await
    }

    pub async fn download(
        &self,
        submission_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        download::handle_download(self, submission_id, request).await
    }
}

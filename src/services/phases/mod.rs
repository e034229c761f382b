//! 比赛阶段服务

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{ContestError, Result};
use crate::models::ApiResponse;
use crate::models::phases::{CreatePhaseRequest, Phase, PhaseListResponse};
use crate::storage::Storage;
use crate::utils::validate::validate_name;

use super::error_response;

pub struct PhaseService {
    storage: Option<Arc<dyn Storage>>,
}

impl PhaseService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::shared::<dyn Storage>(request),
        }
    }

    pub async fn create_phase(
        &self,
        body: CreatePhaseRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let result: Result<HttpResponse> = async {
            let phase = create_phase(self.get_storage(request)?.as_ref(), body).await?;
            info!("Phase '{}' created ({})", phase.name, phase.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(phase, "Phase created")))
        }
        .await;

        Ok(result.unwrap_or_else(|e| error_response(&e)))
    }

    pub async fn list_phases(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let result: Result<HttpResponse> = async {
            let items = self.get_storage(request)?.list_phases().await?;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                PhaseListResponse { items },
                "Phases retrieved successfully",
            )))
        }
        .await;

        Ok(result.unwrap_or_else(|e| error_response(&e)))
    }

    pub async fn activate_phase(
        &self,
        phase_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let result: Result<HttpResponse> = async {
            let phase = self.get_storage(request)?.activate_phase(phase_id).await?;
            info!("Phase '{}' ({}) is now active", phase.name, phase.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(phase, "Phase activated")))
        }
        .await;

        Ok(result.unwrap_or_else(|e| error_response(&e)))
    }

    // 当前激活阶段，没有时返回 404
    pub async fn get_active_phase(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let result: Result<HttpResponse> = async {
            let phase = self
                .get_storage(request)?
                .get_active_phase()
                .await?
                .ok_or_else(|| ContestError::not_found("No active phase"))?;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                phase,
                "Active phase retrieved successfully",
            )))
        }
        .await;

        Ok(result.unwrap_or_else(|e| error_response(&e)))
    }
}

/// 校验名称与起止时间后创建阶段（初始为未激活）
pub async fn create_phase(storage: &dyn Storage, mut req: CreatePhaseRequest) -> Result<Phase> {
    req.name = validate_name("Phase name", &req.name)
        .map_err(ContestError::validation)?
        .to_string();
    if req.end_date < req.start_date {
        return Err(ContestError::validation(
            "Phase end date must not be earlier than its start date",
        ));
    }
    storage.create_phase(req).await
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::phases::CreatePhaseRequest;
use crate::services::PhaseService;

static PHASE_SERVICE: Lazy<PhaseService> = Lazy::new(PhaseService::new_lazy);

pub async fn get_active_phase(req: HttpRequest) -> ActixResult<HttpResponse> {
    PHASE_SERVICE.get_active_phase(&req).await
}

pub async fn create_phase(
    req: HttpRequest,
    body: web::Json<CreatePhaseRequest>,
) -> ActixResult<HttpResponse> {
    PHASE_SERVICE.create_phase(body.into_inner(), &req).await
}

pub async fn list_phases(req: HttpRequest) -> ActixResult<HttpResponse> {
    PHASE_SERVICE.list_phases(&req).await
}

pub async fn activate_phase(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    PHASE_SERVICE.activate_phase(path.into_inner(), &req).await
}

// 所有登录用户可查看当前阶段，管理端路由见 admin.rs
pub fn configure_phase_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/phases")
            .wrap(middlewares::RequireJWT)
            .route("/active", web::get().to(get_active_phase)),
    );
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::auth::CreateEvaluatorRequest;
use crate::models::users::UserRole;
use crate::services::EvaluatorService;

use super::{phases, tasks};

static EVALUATOR_SERVICE: Lazy<EvaluatorService> = Lazy::new(EvaluatorService::new_lazy);

pub async fn create_evaluator(
    req: HttpRequest,
    body: web::Json<CreateEvaluatorRequest>,
) -> ActixResult<HttpResponse> {
    EVALUATOR_SERVICE
        .create_evaluator(body.into_inner(), &req)
        .await
}

// 管理端：阶段、任务与评审账号，仅管理员
pub fn configure_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/admin")
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/phases")
                    .route(web::get().to(phases::list_phases))
                    .route(web::post().to(phases::create_phase)),
            )
            .route("/phases/{id}/activate", web::put().to(phases::activate_phase))
            .route("/tasks", web::post().to(tasks::create_task))
            .route("/evaluators", web::post().to(create_evaluator)),
    );
}

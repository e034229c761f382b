use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequireRole};
use crate::models::submissions::GradeSubmissionRequest;
use crate::models::users::UserRole;
use crate::services::SubmissionService;

// 懒加载的全局 SubmissionService 实例
static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);

// 上传/替换提交
pub async fn submit(
    req: HttpRequest,
    path: web::Path<i64>, // task_id
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .submit(path.into_inner(), payload, &req)
        .await
}

// 本队全部提交
pub async fn list_my(req: HttpRequest) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.list_my(&req).await
}

// 本队某任务的提交
pub async fn get_my_for_task(
    req: HttpRequest,
    path: web::Path<i64>, // task_id
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .get_my_for_task(path.into_inner(), &req)
        .await
}

// 某任务下的全部提交（评审视角）
pub async fn list_for_task(
    req: HttpRequest,
    path: web::Path<i64>, // task_id
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .list_for_task(path.into_inner(), &req)
        .await
}

pub async fn grade(
    req: HttpRequest,
    path: web::Path<i64>, // submission_id
    body: web::Json<GradeSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .grade(path.into_inner(), body.into_inner(), &req)
        .await
}

pub async fn download(
    req: HttpRequest,
    path: web::Path<i64>, // submission_id
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .download(path.into_inner(), &req)
        .await
}

// 配置路由
pub fn configure_submissions_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/submissions")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_my))
                    .wrap(RequireRole::new_any(UserRole::participant_roles())),
            )
            // 固定前缀的路由要先于 /{task_id} 注册
            .service(
                web::resource("/task/{task_id}")
                    .route(web::get().to(list_for_task))
                    .wrap(RequireRole::new_any(UserRole::grader_roles())),
            )
            .service(
                web::resource("/{id}/grade")
                    .route(web::put().to(grade))
                    .wrap(RequireRole::new_any(UserRole::grader_roles())),
            )
            // 参赛者与评审都可下载，归属在业务层检查
            .route("/{id}/artifact", web::get().to(download))
            .service(
                web::resource("/{task_id}/me")
                    .route(web::get().to(get_my_for_task))
                    .wrap(RequireRole::new_any(UserRole::participant_roles())),
            )
            .service(
                web::resource("/{task_id}")
                    .route(web::post().to(submit))
                    .wrap(RequireRole::new_any(UserRole::participant_roles())),
            ),
    );
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::tasks::{CreateTaskRequest, TaskListQuery};
use crate::services::TaskService;

static TASK_SERVICE: Lazy<TaskService> = Lazy::new(TaskService::new_lazy);

pub async fn list_tasks(
    req: HttpRequest,
    query: web::Query<TaskListQuery>,
) -> ActixResult<HttpResponse> {
    TASK_SERVICE.list_tasks(query.into_inner(), &req).await
}

pub async fn get_task(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    TASK_SERVICE.get_task(path.into_inner(), &req).await
}

pub async fn create_task(
    req: HttpRequest,
    body: web::Json<CreateTaskRequest>,
) -> ActixResult<HttpResponse> {
    TASK_SERVICE.create_task(body.into_inner(), &req).await
}

pub fn configure_task_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/tasks")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_tasks))
            .route("/{id}", web::get().to(get_task)),
    );
}

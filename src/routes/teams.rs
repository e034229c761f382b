use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::services::TeamService;

static TEAM_SERVICE: Lazy<TeamService> = Lazy::new(TeamService::new_lazy);

pub async fn get_my_team(req: HttpRequest) -> ActixResult<HttpResponse> {
    TEAM_SERVICE.get_my_team(&req).await
}

pub fn configure_team_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/teams")
            .wrap(middlewares::RequireJWT)
            .route("/my", web::get().to(get_my_team)),
    );
}

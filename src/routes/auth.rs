use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RateLimit};
use crate::models::auth::{LoginRequest, RegisterLeaderRequest, RegisterMemberRequest};
use crate::services::AuthService;

// 懒加载的全局 AuthService 实例
static AUTH_SERVICE: Lazy<AuthService> = Lazy::new(AuthService::new_lazy);

pub async fn register_leader(
    req: HttpRequest,
    body: web::Json<RegisterLeaderRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.register_leader(body.into_inner(), &req).await
}

pub async fn register_member(
    req: HttpRequest,
    body: web::Json<RegisterMemberRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.register_member(body.into_inner(), &req).await
}

pub async fn login(req: HttpRequest, body: web::Json<LoginRequest>) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.login(body.into_inner(), &req).await
}

pub async fn refresh_token(req: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.refresh_token(&req).await
}

pub async fn logout() -> ActixResult<HttpResponse> {
    AUTH_SERVICE.logout().await
}

pub async fn me(req: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.me(&req).await
}

// 配置路由
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/auth")
            .service(
                web::resource("/register-leader")
                    .wrap(RateLimit::register())
                    .route(web::post().to(register_leader)),
            )
            .service(
                web::resource("/register-member")
                    .wrap(RateLimit::register())
                    .route(web::post().to(register_member)),
            )
            .service(
                web::resource("/login")
                    .wrap(RateLimit::login())
                    .route(web::post().to(login)),
            )
            .route("/refresh", web::post().to(refresh_token))
            .route("/logout", web::post().to(logout))
            .service(
                web::resource("/me")
                    .wrap(middlewares::RequireJWT)
                    .route(web::get().to(me)),
            ),
    );
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::errors::{ContestError, Result};
use crate::models::ApiResponse;
use crate::models::auth::{RefreshTokenResponse, UserInfoResponse};
use crate::services::{current_user, error_response};
use crate::utils::jwt::JwtUtils;

use super::AuthService;

pub async fn handle_refresh_token(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let result: Result<HttpResponse> = async {
        let refresh_token = JwtUtils::extract_refresh_token_from_cookie(request)
            .ok_or_else(|| ContestError::authentication("Unauthorized access, please login"))?;

        let claims = JwtUtils::verify_refresh_token(&refresh_token).map_err(|e| {
            tracing::info!("Refresh token rejected: {}", e);
            ContestError::authentication("Login expired or invalid, please login again")
        })?;

        // 角色以数据库为准，账号被删除后 refresh 失效
        let storage = service.get_storage(request)?;
        let user = match claims.user_id() {
            Some(id) => storage.get_user_by_id(id).await?,
            None => None,
        }
        .ok_or_else(|| ContestError::authentication("Login expired or invalid, please login again"))?;

        let access_token = JwtUtils::generate_access_token(user.id, &user.role.to_string())
            .map_err(|e| ContestError::internal(format!("Failed to generate token: {e}")))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            RefreshTokenResponse {
                access_token,
                expires_in: JwtUtils::access_token_expires_in(),
            },
            "Token refreshed successfully",
        )))
    }
    .await;

    Ok(result.unwrap_or_else(|e| {
        let mut response = error_response(&e);
        if e.code() == "E011" {
            // 清除无效的 refresh token cookie
            let _ = response.add_cookie(&JwtUtils::create_empty_refresh_token_cookie());
        }
        response
    }))
}

pub async fn handle_me(service: &AuthService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let result: Result<HttpResponse> = async {
        let user = current_user(request)?;
        let team = match user.team_id {
            Some(team_id) => service.get_storage(request)?.get_team_by_id(team_id).await?,
            None => None,
        };
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserInfoResponse { user, team },
            "User information retrieved successfully",
        )))
    }
    .await;

    Ok(result.unwrap_or_else(|e| error_response(&e)))
}

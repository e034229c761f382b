use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::errors::{ContestError, Result};
use crate::models::ApiResponse;
use crate::models::auth::{LoginRequest, LoginResponse};
use crate::models::users::User;
use crate::services::error_response;
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use crate::utils::password::verify_password;

use super::{AuthService, issue_tokens};

/// 手机号 + 密码验证；用户不存在与密码错误返回同一条信息
pub async fn authenticate(storage: &dyn Storage, phone: &str, password: &str) -> Result<User> {
    let user = storage.get_user_by_phone(phone.trim()).await?;
    match user {
        Some(user) if verify_password(password, &user.password_hash) => Ok(user),
        _ => Err(ContestError::authentication(
            "Phone number or password is incorrect",
        )),
    }
}

pub async fn handle_login(
    service: &AuthService,
    body: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let result: Result<HttpResponse> = async {
        let storage = service.get_storage(request)?;
        let user = authenticate(storage.as_ref(), &body.phone, &body.password).await?;

        let team = match user.team_id {
            Some(team_id) => storage.get_team_by_id(team_id).await?,
            None => None,
        };
        let tokens = issue_tokens(&user)?;

        info!("User {} logged in successfully", user.id);

        let response = LoginResponse {
            access_token: tokens.access_token,
            expires_in: JwtUtils::access_token_expires_in(),
            user,
            team,
            created_at: chrono::Utc::now(),
        };
        Ok(HttpResponse::Ok()
            .cookie(JwtUtils::create_refresh_token_cookie(&tokens.refresh_token))
            .json(ApiResponse::success(response, "Login successful")))
    }
    .await;

    Ok(result.unwrap_or_else(|e| error_response(&e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::register::register_leader;
    use crate::services::auth::register::tests::leader_request;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::utils::password::test_argon2_config;

    #[tokio::test]
    async fn login_by_phone() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let (leader, _) = register_leader(
            &storage,
            leader_request("login", "9111111111"),
            &test_argon2_config(),
        )
        .await
        .unwrap();

        let user = authenticate(&storage, " 9111111111 ", "secret99")
            .await
            .unwrap();
        assert_eq!(user.id, leader.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_phone_look_the_same() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        register_leader(
            &storage,
            leader_request("login", "9111111112"),
            &test_argon2_config(),
        )
        .await
        .unwrap();

        let wrong = authenticate(&storage, "9111111112", "nope1234")
            .await
            .unwrap_err();
        let unknown = authenticate(&storage, "9999999999", "secret99")
            .await
            .unwrap_err();
        assert_eq!(wrong.code(), "E011");
        assert_eq!(wrong.message(), unknown.message());
    }
}

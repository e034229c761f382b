pub mod login;
pub mod logout;
pub mod register;
pub mod token;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::{ContestError, Result};
use crate::models::auth::{LoginRequest, RegisterLeaderRequest, RegisterMemberRequest};
use crate::models::users::User;
use crate::storage::Storage;
use crate::utils::jwt::{JwtUtils, TokenPair};

pub struct AuthService {
    storage: Option<Arc<dyn Storage>>,
}

impl AuthService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::shared::<dyn Storage>(request),
        }
    }

    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    // 队长注册并创建队伍
    pub async fn register_leader(
        &self,
        body: RegisterLeaderRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        register::handle_register_leader(self, body, request).await
    }

    // 队员凭队伍码注册
    pub async fn register_member(
        &self,
        body: RegisterMemberRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        register::handle_register_member(self, body, request).await
    }

    // 登录验证
    pub async fn login(&self, body: LoginRequest, request: &HttpRequest) -> ActixResult<HttpResponse> {
        login::handle_login(self, body, request).await
    }

    // 刷新令牌
    pub async fn refresh_token(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        token::handle_refresh_token(self, request).await
    }

    // 当前用户信息
    pub async fn me(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        token::handle_me(self, request).await
    }

    pub async fn logout(&self) -> ActixResult<HttpResponse> {
        logout::handle_logout().await
    }
}

/// 为用户签发 access + refresh 令牌
pub(crate) fn issue_tokens(user: &User) -> Result<TokenPair> {
    JwtUtils::generate_token_pair(user.id, &user.role.to_string())
        .map_err(|e| ContestError::internal(format!("Failed to generate token: {e}")))
}

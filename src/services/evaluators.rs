//! 评审账号管理

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::config::{AppConfig, Argon2Config};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::auth::CreateEvaluatorRequest;
use crate::models::users::{NewUser, User, UserProfile, UserRole};
use crate::storage::Storage;
use crate::utils::password::hash_password_with;
use crate::utils::validate::validate_account_fields;

use super::error_response;

pub struct EvaluatorService {
    storage: Option<Arc<dyn Storage>>,
}

impl EvaluatorService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::shared::<dyn Storage>(request),
        }
    }

    pub async fn create_evaluator(
        &self,
        body: CreateEvaluatorRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let result: Result<HttpResponse> = async {
            let storage = self.get_storage(request)?;
            let user = create_evaluator(storage.as_ref(), body, &AppConfig::get().argon2).await?;
            info!("Evaluator account {} created", user.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(user, "Evaluator created")))
        }
        .await;

        Ok(result.unwrap_or_else(|e| error_response(&e)))
    }
}

/// 创建不属于任何队伍的评审账号
pub async fn create_evaluator(
    storage: &dyn Storage,
    req: CreateEvaluatorRequest,
    argon2: &Argon2Config,
) -> Result<User> {
    let email = req.email.trim().to_lowercase();
    let phone = req.phone.trim().to_string();
    validate_account_fields(&req.name, &email, &phone, &req.password)?;

    let user = NewUser {
        name: req.name.trim().to_string(),
        email,
        phone,
        password_hash: hash_password_with(&req.password, argon2)?,
        profile: UserProfile::default(),
    };
    storage.create_staff_user(user, UserRole::Evaluator).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::utils::password::{test_argon2_config, verify_password};

    fn request(phone: &str) -> CreateEvaluatorRequest {
        CreateEvaluatorRequest {
            name: "Judge".into(),
            email: format!("judge{phone}@example.com"),
            phone: phone.into(),
            password: "judge2024".into(),
        }
    }

    #[tokio::test]
    async fn evaluator_has_no_team() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let user = create_evaluator(&storage, request("9333333330"), &test_argon2_config())
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Evaluator);
        assert!(user.team_id.is_none());
        assert!(verify_password("judge2024", &user.password_hash));
    }

    #[tokio::test]
    async fn duplicate_phone_conflicts() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        create_evaluator(&storage, request("9333333331"), &test_argon2_config())
            .await
            .unwrap();
        let mut again = request("9333333331");
        again.email = "other@example.com".into();
        let err = create_evaluator(&storage, again, &test_argon2_config())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E013");
    }
}

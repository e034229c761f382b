use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::config::Argon2Config;
use crate::errors::{ContestError, Result};
use crate::models::ApiResponse;
use crate::models::auth::{
    RegisterLeaderRequest, RegisterLeaderResponse, RegisterMemberRequest, RegisterMemberResponse,
};
use crate::models::teams::Team;
use crate::models::users::{NewUser, User, UserProfile};
use crate::services::error_response;
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use crate::utils::password::hash_password_with;
use crate::utils::random_code::normalize_team_code;
use crate::utils::validate::{validate_account_fields, validate_name};

use super::{AuthService, issue_tokens};

/// 空白的可选字段视为未填写
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 校验账号字段并哈希密码，得到待插入的用户
fn build_account(
    name: &str,
    email: &str,
    phone: &str,
    password: &str,
    profile: UserProfile,
    argon2: &Argon2Config,
) -> Result<NewUser> {
    let email = email.trim().to_lowercase();
    let phone = phone.trim().to_string();
    validate_account_fields(name, &email, &phone, password)?;

    Ok(NewUser {
        name: name.trim().to_string(),
        email,
        phone,
        password_hash: hash_password_with(password, argon2)?,
        profile,
    })
}

/// 队长注册：创建账号与队伍，并签发队伍码
pub async fn register_leader(
    storage: &dyn Storage,
    req: RegisterLeaderRequest,
    argon2: &Argon2Config,
) -> Result<(User, Team)> {
    let team_name = validate_name("Team name", &req.team_name)
        .map_err(ContestError::validation)?
        .to_string();
    let college_name = validate_name("College name", &req.college_name)
        .map_err(ContestError::validation)?
        .to_string();

    let profile = UserProfile {
        institute_name: Some(college_name.clone()),
        city: optional(req.city),
        year: optional(req.year),
        branch: optional(req.branch),
        instagram: optional(req.instagram),
        linkedin: optional(req.linkedin),
    };
    let leader = build_account(
        &req.name,
        &req.email,
        &req.phone,
        &req.password,
        profile,
        argon2,
    )?;

    storage
        .register_leader(leader, &team_name, &college_name)
        .await
}

/// 队员注册：凭队伍码加入，学校信息沿用队伍
pub async fn register_member(
    storage: &dyn Storage,
    req: RegisterMemberRequest,
    argon2: &Argon2Config,
) -> Result<(User, Team)> {
    let code = normalize_team_code(&req.team_code);
    if code.is_empty() {
        return Err(ContestError::validation("Team code must not be empty"));
    }

    let profile = UserProfile {
        year: optional(req.year),
        branch: optional(req.branch),
        ..Default::default()
    };
    let member = build_account(
        &req.name,
        &req.email,
        &req.phone,
        &req.password,
        profile,
        argon2,
    )?;

    storage.join_team(&code, member).await
}

pub async fn handle_register_leader(
    service: &AuthService,
    body: RegisterLeaderRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let result: Result<HttpResponse> = async {
        let storage = service.get_storage(request)?;
        let config = service.get_config();
        let (user, team) = register_leader(storage.as_ref(), body, &config.argon2).await?;
        let tokens = issue_tokens(&user)?;

        info!(
            "Team '{}' ({}) registered by leader {}",
            team.team_name, team.id, user.id
        );

        let response = RegisterLeaderResponse {
            team_code: team.team_code.clone(),
            access_token: tokens.access_token,
            user,
            team,
        };
        Ok(HttpResponse::Created()
            .cookie(JwtUtils::create_refresh_token_cookie(&tokens.refresh_token))
            .json(ApiResponse::success(response, "Team registered successfully")))
    }
    .await;

    Ok(result.unwrap_or_else(|e| error_response(&e)))
}

pub async fn handle_register_member(
    service: &AuthService,
    body: RegisterMemberRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let result: Result<HttpResponse> = async {
        let storage = service.get_storage(request)?;
        let config = service.get_config();
        let (user, team) = register_member(storage.as_ref(), body, &config.argon2).await?;
        let tokens = issue_tokens(&user)?;

        info!("User {} joined team {}", user.id, team.id);

        let response = RegisterMemberResponse {
            access_token: tokens.access_token,
            user,
            team,
        };
        Ok(HttpResponse::Created()
            .cookie(JwtUtils::create_refresh_token_cookie(&tokens.refresh_token))
            .json(ApiResponse::success(response, "Joined team successfully")))
    }
    .await;

    Ok(result.unwrap_or_else(|e| error_response(&e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::users::UserRole;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::utils::password::test_argon2_config;

    pub(crate) fn leader_request(tag: &str, phone: &str) -> RegisterLeaderRequest {
        RegisterLeaderRequest {
            name: format!("Leader {tag}"),
            email: format!("{tag}@example.com"),
            phone: phone.to_string(),
            password: "secret99".to_string(),
            team_name: format!("Team {tag}"),
            college_name: "  Tech Institute ".to_string(),
            city: Some("Pune".to_string()),
            year: Some(" ".to_string()),
            branch: None,
            instagram: None,
            linkedin: None,
        }
    }

    pub(crate) fn member_request(tag: &str, phone: &str, code: &str) -> RegisterMemberRequest {
        RegisterMemberRequest {
            name: format!("Member {tag}"),
            email: format!("{tag}@example.com"),
            phone: phone.to_string(),
            password: "secret99".to_string(),
            team_code: code.to_string(),
            year: Some("2".to_string()),
            branch: Some("CSE".to_string()),
        }
    }

    #[tokio::test]
    async fn leader_registration_normalizes_fields() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let mut req = leader_request("alpha", "9000000001");
        req.email = " Alpha@Example.com ".to_string();

        let (user, team) = register_leader(&storage, req, &test_argon2_config())
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Leader);
        assert_eq!(user.email, "alpha@example.com");
        assert_eq!(user.team_id, Some(team.id));
        assert_eq!(team.college_name, "Tech Institute");
        assert_eq!(user.profile.city.as_deref(), Some("Pune"));
        assert!(user.profile.year.is_none());
        assert_ne!(user.password_hash, "secret99");
    }

    #[tokio::test]
    async fn weak_password_rejected_before_storage() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let mut req = leader_request("weak", "9000000002");
        req.password = "abc".to_string();

        let err = register_leader(&storage, req, &test_argon2_config())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");
    }

    #[tokio::test]
    async fn member_joins_with_lowercase_code() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let (_, team) = register_leader(
            &storage,
            leader_request("lead", "9000000003"),
            &test_argon2_config(),
        )
        .await
        .unwrap();

        let code = team.team_code.to_lowercase();
        let (member, joined) = register_member(
            &storage,
            member_request("m1", "9000000004", &code),
            &test_argon2_config(),
        )
        .await
        .unwrap();
        assert_eq!(member.role, UserRole::Member);
        assert_eq!(joined.id, team.id);
        assert_eq!(joined.member_count, 2);
        assert_eq!(
            member.profile.institute_name.as_deref(),
            Some("Tech Institute")
        );
    }

    #[tokio::test]
    async fn member_with_blank_code_rejected() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let err = register_member(
            &storage,
            member_request("m1", "9000000005", "   "),
            &test_argon2_config(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "E007");
    }
}

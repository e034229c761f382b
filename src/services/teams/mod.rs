//! 队伍查询服务

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{ContestError, Result};
use crate::models::ApiResponse;
use crate::models::teams::TeamDetail;
use crate::storage::Storage;

use super::{current_user, error_response};

pub struct TeamService {
    storage: Option<Arc<dyn Storage>>,
}

impl TeamService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::shared::<dyn Storage>(request),
        }
    }

    // 当前用户所在队伍
    pub async fn get_my_team(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let result: Result<HttpResponse> = async {
            let user = current_user(request)?;
            let team_id = user
                .team_id
                .ok_or_else(|| ContestError::not_found("You are not a member of any team"))?;
            let detail = team_detail(self.get_storage(request)?.as_ref(), team_id).await?;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                detail,
                "Team retrieved successfully",
            )))
        }
        .await;

        Ok(result.unwrap_or_else(|e| error_response(&e)))
    }
}

/// 队伍详情：成员列表（队长在前）与实时排名
pub async fn team_detail(storage: &dyn Storage, team_id: i64) -> Result<TeamDetail> {
    let team = storage
        .get_team_by_id(team_id)
        .await?
        .ok_or_else(|| ContestError::not_found(format!("Team {team_id} not found")))?;

    let mut members = storage.list_team_members(team_id).await?;
    // 队长的用户 ID 一定最小，这里仍显式排到首位
    if let Some(pos) = members.iter().position(|m| m.id == team.leader_id) {
        let leader = members.remove(pos);
        members.insert(0, leader);
    }

    let rank = storage.get_team_rank(team_id).await?.unwrap_or(1);
    Ok(TeamDetail {
        team,
        members,
        rank,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::register::tests::{leader_request, member_request};
    use crate::services::auth::register::{register_leader, register_member};
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::utils::password::test_argon2_config;

    #[tokio::test]
    async fn detail_lists_leader_first_with_rank() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let argon2 = test_argon2_config();
        let (leader, team) = register_leader(&storage, leader_request("t", "9222222220"), &argon2)
            .await
            .unwrap();
        register_member(
            &storage,
            member_request("m", "9222222221", &team.team_code),
            &argon2,
        )
        .await
        .unwrap();

        let detail = team_detail(&storage, team.id).await.unwrap();
        assert_eq!(detail.members.len(), 2);
        assert_eq!(detail.members[0].id, leader.id);
        assert_eq!(detail.rank, 1);
        assert_eq!(detail.team.member_count, 2);
    }

    #[tokio::test]
    async fn unknown_team_not_found() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let err = team_detail(&storage, 99).await.unwrap_err();
        assert_eq!(err.code(), "E008");
    }
}

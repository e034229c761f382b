use super::SeaOrmStorage;
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{ContestError, Result};
use crate::models::users::{NewUser, User, UserRole};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 构造待插入的用户行
    pub(crate) fn new_user_model(
        user: NewUser,
        role: UserRole,
        team_id: Option<i64>,
        now: i64,
    ) -> ActiveModel {
        ActiveModel {
            name: Set(user.name),
            email: Set(user.email),
            phone: Set(user.phone),
            password_hash: Set(user.password_hash),
            role: Set(role.to_string()),
            team_id: Set(team_id),
            institute_name: Set(user.profile.institute_name),
            city: Set(user.profile.city),
            year: Set(user.profile.year),
            branch: Set(user.profile.branch),
            instagram: Set(user.profile.instagram),
            linkedin: Set(user.profile.linkedin),
            created_at: Set(now),
            ..Default::default()
        }
    }

    /// 邮箱或手机号已被占用时返回 Conflict
    pub(crate) async fn ensure_user_unique<C: ConnectionTrait>(
        conn: &C,
        email: &str,
        phone: &str,
    ) -> Result<()> {
        let existing = Users::find()
            .filter(
                Condition::any()
                    .add(Column::Email.eq(email))
                    .add(Column::Phone.eq(phone)),
            )
            .one(conn)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询用户失败: {e}")))?;

        match existing {
            Some(_) => Err(ContestError::conflict(
                "User with this email or phone already exists",
            )),
            None => Ok(()),
        }
    }

    /// 创建评审或管理员账号
    pub async fn create_staff_user_impl(&self, user: NewUser, role: UserRole) -> Result<User> {
        if role.is_participant() {
            return Err(ContestError::validation(
                "Participants must register through a team",
            ));
        }
        Self::ensure_user_unique(&self.db, &user.email, &user.phone).await?;

        let now = chrono::Utc::now().timestamp();
        let result = Self::new_user_model(user, role, None, now)
            .insert(&self.db)
            .await?;

        Ok(result.into_user())
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过手机号获取用户
    pub async fn get_user_by_phone_impl(&self, phone: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Phone.eq(phone))
            .one(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    pub async fn count_users_by_role_impl(&self, role: UserRole) -> Result<u64> {
        Users::find()
            .filter(Column::Role.eq(role.to_string()))
            .count(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("统计用户失败: {e}")))
    }

    /// 列出队伍成员，按用户 ID 升序
    pub async fn list_team_members_impl(&self, team_id: i64) -> Result<Vec<User>> {
        let members = Users::find()
            .filter(Column::TeamId.eq(team_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询队伍成员失败: {e}")))?;

        Ok(members.into_iter().map(|m| m.into_user()).collect())
    }
}

//! 用户实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub phone: String,
    pub password_hash: String,
    pub role: String,
    pub team_id: Option<i64>,
    pub institute_name: Option<String>,
    pub city: Option<String>,
    pub year: Option<String>,
    pub branch: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_user(self) -> crate::models::users::User {
        use crate::models::users::{User, UserProfile, UserRole};

        User {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            password_hash: self.password_hash,
            role: self.role.parse::<UserRole>().unwrap_or(UserRole::Member),
            team_id: self.team_id,
            profile: UserProfile {
                institute_name: self.institute_name,
                city: self.city,
                year: self.year,
                branch: self.branch,
                instagram: self.instagram,
                linkedin: self.linkedin,
            },
            created_at: super::from_timestamp(self.created_at),
        }
    }
}

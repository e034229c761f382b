use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 用户角色
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "user.ts")]
pub enum UserRole {
    Leader,    // 队长
    Member,    // 队员
    Evaluator, // 评审
    Admin,     // 管理员
}

impl UserRole {
    pub const LEADER: &'static str = "leader";
    pub const MEMBER: &'static str = "member";
    pub const EVALUATOR: &'static str = "evaluator";
    pub const ADMIN: &'static str = "admin";

    pub fn admin_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin]
    }
    /// 可以查看并评分提交的角色
    pub fn grader_roles() -> &'static [&'static UserRole] {
        &[&Self::Evaluator, &Self::Admin]
    }
    /// 隶属于队伍的参赛角色
    pub fn participant_roles() -> &'static [&'static UserRole] {
        &[&Self::Leader, &Self::Member]
    }
    pub fn all_roles() -> &'static [&'static UserRole] {
        &[&Self::Leader, &Self::Member, &Self::Evaluator, &Self::Admin]
    }

    pub fn is_participant(&self) -> bool {
        matches!(self, UserRole::Leader | UserRole::Member)
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<UserRole>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的用户角色: '{s}'. 支持的角色: leader, member, evaluator, admin"
            ))
        })
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Leader => write!(f, "{}", UserRole::LEADER),
            UserRole::Member => write!(f, "{}", UserRole::MEMBER),
            UserRole::Evaluator => write!(f, "{}", UserRole::EVALUATOR),
            UserRole::Admin => write!(f, "{}", UserRole::ADMIN),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            UserRole::LEADER => Ok(UserRole::Leader),
            UserRole::MEMBER => Ok(UserRole::Member),
            UserRole::EVALUATOR => Ok(UserRole::Evaluator),
            UserRole::ADMIN => Ok(UserRole::Admin),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

// 用户资料（选填项）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserProfile {
    pub institute_name: Option<String>,
    pub city: Option<String>,
    pub year: Option<String>,
    pub branch: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
}

// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    #[ts(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub team_id: Option<i64>,
    pub profile: UserProfile,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 新建账号所需的信息，口令已经哈希
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub profile: UserProfile,
}

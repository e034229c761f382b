use serde::Deserialize;
use ts_rs::TS;

// 队长注册（同时创建队伍）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "auth.ts")]
pub struct RegisterLeaderRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub team_name: String,
    pub college_name: String,
    pub city: Option<String>,
    pub year: Option<String>,
    pub branch: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
}

// 队员凭队伍码注册
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "auth.ts")]
pub struct RegisterMemberRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub team_code: String,
    pub year: Option<String>,
    pub branch: Option<String>,
}

// 登录请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "auth.ts")]
pub struct LoginRequest {
    /// 手机号
    pub phone: String,
    /// 密码
    pub password: String,
}

// 创建评审账号
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "auth.ts")]
pub struct CreateEvaluatorRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

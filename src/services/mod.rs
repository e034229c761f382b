//! 业务逻辑层
//!
//! 每个服务都提供两层：返回 `Result<T>` 的核心流程（便于单元测试），以及把结果
//! 转成统一 JSON 信封的 `handle_*` 处理函数。

pub mod auth;
pub mod evaluators;
pub mod phases;
pub mod submissions;
pub mod tasks;
pub mod teams;

pub use auth::AuthService;
pub use evaluators::EvaluatorService;
pub use phases::PhaseService;
pub use submissions::{SubmissionLocks, SubmissionService};
pub use tasks::TaskService;
pub use teams::TeamService;

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, web};

use crate::errors::{ContestError, Result};
use crate::middlewares::RequireJWT;
use crate::models::users::User;
use crate::models::{ApiResponse, ErrorCode};

/// 从 app_data 中取出共享组件
pub(crate) fn shared<T: ?Sized + 'static>(request: &HttpRequest) -> Result<Arc<T>> {
    request
        .app_data::<web::Data<Arc<T>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            ContestError::internal(format!(
                "{} not found in app data",
                std::any::type_name::<T>()
            ))
        })
}

/// 当前登录用户，必须挂在 RequireJWT 之后
pub(crate) fn current_user(request: &HttpRequest) -> Result<User> {
    RequireJWT::extract_user(request)
        .ok_or_else(|| ContestError::authentication("Unauthorized access, please login"))
}

/// 将业务错误转换为统一响应
///
/// 4xx 直接回传错误信息；5xx 记录日志并隐藏细节。
pub(crate) fn error_response(err: &ContestError) -> HttpResponse {
    let code = ErrorCode::from(err);
    if err.is_client_error() {
        HttpResponse::build(err.status()).json(ApiResponse::error_empty(code, err.message()))
    } else {
        tracing::error!("{}", err.format_simple());
        HttpResponse::build(err.status())
            .json(ApiResponse::error_empty(code, "Internal server error"))
    }
}

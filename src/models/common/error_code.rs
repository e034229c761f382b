
use crate::errors::ContestError;

/// 业务错误码
///
/// 0 表示成功；1xxx 通用，2xxx 认证，3xxx 队伍，4xxx 阶段，5xxx 任务，6xxx 提交，7xxx 文件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1009,
    RateLimitExceeded = 1029,
    InternalServerError = 1500,

    AuthFailed = 2000,
    RegisterFailed = 2001,
    UserAlreadyExists = 2002,
    UserNotFound = 2004,

    TeamNotFound = 3000,
    TeamCodeInvalid = 3001,
    TeamFull = 3002,
    TeamNameAlreadyExists = 3003,
    TeamRequired = 3004,

    PhaseNotFound = 4000,
    PhaseInvalid = 4001,

    TaskNotFound = 5000,
    TaskInvalid = 5001,

    SubmissionNotFound = 6000,
    DeadlineExpired = 6001,
    ScoreOutOfRange = 6002,

    FileNotFound = 7000,
    FileUploadFailed = 7001,
    FileTypeNotAllowed = 7002,
    FileSizeExceeded = 7003,
    MultifileUploadNotAllowed = 7004,
}

impl From<&ContestError> for ErrorCode {
    fn from(err: &ContestError) -> Self {
        match err {
            ContestError::Validation(_) | ContestError::DateParse(_) => ErrorCode::BadRequest,
            ContestError::NotFound(_) => ErrorCode::NotFound,
            ContestError::Conflict(_) => ErrorCode::Conflict,
            ContestError::CapacityExceeded(_) => ErrorCode::TeamFull,
            ContestError::DeadlineExpired(_) => ErrorCode::DeadlineExpired,
            ContestError::UnsupportedMediaType(_) => ErrorCode::FileTypeNotAllowed,
            ContestError::PayloadTooLarge(_) => ErrorCode::FileSizeExceeded,
            ContestError::Authentication(_) => ErrorCode::Unauthorized,
            ContestError::Authorization(_) => ErrorCode::Forbidden,
            _ => ErrorCode::InternalServerError,
        }
    }
}

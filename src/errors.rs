//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码、类型名称和 HTTP 状态码。

use std::fmt;

use actix_web::http::StatusCode;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - status() 方法 - 返回对应的 HTTP 状态码
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_contest_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal, $status:ident)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum ContestError {
            $($variant(String),)*
        }

        impl ContestError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(ContestError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(ContestError::$variant(_) => $type_name,)*
                }
            }

            /// 获取 HTTP 状态码
            pub fn status(&self) -> StatusCode {
                match self {
                    $(ContestError::$variant(_) => StatusCode::$status,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(ContestError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl ContestError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        ContestError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_contest_errors! {
    CacheConnection("E001", "Cache Connection Error", INTERNAL_SERVER_ERROR),
    CachePluginNotFound("E002", "Cache Plugin Not Found", INTERNAL_SERVER_ERROR),
    DatabaseConfig("E003", "Database Configuration Error", INTERNAL_SERVER_ERROR),
    DatabaseConnection("E004", "Database Connection Error", INTERNAL_SERVER_ERROR),
    DatabaseOperation("E005", "Database Operation Error", INTERNAL_SERVER_ERROR),
    FileOperation("E006", "File Operation Error", INTERNAL_SERVER_ERROR),
    Validation("E007", "Validation Error", BAD_REQUEST),
    NotFound("E008", "Resource Not Found", NOT_FOUND),
    Serialization("E009", "Serialization Error", INTERNAL_SERVER_ERROR),
    DateParse("E010", "Date Parse Error", BAD_REQUEST),
    Authentication("E011", "Authentication Error", UNAUTHORIZED),
    Authorization("E012", "Authorization Error", FORBIDDEN),
    Conflict("E013", "Conflict Error", CONFLICT),
    CapacityExceeded("E014", "Capacity Exceeded", CONFLICT),
    DeadlineExpired("E015", "Deadline Expired", FORBIDDEN),
    UnsupportedMediaType("E016", "Unsupported Media Type", UNSUPPORTED_MEDIA_TYPE),
    PayloadTooLarge("E017", "Payload Too Large", PAYLOAD_TOO_LARGE),
    Internal("E018", "Internal Error", INTERNAL_SERVER_ERROR),
}

impl ContestError {
    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否为调用方可见的业务错误（4xx）
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl fmt::Display for ContestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ContestError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for ContestError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => ContestError::Conflict(msg),
            _ => ContestError::DatabaseOperation(err.to_string()),
        }
    }
}

impl From<std::io::Error> for ContestError {
    fn from(err: std::io::Error) -> Self {
        ContestError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ContestError {
    fn from(err: serde_json::Error) -> Self {
        ContestError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for ContestError {
    fn from(err: chrono::ParseError) -> Self {
        ContestError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ContestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ContestError::cache_connection("test").code(), "E001");
        assert_eq!(ContestError::database_config("test").code(), "E003");
        assert_eq!(ContestError::validation("test").code(), "E007");
        assert_eq!(ContestError::capacity_exceeded("test").code(), "E014");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            ContestError::deadline_expired("test").error_type(),
            "Deadline Expired"
        );
        assert_eq!(
            ContestError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_error_status() {
        assert_eq!(ContestError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ContestError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(
            ContestError::unsupported_media_type("x").status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            ContestError::payload_too_large("x").status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert!(ContestError::validation("x").is_client_error());
        assert!(!ContestError::file_operation("x").is_client_error());
    }

    #[test]
    fn test_format_simple() {
        let err = ContestError::validation("Score out of range");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("Score out of range"));
    }
}

//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码、类型名称以及对外暴露的错误分类。

use std::fmt;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::AppConfig;
use crate::models::{ApiResponse, ErrorCode};

/// 单个字段的校验错误
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// 对外暴露的错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    ServiceUnavailable,
    ExternalService,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::Authorization => "AuthorizationError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Conflict => "ConflictError",
            ErrorKind::ServiceUnavailable => "ExternalServiceUnavailable",
            ErrorKind::ExternalService => "ExternalServiceError",
            ErrorKind::Internal => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::ExternalService => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义（外加携带字段列表的 `InvalidFields` 变体）
/// - code() / error_type() / kind() / api_code() / message()
/// - 便捷构造函数
macro_rules! define_app_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal, $kind:ident, $api:ident)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum AppError {
            $($variant(String),)*
            InvalidFields(Vec<FieldError>),
        }

        impl AppError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(AppError::$variant(_) => $code,)*
                    AppError::InvalidFields(_) => "E100",
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(AppError::$variant(_) => $type_name,)*
                    AppError::InvalidFields(_) => "Field Validation Error",
                }
            }

            /// 获取对外错误分类
            pub fn kind(&self) -> ErrorKind {
                match self {
                    $(AppError::$variant(_) => ErrorKind::$kind,)*
                    AppError::InvalidFields(_) => ErrorKind::Validation,
                }
            }

            /// 获取 API 响应码
            pub fn api_code(&self) -> ErrorCode {
                match self {
                    $(AppError::$variant(_) => ErrorCode::$api,)*
                    AppError::InvalidFields(_) => ErrorCode::ValidationFailed,
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(AppError::$variant(msg) => msg,)*
                    AppError::InvalidFields(_) => "Validation failed",
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl AppError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        AppError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_app_errors! {
    CacheConnection("E001", "Cache Connection Error", Internal, InternalServerError),
    CachePluginNotFound("E002", "Cache Plugin Not Found", Internal, InternalServerError),
    DatabaseConfig("E003", "Database Configuration Error", Internal, InternalServerError),
    DatabaseConnection("E004", "Database Connection Error", Internal, InternalServerError),
    DatabaseOperation("E005", "Database Operation Error", Internal, InternalServerError),
    Validation("E006", "Validation Error", Validation, ValidationFailed),
    NotFound("E007", "Resource Not Found", NotFound, NotFound),
    Serialization("E008", "Serialization Error", Internal, InternalServerError),
    Authentication("E009", "Authentication Error", Authentication, Unauthorized),
    Authorization("E010", "Authorization Error", Authorization, Forbidden),
    UsernameTaken("E011", "Username Taken", Conflict, UserNameAlreadyExists),
    EmailExists("E012", "Email Exists", Conflict, UserEmailAlreadyExists),
    InvalidCredentials("E013", "Invalid Credentials", Authentication, AuthFailed),
    WrongPassword("E014", "Wrong Password", Authentication, WrongPassword),
    AnalysisUnavailable("E015", "Analysis Service Unavailable", ServiceUnavailable, AnalysisServiceUnavailable),
    AnalysisFailed("E016", "Analysis Failed", ExternalService, AnalysisFailed),
    Internal("E017", "Internal Error", Internal, InternalServerError),
}

impl AppError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 字段校验错误列表（仅 `InvalidFields`）
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            AppError::InvalidFields(errors) => Some(errors),
            _ => None,
        }
    }

    /// 对外展示的消息，生产环境下隐藏内部错误细节
    pub fn public_message(&self) -> String {
        if self.kind() == ErrorKind::Internal && AppConfig::get().is_production() {
            "Internal server error".to_string()
        } else {
            self.message().to_string()
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.kind().status()
    }

    fn error_response(&self) -> HttpResponse {
        if self.kind() == ErrorKind::Internal {
            tracing::error!("{}", self.format_simple());
        }

        let mut body = ApiResponse::error_empty(self.api_code(), self.public_message())
            .with_kind(self.kind().as_str());
        if let Some(errors) = self.field_errors() {
            body = body.with_errors(errors.to_vec());
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::cache_connection("test").code(), "E001");
        assert_eq!(AppError::validation("test").code(), "E006");
        assert_eq!(AppError::authentication("test").code(), "E009");
        assert_eq!(AppError::InvalidFields(vec![]).code(), "E100");
    }

    #[test]
    fn test_error_kinds_map_to_status() {
        assert_eq!(
            AppError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::username_taken("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::authentication("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::authorization("x").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::analysis_unavailable("x").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::database_operation("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_conflicts_are_distinguishable() {
        let username = AppError::username_taken("Username is already taken");
        let email = AppError::email_exists("Email already exists");
        assert_eq!(username.kind(), ErrorKind::Conflict);
        assert_eq!(email.kind(), ErrorKind::Conflict);
        assert_ne!(username.code(), email.code());
        assert_ne!(username.api_code() as i32, email.api_code() as i32);
    }

    #[test]
    fn test_field_errors_are_kept() {
        let err = AppError::InvalidFields(vec![
            FieldError::new("title", "Title is required"),
            FieldError::new("code", "Code is required"),
        ]);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field_errors().map(|e| e.len()), Some(2));
    }

    #[test]
    fn test_format_simple() {
        let err = AppError::validation("Invalid URL");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("Invalid URL"));
    }
}

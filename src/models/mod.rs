pub mod admin;
pub mod auth;
pub mod common;
pub mod submissions;
pub mod system;
pub mod users;

pub use common::{ApiResponse, PaginationInfo, PaginationQuery};

use serde::Serialize;
use ts_rs::TS;

/// 程序启动时间，用于健康检查中的运行时长
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// API 业务响应码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub enum ErrorCode {
    // 通用
    Success = 0,
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    ValidationFailed = 1005,
    RateLimitExceeded = 1029,
    InternalServerError = 1500,

    // 认证
    AuthFailed = 2000,
    WrongPassword = 2001,

    // 用户
    UserNotFound = 3000,
    UserNameAlreadyExists = 3001,
    UserEmailAlreadyExists = 3002,

    // 代码提交与分析
    SubmissionNotFound = 4000,
    AnalysisServiceUnavailable = 4001,
    AnalysisFailed = 4002,
}

//! 请求体与查询参数的解析错误处理
//!
//! 统一转换为 ValidationError 响应体，而不是 actix 默认的纯文本。

use actix_web::{HttpRequest, error};

use crate::errors::AppError;

pub fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> error::Error {
    let message = match &err {
        error::JsonPayloadError::ContentType => "Content type must be application/json".to_string(),
        error::JsonPayloadError::OverflowKnownLength { .. }
        | error::JsonPayloadError::Overflow { .. } => "Request body is too large".to_string(),
        error::JsonPayloadError::Deserialize(e) => format!("Invalid request body: {e}"),
        other => format!("Invalid request body: {other}"),
    };
    tracing::debug!("JSON payload rejected: {}", err);
    AppError::validation(message).into()
}

pub fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> error::Error {
    tracing::debug!("Query string rejected: {}", err);
    AppError::validation(format!("Invalid query parameters: {err}")).into()
}

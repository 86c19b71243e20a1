//! 路径参数提取器
//!
//! 非数字或非正数的 ID 一律视为资源不存在，不会进入数据库查询。

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};

use crate::errors::AppError;

/// 安全解析的 `{id}` 路径参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeIDI64(pub i64);

impl SafeIDI64 {
    pub fn parse(raw: &str) -> Option<i64> {
        raw.parse::<i64>().ok().filter(|id| *id > 0)
    }
}

impl FromRequest for SafeIDI64 {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let parsed = req
            .match_info()
            .get("id")
            .and_then(Self::parse)
            .map(SafeIDI64)
            .ok_or_else(|| AppError::not_found("Resource not found"));
        ready(parsed)
    }
}

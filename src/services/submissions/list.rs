use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::errors::{AppError, Result};
use crate::middlewares::RequireJWT;
use crate::models::ApiResponse;
use crate::models::submissions::entities::{Language, SubmissionStatus};
use crate::models::submissions::requests::{SubmissionListParams, SubmissionListQuery};
use crate::utils::validate::FieldErrors;

/// 把 HTTP 查询参数转换为存储层查询，空字符串视为未筛选
pub fn build_list_query(
    params: SubmissionListParams,
    owner_id: Option<i64>,
) -> Result<SubmissionListQuery> {
    let (page, size) = params.pagination.normalized();
    let mut errors = FieldErrors::new();

    let language = match non_empty(params.language) {
        Some(raw) => match raw.parse::<Language>() {
            Ok(language) => Some(language),
            Err(msg) => {
                errors.push("language", msg);
                None
            }
        },
        None => None,
    };

    let status = match non_empty(params.status) {
        Some(raw) => match raw.parse::<SubmissionStatus>() {
            Ok(status) => Some(status),
            Err(msg) => {
                errors.push("status", msg);
                None
            }
        },
        None => None,
    };

    errors.into_result()?;

    Ok(SubmissionListQuery {
        page,
        size,
        owner_id,
        language,
        status,
        search: non_empty(params.search),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn list_submissions(
    service: &SubmissionService,
    request: &HttpRequest,
    params: SubmissionListParams,
) -> ActixResult<HttpResponse> {
    let actor = RequireJWT::extract_actor(request)
        .ok_or_else(|| AppError::authentication("Not authenticated"))?;

    // 只列出自己的提交
    let query = build_list_query(params, Some(actor.id))?;
    let storage = service.get_storage(request);
    let response = storage.list_submissions_with_pagination(query).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Submissions retrieved successfully",
    )))
}

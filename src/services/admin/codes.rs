use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AdminService, attach_owners, require_admin};
use crate::models::ApiResponse;
use crate::models::submissions::requests::SubmissionListParams;
use crate::models::submissions::responses::SubmissionWithOwnerListResponse;
use crate::policy::AdminAction;
use crate::services::submissions::build_list_query;

pub async fn list_codes(
    service: &AdminService,
    request: &HttpRequest,
    params: SubmissionListParams,
) -> ActixResult<HttpResponse> {
    require_admin(request, AdminAction::ListSubmissions)?;
    let storage = service.get_storage(request);

    let query = build_list_query(params, None)?;
    let page = storage.list_submissions_with_pagination(query).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        SubmissionWithOwnerListResponse {
            items: attach_owners(&storage, page.items).await?,
            pagination: page.pagination,
        },
        "Submissions retrieved successfully",
    )))
}

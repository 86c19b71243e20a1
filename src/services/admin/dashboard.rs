use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AdminService, aggregate, attach_owners, require_admin};
use crate::models::ApiResponse;
use crate::models::admin::responses::DashboardResponse;
use crate::models::users::entities::UserRole;
use crate::policy::AdminAction;

/// 仪表盘展示的最近提交数量
const RECENT_SUBMISSIONS_LIMIT: u64 = 5;

pub async fn get_dashboard(
    service: &AdminService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    require_admin(request, AdminAction::Dashboard)?;
    let storage = service.get_storage(request);

    let now = chrono::Utc::now();
    let total_students = storage.count_users_by_role(UserRole::Student).await?;
    let active_today = storage
        .count_users_active_since(UserRole::Student, aggregate::start_of_day(now))
        .await?;
    let facets = storage.list_submission_facets().await?;
    let recent = storage
        .list_recent_submissions(RECENT_SUBMISSIONS_LIMIT)
        .await?;

    let response = DashboardResponse {
        total_students: total_students as i64,
        total_submissions: facets.len() as i64,
        active_today: active_today as i64,
        language_stats: aggregate::language_stats(&facets),
        status_stats: aggregate::status_stats(&facets),
        grade_stats: aggregate::grade_stats(&facets),
        recent_submissions: attach_owners(&storage, recent).await?,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Dashboard retrieved successfully",
    )))
}

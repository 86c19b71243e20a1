use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AdminService, require_admin};
use crate::errors::AppError;
use crate::models::ApiResponse;
use crate::models::admin::responses::{StudentCodesResponse, StudentListResponse, StudentSummary};
use crate::models::submissions::requests::SubmissionListParams;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{StudentListParams, StudentListQuery};
use crate::policy::AdminAction;
use crate::services::submissions::build_list_query;

pub async fn list_students(
    service: &AdminService,
    request: &HttpRequest,
    params: StudentListParams,
) -> ActixResult<HttpResponse> {
    require_admin(request, AdminAction::ListStudents)?;
    let storage = service.get_storage(request);

    let (page, size) = params.pagination.normalized();
    let students = storage
        .list_students_with_pagination(StudentListQuery {
            page,
            size,
            search: params
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
        .await?;

    // 当前页学生的提交统计
    let ids: Vec<i64> = students.items.iter().map(|u| u.id).collect();
    let stats = storage.submission_stats_by_owner(&ids).await?;

    let items = students
        .items
        .into_iter()
        .map(|user| {
            let stat = stats.get(&user.id);
            StudentSummary {
                id: user.id,
                username: user.username,
                email: user.email,
                last_active: user.last_active,
                created_at: user.created_at,
                submission_count: stat.map_or(0, |s| s.count),
                last_submission_at: stat.and_then(|s| s.last_submission_at),
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StudentListResponse {
            items,
            pagination: students.pagination,
        },
        "Students retrieved successfully",
    )))
}

pub async fn list_student_codes(
    service: &AdminService,
    request: &HttpRequest,
    student_id: i64,
    params: SubmissionListParams,
) -> ActixResult<HttpResponse> {
    require_admin(request, AdminAction::StudentDetail)?;
    let storage = service.get_storage(request);

    let student = storage
        .get_user_by_id(student_id)
        .await?
        .filter(|user| user.role == UserRole::Student)
        .ok_or_else(|| AppError::not_found("Student not found"))?;

    let query = build_list_query(params, Some(student.id))?;
    let submissions = storage.list_submissions_with_pagination(query).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StudentCodesResponse {
            student,
            items: submissions.items,
            pagination: submissions.pagination,
        },
        "Student submissions retrieved successfully",
    )))
}

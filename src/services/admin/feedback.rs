use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AdminService, require_admin};
use crate::errors::AppError;
use crate::models::ApiResponse;
use crate::models::submissions::requests::FeedbackRequest;
use crate::policy::AdminAction;
use crate::services::submissions::load_submission;
use crate::utils::validate::validate_feedback;

pub async fn give_feedback(
    service: &AdminService,
    request: &HttpRequest,
    submission_id: i64,
    feedback_request: FeedbackRequest,
) -> ActixResult<HttpResponse> {
    let teacher = require_admin(request, AdminAction::Feedback)?;
    let storage = service.get_storage(request);

    let (comment, grade) = validate_feedback(feedback_request)?;
    let mut submission = load_submission(&storage, submission_id).await?;

    // 覆盖之前的反馈，有分数为已评分，否则为已点评
    submission.apply_feedback(teacher.id, comment, grade, chrono::Utc::now())?;
    if !storage.save_submission_feedback(&submission).await? {
        return Err(AppError::not_found("Submission not found").into());
    }

    tracing::info!(
        "Teacher {} left feedback on submission {} ({})",
        teacher.id,
        submission.id,
        submission.status
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        submission,
        "Feedback saved successfully",
    )))
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{SubmissionService, load_submission};
use crate::errors::AppError;
use crate::middlewares::RequireJWT;
use crate::models::ApiResponse;
use crate::models::submissions::requests::UpdateSubmissionRequest;
use crate::policy::{Action, authorize};
use crate::utils::validate::validate_submission_edit;

pub async fn update_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
    update_request: UpdateSubmissionRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let actor = RequireJWT::extract_actor(request);

    let mut submission = load_submission(&storage, submission_id).await?;
    authorize(
        actor.as_ref(),
        Action::UpdateSubmission {
            owner_id: submission.owner_id,
        },
    )?;

    let content = validate_submission_edit(&submission, update_request)?;

    // 修改后回到已提交状态，分析结果作废
    submission.apply_edit(content, chrono::Utc::now());
    if !storage.save_submission_edit(&submission).await? {
        return Err(AppError::not_found("Submission not found").into());
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        submission,
        "Submission updated successfully",
    )))
}

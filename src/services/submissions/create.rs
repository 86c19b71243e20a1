use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::errors::AppError;
use crate::middlewares::RequireJWT;
use crate::models::ApiResponse;
use crate::models::submissions::requests::CreateSubmissionRequest;
use crate::policy::{Action, authorize};
use crate::utils::validate::validate_new_submission;

pub async fn create_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    create_request: CreateSubmissionRequest,
) -> ActixResult<HttpResponse> {
    let actor = RequireJWT::extract_actor(request)
        .ok_or_else(|| AppError::authentication("Not authenticated"))?;
    authorize(Some(&actor), Action::CreateSubmission)?;

    let content = validate_new_submission(create_request)?;

    let storage = service.get_storage(request);
    // 提交者固定为当前用户
    let submission = storage.create_submission(actor.id, content).await?;

    tracing::info!(
        "Submission {} created by user {}",
        submission.id,
        submission.owner_id
    );

    Ok(HttpResponse::Created().json(ApiResponse::success(
        submission,
        "Submission created successfully",
    )))
}

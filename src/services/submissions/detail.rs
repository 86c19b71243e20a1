use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{SubmissionService, load_submission};
use crate::middlewares::RequireJWT;
use crate::models::ApiResponse;
use crate::policy::{Action, authorize};

pub async fn get_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let actor = RequireJWT::extract_actor(request);

    let submission = load_submission(&storage, submission_id).await?;
    authorize(
        actor.as_ref(),
        Action::ReadSubmission {
            owner_id: submission.owner_id,
        },
    )?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        submission,
        "Submission retrieved successfully",
    )))
}

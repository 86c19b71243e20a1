use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{SubmissionService, load_submission};
use crate::errors::AppError;
use crate::middlewares::RequireJWT;
use crate::models::ApiResponse;
use crate::policy::{Action, authorize};

pub async fn delete_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let actor = RequireJWT::extract_actor(request);

    let submission = load_submission(&storage, submission_id).await?;
    authorize(
        actor.as_ref(),
        Action::DeleteSubmission {
            owner_id: submission.owner_id,
        },
    )?;

    if !storage.delete_submission(submission_id).await? {
        return Err(AppError::not_found("Submission not found").into());
    }

    tracing::info!(
        "Submission {} deleted by user {:?}",
        submission_id,
        actor.map(|a| a.id)
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Submission deleted successfully")))
}

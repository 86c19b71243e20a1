use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{SubmissionService, load_submission};
use crate::errors::AppError;
use crate::middlewares::RequireJWT;
use crate::models::ApiResponse;
use crate::policy::{Action, authorize};

pub async fn analyze_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let actor = RequireJWT::extract_actor(request);

    let mut submission = load_submission(&storage, submission_id).await?;
    authorize(
        actor.as_ref(),
        Action::AnalyzeSubmission {
            owner_id: submission.owner_id,
        },
    )?;

    // 分析失败时提交保持原样
    let result = service
        .get_analyzer(request)
        .analyze(submission.language, &submission.code)
        .await
        .map_err(|e| {
            tracing::warn!("Analysis of submission {} failed: {}", submission_id, e);
            e
        })?;

    submission.complete_analysis(result, chrono::Utc::now());
    if !storage.save_submission_analysis(&submission).await? {
        return Err(AppError::not_found("Submission not found").into());
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        submission,
        "Analysis completed successfully",
    )))
}

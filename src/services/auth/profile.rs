use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::cache::user_cache_key;
use crate::errors::AppError;
use crate::middlewares::RequireJWT;
use crate::models::auth::requests::UpdateProfileRequest;
use crate::models::auth::responses::UserInfoResponse;
use crate::models::users::requests::UserUpdate;
use crate::models::users::responses::UserResponse;
use crate::models::ApiResponse;
use crate::utils::validate::{FieldErrors, validate_email, validate_username};

use super::{AuthService, ensure_account_available, normalize_email};

pub async fn handle_get_user(
    _service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = RequireJWT::extract_user_claims(request)
        .ok_or_else(|| AppError::authentication("Not authenticated"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserInfoResponse { user },
        "User information retrieved successfully",
    )))
}

pub async fn handle_update_profile(
    service: &AuthService,
    update_data: UpdateProfileRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let current_user_id = RequireJWT::extract_user_id(request)
        .ok_or_else(|| AppError::authentication("Not authenticated"))?;

    let username = update_data.username.map(|u| u.trim().to_string());
    let email = update_data.email.as_deref().map(normalize_email);

    let mut errors = FieldErrors::new();
    if let Some(ref username) = username
        && let Err(msg) = validate_username(username)
    {
        errors.push("username", msg);
    }
    if let Some(ref email) = email
        && let Err(msg) = validate_email(email)
    {
        errors.push("email", msg);
    }
    errors.into_result()?;

    ensure_account_available(
        &storage,
        username.as_deref(),
        email.as_deref(),
        Some(current_user_id),
    )
    .await?;

    let user = storage
        .update_user(
            current_user_id,
            UserUpdate {
                username,
                email,
                password_hash: None,
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    service
        .get_cache(request)
        .remove(&user_cache_key(current_user_id))
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserResponse { user },
        "Profile updated successfully",
    )))
}

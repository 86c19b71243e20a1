use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::cache::user_cache_key;
use crate::errors::AppError;
use crate::middlewares::RequireJWT;
use crate::models::auth::requests::ChangePasswordRequest;
use crate::models::users::requests::UserUpdate;
use crate::models::ApiResponse;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validate::{FieldErrors, validate_password};

use super::AuthService;

pub async fn handle_change_password(
    service: &AuthService,
    password_request: ChangePasswordRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let current_user_id = RequireJWT::extract_user_id(request)
        .ok_or_else(|| AppError::authentication("Not authenticated"))?;

    let mut errors = FieldErrors::new();
    if password_request.current_password.is_empty() {
        errors.push("currentPassword", "Current password is required");
    }
    let policy = validate_password(&password_request.new_password);
    if !policy.is_valid {
        errors.push("newPassword", policy.error_message());
    }
    errors.into_result()?;

    // 缓存中的用户不含密码哈希，需从存储读取
    let user = storage
        .get_user_by_id(current_user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !verify_password(&password_request.current_password, &user.password_hash) {
        return Err(AppError::wrong_password("Current password is incorrect").into());
    }

    let password_hash = hash_password(&password_request.new_password)?;
    storage
        .update_user(
            current_user_id,
            UserUpdate {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    service
        .get_cache(request)
        .remove(&user_cache_key(current_user_id))
        .await;

    tracing::info!("User {} changed password", user.username);

    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Password changed successfully")))
}

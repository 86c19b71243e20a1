use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use once_cell::sync::Lazy;

use crate::cache::user_cache_key;
use crate::errors::AppError;
use crate::models::{ApiResponse, auth::requests::LoginRequest, users::entities::User};
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validate::FieldErrors;

use super::{AuthService, issue_token, normalize_email};

/// 邮箱不存在时用于比对的哈希，与真实用户使用相同的 Argon2 参数
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("dummy-password-for-timing").ok());

/// 校验凭据；用户不存在时仍执行一次哈希比对，两种失败耗时一致
fn check_credentials(user: Option<User>, password: &str) -> Option<User> {
    match user {
        Some(user) => verify_password(password, &user.password_hash).then_some(user),
        None => {
            if let Some(hash) = DUMMY_HASH.as_deref() {
                verify_password(password, hash);
            }
            None
        }
    }
}

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let email = normalize_email(&login_request.email);
    let mut errors = FieldErrors::new();
    if email.is_empty() {
        errors.push("email", "Email is required");
    }
    if login_request.password.is_empty() {
        errors.push("password", "Password is required");
    }
    errors.into_result()?;

    // 1. 查找用户并验证密码，两种失败不作区分
    let user = check_credentials(
        storage.get_user_by_email(&email).await?,
        &login_request.password,
    )
    .ok_or_else(|| AppError::invalid_credentials("Invalid email or password"))?;

    // 2. 更新最后活跃时间
    if let Err(e) = storage.update_last_active(user.id).await {
        tracing::warn!("Failed to update last active time for {}: {}", user.id, e);
    }
    service.get_cache(request).remove(&user_cache_key(user.id)).await;

    let user = storage.get_user_by_id(user.id).await?.unwrap_or(user);

    // 3. 签发令牌
    tracing::info!("User {} logged in successfully", user.username);
    let response = issue_token(user)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Login successful")))
}

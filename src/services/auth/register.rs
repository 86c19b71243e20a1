use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::errors::AppError;
use crate::models::{
    ApiResponse,
    auth::requests::RegisterRequest,
    users::{entities::UserRole, requests::NewUser},
};
use crate::utils::password::hash_password;
use crate::utils::validate::validate_account;

use super::{AuthService, ensure_account_available, issue_token, normalize_email};

pub async fn handle_register(
    service: &AuthService,
    register_request: RegisterRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let config = service.get_config();

    let username = register_request.username.trim().to_string();
    let email = normalize_email(&register_request.email);

    // 1. 校验字段
    validate_account(&username, &email, &register_request.password)?;

    // 2. 自助注册教师账号受配置控制
    let role = register_request.role.unwrap_or(UserRole::Student);
    if role == UserRole::Teacher && !config.auth.allow_teacher_registration {
        return Err(AppError::authorization("Teacher accounts cannot be self-registered").into());
    }

    // 3. 唯一性检查，用户名优先
    ensure_account_available(&storage, Some(&username), Some(&email), None).await?;

    // 4. 创建用户
    let password_hash = hash_password(&register_request.password)?;
    let user = storage
        .create_user(NewUser {
            username,
            email,
            password_hash,
            role,
        })
        .await?;

    tracing::info!("User {} registered as {}", user.username, user.role);

    let response = issue_token(user)?;
    Ok(HttpResponse::Created().json(ApiResponse::success(response, "Registration successful")))
}

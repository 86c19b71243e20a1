use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AdminService, require_admin};
use crate::cache::user_cache_key;
use crate::errors::AppError;
use crate::middlewares::RequireJWT;
use crate::models::ApiResponse;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{CreateUserRequest, NewUser};
use crate::models::users::responses::UserResponse;
use crate::policy::{Action, AdminAction, authorize};
use crate::services::auth::{ensure_account_available, normalize_email};
use crate::utils::password::hash_password;
use crate::utils::validate::validate_account;

pub async fn create_user(
    service: &AdminService,
    request: &HttpRequest,
    create_request: CreateUserRequest,
) -> ActixResult<HttpResponse> {
    let teacher = require_admin(request, AdminAction::CreateUser)?;
    let storage = service.get_storage(request);

    let username = create_request.username.trim().to_string();
    let email = normalize_email(&create_request.email);
    validate_account(&username, &email, &create_request.password)?;
    ensure_account_available(&storage, Some(&username), Some(&email), None).await?;

    // 教师只能创建学生账号
    let user = storage
        .create_user(NewUser {
            username,
            email,
            password_hash: hash_password(&create_request.password)?,
            role: UserRole::Student,
        })
        .await?;

    tracing::info!("Teacher {} created student {}", teacher.id, user.username);

    Ok(HttpResponse::Created().json(ApiResponse::success(
        UserResponse { user },
        "Student created successfully",
    )))
}

pub async fn delete_user(
    service: &AdminService,
    request: &HttpRequest,
    user_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let actor = RequireJWT::extract_actor(request);

    let target = storage
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    authorize(
        actor.as_ref(),
        Action::DeleteUser {
            target_role: target.role,
        },
    )?;

    // 同一事务内删除其全部提交
    if !storage.delete_user_cascade(user_id).await? {
        return Err(AppError::not_found("User not found").into());
    }
    service.get_cache(request).remove(&user_cache_key(user_id)).await;

    tracing::info!(
        "User {} ({}) deleted by teacher {:?}",
        target.id,
        target.username,
        actor.map(|a| a.id)
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("User deleted successfully")))
}

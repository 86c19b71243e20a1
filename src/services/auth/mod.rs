pub mod login;
pub mod password;
pub mod profile;
pub mod register;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::auth::requests::{
    ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
};
use crate::models::auth::responses::LoginResponse;
use crate::models::users::entities::User;
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;

pub struct AuthService {
    storage: Option<Arc<dyn Storage>>,
}

impl AuthService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn get_cache(&self, request: &HttpRequest) -> Arc<dyn ObjectCache> {
        request
            .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
            .expect("Cache not found in app data")
            .get_ref()
            .clone()
    }

    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    // 用户注册
    pub async fn register(
        &self,
        register_request: RegisterRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        register::handle_register(self, register_request, request).await
    }

    // 登录验证
    pub async fn login(
        &self,
        login_request: LoginRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        login::handle_login(self, login_request, request).await
    }

    // 获取当前用户信息
    pub async fn get_user(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        profile::handle_get_user(self, request).await
    }

    // 更新用户资料
    pub async fn update_profile(
        &self,
        update_request: UpdateProfileRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        profile::handle_update_profile(self, update_request, request).await
    }

    // 修改密码
    pub async fn change_password(
        &self,
        password_request: ChangePasswordRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        password::handle_change_password(self, password_request, request).await
    }
}

/// 检查用户名与邮箱是否可用，用户名优先报告
///
/// `exclude_id` 为当前用户时，不与自己冲突。
pub(crate) async fn ensure_account_available(
    storage: &Arc<dyn Storage>,
    username: Option<&str>,
    email: Option<&str>,
    exclude_id: Option<i64>,
) -> Result<()> {
    let is_other = |user: &User| Some(user.id) != exclude_id;

    if let Some(username) = username
        && let Some(existing) = storage.get_user_by_username(username).await?
        && is_other(&existing)
    {
        return Err(AppError::username_taken("Username is already taken"));
    }

    if let Some(email) = email
        && let Some(existing) = storage.get_user_by_email(email).await?
        && is_other(&existing)
    {
        return Err(AppError::email_exists("Email already exists"));
    }

    Ok(())
}

/// 邮箱统一按小写存储和比较
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 为用户签发访问令牌
pub(crate) fn issue_token(user: User) -> Result<LoginResponse> {
    let access_token = user.generate_access_token().map_err(|e| {
        tracing::error!("Failed to generate JWT token: {}", e);
        AppError::internal("Unable to generate token")
    })?;

    Ok(LoginResponse {
        access_token,
        expires_in: JwtUtils::access_token_expires_in(),
        user,
    })
}

/*!
 * 基于角色的访问控制中间件
 *
 * 此中间件必须在 RequireJWT 中间件之后使用，用于验证用户是否具有特定角色权限。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * use actix_web::{web, App};
 * use crate::middlewares::{RequireJWT, RequireRole};
 * use crate::models::users::entities::UserRole;
 *
 * App::new().service(
 *     web::scope("/api/admin")
 *         .wrap(RequireRole::new(&UserRole::Teacher)) // 后验证角色
 *         .wrap(RequireJWT)                           // 先验证JWT
 *         .route("/dashboard", web::get().to(dashboard)),
 * );
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::errors::AppError;
use crate::models::users::entities::{User, UserRole};

#[derive(Clone)]
pub struct RequireRole {
    required_role: UserRole,
}

impl RequireRole {
    /// 创建需要特定角色的中间件
    pub fn new(role: &UserRole) -> Self {
        Self {
            required_role: *role,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            required_role: self.required_role,
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    required_role: UserRole,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let required_role = self.required_role;

        Box::pin(async move {
            let user = req.extensions().get::<User>().map(|u| (u.id, u.role));

            match user {
                Some((_, role)) if role == required_role => {
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Some((user_id, role)) => {
                    info!(
                        "Access denied for user {} (role: {}). Required role: {}",
                        user_id, role, required_role
                    );
                    let response =
                        AppError::authorization("Not authorized to perform this action")
                            .error_response();
                    Ok(req.into_response(response.map_into_right_body()))
                }
                None => {
                    info!(
                        "Role check failed: no user in request. Make sure RequireJWT is applied first."
                    );
                    let response = AppError::authentication("Not authenticated").error_response();
                    Ok(req.into_response(response.map_into_right_body()))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    fn stub_user(role: UserRole) -> User {
        User {
            id: 7,
            username: "someone".into(),
            email: "someone@example.com".into(),
            password_hash: String::new(),
            role,
            last_active: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[actix_web::test]
    async fn test_only_required_role_passes() {
        let app = test::init_service(
            App::new().service(
                web::resource("/teachers-only")
                    .wrap(RequireRole::new(&UserRole::Teacher))
                    .to(HttpResponse::Ok),
            ),
        )
        .await;

        let cases = [
            (Some(UserRole::Teacher), StatusCode::OK),
            (Some(UserRole::Student), StatusCode::FORBIDDEN),
            (None, StatusCode::UNAUTHORIZED),
        ];
        for (role, expected) in cases {
            let req = test::TestRequest::get().uri("/teachers-only").to_request();
            if let Some(role) = role {
                req.extensions_mut().insert(stub_user(role));
            }
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);
        }
    }
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::submissions::requests::{FeedbackRequest, SubmissionListParams};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{CreateUserRequest, StudentListParams};
use crate::services::AdminService;
use crate::utils::SafeIDI64;

// 懒加载的全局 AdminService 实例
static ADMIN_SERVICE: Lazy<AdminService> = Lazy::new(AdminService::new_lazy);

pub async fn dashboard(req: HttpRequest) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.dashboard(&req).await
}

pub async fn list_students(
    req: HttpRequest,
    query: web::Query<StudentListParams>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.list_students(&req, query.into_inner()).await
}

pub async fn list_student_codes(
    req: HttpRequest,
    id: SafeIDI64,
    query: web::Query<SubmissionListParams>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE
        .list_student_codes(&req, id.0, query.into_inner())
        .await
}

pub async fn list_codes(
    req: HttpRequest,
    query: web::Query<SubmissionListParams>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.list_codes(&req, query.into_inner()).await
}

pub async fn give_feedback(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<FeedbackRequest>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE
        .give_feedback(&req, id.0, body.into_inner())
        .await
}

pub async fn create_user(
    req: HttpRequest,
    body: web::Json<CreateUserRequest>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.create_user(&req, body.into_inner()).await
}

pub async fn delete_user(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.delete_user(&req, id.0).await
}

// 配置路由
pub fn configure_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin")
            .wrap(middlewares::RequireRole::new(&UserRole::Teacher)) // 后验证角色
            .wrap(middlewares::RequireJWT) // 先验证JWT
            .route("/dashboard", web::get().to(dashboard))
            .route("/students", web::get().to(list_students))
            .route("/students/{id}/codes", web::get().to(list_student_codes))
            .route("/codes", web::get().to(list_codes))
            .route("/codes/{id}/feedback", web::post().to(give_feedback))
            .route("/users", web::post().to(create_user))
            .route("/users/{id}", web::delete().to(delete_user)),
    );
}

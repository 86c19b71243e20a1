use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::submissions::requests::{
    CreateSubmissionRequest, SubmissionListParams, UpdateSubmissionRequest,
};
use crate::services::SubmissionService;
use crate::utils::SafeIDI64;

// 懒加载的全局 SubmissionService 实例
static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);

// 创建提交
pub async fn create_submission(
    req: HttpRequest,
    body: web::Json<CreateSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .create_submission(&req, body.into_inner())
        .await
}

// 列出自己的提交
pub async fn list_submissions(
    req: HttpRequest,
    query: web::Query<SubmissionListParams>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .list_submissions(&req, query.into_inner())
        .await
}

// 获取提交详情
pub async fn get_submission(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.get_submission(&req, id.0).await
}

// 修改提交
pub async fn update_submission(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<UpdateSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .update_submission(&req, id.0, body.into_inner())
        .await
}

// 删除提交
pub async fn delete_submission(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.delete_submission(&req, id.0).await
}

// 请求 AI 分析
pub async fn analyze_submission(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.analyze_submission(&req, id.0).await
}

// 配置路由
pub fn configure_code_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/code")
            .wrap(middlewares::RequireJWT)
            .route("", web::post().to(create_submission))
            .route("", web::get().to(list_submissions))
            .route("/{id}", web::get().to(get_submission))
            .route("/{id}", web::put().to(update_submission))
            .route("/{id}", web::delete().to(delete_submission))
            .route("/{id}/analyze", web::post().to(analyze_submission)),
    );
}

pub mod analyze;
pub mod create;
pub mod delete;
pub mod detail;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{AppError, Result};
use crate::models::submissions::entities::Submission;
use crate::models::submissions::requests::{
    CreateSubmissionRequest, SubmissionListParams, UpdateSubmissionRequest,
};
use crate::services::analyzer::CodeAnalyzer;
use crate::storage::Storage;

pub use list::build_list_query;

pub struct SubmissionService {
    storage: Option<Arc<dyn Storage>>,
}

impl SubmissionService {
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

    pub(crate) fn get_analyzer(&self, request: &HttpRequest) -> Arc<dyn CodeAnalyzer> {
        request
            .app_data::<actix_web::web::Data<Arc<dyn CodeAnalyzer>>>()
            .expect("Analyzer not found in app data")
            .get_ref()
            .clone()
    }

    // 创建提交
    pub async fn create_submission(
        &self,
        request: &HttpRequest,
        create_request: CreateSubmissionRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_submission(self, request, create_request).await
    }

    // 列出自己的提交
    pub async fn list_submissions(
        &self,
        request: &HttpRequest,
        params: SubmissionListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_submissions(self, request, params).await
    }

    // 获取提交详情
    pub async fn get_submission(
        &self,
        request: &HttpRequest,
        submission_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_submission(self, request, submission_id).await
    }

    // 修改提交
    pub async fn update_submission(
        &self,
        request: &HttpRequest,
        submission_id: i64,
        update_request: UpdateSubmissionRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_submission(self, request, submission_id, update_request).await
    }

    // 删除提交
    pub async fn delete_submission(
        &self,
        request: &HttpRequest,
        submission_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::delete_submission(self, request, submission_id).await
    }

    // 请求 AI 分析
    pub async fn analyze_submission(
        &self,
        request: &HttpRequest,
        submission_id: i64,
    ) -> ActixResult<HttpResponse> {
        analyze::analyze_submission(self, request, submission_id).await
    }
}

/// 读取提交，不存在时返回 404
pub(crate) async fn load_submission(
    storage: &Arc<dyn Storage>,
    submission_id: i64,
) -> Result<Submission> {
    storage
        .get_submission_by_id(submission_id)
        .await?
        .ok_or_else(|| AppError::not_found("Submission not found"))
}

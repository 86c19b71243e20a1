pub mod aggregate;
pub mod codes;
pub mod dashboard;
pub mod feedback;
pub mod students;
pub mod users;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::errors::{AppError, Result};
use crate::middlewares::RequireJWT;
use crate::models::submissions::entities::Submission;
use crate::models::submissions::requests::{FeedbackRequest, SubmissionListParams};
use crate::models::submissions::responses::{SubmissionOwner, SubmissionWithOwner};
use crate::models::users::requests::{CreateUserRequest, StudentListParams};
use crate::policy::{Action, AdminAction, Actor, authorize};
use crate::storage::Storage;

pub struct AdminService {
    storage: Option<Arc<dyn Storage>>,
}

impl AdminService {
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

    // 仪表盘统计
    pub async fn dashboard(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        dashboard::get_dashboard(self, request).await
    }

    // 学生列表
    pub async fn list_students(
        &self,
        request: &HttpRequest,
        params: StudentListParams,
    ) -> ActixResult<HttpResponse> {
        students::list_students(self, request, params).await
    }

    // 某学生的提交
    pub async fn list_student_codes(
        &self,
        request: &HttpRequest,
        student_id: i64,
        params: SubmissionListParams,
    ) -> ActixResult<HttpResponse> {
        students::list_student_codes(self, request, student_id, params).await
    }

    // 全部提交
    pub async fn list_codes(
        &self,
        request: &HttpRequest,
        params: SubmissionListParams,
    ) -> ActixResult<HttpResponse> {
        codes::list_codes(self, request, params).await
    }

    // 教师反馈
    pub async fn give_feedback(
        &self,
        request: &HttpRequest,
        submission_id: i64,
        feedback_request: FeedbackRequest,
    ) -> ActixResult<HttpResponse> {
        feedback::give_feedback(self, request, submission_id, feedback_request).await
    }

    // 创建学生账号
    pub async fn create_user(
        &self,
        request: &HttpRequest,
        create_request: CreateUserRequest,
    ) -> ActixResult<HttpResponse> {
        users::create_user(self, request, create_request).await
    }

    // 删除学生账号
    pub async fn delete_user(
        &self,
        request: &HttpRequest,
        user_id: i64,
    ) -> ActixResult<HttpResponse> {
        users::delete_user(self, request, user_id).await
    }
}

/// 取出操作者并校验教师管理权限
pub(crate) fn require_admin(request: &HttpRequest, action: AdminAction) -> Result<Actor> {
    let actor = RequireJWT::extract_actor(request);
    authorize(actor.as_ref(), Action::Admin(action))?;
    actor.ok_or_else(|| AppError::authentication("Not authenticated"))
}

/// 批量补齐提交者信息，已删除的用户为 None
pub(crate) async fn attach_owners(
    storage: &Arc<dyn Storage>,
    submissions: Vec<Submission>,
) -> Result<Vec<SubmissionWithOwner>> {
    let mut owner_ids: Vec<i64> = submissions.iter().map(|s| s.owner_id).collect();
    owner_ids.sort_unstable();
    owner_ids.dedup();

    let owners: HashMap<i64, SubmissionOwner> = storage
        .get_users_by_ids(&owner_ids)
        .await?
        .iter()
        .map(|user| (user.id, SubmissionOwner::from(user)))
        .collect();

    Ok(submissions
        .into_iter()
        .map(|submission| SubmissionWithOwner {
            owner: owners.get(&submission.owner_id).cloned(),
            submission,
        })
        .collect())
}

use serde::Serialize;
use ts_rs::TS;

use super::entities::Submission;
use crate::models::PaginationInfo;
use crate::models::users::entities::User;

/// 提交者信息
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionOwner {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<&User> for SubmissionOwner {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// 附带提交者信息的提交（教师视图）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionWithOwner {
    #[serde(flatten)]
    #[ts(flatten)]
    pub submission: Submission,
    pub owner: Option<SubmissionOwner>,
}

/// 提交列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionListResponse {
    pub items: Vec<Submission>,
    pub pagination: PaginationInfo,
}

/// 教师视角的提交列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionWithOwnerListResponse {
    pub items: Vec<SubmissionWithOwner>,
    pub pagination: PaginationInfo,
}

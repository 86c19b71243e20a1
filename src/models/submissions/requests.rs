use super::entities::{Language, SubmissionStatus};
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 创建代码提交请求
//
// 字段均为可选，缺失与非法值统一在校验阶段以字段列表的形式报告。
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct CreateSubmissionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub code: Option<String>,
    pub tags: Option<Vec<String>>,
}

// 更新代码提交请求，未给出的字段保持原值
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct UpdateSubmissionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub code: Option<String>,
    pub tags: Option<Vec<String>>,
}

// 提交列表查询参数（来自HTTP请求）
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub language: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

// 教师反馈请求
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct FeedbackRequest {
    pub comment: Option<String>,
    pub grade: Option<f64>,
}

// 提交列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct SubmissionListQuery {
    pub page: u64,
    pub size: u64,
    /// 为空时列出所有学生的提交
    pub owner_id: Option<i64>,
    pub language: Option<Language>,
    pub status: Option<SubmissionStatus>,
    pub search: Option<String>,
}

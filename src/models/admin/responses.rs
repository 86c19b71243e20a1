use serde::Serialize;
use ts_rs::TS;

use crate::models::PaginationInfo;
use crate::models::submissions::entities::{Language, Submission, SubmissionStatus};
use crate::models::submissions::responses::SubmissionWithOwner;
use crate::models::users::entities::User;

/// 按语言统计的提交数
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/admin.ts")]
pub struct LanguageStat {
    pub language: Language,
    pub count: i64,
}

/// 按状态统计的提交数
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/admin.ts")]
pub struct StatusStat {
    pub status: SubmissionStatus,
    pub count: i64,
}

/// 分数统计，没有已评分提交时均为 0
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../frontend/src/types/generated/admin.ts")]
pub struct GradeStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub graded_count: i64,
}

/// 教师仪表盘
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../frontend/src/types/generated/admin.ts")]
pub struct DashboardResponse {
    pub total_students: i64,
    pub total_submissions: i64,
    pub active_today: i64,
    pub language_stats: Vec<LanguageStat>,
    pub status_stats: Vec<StatusStat>,
    pub grade_stats: GradeStats,
    pub recent_submissions: Vec<SubmissionWithOwner>,
}

/// 学生列表项
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../frontend/src/types/generated/admin.ts")]
pub struct StudentSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub last_active: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub submission_count: i64,
    pub last_submission_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// 学生列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/admin.ts")]
pub struct StudentListResponse {
    pub items: Vec<StudentSummary>,
    pub pagination: PaginationInfo,
}

/// 单个学生及其提交
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/admin.ts")]
pub struct StudentCodesResponse {
    pub student: User,
    pub items: Vec<Submission>,
    pub pagination: PaginationInfo,
}

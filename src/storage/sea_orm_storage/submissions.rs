//! 代码提交存储操作
//!
//! 每种状态迁移只写入它负责的列，并发修改按最后写入为准。

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::submissions::{ActiveModel, Column, Entity as Submissions};
use crate::errors::{AppError, Result};
use crate::models::{
    PaginationInfo,
    submissions::{
        entities::{
            Language, OwnerSubmissionStats, Submission, SubmissionContent, SubmissionFacet,
            SubmissionStatus,
        },
        requests::SubmissionListQuery,
        responses::SubmissionListResponse,
    },
};
use crate::utils::sql::{LIKE_ESCAPE, contains_pattern, search_text};
use sea_orm::sea_query::{Expr, ExprTrait, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

fn encode_tags(tags: &[String]) -> Result<String> {
    Ok(serde_json::to_string(tags)?)
}

fn submission_search_text(title: &str, description: Option<&str>) -> String {
    search_text([title, description.unwrap_or_default()])
}

impl SeaOrmStorage {
    /// 创建提交，初始状态为已提交
    pub async fn create_submission_impl(
        &self,
        owner_id: i64,
        content: SubmissionContent,
    ) -> Result<Submission> {
        let now = chrono::Utc::now().timestamp();
        let search = submission_search_text(&content.title, content.description.as_deref());

        let model = ActiveModel {
            owner_id: Set(owner_id),
            title: Set(content.title),
            description: Set(content.description),
            language: Set(content.language.to_string()),
            code: Set(content.code),
            tags: Set(encode_tags(&content.tags)?),
            search_text: Set(search),
            status: Set(SubmissionStatus::Submitted.to_string()),
            analysis_result: Set(None),
            analyzed_at: Set(None),
            feedback_teacher_id: Set(None),
            feedback_comment: Set(None),
            feedback_grade: Set(None),
            feedback_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to create submission: {e}")))?;

        Ok(result.into_submission())
    }

    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(&self, id: i64) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to query submission: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 列出提交（分页）
    pub async fn list_submissions_with_pagination_impl(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        let page = std::cmp::max(query.page, 1);
        let size = std::cmp::max(query.size, 1);

        let mut select = Submissions::find();

        // 提交者筛选
        if let Some(owner_id) = query.owner_id {
            select = select.filter(Column::OwnerId.eq(owner_id));
        }

        // 语言筛选
        if let Some(language) = query.language {
            select = select.filter(Column::Language.eq(language.as_str()));
        }

        // 状态筛选
        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.as_str()));
        }

        // 标题或描述中搜索，不区分大小写
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let pattern = contains_pattern(search.trim());
            select = select.filter(
                Expr::col((Submissions, Column::SearchText))
                    .like(LikeExpr::new(pattern).escape(LIKE_ESCAPE)),
            );
        }

        // 排序
        select = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        // 分页查询
        let paginator = select.paginate(&self.db, size);
        let total = paginator.num_items().await.map_err(|e| {
            AppError::database_operation(format!("Failed to count submissions: {e}"))
        })?;

        let submissions = paginator.fetch_page(page - 1).await.map_err(|e| {
            AppError::database_operation(format!("Failed to list submissions: {e}"))
        })?;

        Ok(SubmissionListResponse {
            items: submissions
                .into_iter()
                .map(|m| m.into_submission())
                .collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 保存内容修改
    pub async fn save_submission_edit_impl(&self, submission: &Submission) -> Result<bool> {
        let result = Submissions::update_many()
            .col_expr(Column::Title, Expr::value(submission.title.clone()))
            .col_expr(
                Column::Description,
                Expr::value(submission.description.clone()),
            )
            .col_expr(Column::Language, Expr::value(submission.language.as_str()))
            .col_expr(Column::Code, Expr::value(submission.code.clone()))
            .col_expr(Column::Tags, Expr::value(encode_tags(&submission.tags)?))
            .col_expr(
                Column::SearchText,
                Expr::value(submission_search_text(
                    &submission.title,
                    submission.description.as_deref(),
                )),
            )
            .col_expr(Column::Status, Expr::value(submission.status.as_str()))
            .col_expr(
                Column::AnalysisResult,
                Expr::value(submission.analysis.as_ref().map(|a| a.result.clone())),
            )
            .col_expr(
                Column::AnalyzedAt,
                Expr::value(submission.analysis.as_ref().map(|a| a.analyzed_at.timestamp())),
            )
            .col_expr(
                Column::UpdatedAt,
                Expr::value(submission.updated_at.timestamp()),
            )
            .filter(Column::Id.eq(submission.id))
            .exec(&self.db)
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to update submission: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 保存分析结果
    pub async fn save_submission_analysis_impl(&self, submission: &Submission) -> Result<bool> {
        let result = Submissions::update_many()
            .col_expr(Column::Status, Expr::value(submission.status.as_str()))
            .col_expr(
                Column::AnalysisResult,
                Expr::value(submission.analysis.as_ref().map(|a| a.result.clone())),
            )
            .col_expr(
                Column::AnalyzedAt,
                Expr::value(submission.analysis.as_ref().map(|a| a.analyzed_at.timestamp())),
            )
            .col_expr(
                Column::UpdatedAt,
                Expr::value(submission.updated_at.timestamp()),
            )
            .filter(Column::Id.eq(submission.id))
            .exec(&self.db)
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to save analysis: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 保存教师反馈
    pub async fn save_submission_feedback_impl(&self, submission: &Submission) -> Result<bool> {
        let feedback = submission.feedback.as_ref();

        let result = Submissions::update_many()
            .col_expr(Column::Status, Expr::value(submission.status.as_str()))
            .col_expr(
                Column::FeedbackTeacherId,
                Expr::value(feedback.map(|f| f.teacher_id)),
            )
            .col_expr(
                Column::FeedbackComment,
                Expr::value(feedback.map(|f| f.comment.clone())),
            )
            .col_expr(Column::FeedbackGrade, Expr::value(feedback.and_then(|f| f.grade)))
            .col_expr(
                Column::FeedbackAt,
                Expr::value(feedback.map(|f| f.feedback_at.timestamp())),
            )
            .col_expr(
                Column::UpdatedAt,
                Expr::value(submission.updated_at.timestamp()),
            )
            .filter(Column::Id.eq(submission.id))
            .exec(&self.db)
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to save feedback: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 删除提交
    pub async fn delete_submission_impl(&self, id: i64) -> Result<bool> {
        let result = Submissions::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to delete submission: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 删除某用户的全部提交
    pub async fn delete_submissions_by_owner_impl(&self, owner_id: i64) -> Result<u64> {
        let result = Submissions::delete_many()
            .filter(Column::OwnerId.eq(owner_id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                AppError::database_operation(format!("Failed to delete submissions: {e}"))
            })?;

        Ok(result.rows_affected)
    }

    /// 最近的提交
    pub async fn list_recent_submissions_impl(&self, limit: u64) -> Result<Vec<Submission>> {
        let results = Submissions::find()
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| {
                AppError::database_operation(format!("Failed to query recent submissions: {e}"))
            })?;

        Ok(results.into_iter().map(|m| m.into_submission()).collect())
    }

    /// 只取统计所需的列
    pub async fn list_submission_facets_impl(&self) -> Result<Vec<SubmissionFacet>> {
        let rows = Submissions::find()
            .select_only()
            .column(Column::Language)
            .column(Column::Status)
            .column(Column::FeedbackGrade)
            .into_tuple::<(String, String, Option<f64>)>()
            .all(&self.db)
            .await
            .map_err(|e| {
                AppError::database_operation(format!("Failed to query submission stats: {e}"))
            })?;

        Ok(rows
            .into_iter()
            .filter_map(|(language, status, grade)| {
                Some(SubmissionFacet {
                    language: language.parse::<Language>().ok()?,
                    status: status.parse::<SubmissionStatus>().ok()?,
                    grade,
                })
            })
            .collect())
    }

    /// 按学生分组统计提交数与最近提交时间
    pub async fn submission_stats_by_owner_impl(
        &self,
        owner_ids: &[i64],
    ) -> Result<HashMap<i64, OwnerSubmissionStats>> {
        if owner_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = Submissions::find()
            .select_only()
            .column(Column::OwnerId)
            .column_as(Expr::from(Func::count(Expr::col(Column::Id))), "submission_count")
            .column_as(Expr::from(Func::max(Expr::col(Column::CreatedAt))), "last_submission_at")
            .filter(Column::OwnerId.is_in(owner_ids.iter().copied()))
            .group_by(Column::OwnerId)
            .into_tuple::<(i64, i64, Option<i64>)>()
            .all(&self.db)
            .await
            .map_err(|e| {
                AppError::database_operation(format!("Failed to query student stats: {e}"))
            })?;

        Ok(rows
            .into_iter()
            .map(|(owner_id, count, last)| {
                (
                    owner_id,
                    OwnerSubmissionStats {
                        count,
                        last_submission_at: last
                            .and_then(|ts| chrono::DateTime::<chrono::Utc>::from_timestamp(ts, 0)),
                    },
                )
            })
            .collect())
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{
    submissions::{
        entities::{OwnerSubmissionStats, Submission, SubmissionContent, SubmissionFacet},
        requests::SubmissionListQuery,
        responses::SubmissionListResponse,
    },
    users::{
        entities::{User, UserRole},
        requests::{NewUser, StudentListQuery, UserUpdate},
        responses::UserListResponse,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户
    async fn create_user(&self, user: NewUser) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 批量获取用户信息
    async fn get_users_by_ids(&self, ids: &[i64]) -> Result<Vec<User>>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>>;
    // 更新用户最后活跃时间
    async fn update_last_active(&self, id: i64) -> Result<bool>;
    // 删除用户及其全部提交（同一事务）
    async fn delete_user_cascade(&self, id: i64) -> Result<bool>;
    // 按角色统计用户数
    async fn count_users_by_role(&self, role: UserRole) -> Result<u64>;
    // 统计某时刻之后活跃过的用户数
    async fn count_users_active_since(
        &self,
        role: UserRole,
        since: chrono::DateTime<chrono::Utc>,
    ) -> Result<u64>;
    // 分页列出学生，按最后活跃时间倒序
    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<UserListResponse>;

    /// 代码提交管理方法
    // 创建提交
    async fn create_submission(
        &self,
        owner_id: i64,
        content: SubmissionContent,
    ) -> Result<Submission>;
    // 通过ID获取提交
    async fn get_submission_by_id(&self, id: i64) -> Result<Option<Submission>>;
    // 分页列出提交，按创建时间倒序
    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse>;
    // 保存内容修改（内容、状态、清除分析）
    async fn save_submission_edit(&self, submission: &Submission) -> Result<bool>;
    // 保存分析结果（分析、状态）
    async fn save_submission_analysis(&self, submission: &Submission) -> Result<bool>;
    // 保存教师反馈（反馈、状态）
    async fn save_submission_feedback(&self, submission: &Submission) -> Result<bool>;
    // 删除提交
    async fn delete_submission(&self, id: i64) -> Result<bool>;
    // 删除某用户的全部提交
    async fn delete_submissions_by_owner(&self, owner_id: i64) -> Result<u64>;
    // 最近的 N 条提交
    async fn list_recent_submissions(&self, limit: u64) -> Result<Vec<Submission>>;
    // 全部提交的统计摘要
    async fn list_submission_facets(&self) -> Result<Vec<SubmissionFacet>>;
    // 指定学生的提交数与最近提交时间
    async fn submission_stats_by_owner(
        &self,
        owner_ids: &[i64],
    ) -> Result<HashMap<i64, OwnerSubmissionStats>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}

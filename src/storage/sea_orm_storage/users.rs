use super::SeaOrmStorage;
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{AppError, Result};
use crate::models::{
    PaginationInfo,
    users::{
        entities::{User, UserRole},
        requests::{NewUser, StudentListQuery, UserUpdate},
        responses::UserListResponse,
    },
};
use crate::utils::sql::{LIKE_ESCAPE, contains_pattern, search_text};
use sea_orm::sea_query::{Expr, ExprTrait, LikeExpr, NullOrdering};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, SqlErr, TransactionTrait,
};

/// 写入用户时的错误映射
///
/// 唯一约束冲突转换为用户名或邮箱冲突，与写入前的检查结果一致。
fn map_user_write_error(err: DbErr, action: &str) -> AppError {
    if let Some(SqlErr::UniqueConstraintViolation(message)) = err.sql_err() {
        match conflicting_column(&message) {
            Some(UniqueColumn::Username) => {
                return AppError::username_taken("Username is already taken");
            }
            Some(UniqueColumn::Email) => return AppError::email_exists("Email already exists"),
            None => {}
        }
    }
    AppError::database_operation(format!("Failed to {action}: {err}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UniqueColumn {
    Username,
    Email,
}

/// 从驱动的错误信息中找出冲突的列
///
/// 约束名或列名出现在信息末尾（SQLite `users.email`、PostgreSQL `users_email_key`、
/// MySQL `for key 'users.email'`），取最后出现的那个，避免被冲突值本身误导。
fn conflicting_column(message: &str) -> Option<UniqueColumn> {
    match (message.rfind("username"), message.rfind("email")) {
        (Some(u), Some(e)) if u > e => Some(UniqueColumn::Username),
        (Some(_), Some(_)) | (None, Some(_)) => Some(UniqueColumn::Email),
        (Some(_), None) => Some(UniqueColumn::Username),
        (None, None) => None,
    }
}

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(&self, req: NewUser) -> Result<User> {
        let now = chrono::Utc::now().timestamp();
        let search = search_text([req.username.as_str(), req.email.as_str()]);

        let model = ActiveModel {
            search_text: Set(search),
            username: Set(req.username),
            email: Set(req.email),
            password_hash: Set(req.password_hash),
            role: Set(req.role.to_string()),
            last_active: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| map_user_write_error(e, "create user"))?;

        Ok(result.into_user())
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to query user: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过用户名获取用户
    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to query user: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过邮箱获取用户
    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to query user: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 批量获取用户
    pub async fn get_users_by_ids_impl(&self, ids: &[i64]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let results = Users::find()
            .filter(Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to query users: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_user()).collect())
    }

    /// 分页列出学生
    pub async fn list_students_with_pagination_impl(
        &self,
        query: StudentListQuery,
    ) -> Result<UserListResponse> {
        let page = std::cmp::max(query.page, 1);
        let size = std::cmp::max(query.size, 1);

        let mut select = Users::find().filter(Column::Role.eq(UserRole::STUDENT));

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let pattern = contains_pattern(search.trim());
            select = select.filter(
                Expr::col((Users, Column::SearchText))
                    .like(LikeExpr::new(pattern).escape(LIKE_ESCAPE)),
            );
        }

        // 最近活跃的排在前面，从未登录的排在最后
        select = select
            .order_by_with_nulls(Column::LastActive, sea_orm::Order::Desc, NullOrdering::Last)
            .order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to count students: {e}")))?;

        let users = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to list students: {e}")))?;

        Ok(UserListResponse {
            items: users.into_iter().map(|m| m.into_user()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 更新用户最后活跃时间
    pub async fn update_last_active_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastActive, Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                AppError::database_operation(format!("Failed to update last active time: {e}"))
            })?;

        Ok(result.rows_affected > 0)
    }

    /// 更新用户信息
    pub async fn update_user_impl(&self, id: i64, update: UserUpdate) -> Result<Option<User>> {
        // 先检查用户是否存在
        let Some(current) = self.get_user_by_id_impl(id).await? else {
            return Ok(None);
        };

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(now),
            ..Default::default()
        };

        if update.username.is_some() || update.email.is_some() {
            let username = update.username.as_deref().unwrap_or(&current.username);
            let email = update.email.as_deref().unwrap_or(&current.email);
            model.search_text = Set(search_text([username, email]));
        }

        if let Some(username) = update.username {
            model.username = Set(username);
        }

        if let Some(email) = update.email {
            model.email = Set(email);
        }

        if let Some(password_hash) = update.password_hash {
            model.password_hash = Set(password_hash);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| map_user_write_error(e, "update user"))?;

        self.get_user_by_id_impl(id).await
    }

    /// 删除用户及其全部提交
    pub async fn delete_user_cascade_impl(&self, id: i64) -> Result<bool> {
        let txn = self.db.begin().await?;

        Submissions::delete_many()
            .filter(SubmissionColumn::OwnerId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| {
                AppError::database_operation(format!("Failed to delete user submissions: {e}"))
            })?;

        let result = Users::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to delete user: {e}")))?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    /// 按角色统计用户数量
    pub async fn count_users_by_role_impl(&self, role: UserRole) -> Result<u64> {
        let count = Users::find()
            .filter(Column::Role.eq(role.to_string()))
            .count(&self.db)
            .await
            .map_err(|e| AppError::database_operation(format!("Failed to count users: {e}")))?;

        Ok(count)
    }

    /// 统计某时刻之后活跃过的用户数量
    pub async fn count_users_active_since_impl(
        &self,
        role: UserRole,
        since: chrono::DateTime<chrono::Utc>,
    ) -> Result<u64> {
        let count = Users::find()
            .filter(Column::Role.eq(role.to_string()))
            .filter(Column::LastActive.gte(since.timestamp()))
            .count(&self.db)
            .await
            .map_err(|e| {
                AppError::database_operation(format!("Failed to count active users: {e}"))
            })?;

        Ok(count)
    }
}

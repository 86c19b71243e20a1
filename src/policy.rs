//! 访问控制策略
//!
//! 纯函数：给定操作者与动作，判定允许或拒绝（附带原因），不触碰存储。
//! 路由层的 `RequireJWT` / `RequireRole` 负责身份解析，业务层在修改数据前调用这里。

use crate::errors::AppError;
use crate::models::users::entities::{User, UserRole};

/// 已认证的操作者
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: UserRole,
}

impl Actor {
    pub fn is_teacher(&self) -> bool {
        self.role == UserRole::Teacher
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }
}

/// 教师管理类动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Dashboard,
    ListStudents,
    StudentDetail,
    ListSubmissions,
    Feedback,
    CreateUser,
}

/// 受控动作，携带判定所需的资源属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Admin(AdminAction),
    DeleteUser { target_role: UserRole },
    CreateSubmission,
    ReadSubmission { owner_id: i64 },
    UpdateSubmission { owner_id: i64 },
    DeleteSubmission { owner_id: i64 },
    AnalyzeSubmission { owner_id: i64 },
}

/// 拒绝原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAuthenticated,
    NotAuthorized,
    /// 目标账号是教师，不能通过账号管理删除
    ProtectedAccount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// 转换为错误，拒绝原因决定 HTTP 状态
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::NotAuthenticated) => {
                Err(AppError::authentication("Not authenticated"))
            }
            Decision::Deny(DenyReason::NotAuthorized) => {
                Err(AppError::authorization("Not authorized to perform this action"))
            }
            Decision::Deny(DenyReason::ProtectedAccount) => {
                Err(AppError::authorization("Teacher accounts cannot be deleted"))
            }
        }
    }
}

/// 判定操作者能否执行动作
pub fn can_perform(actor: Option<&Actor>, action: Action) -> Decision {
    let Some(actor) = actor else {
        return Decision::Deny(DenyReason::NotAuthenticated);
    };

    let allow_if = |cond: bool| {
        if cond {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::NotAuthorized)
        }
    };

    match action {
        Action::Admin(_) => allow_if(actor.is_teacher()),
        Action::DeleteUser { target_role } => {
            if !actor.is_teacher() {
                Decision::Deny(DenyReason::NotAuthorized)
            } else if target_role == UserRole::Teacher {
                Decision::Deny(DenyReason::ProtectedAccount)
            } else {
                Decision::Allow
            }
        }
        Action::CreateSubmission => Decision::Allow,
        Action::ReadSubmission { owner_id } | Action::DeleteSubmission { owner_id } => {
            allow_if(actor.id == owner_id || actor.is_teacher())
        }
        Action::UpdateSubmission { owner_id } | Action::AnalyzeSubmission { owner_id } => {
            allow_if(actor.id == owner_id)
        }
    }
}

/// `can_perform` 的便捷形式，直接返回错误
pub fn authorize(actor: Option<&Actor>, action: Action) -> Result<(), AppError> {
    can_perform(actor, action).into_result()
}

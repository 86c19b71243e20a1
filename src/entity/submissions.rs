//! 代码提交实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub language: String,
    #[sea_orm(column_type = "Text")]
    pub code: String,
    /// JSON 数组
    #[sea_orm(column_type = "Text")]
    pub tags: String,
    /// 小写的标题与描述
    #[sea_orm(column_type = "Text")]
    pub search_text: String,
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub analysis_result: Option<String>,
    pub analyzed_at: Option<i64>,
    pub feedback_teacher_id: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback_comment: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub feedback_grade: Option<f64>,
    pub feedback_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id"
    )]
    Owner,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_submission(self) -> crate::models::submissions::entities::Submission {
        use crate::models::submissions::entities::{
            Analysis, Feedback, Language, Submission, SubmissionStatus,
        };
        use chrono::{DateTime, Utc};

        let to_datetime =
            |ts: i64| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default();

        let analysis = match (self.analysis_result, self.analyzed_at) {
            (Some(result), Some(at)) => Some(Analysis {
                result,
                analyzed_at: to_datetime(at),
            }),
            _ => None,
        };

        let feedback = match (self.feedback_teacher_id, self.feedback_at) {
            (Some(teacher_id), Some(at)) => Some(Feedback {
                teacher_id,
                comment: self.feedback_comment.unwrap_or_default(),
                grade: self.feedback_grade,
                feedback_at: to_datetime(at),
            }),
            _ => None,
        };

        let status = self
            .status
            .parse::<SubmissionStatus>()
            .unwrap_or_else(|_| Submission::derive_status(analysis.as_ref(), feedback.as_ref()));

        Submission {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            language: self.language.parse::<Language>().unwrap_or(Language::Javascript),
            code: self.code,
            tags: serde_json::from_str(&self.tags).unwrap_or_default(),
            status,
            analysis,
            feedback,
            created_at: to_datetime(self.created_at),
            updated_at: to_datetime(self.updated_at),
        }
    }
}

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::{AppError, FieldError, Result};

pub const MIN_GRADE: f64 = 0.0;
pub const MAX_GRADE: f64 = 100.0;

// 支持的编程语言
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub enum Language {
    Javascript,
    Python,
    Java,
    Cpp,
    C,
}

impl Language {
    pub const JAVASCRIPT: &'static str = "javascript";
    pub const PYTHON: &'static str = "python";
    pub const JAVA: &'static str = "java";
    pub const CPP: &'static str = "cpp";
    pub const C_LANG: &'static str = "c";

    pub fn all() -> &'static [Language] {
        &[
            Language::Javascript,
            Language::Python,
            Language::Java,
            Language::Cpp,
            Language::C,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Javascript => Self::JAVASCRIPT,
            Language::Python => Self::PYTHON,
            Language::Java => Self::JAVA,
            Language::Cpp => Self::CPP,
            Language::C => Self::C_LANG,
        }
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            Language::JAVASCRIPT => Ok(Language::Javascript),
            Language::PYTHON => Ok(Language::Python),
            Language::JAVA => Ok(Language::Java),
            Language::CPP => Ok(Language::Cpp),
            Language::C_LANG => Ok(Language::C),
            _ => Err(format!(
                "Invalid language: '{s}'. Supported languages: javascript, python, java, cpp, c"
            )),
        }
    }
}

// 提交状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub enum SubmissionStatus {
    Submitted, // 已提交
    Analyzed,  // 已分析
    Reviewed,  // 已点评
    Graded,    // 已评分
}

impl SubmissionStatus {
    pub const SUBMITTED: &'static str = "submitted";
    pub const ANALYZED: &'static str = "analyzed";
    pub const REVIEWED: &'static str = "reviewed";
    pub const GRADED: &'static str = "graded";

    pub fn all() -> &'static [SubmissionStatus] {
        &[
            SubmissionStatus::Submitted,
            SubmissionStatus::Analyzed,
            SubmissionStatus::Reviewed,
            SubmissionStatus::Graded,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => Self::SUBMITTED,
            SubmissionStatus::Analyzed => Self::ANALYZED,
            SubmissionStatus::Reviewed => Self::REVIEWED,
            SubmissionStatus::Graded => Self::GRADED,
        }
    }

    /// 教师反馈是否已决定当前状态
    pub fn is_feedback_state(&self) -> bool {
        matches!(self, SubmissionStatus::Reviewed | SubmissionStatus::Graded)
    }
}

impl<'de> Deserialize<'de> for SubmissionStatus {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            SubmissionStatus::SUBMITTED => Ok(SubmissionStatus::Submitted),
            SubmissionStatus::ANALYZED => Ok(SubmissionStatus::Analyzed),
            SubmissionStatus::REVIEWED => Ok(SubmissionStatus::Reviewed),
            SubmissionStatus::GRADED => Ok(SubmissionStatus::Graded),
            _ => Err(format!(
                "Invalid status: '{s}'. Supported statuses: submitted, analyzed, reviewed, graded"
            )),
        }
    }
}

/// AI 分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct Analysis {
    pub result: String,
    pub analyzed_at: chrono::DateTime<chrono::Utc>,
}

/// 教师反馈
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct Feedback {
    pub teacher_id: i64,
    pub comment: String,
    pub grade: Option<f64>,
    pub feedback_at: chrono::DateTime<chrono::Utc>,
}

/// 可由提交者编辑的内容
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionContent {
    pub title: String,
    pub description: Option<String>,
    pub language: Language,
    pub code: String,
    pub tags: Vec<String>,
}

// 代码提交实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct Submission {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub language: Language,
    pub code: String,
    pub tags: Vec<String>,
    pub status: SubmissionStatus,
    pub analysis: Option<Analysis>,
    pub feedback: Option<Feedback>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Submission {
    /// 由分析与反馈的有无推导状态
    pub fn derive_status(
        analysis: Option<&Analysis>,
        feedback: Option<&Feedback>,
    ) -> SubmissionStatus {
        match (feedback, analysis) {
            (Some(fb), _) if fb.grade.is_some() => SubmissionStatus::Graded,
            (Some(_), _) => SubmissionStatus::Reviewed,
            (None, Some(_)) => SubmissionStatus::Analyzed,
            (None, None) => SubmissionStatus::Submitted,
        }
    }

    /// 提交者修改内容：任意状态回到已提交，清除分析，保留反馈
    pub fn apply_edit(&mut self, content: SubmissionContent, now: chrono::DateTime<chrono::Utc>) {
        self.title = content.title;
        self.description = content.description;
        self.language = content.language;
        self.code = content.code;
        self.tags = content.tags;
        self.analysis = None;
        self.status = SubmissionStatus::Submitted;
        self.updated_at = now;
    }

    /// 记录分析结果，覆盖之前的分析
    ///
    /// 已有教师反馈时状态不被新的分析回退。
    pub fn complete_analysis(&mut self, result: String, now: chrono::DateTime<chrono::Utc>) {
        self.analysis = Some(Analysis {
            result,
            analyzed_at: now,
        });
        if !self.status.is_feedback_state() {
            self.status = SubmissionStatus::Analyzed;
        }
        self.updated_at = now;
    }

    /// 教师反馈：有分数为已评分，否则为已点评；覆盖之前的反馈
    pub fn apply_feedback(
        &mut self,
        teacher_id: i64,
        comment: String,
        grade: Option<f64>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<()> {
        if let Some(grade) = grade {
            check_grade(grade)?;
        }
        self.feedback = Some(Feedback {
            teacher_id,
            comment,
            grade,
            feedback_at: now,
        });
        self.status = if grade.is_some() {
            SubmissionStatus::Graded
        } else {
            SubmissionStatus::Reviewed
        };
        self.updated_at = now;
        Ok(())
    }
}

/// 统计用的提交摘要（不含代码正文）
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionFacet {
    pub language: Language,
    pub status: SubmissionStatus,
    pub grade: Option<f64>,
}

/// 单个学生的提交概况
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnerSubmissionStats {
    pub count: i64,
    pub last_submission_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// 分数必须是 [0, 100] 内的有限数
pub fn check_grade(grade: f64) -> Result<()> {
    if grade.is_finite() && (MIN_GRADE..=MAX_GRADE).contains(&grade) {
        Ok(())
    } else {
        Err(AppError::InvalidFields(vec![FieldError::new(
            "grade",
            "Grade must be a number between 0 and 100",
        )]))
    }
}

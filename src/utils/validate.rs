use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{AppError, FieldError};
use crate::models::submissions::entities::{
    Language, MAX_GRADE, MIN_GRADE, Submission, SubmissionContent,
};
use crate::models::submissions::requests::{
    CreateSubmissionRequest, FeedbackRequest, UpdateSubmissionRequest,
};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;
pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 500;
pub const COMMENT_MAX_LEN: usize = 2000;
pub const MAX_TAGS: usize = 20;
pub const TAG_MAX_LEN: usize = 30;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err("Username length must be between 3 and 30 characters");
    }
    // 只能包含字母、数字、下划线、点或连字符
    if !USERNAME_RE.is_match(username) {
        return Err("Username must contain only letters, numbers, underscores, dots or hyphens");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 密码策略验证结果
#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// 验证密码是否符合安全策略
///
/// 至少 8 个字符，同时包含字母与数字，且不在常见弱密码列表中。
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    if password.chars().count() < 8 {
        errors.push("Password must be at least 8 characters long");
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        errors.push("Password must contain at least one letter");
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }

    let weak_passwords = [
        "password1",
        "qwerty123",
        "admin123",
        "abcd1234",
        "abc12345",
        "passw0rd",
        "letmein1",
    ];
    if weak_passwords
        .iter()
        .any(|&weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// 收集字段错误，全部校验完成后统一报告
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(self.0))
        }
    }
}

/// 校验注册或建号信息
pub fn validate_account(username: &str, email: &str, password: &str) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Err(msg) = validate_username(username) {
        errors.push("username", msg);
    }
    if let Err(msg) = validate_email(email) {
        errors.push("email", msg);
    }
    let password_check = validate_password(password);
    if !password_check.is_valid {
        errors.push("password", password_check.error_message());
    }
    errors.into_result()
}

fn check_title(title: &str, errors: &mut FieldErrors) {
    if title.trim().is_empty() {
        errors.push("title", "Title is required");
    } else if title.chars().count() > TITLE_MAX_LEN {
        errors.push("title", "Title cannot exceed 100 characters");
    }
}

fn check_description(description: Option<&str>, errors: &mut FieldErrors) {
    if let Some(description) = description
        && description.chars().count() > DESCRIPTION_MAX_LEN
    {
        errors.push("description", "Description cannot exceed 500 characters");
    }
}

fn check_code(code: &str, errors: &mut FieldErrors) {
    if code.trim().is_empty() {
        errors.push("code", "Code is required");
    }
}

fn parse_language(language: &str, errors: &mut FieldErrors) -> Option<Language> {
    match language.trim().to_lowercase().parse::<Language>() {
        Ok(language) => Some(language),
        Err(msg) => {
            errors.push("language", msg);
            None
        }
    }
}

/// 去除首尾空白、空标签与重复标签，保持原有顺序
pub fn normalize_tags(tags: Vec<String>, errors: &mut FieldErrors) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_string();
        if tag.is_empty() || normalized.contains(&tag) {
            continue;
        }
        if tag.chars().count() > TAG_MAX_LEN {
            errors.push("tags", format!("Tag '{tag}' cannot exceed 30 characters"));
            continue;
        }
        normalized.push(tag);
    }
    if normalized.len() > MAX_TAGS {
        errors.push("tags", "No more than 20 tags are allowed");
    }
    normalized
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// 校验新建提交
pub fn validate_new_submission(req: CreateSubmissionRequest) -> Result<SubmissionContent, AppError> {
    let mut errors = FieldErrors::new();

    let title = req.title.unwrap_or_default();
    check_title(&title, &mut errors);
    check_description(req.description.as_deref(), &mut errors);

    let language = match req.language {
        Some(ref language) if !language.trim().is_empty() => {
            parse_language(language, &mut errors)
        }
        _ => {
            errors.push("language", "Language is required");
            None
        }
    };

    let code = req.code.unwrap_or_default();
    check_code(&code, &mut errors);
    let tags = normalize_tags(req.tags.unwrap_or_default(), &mut errors);

    errors.into_result()?;

    Ok(SubmissionContent {
        title: title.trim().to_string(),
        description: normalize_description(req.description),
        language: language.ok_or_else(|| AppError::validation("Language is required"))?,
        code,
        tags,
    })
}

/// 校验提交修改，未给出的字段沿用原值
pub fn validate_submission_edit(
    existing: &Submission,
    req: UpdateSubmissionRequest,
) -> Result<SubmissionContent, AppError> {
    let mut errors = FieldErrors::new();

    let title = req.title.unwrap_or_else(|| existing.title.clone());
    check_title(&title, &mut errors);

    let description = match req.description {
        Some(description) => Some(description),
        None => existing.description.clone(),
    };
    check_description(description.as_deref(), &mut errors);

    let language = match req.language {
        Some(ref language) => parse_language(language, &mut errors),
        None => Some(existing.language),
    };

    let code = req.code.unwrap_or_else(|| existing.code.clone());
    check_code(&code, &mut errors);

    let tags = normalize_tags(
        req.tags.unwrap_or_else(|| existing.tags.clone()),
        &mut errors,
    );

    errors.into_result()?;

    Ok(SubmissionContent {
        title: title.trim().to_string(),
        description: normalize_description(description),
        language: language.unwrap_or(existing.language),
        code,
        tags,
    })
}

/// 校验教师反馈，返回 (评语, 分数)
pub fn validate_feedback(req: FeedbackRequest) -> Result<(String, Option<f64>), AppError> {
    let mut errors = FieldErrors::new();

    let comment = req.comment.unwrap_or_default().trim().to_string();
    if comment.is_empty() {
        errors.push("comment", "Comment is required");
    } else if comment.chars().count() > COMMENT_MAX_LEN {
        errors.push("comment", "Comment cannot exceed 2000 characters");
    }

    if let Some(grade) = req.grade
        && !(grade.is_finite() && (MIN_GRADE..=MAX_GRADE).contains(&grade))
    {
        errors.push("grade", "Grade must be a number between 0 and 100");
    }

    errors.into_result()?;
    Ok((comment, req.grade))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submissions::entities::SubmissionStatus;

    fn fields(err: AppError) -> Vec<String> {
        err.field_errors()
            .unwrap_or_default()
            .iter()
            .map(|e| e.field.clone())
            .collect()
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("bob").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
        assert!(validate_username("bad name").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("alice@example").is_err());
        assert!(validate_email("alice.example.com").is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("Secret123").is_valid);
        let short = validate_password("ab1");
        assert!(!short.is_valid);
        assert!(
            short
                .errors
                .contains(&"Password must be at least 8 characters long")
        );
        assert!(!validate_password("abcdefgh").is_valid);
        assert!(!validate_password("12345678").is_valid);
        assert!(!validate_password("Password1").is_valid);
    }

    #[test]
    fn test_account_errors_are_all_reported() {
        let err = validate_account("x", "nope", "short").unwrap_err();
        assert_eq!(fields(err), vec!["username", "email", "password"]);
    }

    #[test]
    fn test_new_submission_reports_every_bad_field() {
        let err = validate_new_submission(CreateSubmissionRequest {
            title: Some("   ".into()),
            description: Some("d".repeat(501)),
            language: Some("rust".into()),
            code: None,
            tags: None,
        })
        .unwrap_err();
        assert_eq!(fields(err), vec!["title", "description", "language", "code"]);
    }

    #[test]
    fn test_new_submission_requires_language() {
        let err = validate_new_submission(CreateSubmissionRequest {
            title: Some("ok".into()),
            code: Some("x".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(fields(err), vec!["language"]);
    }

    #[test]
    fn test_title_length_limit() {
        let ok = validate_new_submission(CreateSubmissionRequest {
            title: Some("t".repeat(100)),
            language: Some("c".into()),
            code: Some("int main(){}".into()),
            ..Default::default()
        });
        assert!(ok.is_ok());
        let err = validate_new_submission(CreateSubmissionRequest {
            title: Some("t".repeat(101)),
            language: Some("c".into()),
            code: Some("int main(){}".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(fields(err), vec!["title"]);
    }

    #[test]
    fn test_tags_are_normalized() {
        let content = validate_new_submission(CreateSubmissionRequest {
            title: Some("Sorting".into()),
            language: Some("Python".into()),
            code: Some("sorted(x)".into()),
            tags: Some(vec![" sort ".into(), "sort".into(), "".into(), "algo".into()]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(content.tags, vec!["sort", "algo"]);
        assert_eq!(content.language, Language::Python);
        assert_eq!(content.description, None);
    }

    #[test]
    fn test_edit_keeps_missing_fields() {
        let now = chrono::Utc::now();
        let existing = Submission {
            id: 1,
            owner_id: 1,
            title: "Old".into(),
            description: Some("desc".into()),
            language: Language::Java,
            code: "class A {}".into(),
            tags: vec!["oop".into()],
            status: SubmissionStatus::Graded,
            analysis: None,
            feedback: None,
            created_at: now,
            updated_at: now,
        };
        let content = validate_submission_edit(
            &existing,
            UpdateSubmissionRequest {
                title: Some("New".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(content.title, "New");
        assert_eq!(content.language, Language::Java);
        assert_eq!(content.code, "class A {}");
        assert_eq!(content.tags, vec!["oop"]);

        let err = validate_submission_edit(
            &existing,
            UpdateSubmissionRequest {
                code: Some("  ".into()),
                language: Some("go".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(fields(err), vec!["language", "code"]);
    }

    #[test]
    fn test_feedback_grade_range() {
        assert!(
            validate_feedback(FeedbackRequest {
                comment: Some("Nice".into()),
                grade: Some(150.0),
            })
            .is_err()
        );
        assert_eq!(
            validate_feedback(FeedbackRequest {
                comment: Some("Nice".into()),
                grade: None,
            })
            .unwrap(),
            ("Nice".to_string(), None)
        );
        let err = validate_feedback(FeedbackRequest {
            comment: None,
            grade: Some(-5.0),
        })
        .unwrap_err();
        assert_eq!(fields(err), vec!["comment", "grade"]);
    }
}

use std::sync::Arc;

use actix_web::http::{Method, StatusCode};
use serde_json::json;

use super::{StubAnalyzer, TestContext, call_json, request};
use crate::config::AnalyzerConfig;
use crate::models::submissions::entities::{Language, SubmissionStatus};
use crate::services::analyzer::OllamaAnalyzer;

#[actix_web::test]
async fn test_submission_lifecycle() {
    let ctx = TestContext::new().await;
    let (_, student) = ctx.student("alice").await;
    let (_, teacher) = ctx.teacher("mr_smith").await;
    let app = init_test_app!(ctx);

    // 创建
    let (status, body) = call_json(
        &app,
        request(Method::POST, "/api/code", Some(&student))
            .set_json(json!({
                "title": "Bubble sort",
                "language": "python",
                "code": "def sort(xs): ...",
                "tags": ["sorting", "sorting", " loops "]
            }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "submitted");
    assert_eq!(body["data"]["tags"], json!(["sorting", "loops"]));
    let id = body["data"]["id"].as_i64().unwrap();

    // 分析
    let (status, body) = call_json(
        &app,
        request(Method::POST, &format!("/api/code/{id}/analyze"), Some(&student)).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "analyzed");
    assert_eq!(body["data"]["analysis"]["result"], "[python] Looks good");

    // 评分
    let (status, body) = call_json(
        &app,
        request(
            Method::POST,
            &format!("/api/admin/codes/{id}/feedback"),
            Some(&teacher),
        )
        .set_json(json!({ "comment": "Nice work", "grade": 85 }))
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "graded");
    assert_eq!(body["data"]["feedback"]["grade"], 85.0);
    assert!(!body["data"]["analysis"].is_null());

    // 已评分后再次分析不回退状态
    let (_, body) = call_json(
        &app,
        request(Method::POST, &format!("/api/code/{id}/analyze"), Some(&student)).to_request(),
    )
    .await;
    assert_eq!(body["data"]["status"], "graded");

    // 修改后回到已提交，清除分析，保留反馈
    let (status, body) = call_json(
        &app,
        request(Method::PUT, &format!("/api/code/{id}"), Some(&student))
            .set_json(json!({ "code": "def sort(xs): return sorted(xs)" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "submitted");
    assert!(body["data"]["analysis"].is_null());
    assert_eq!(body["data"]["feedback"]["comment"], "Nice work");
    assert_eq!(body["data"]["title"], "Bubble sort");

    let stored = ctx.storage.get_submission_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.status, SubmissionStatus::Submitted);
    assert!(stored.analysis.is_none());
    assert!(stored.feedback.is_some());
}

#[actix_web::test]
async fn test_create_reports_every_invalid_field() {
    let ctx = TestContext::new().await;
    let (owner, student) = ctx.student("alice").await;
    let app = init_test_app!(ctx);

    let (status, body) = call_json(
        &app,
        request(Method::POST, "/api/code", Some(&student))
            .set_json(json!({ "title": "x".repeat(101), "language": "cobol" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "language", "code"]);

    let listed = ctx
        .storage
        .list_submissions_with_pagination(crate::models::submissions::requests::SubmissionListQuery {
            page: 1,
            size: 10,
            owner_id: Some(owner.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(listed.pagination.total, 0);
}

#[actix_web::test]
async fn test_students_cannot_touch_each_others_submissions() {
    let ctx = TestContext::new().await;
    let (alice, _) = ctx.student("alice").await;
    let (_, bob) = ctx.student("bob").await;
    let submission = ctx.submission(alice.id, Language::C, "Mine").await;
    let app = init_test_app!(ctx);
    let uri = format!("/api/code/{}", submission.id);

    let attempts = [
        request(Method::GET, &uri, Some(&bob)),
        request(Method::PUT, &uri, Some(&bob)).set_json(json!({ "title": "Stolen" })),
        request(Method::DELETE, &uri, Some(&bob)),
        request(Method::POST, &format!("{uri}/analyze"), Some(&bob)),
        request(
            Method::POST,
            &format!("/api/admin/codes/{}/feedback", submission.id),
            Some(&bob),
        )
        .set_json(json!({ "comment": "A+", "grade": 100 })),
    ];
    for attempt in attempts {
        let (status, body) = call_json(&app, attempt.to_request()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["kind"], "AuthorizationError");
    }

    let unchanged = ctx
        .storage
        .get_submission_by_id(submission.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.title, "Mine");
    assert_eq!(unchanged.status, SubmissionStatus::Submitted);
    assert!(unchanged.feedback.is_none());
}

#[actix_web::test]
async fn test_teacher_reads_and_deletes_but_cannot_edit() {
    let ctx = TestContext::new().await;
    let (alice, _) = ctx.student("alice").await;
    let (_, teacher) = ctx.teacher("mr_smith").await;
    let submission = ctx.submission(alice.id, Language::Java, "Hello").await;
    let app = init_test_app!(ctx);
    let uri = format!("/api/code/{}", submission.id);

    let (status, _) = call_json(&app, request(Method::GET, &uri, Some(&teacher)).to_request()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call_json(
        &app,
        request(Method::PUT, &uri, Some(&teacher))
            .set_json(json!({ "title": "Edited" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call_json(
        &app,
        request(Method::POST, &format!("{uri}/analyze"), Some(&teacher)).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        call_json(&app, request(Method::DELETE, &uri, Some(&teacher)).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        ctx.storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[actix_web::test]
async fn test_malformed_and_missing_ids_are_not_found() {
    let ctx = TestContext::new().await;
    let (_, student) = ctx.student("alice").await;
    let app = init_test_app!(ctx);

    for uri in ["/api/code/abc", "/api/code/0", "/api/code/-1", "/api/code/999"] {
        let (status, body) = call_json(&app, request(Method::GET, uri, Some(&student)).to_request()).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["kind"], "NotFoundError");
    }
}

#[actix_web::test]
async fn test_list_own_submissions_with_filters() {
    let ctx = TestContext::new().await;
    let (alice, student) = ctx.student("alice").await;
    let (bob, _) = ctx.student("bob").await;
    ctx.submission(alice.id, Language::Python, "Quick SORT").await;
    ctx.submission(alice.id, Language::Python, "Binary search").await;
    ctx.submission(alice.id, Language::Cpp, "Sorting in C++").await;
    ctx.submission(bob.id, Language::Python, "Bob sorts too").await;
    let app = init_test_app!(ctx);

    let (status, body) = call_json(
        &app,
        request(Method::GET, "/api/code", Some(&student)).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 3);
    // 最新的在前
    assert_eq!(body["data"]["items"][0]["title"], "Sorting in C++");

    let (_, body) = call_json(
        &app,
        request(
            Method::GET,
            "/api/code?language=python&search=sort",
            Some(&student),
        )
        .to_request(),
    )
    .await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Quick SORT");

    let (status, body) = call_json(
        &app,
        request(Method::GET, "/api/code?status=finished", Some(&student)).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "status");
}

#[actix_web::test]
async fn test_unreachable_analyzer_leaves_submission_untouched() {
    // 端口 1 上不会有服务监听
    let analyzer = OllamaAnalyzer::new(&AnalyzerConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        model: "codellama".to_string(),
        timeout: 2,
    })
    .unwrap();
    let ctx = TestContext::with_analyzer(Arc::new(analyzer)).await;
    let (alice, student) = ctx.student("alice").await;
    let submission = ctx.submission(alice.id, Language::Javascript, "Closure").await;
    let app = init_test_app!(ctx);

    let (status, body) = call_json(
        &app,
        request(
            Method::POST,
            &format!("/api/code/{}/analyze", submission.id),
            Some(&student),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "ExternalServiceUnavailable");

    let stored = ctx
        .storage
        .get_submission_by_id(submission.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SubmissionStatus::Submitted);
    assert!(stored.analysis.is_none());
    assert_eq!(stored.updated_at, submission.updated_at);
}

#[actix_web::test]
async fn test_failing_analyzer_is_a_distinct_error() {
    let ctx = TestContext::with_analyzer(Arc::new(StubAnalyzer::Failing)).await;
    let (alice, student) = ctx.student("alice").await;
    let submission = ctx.submission(alice.id, Language::C, "Pointers").await;
    let app = init_test_app!(ctx);

    let (status, body) = call_json(
        &app,
        request(
            Method::POST,
            &format!("/api/code/{}/analyze", submission.id),
            Some(&student),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "ExternalServiceError");
    assert!(
        ctx.storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap()
            .analysis
            .is_none()
    );
}

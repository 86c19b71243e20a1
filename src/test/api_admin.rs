use actix_web::http::{Method, StatusCode};
use serde_json::json;

use super::{PASSWORD, TestContext, call_json, request};
use crate::models::submissions::entities::Language;

#[actix_web::test]
async fn test_students_cannot_reach_admin_routes() {
    let ctx = TestContext::new().await;
    let (_, student) = ctx.student("alice").await;
    let app = init_test_app!(ctx);

    for (method, uri) in [
        (Method::GET, "/api/admin/dashboard"),
        (Method::GET, "/api/admin/students"),
        (Method::GET, "/api/admin/codes"),
        (Method::POST, "/api/admin/users"),
        (Method::DELETE, "/api/admin/users/1"),
    ] {
        let (status, body) =
            call_json(&app, request(method, uri, Some(&student)).to_request()).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["kind"], "AuthorizationError");
    }
}

#[actix_web::test]
async fn test_dashboard_counts_languages() {
    let ctx = TestContext::new().await;
    let (alice, _) = ctx.student("alice").await;
    let (bob, _) = ctx.student("bob").await;
    let (_, teacher) = ctx.teacher("mr_smith").await;
    ctx.submission(alice.id, Language::Javascript, "One").await;
    ctx.submission(alice.id, Language::Python, "Two").await;
    ctx.submission(bob.id, Language::Java, "Three").await;
    ctx.storage.update_last_active(bob.id).await.unwrap();
    let app = init_test_app!(ctx);

    let (status, body) = call_json(
        &app,
        request(Method::GET, "/api/admin/dashboard", Some(&teacher)).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["totalStudents"], 2);
    assert_eq!(data["totalSubmissions"], 3);
    assert_eq!(data["activeToday"], 1);

    let languages = data["languageStats"].as_array().unwrap();
    assert_eq!(languages.len(), 3);
    for language in ["javascript", "python", "java"] {
        let stat = languages
            .iter()
            .find(|s| s["language"] == language)
            .unwrap();
        assert_eq!(stat["count"], 1);
    }

    assert_eq!(data["gradeStats"]["average"], 0.0);
    assert_eq!(data["gradeStats"]["min"], 0.0);
    assert_eq!(data["gradeStats"]["max"], 0.0);

    let recent = data["recentSubmissions"].as_array().unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0]["title"], "Three");
    assert_eq!(recent[0]["owner"]["username"], "bob");
}

#[actix_web::test]
async fn test_students_pagination() {
    let ctx = TestContext::new().await;
    let (_, teacher) = ctx.teacher("mr_smith").await;
    for i in 0..15 {
        ctx.student(&format!("student{i:02}")).await;
    }
    let app = init_test_app!(ctx);

    let (status, body) = call_json(
        &app,
        request(Method::GET, "/api/admin/students?page=1&limit=5", Some(&teacher)).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["pagination"]["total"], 15);
    assert_eq!(body["data"]["pagination"]["totalPages"], 3);

    let (_, body) = call_json(
        &app,
        request(Method::GET, "/api/admin/students?page=3&limit=5", Some(&teacher)).to_request(),
    )
    .await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 5);
}

#[actix_web::test]
async fn test_students_list_includes_submission_stats() {
    let ctx = TestContext::new().await;
    let (_, teacher) = ctx.teacher("mr_smith").await;
    let (alice, _) = ctx.student("alice").await;
    let (bob, _) = ctx.student("bob").await;
    ctx.submission(alice.id, Language::C, "One").await;
    ctx.submission(alice.id, Language::C, "Two").await;
    ctx.storage.update_last_active(alice.id).await.unwrap();
    let app = init_test_app!(ctx);

    let (_, body) = call_json(
        &app,
        request(Method::GET, "/api/admin/students", Some(&teacher)).to_request(),
    )
    .await;
    let items = body["data"]["items"].as_array().unwrap();
    // 最近活跃的在前，从未登录的在后
    assert_eq!(items[0]["id"], alice.id);
    assert_eq!(items[0]["submissionCount"], 2);
    assert!(!items[0]["lastSubmissionAt"].is_null());
    assert_eq!(items[1]["id"], bob.id);
    assert_eq!(items[1]["submissionCount"], 0);
    assert!(items[1]["lastSubmissionAt"].is_null());

    let (_, body) = call_json(
        &app,
        request(Method::GET, "/api/admin/students?search=BO", Some(&teacher)).to_request(),
    )
    .await;
    assert_eq!(body["data"]["pagination"]["total"], 1);
}

#[actix_web::test]
async fn test_student_codes_and_all_codes() {
    let ctx = TestContext::new().await;
    let (mr_smith, teacher) = ctx.teacher("mr_smith").await;
    let (alice, _) = ctx.student("alice").await;
    let (bob, _) = ctx.student("bob").await;
    ctx.submission(alice.id, Language::Python, "Alice one").await;
    ctx.submission(bob.id, Language::Python, "Bob one").await;
    let app = init_test_app!(ctx);

    let (status, body) = call_json(
        &app,
        request(
            Method::GET,
            &format!("/api/admin/students/{}/codes", alice.id),
            Some(&teacher),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["student"]["username"], "alice");
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let (_, body) = call_json(
        &app,
        request(Method::GET, "/api/admin/codes?language=python", Some(&teacher)).to_request(),
    )
    .await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["owner"]["username"], "bob");

    // 教师账号不按学生处理
    for id in [mr_smith.id, 999] {
        let (status, _) = call_json(
            &app,
            request(
                Method::GET,
                &format!("/api/admin/students/{id}/codes"),
                Some(&teacher),
            )
            .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[actix_web::test]
async fn test_feedback_validation() {
    let ctx = TestContext::new().await;
    let (_, teacher) = ctx.teacher("mr_smith").await;
    let (alice, _) = ctx.student("alice").await;
    let submission = ctx.submission(alice.id, Language::Cpp, "Templates").await;
    let app = init_test_app!(ctx);
    let uri = format!("/api/admin/codes/{}/feedback", submission.id);

    let (status, body) = call_json(
        &app,
        request(Method::POST, &uri, Some(&teacher))
            .set_json(json!({ "comment": "Too generous", "grade": 150 }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "grade");
    let stored = ctx.storage.get_submission_by_id(submission.id).await.unwrap().unwrap();
    assert!(stored.feedback.is_none());

    let (status, body) = call_json(
        &app,
        request(Method::POST, &uri, Some(&teacher))
            .set_json(json!({ "grade": 70 }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "comment");

    let (status, body) = call_json(
        &app,
        request(Method::POST, &uri, Some(&teacher))
            .set_json(json!({ "comment": "Read about SFINAE" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "reviewed");
    assert!(body["data"]["feedback"]["grade"].is_null());

    let (status, _) = call_json(
        &app,
        request(Method::POST, "/api/admin/codes/999/feedback", Some(&teacher))
            .set_json(json!({ "comment": "Hello" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_create_user_is_always_a_student() {
    let ctx = TestContext::new().await;
    let (_, teacher) = ctx.teacher("mr_smith").await;
    let app = init_test_app!(ctx);

    let (status, body) = call_json(
        &app,
        request(Method::POST, "/api/admin/users", Some(&teacher))
            .set_json(json!({
                "username": "newbie",
                "email": "newbie@example.com",
                "password": "Welcome123",
                "role": "teacher"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user"]["role"], "student");

    let (status, _) = call_json(
        &app,
        request(Method::POST, "/api/auth/login", None)
            .set_json(json!({ "email": "newbie@example.com", "password": "Welcome123" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_delete_student_cascades() {
    let ctx = TestContext::new().await;
    let (_, teacher) = ctx.teacher("mr_smith").await;
    let (alice, alice_token) = ctx.student("alice").await;
    let first = ctx.submission(alice.id, Language::C, "One").await;
    let second = ctx.submission(alice.id, Language::C, "Two").await;
    let app = init_test_app!(ctx);

    // 先访问一次，让用户进入缓存
    let (status, _) = call_json(
        &app,
        request(Method::GET, "/api/auth/me", Some(&alice_token)).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call_json(
        &app,
        request(
            Method::DELETE,
            &format!("/api/admin/users/{}", alice.id),
            Some(&teacher),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for id in [first.id, second.id] {
        assert!(ctx.storage.get_submission_by_id(id).await.unwrap().is_none());
    }

    let (status, _) = call_json(
        &app,
        request(Method::POST, "/api/auth/login", None)
            .set_json(json!({ "email": "alice@example.com", "password": PASSWORD }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 旧令牌随之失效
    let (status, _) = call_json(
        &app,
        request(Method::GET, "/api/auth/me", Some(&alice_token)).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_teacher_accounts_cannot_be_deleted() {
    let ctx = TestContext::new().await;
    let (_, teacher) = ctx.teacher("mr_smith").await;
    let (colleague, _) = ctx.teacher("ms_jones").await;
    let app = init_test_app!(ctx);

    let (status, body) = call_json(
        &app,
        request(
            Method::DELETE,
            &format!("/api/admin/users/{}", colleague.id),
            Some(&teacher),
        )
        .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Teacher accounts cannot be deleted");
    assert!(
        ctx.storage
            .get_user_by_id(colleague.id)
            .await
            .unwrap()
            .is_some()
    );

    let (status, _) = call_json(
        &app,
        request(Method::DELETE, "/api/admin/users/999", Some(&teacher)).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

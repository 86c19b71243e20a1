use actix_web::http::{Method, StatusCode};
use serde_json::json;

use super::{PASSWORD, TestContext, call_json, request};
use crate::models::users::entities::UserRole;

fn register_body(username: &str, email: &str) -> serde_json::Value {
    json!({ "username": username, "email": email, "password": "Passw0rd!" })
}

#[actix_web::test]
async fn test_register_login_and_me() {
    let ctx = TestContext::new().await;
    let app = init_test_app!(ctx);

    let (status, body) = call_json(
        &app,
        request(Method::POST, "/api/auth/register", None)
            .set_json(register_body("alice", "Alice@Example.com"))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user"]["role"], "student");
    assert_eq!(body["data"]["user"]["email"], "alice@example.com");
    assert!(body["data"]["user"].get("passwordHash").is_none());
    assert!(body["data"]["expiresIn"].as_i64().unwrap() > 0);
    assert!(body["data"]["user"]["lastActive"].is_null());

    let (status, body) = call_json(
        &app,
        request(Method::POST, "/api/auth/login", None)
            .set_json(json!({ "email": "alice@example.com", "password": "Passw0rd!" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["data"]["user"]["lastActive"].is_null());
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();

    let (status, body) = call_json(
        &app,
        request(Method::GET, "/api/auth/me", Some(&token)).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["username"], "alice");
}

#[actix_web::test]
async fn test_duplicate_username_is_reported_before_email() {
    let ctx = TestContext::new().await;
    ctx.student("alice").await;
    let app = init_test_app!(ctx);

    // 用户名与邮箱同时重复
    let (status, body) = call_json(
        &app,
        request(Method::POST, "/api/auth/register", None)
            .set_json(register_body("alice", "alice@example.com"))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ConflictError");
    assert_eq!(body["message"], "Username is already taken");

    // 仅邮箱重复
    let (status, body) = call_json(
        &app,
        request(Method::POST, "/api/auth/register", None)
            .set_json(register_body("alice2", "alice@example.com"))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists");
}

#[actix_web::test]
async fn test_register_reports_every_invalid_field() {
    let ctx = TestContext::new().await;
    let app = init_test_app!(ctx);

    let (status, body) = call_json(
        &app,
        request(Method::POST, "/api/auth/register", None)
            .set_json(json!({ "username": "ab", "email": "not-an-email", "password": "short" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationError");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["username", "email", "password"]);
    assert_eq!(ctx.storage.count_users_by_role(UserRole::Student).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_teacher_self_registration_is_rejected() {
    let ctx = TestContext::new().await;
    let app = init_test_app!(ctx);

    let mut body = register_body("mallory", "mallory@example.com");
    body["role"] = json!("teacher");
    let (status, body) = call_json(
        &app,
        request(Method::POST, "/api/auth/register", None)
            .set_json(body)
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "AuthorizationError");
    assert!(
        ctx.storage
            .get_user_by_username("mallory")
            .await
            .unwrap()
            .is_none()
    );
}

#[actix_web::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new().await;
    ctx.student("bob").await;
    let app = init_test_app!(ctx);

    for (email, password) in [
        ("bob@example.com", "WrongPass1"),
        ("nobody@example.com", PASSWORD),
    ] {
        let (status, body) = call_json(
            &app,
            request(Method::POST, "/api/auth/login", None)
                .set_json(json!({ "email": email, "password": password }))
                .to_request(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "AuthenticationError");
        assert_eq!(body["message"], "Invalid email or password");
    }
}

#[actix_web::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new().await;
    let app = init_test_app!(ctx);

    for (method, uri) in [
        (Method::GET, "/api/auth/me"),
        (Method::GET, "/api/code"),
        (Method::GET, "/api/admin/dashboard"),
    ] {
        let (status, body) = call_json(&app, request(method, uri, None).to_request()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "AuthenticationError");
    }

    let (status, _) = call_json(
        &app,
        request(Method::GET, "/api/auth/me", Some("garbage")).to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_update_profile() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.student("carol").await;
    ctx.student("dave").await;
    let app = init_test_app!(ctx);

    let (status, body) = call_json(
        &app,
        request(Method::PUT, "/api/auth/updateprofile", Some(&token))
            .set_json(json!({ "username": "dave" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ConflictError");

    let (status, body) = call_json(
        &app,
        request(Method::PUT, "/api/auth/updateprofile", Some(&token))
            .set_json(json!({ "username": "carol_new" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["username"], "carol_new");
    assert_eq!(body["data"]["user"]["email"], "carol@example.com");

    // 缓存已失效，/me 返回新名字
    let (_, body) = call_json(
        &app,
        request(Method::GET, "/api/auth/me", Some(&token)).to_request(),
    )
    .await;
    assert_eq!(body["data"]["user"]["username"], "carol_new");
}

#[actix_web::test]
async fn test_change_password() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.student("erin").await;
    let app = init_test_app!(ctx);

    let (status, body) = call_json(
        &app,
        request(Method::PUT, "/api/auth/changepassword", Some(&token))
            .set_json(json!({ "currentPassword": "NotMine123", "newPassword": "NewSecret456" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Current password is incorrect");

    let (status, _) = call_json(
        &app,
        request(Method::PUT, "/api/auth/changepassword", Some(&token))
            .set_json(json!({ "currentPassword": PASSWORD, "newPassword": "NewSecret456" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let login = |password: &'static str| {
        request(Method::POST, "/api/auth/login", None)
            .set_json(json!({ "email": "erin@example.com", "password": password }))
            .to_request()
    };
    let (status, _) = call_json(&app, login(PASSWORD)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call_json(&app, login("NewSecret456")).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_health() {
    let ctx = TestContext::new().await;
    let app = init_test_app!(ctx);

    let (status, body) = call_json(&app, request(Method::GET, "/api/health", None).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

//! 存储层与 HTTP 流程测试
//!
//! 使用内存 SQLite、Moka 缓存与可控的分析服务替身。

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{Method, StatusCode};
use actix_web::test::{self, TestRequest};
use async_trait::async_trait;
use serde_json::Value;

use crate::cache::ObjectCache;
use crate::cache::object_cache::moka::MokaCacheWrapper;
use crate::errors::{AppError, Result};
use crate::models::submissions::entities::{Language, Submission, SubmissionContent};
use crate::models::users::entities::{User, UserRole};
use crate::models::users::requests::NewUser;
use crate::services::analyzer::CodeAnalyzer;
use crate::storage::Storage;
use crate::storage::sea_orm_storage::SeaOrmStorage;

/// 构造挂载全部路由的测试应用
macro_rules! init_test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(
                    actix_web::web::QueryConfig::default()
                        .error_handler(crate::utils::query_error_handler),
                )
                .app_data(
                    actix_web::web::JsonConfig::default()
                        .error_handler(crate::utils::json_error_handler),
                )
                .app_data(actix_web::web::Data::new($ctx.storage.clone()))
                .app_data(actix_web::web::Data::new($ctx.cache.clone()))
                .app_data(actix_web::web::Data::new($ctx.analyzer.clone()))
                .configure(crate::routes::configure_auth_routes)
                .configure(crate::routes::configure_code_routes)
                .configure(crate::routes::configure_admin_routes)
                .configure(crate::routes::configure_system_routes),
        )
        .await
    };
}

mod api_admin;
mod api_auth;
mod api_codes;

/// 固定的密码，测试中直接写库的账号都使用它
pub const PASSWORD: &str = "Secret123";

/// 分析服务替身
pub enum StubAnalyzer {
    Reply(&'static str),
    Unavailable,
    Failing,
}

#[async_trait]
impl CodeAnalyzer for StubAnalyzer {
    async fn analyze(&self, language: Language, _code: &str) -> Result<String> {
        match self {
            StubAnalyzer::Reply(text) => Ok(format!("[{language}] {text}")),
            StubAnalyzer::Unavailable => Err(AppError::analysis_unavailable(
                "AI analysis service is unavailable",
            )),
            StubAnalyzer::Failing => Err(AppError::analysis_failed("AI analysis request failed")),
        }
    }
}

pub struct TestContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub analyzer: Arc<dyn CodeAnalyzer>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_analyzer(Arc::new(StubAnalyzer::Reply("Looks good"))).await
    }

    pub async fn with_analyzer(analyzer: Arc<dyn CodeAnalyzer>) -> Self {
        Self {
            storage: test_storage().await,
            cache: Arc::new(MokaCacheWrapper::new(1_000, 60)),
            analyzer,
        }
    }

    /// 直接写库创建账号并签发令牌
    pub async fn user(&self, username: &str, role: UserRole) -> (User, String) {
        let user = create_user(&self.storage, username, role).await;
        let token = user.generate_access_token().unwrap();
        (user, token)
    }

    pub async fn student(&self, username: &str) -> (User, String) {
        self.user(username, UserRole::Student).await
    }

    pub async fn teacher(&self, username: &str) -> (User, String) {
        self.user(username, UserRole::Teacher).await
    }

    pub async fn submission(&self, owner_id: i64, language: Language, title: &str) -> Submission {
        self.storage
            .create_submission(owner_id, content(language, title))
            .await
            .unwrap()
    }
}

pub async fn test_storage() -> Arc<dyn Storage> {
    Arc::new(SeaOrmStorage::in_memory().await.unwrap())
}

static PASSWORD_HASH: once_cell::sync::Lazy<String> =
    once_cell::sync::Lazy::new(|| crate::utils::password::hash_password(PASSWORD).unwrap());

pub async fn create_user(storage: &Arc<dyn Storage>, username: &str, role: UserRole) -> User {
    storage
        .create_user(NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: PASSWORD_HASH.clone(),
            role,
        })
        .await
        .unwrap()
}

pub fn content(language: Language, title: &str) -> SubmissionContent {
    SubmissionContent {
        title: title.to_string(),
        description: Some(format!("{title} description")),
        language,
        code: "print('hello')".to_string(),
        tags: vec!["practice".to_string()],
    }
}

static NEXT_PEER: AtomicU32 = AtomicU32::new(1);

/// 每个请求使用不同的来源地址，避免触发登录与注册限流
pub fn request(method: Method, uri: &str, token: Option<&str>) -> TestRequest {
    let n = NEXT_PEER.fetch_add(1, Ordering::Relaxed);
    let peer = SocketAddr::from(([10, (n >> 16) as u8, (n >> 8) as u8, n as u8], 40_000));
    let mut req = TestRequest::default()
        .method(method)
        .uri(uri)
        .peer_addr(peer);
    if let Some(token) = token {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    req
}

/// 发送请求并解析 JSON 响应体，空响应体为 Null
pub async fn call_json<S, R, B, E>(app: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = E>,
    B: MessageBody,
    E: std::fmt::Debug,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

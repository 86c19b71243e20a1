/*!
 * 登录与注册的速率限制中间件
 *
 * 按客户端 IP 计数，固定一分钟窗口，超过限制返回 429。
 *
 * ```rust,ignore
 * web::resource("/login")
 *     .wrap(RateLimit::login())
 *     .route(web::post().to(login))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::models::{ApiResponse, ErrorCode};

/// 计数窗口（秒）
const WINDOW_SECS: u64 = 60;

/// 键: `{endpoint}:{ip}`，值: 窗口内的请求数
static ATTEMPTS: Lazy<Cache<String, u32>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(WINDOW_SECS))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone)]
pub struct RateLimit {
    endpoint: &'static str,
    max_attempts: u32,
}

impl RateLimit {
    /// 5 次/分钟/IP
    pub fn login() -> Self {
        Self {
            endpoint: "login",
            max_attempts: 5,
        }
    }

    /// 3 次/分钟/IP
    pub fn register() -> Self {
        Self {
            endpoint: "register",
            max_attempts: 3,
        }
    }
}

/// 客户端 IP：优先取连接地址，其次取代理转发头中的第一个地址
fn client_ip(req: &ServiceRequest) -> String {
    let info = req.connection_info();
    let peer = info.realip_remote_addr().map(str::to_string);

    if let Some(ip) = peer.as_deref().and_then(parse_ip) {
        return ip.to_string();
    }

    let forwarded = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(parse_ip);
    let real_ip = req
        .headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_ip);

    forwarded
        .or(real_ip)
        .map(|ip| ip.to_string())
        .or(peer)
        .unwrap_or_else(|| "unknown".to_string())
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    value.trim().parse().ok()
}

fn too_many_requests() -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header(("Retry-After", WINDOW_SECS.to_string()))
        .json(
            ApiResponse::<()>::error_empty(
                ErrorCode::RateLimitExceeded,
                "Too many requests, please try again later",
            )
            .with_kind("RateLimitError"),
        )
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let limit = self.limit.clone();

        Box::pin(async move {
            let key = format!("{}:{}", limit.endpoint, client_ip(&req));
            let attempts = ATTEMPTS.get(&key).await.unwrap_or(0);

            if attempts >= limit.max_attempts {
                warn!(
                    "Rate limit exceeded for {} ({}/{})",
                    key, attempts, limit.max_attempts
                );
                return Ok(req.into_response(too_many_requests().map_into_right_body()));
            }

            ATTEMPTS.insert(key, attempts + 1).await;
            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}

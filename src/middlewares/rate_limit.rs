/*!
 * 固定窗口速率限制
 *
 * 已认证请求按用户计数，其余按客户端 IP 计数。计数键带上窗口序号，
 * 窗口切换后自然从零开始；超限返回 429 与 Retry-After。
 *
 * ```rust,ignore
 * web::resource("/login")
 *     .wrap(RateLimit::login())
 *     .route(web::post().to(login))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::{HeaderName, HeaderValue, RETRY_AFTER},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::models::{ErrorCode, users::entities::User};

use super::create_error_response;

const LONGEST_WINDOW_SECS: u64 = 3600;
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// 键: 前缀:身份:窗口序号，值: 窗口内已用次数
static COUNTERS: Lazy<Cache<String, u32>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(LONGEST_WINDOW_SECS))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone, Debug)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    scope: &'static str,
}

impl RateLimit {
    /// `window_secs` 取值 1..=3600
    pub fn new(scope: &'static str, max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs: window_secs.clamp(1, LONGEST_WINDOW_SECS),
            scope,
        }
    }

    /// 每个 IP 每分钟 5 次
    pub fn login() -> Self {
        Self::new("login", 5, 60)
    }

    /// 每个用户每分钟 30 次汇总写入
    pub fn consolidation() -> Self {
        Self::new("consolidate", 30, 60)
    }

    /// 当前窗口序号与距窗口结束的秒数
    fn window_at(&self, unix_secs: u64) -> (u64, u64) {
        let index = unix_secs / self.window_secs;
        let retry_after = self.window_secs - unix_secs % self.window_secs;
        (index, retry_after)
    }
}

/// 连接地址优先；拿不到合法地址时才看 X-Forwarded-For 首项与 X-Real-IP
fn client_ip(req: &ServiceRequest) -> String {
    let info = req.connection_info();
    let peer = info.realip_remote_addr();
    if let Some(ip) = peer.filter(|ip| ip.parse::<IpAddr>().is_ok()) {
        return ip.to_string();
    }

    let headers = req.headers();
    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next());
    let real_ip = headers.get("X-Real-IP").and_then(|v| v.to_str().ok());

    forwarded
        .into_iter()
        .chain(real_ip)
        .map(str::trim)
        .find(|ip| ip.parse::<IpAddr>().is_ok())
        .or(peer)
        .unwrap_or("unknown")
        .to_string()
}

fn caller_identity(req: &ServiceRequest) -> String {
    // connection_info() 可能写扩展，不能在持有扩展借用时调用
    let user_id = req.extensions().get::<User>().map(|user| user.id);
    match user_id {
        Some(id) => format!("user:{id}"),
        None => format!("ip:{}", client_ip(req)),
    }
}

fn too_many_requests(retry_after: u64) -> HttpResponse {
    let mut response = create_error_response(
        StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::RateLimitExceeded,
        "Too many requests, please retry later",
    );
    let headers = response.headers_mut();
    headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
    headers.insert(REMAINING_HEADER, HeaderValue::from(0u32));
    response
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
            policy: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    policy: RateLimit,
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
        let policy = self.policy.clone();

        Box::pin(async move {
            let now = chrono::Utc::now().timestamp().max(0) as u64;
            let (window, retry_after) = policy.window_at(now);
            let key = format!("{}:{}:{}", policy.scope, caller_identity(&req), window);

            let used = COUNTERS
                .entry(key.clone())
                .and_upsert_with(|existing| async move {
                    existing.map_or(1, |e| e.into_value().saturating_add(1))
                })
                .await
                .into_value();

            if used > policy.max_requests {
                warn!(
                    "Rate limit exceeded for {} ({}/{} in {}s window)",
                    key, used, policy.max_requests, policy.window_secs
                );
                return Ok(req.into_response(too_many_requests(retry_after).map_into_right_body()));
            }

            let mut res = srv.call(req).await?;
            res.headers_mut().insert(
                REMAINING_HEADER,
                HeaderValue::from(policy.max_requests - used),
            );
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::{TestRequest, call_service, init_service};
    use actix_web::{App, web};

    #[test]
    fn test_windows_are_aligned() {
        let limit = RateLimit::new("t", 3, 60);
        assert_eq!(limit.window_at(120), (2, 60));
        assert_eq!(limit.window_at(179), (2, 1));
        assert_eq!(limit.window_at(180), (3, 60));

        assert_eq!(RateLimit::new("t", 3, 0).window_secs, 1);
        assert_eq!(RateLimit::login().max_requests, 5);
        assert_eq!(RateLimit::consolidation().scope, "consolidate");
    }

    #[actix_web::test]
    async fn test_requests_over_limit_are_rejected() {
        let app = init_service(
            App::new().service(
                web::scope("")
                    .wrap(RateLimit::new("unit-test-limit", 2, LONGEST_WINDOW_SECS))
                    .route("/ping", web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;
        let ping = || {
            TestRequest::get()
                .uri("/ping")
                .peer_addr("10.0.0.7:4000".parse().unwrap())
                .to_request()
        };

        let first = call_service(&app, ping()).await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers().get(REMAINING_HEADER).unwrap(), "1");
        assert_eq!(call_service(&app, ping()).await.status(), StatusCode::OK);

        let resp = call_service(&app, ping()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key(RETRY_AFTER));
    }
}

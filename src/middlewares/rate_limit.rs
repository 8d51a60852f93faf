/*!
 * 速率限制中间件
 *
 * 限制评审请求与批量分配端点的调用频率。
 *
 * ```rust,ignore
 * web::resource("/request_review_fewest")
 *     .wrap(RateLimit::request_review())
 *     .route(web::post().to(request_review_fewest))
 * ```
 *
 * - 限制键为 前缀 + 客户端 IP + 请求路径，不同作业分别计数
 * - 固定时间窗口，窗口内超过上限返回 429 并附带 Retry-After
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::{CONTENT_TYPE, HeaderName, HeaderValue},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::config::AppConfig;
use crate::models::{ApiResponse, ErrorCode};

const WINDOW_SECS: u64 = 60;

/// 一个限制键在当前窗口内的计数
#[derive(Clone, Copy)]
struct RateWindow {
    started: Instant,
    count: u32,
}

/// 全局计数缓存，所有 worker 共享
static RATE_LIMIT_CACHE: Lazy<Cache<String, RateWindow>> = Lazy::new(|| {
    Cache::builder()
        .time_to_idle(Duration::from_secs(WINDOW_SECS * 10))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    key_prefix: String,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window_secs: window_secs.max(1),
            key_prefix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.key_prefix = prefix.to_string();
        self
    }

    /// 动态评审请求：按 rate_limit.request_review_per_minute
    pub fn request_review() -> Self {
        let config = &AppConfig::get().rate_limit;
        Self::new(config.request_review_per_minute, WINDOW_SECS).with_prefix("request_review")
    }

    /// 批量分配：按 rate_limit.batch_per_minute
    pub fn batch_assign() -> Self {
        let config = &AppConfig::get().rate_limit;
        Self::new(config.batch_per_minute, WINDOW_SECS).with_prefix("batch")
    }
}

/// 从请求中提取客户端 IP
///
/// 部署在反向代理之后时依赖代理写入的 X-Forwarded-For / X-Real-IP。
fn extract_client_ip(req: &ServiceRequest) -> String {
    let connection_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string());

    if let Some(ref ip) = connection_ip
        && is_valid_ip(ip)
    {
        return ip.clone();
    }

    // 只取第一个 IP
    if let Some(forwarded) = req.headers().get("X-Forwarded-For")
        && let Ok(value) = forwarded.to_str()
        && let Some(ip) = value.split(',').next()
        && is_valid_ip(ip.trim())
    {
        return ip.trim().to_string();
    }

    connection_ip.unwrap_or_else(|| "unknown".to_string())
}

fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<std::net::IpAddr>().is_ok()
}

fn create_rate_limit_response(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .insert_header(("X-RateLimit-Remaining", "0"))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "请求过于频繁，请稍后再试",
        ))
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
            let cache_key = format!(
                "{}:{}:{}",
                limit.key_prefix,
                extract_client_ip(&req),
                req.path()
            );
            let window = Duration::from_secs(limit.window_secs);
            let now = Instant::now();

            // 原子地累加计数，窗口过期后重新开始
            let current = RATE_LIMIT_CACHE
                .entry(cache_key.clone())
                .and_upsert_with(|existing| {
                    let next = match existing.map(|e| e.into_value()) {
                        Some(w) if now.duration_since(w.started) < window => RateWindow {
                            started: w.started,
                            count: w.count.saturating_add(1),
                        },
                        _ => RateWindow {
                            started: now,
                            count: 1,
                        },
                    };
                    ready(next)
                })
                .await
                .into_value();

            if current.count > limit.max_requests {
                let retry_after = window
                    .saturating_sub(now.duration_since(current.started))
                    .as_secs()
                    .max(1);
                warn!(
                    "Rate limit exceeded for key: {} (count: {}/{})",
                    cache_key, current.count, limit.max_requests
                );
                return Ok(req
                    .into_response(create_rate_limit_response(retry_after).map_into_right_body()));
            }

            let remaining = limit.max_requests - current.count;
            let mut res = srv.call(req).await?.map_into_left_body();
            res.headers_mut().insert(
                HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from(remaining),
            );
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test, web};

    #[actix_web::test]
    async fn test_third_request_is_limited() {
        let app = test::init_service(
            App::new().service(
                web::resource("/limited")
                    .wrap(RateLimit::new(2, 60).with_prefix("limit-test"))
                    .to(|| async { HttpResponse::Ok().finish() }),
            ),
        )
        .await;

        for expected_remaining in ["1", "0"] {
            let res =
                test::call_service(&app, test::TestRequest::post().uri("/limited").to_request())
                    .await;
            assert_eq!(res.status(), StatusCode::OK);
            assert_eq!(
                res.headers().get("x-ratelimit-remaining").unwrap(),
                expected_remaining
            );
        }

        let res =
            test::call_service(&app, test::TestRequest::post().uri("/limited").to_request()).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(res.headers().contains_key("retry-after"));
    }

    #[::core::prelude::v1::test]
    fn test_zero_limit_is_clamped() {
        let limit = RateLimit::new(0, 0).with_prefix("x");
        assert_eq!(limit.max_requests, 1);
        assert_eq!(limit.window_secs, 1);
    }
}

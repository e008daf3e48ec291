use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::rate_limit::{RateLimitResult, RateLimiter};

/// 按客户端 IP 对所有请求限流
#[derive(Clone)]
pub struct RequestRateLimit {
    limiter: RateLimiter,
    limit: u32,
}

const ACTION: &str = "request";

impl RequestRateLimit {
    pub fn new(limiter: RateLimiter, limit: u32) -> Self {
        Self { limiter, limit }
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        let ip = client_ip(&req);
        tracing::debug!("rate limit ip: {}", ip);

        let result = self
            .limiter
            .check_rate_limit(&ip, ACTION, self.limit)
            .await;

        let mut response = if result.allowed {
            next.run(req).await
        } else {
            tracing::info!("Rate limit exceeded for {}", ip);
            AppError::RateLimited {
                retry_after_secs: self.limiter.window().as_secs(),
            }
            .into_response()
        };

        self.write_headers(response.headers_mut(), &result);
        response
    }

    fn write_headers(&self, headers: &mut HeaderMap, result: &RateLimitResult) {
        headers.insert("x-ratelimit-limit", HeaderValue::from(self.limit));
        headers.insert("x-ratelimit-remaining", HeaderValue::from(result.remaining));
        headers.insert("x-ratelimit-reset", HeaderValue::from(result.reset_time));
    }
}

/// 客户端 IP：优先 x-real-ip，其次 x-forwarded-for 的第一个地址，最后使用连接地址
pub fn client_ip<B>(req: &Request<B>) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .filter(|ip| !ip.trim().is_empty())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RequestRateLimit>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}

//! 接口响应缓存中间件
//!
//! 缓存返回 200 的 GET 请求，键为方法和路径（含查询串）的摘要，
//! 存放在 API 响应实体下，默认 300 秒过期。

use axum::{
    body::{Body, HttpBody, to_bytes},
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::CacheStrategy;
use crate::cache::keys::request_fingerprint;
use crate::error::AppError;

/// 超过该大小的响应不缓存
const MAX_CACHED_BODY: usize = 1024 * 1024;

const CACHE_HEADER: &str = "x-cache";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

pub async fn response_cache(
    State(cache): State<CacheStrategy>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let key = request_fingerprint(request.method().as_str(), &path_and_query);

    if let Some(cached) = cache.get_api_response::<CachedResponse>(&key).await {
        debug!(path = %path_and_query, outcome = "hit", "response cache");
        return build_response(cached);
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    // 大小未知或超过上限的响应直接放行，不缓存
    let within_limit = response
        .body()
        .size_hint()
        .upper()
        .is_some_and(|upper| upper <= MAX_CACHED_BODY as u64);
    if !within_limit {
        debug!(path = %path_and_query, outcome = "skip", "response cache");
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_CACHED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("Failed to buffer response for {}: {}", path_and_query, e);
            return AppError::InternalServerError.into_response();
        }
    };

    // 只缓存文本响应
    if let Ok(text) = std::str::from_utf8(&bytes) {
        let cached = CachedResponse {
            status: parts.status.as_u16(),
            headers: parts
                .headers
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
                .collect(),
            body: text.to_string(),
        };
        debug!(path = %path_and_query, outcome = "miss", "response cache");
        cache.cache_api_response(&key, &cached, None).await;
    }

    parts
        .headers
        .insert(CACHE_HEADER, HeaderValue::from_static("MISS"));
    Response::from_parts(parts, Body::from(bytes))
}

fn build_response(cached: CachedResponse) -> Response {
    let mut builder = Response::builder().status(cached.status);

    for (name, value) in cached.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }

    builder
        .header(CACHE_HEADER, "HIT")
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

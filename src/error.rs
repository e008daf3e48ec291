use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::result::ApiResult;

/// 存储层错误，只在缓存管理器内部传递
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("store command timed out after {0}ms")]
    Timeout(u64),
    #[error("store connection closed")]
    Closed,
    #[error("store unavailable")]
    Unavailable,
    #[error("operation against a key holding the wrong kind of value: {0}")]
    WrongType(String),
    #[error("value at {0} is not an integer")]
    NotInteger(String),
}

#[derive(Debug)]
pub enum AppError {
    RateLimited { retry_after_secs: u64 },
    InternalServerError,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!("请求过于频繁，请在{}秒后重试", retry_after_secs),
            ),
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "内部服务器错误".to_string(),
            ),
        };

        let body = Json(ApiResult::<()>::error(
            status.as_u16() as i32,
            &error_message,
        ));

        (status, body).into_response()
    }
}

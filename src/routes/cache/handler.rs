use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::result::ApiResult;

#[derive(Debug, Deserialize)]
pub struct InvalidateTagsRequest {
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InvalidateTagsResponse {
    pub invalidated: bool,
}

/// 缓存后端诊断信息
#[axum::debug_handler]
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.cache.manager().get_stats().await;
    (StatusCode::OK, Json(ApiResult::success(stats)))
}

/// 运维接口：按标签失效缓存
#[axum::debug_handler]
pub async fn invalidate_tags(
    State(state): State<AppState>,
    Json(req): Json<InvalidateTagsRequest>,
) -> impl IntoResponse {
    if req.tags.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResult::<InvalidateTagsResponse>::error(
                StatusCode::BAD_REQUEST.as_u16() as i32,
                "tags must not be empty",
            )),
        );
    }

    let invalidated = state.cache.manager().invalidate_by_tags(&req.tags).await;
    tracing::info!("Invalidated cache tags {:?}: {}", req.tags, invalidated);
    (
        StatusCode::OK,
        Json(ApiResult::success(InvalidateTagsResponse { invalidated })),
    )
}

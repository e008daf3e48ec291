/// 缓存键模块
/// 提供各实体的缓存键生成函数，键格式在进程启动后不再变化

// 用户与会话
pub mod user_keys;

// 租户与功能开关
pub mod tenant_keys;

// 内容、商品、订单、AI 生成结果与接口响应
pub mod content_keys;

pub use content_keys::{
    api_response_key, generation_key, order_key, page_key, page_slug_key, product_key,
    project_key, request_fingerprint,
};
pub use tenant_keys::{feature_flag_key, tenant_content_tag, tenant_key, tenant_slug_key};
pub use user_keys::{session_key, user_email_key, user_key};

/// 速率限制计数器键
pub fn rate_limit_key(identifier: &str, action: &str) -> String {
    format!("rate_limit:{}:{}", identifier, action)
}

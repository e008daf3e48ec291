use sha2::{Digest, Sha256};

const GENERATION_PREFIX: &str = "ai:generation:";
const PROJECT_PREFIX: &str = "builder:project:";
const PAGE_PREFIX: &str = "page:";
const PAGE_SLUG_PREFIX: &str = "page:slug:";
const PRODUCT_PREFIX: &str = "product:";
const ORDER_PREFIX: &str = "order:";
const API_PREFIX: &str = "api:";

pub fn generation_key(generation_id: &str) -> String {
    format!("{}{}", GENERATION_PREFIX, generation_id)
}

pub fn project_key(project_id: &str) -> String {
    format!("{}{}", PROJECT_PREFIX, project_id)
}

pub fn page_key(page_id: &str) -> String {
    format!("{}{}", PAGE_PREFIX, page_id)
}

/// 页面 slug 只在租户内唯一
pub fn page_slug_key(tenant_id: &str, slug: &str) -> String {
    format!("{}{}:{}", PAGE_SLUG_PREFIX, tenant_id, slug)
}

pub fn product_key(product_id: &str) -> String {
    format!("{}{}", PRODUCT_PREFIX, product_id)
}

pub fn order_key(order_id: &str) -> String {
    format!("{}{}", ORDER_PREFIX, order_id)
}

pub fn api_response_key(key: &str) -> String {
    format!("{}{}", API_PREFIX, key)
}

/// 由请求方法和 URI 生成固定长度的接口缓存键
pub fn request_fingerprint(method: &str, path_and_query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b" ");
    hasher.update(path_and_query.as_bytes());
    format!("{:x}", hasher.finalize())
}

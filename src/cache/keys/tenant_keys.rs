const TENANT_PREFIX: &str = "tenant:";
const TENANT_SLUG_PREFIX: &str = "tenant:slug:";
const FEATURE_FLAG_PREFIX: &str = "feature:";

pub fn tenant_key(tenant_id: &str) -> String {
    format!("{}{}", TENANT_PREFIX, tenant_id)
}

pub fn tenant_slug_key(slug: &str) -> String {
    format!("{}{}", TENANT_SLUG_PREFIX, slug)
}

pub fn feature_flag_key(tenant_id: &str, flag: &str) -> String {
    format!("{}{}:{}", FEATURE_FLAG_PREFIX, tenant_id, flag)
}

/// 租户下所有内容共享的失效标签
pub fn tenant_content_tag(tenant_id: &str) -> String {
    format!("{}{}", TENANT_PREFIX, tenant_id)
}

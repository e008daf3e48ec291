use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{CacheStrategy, admits};
use crate::cache::keys::{feature_flag_key, tenant_content_tag, tenant_key, tenant_slug_key};
use crate::cache::models::CachedTenant;
use crate::cache::policy::Entity;

/// 租户与功能开关缓存操作
impl CacheStrategy {
    pub async fn cache_tenant(&self, tenant: &CachedTenant) -> bool {
        if !admits(Entity::Tenant, &tenant.id) {
            return false;
        }
        let stored = self.put(Entity::Tenant, &tenant_key(&tenant.id), tenant).await;
        let indexed = self
            .put_index(Entity::Tenant, &tenant_slug_key(&tenant.slug), &tenant.id)
            .await;
        stored && indexed
    }

    pub async fn get_tenant(&self, tenant_id: &str) -> Option<CachedTenant> {
        if !admits(Entity::Tenant, tenant_id) {
            return None;
        }
        self.cache.get(&tenant_key(tenant_id)).await
    }

    pub async fn get_tenant_by_slug(&self, slug: &str) -> Option<CachedTenant> {
        self.resolve(Entity::Tenant, &tenant_slug_key(slug), tenant_key).await
    }

    pub async fn invalidate_tenant(&self, tenant_id: &str, slugs: &[&str]) -> bool {
        if !admits(Entity::Tenant, tenant_id) {
            return false;
        }
        self.remove(
            tenant_key(tenant_id),
            slugs.iter().map(|slug| tenant_slug_key(slug)),
        )
        .await
    }

    /// 一次性失效租户下的项目、页面、商品和功能开关
    pub async fn invalidate_tenant_content(&self, tenant_id: &str) -> bool {
        self.cache
            .invalidate_by_tags(&[tenant_content_tag(tenant_id)])
            .await
    }

    pub async fn cache_feature_flag<T: Serialize + ?Sized>(
        &self,
        tenant_id: &str,
        flag: &str,
        value: &T,
    ) -> bool {
        self.put_tagged(
            Entity::FeatureFlag,
            &feature_flag_key(tenant_id, flag),
            value,
            &[tenant_content_tag(tenant_id)],
        )
        .await
    }

    pub async fn get_feature_flag<T: DeserializeOwned>(&self, tenant_id: &str, flag: &str) -> Option<T> {
        self.cache.get(&feature_flag_key(tenant_id, flag)).await
    }

    pub async fn invalidate_feature_flag(&self, tenant_id: &str, flag: &str) -> bool {
        self.cache.delete(&feature_flag_key(tenant_id, flag)).await
    }
}

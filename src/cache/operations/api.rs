use serde::Serialize;
use serde::de::DeserializeOwned;

use super::CacheStrategy;
use crate::cache::keys::api_response_key;
use crate::cache::policy::Entity;

/// 通用接口响应缓存操作
impl CacheStrategy {
    /// 未指定过期时间时使用 300 秒
    pub async fn cache_api_response<T: Serialize + ?Sized>(
        &self,
        key: &str,
        response: &T,
        ttl_secs: Option<u64>,
    ) -> bool {
        let ttl = ttl_secs.unwrap_or(Entity::ApiResponse.ttl());
        self.cache
            .set(&api_response_key(key), response, Some(ttl))
            .await
    }

    pub async fn get_api_response<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.cache.get(&api_response_key(key)).await
    }

    pub async fn invalidate_api_response(&self, key: &str) -> bool {
        self.cache.delete(&api_response_key(key)).await
    }
}

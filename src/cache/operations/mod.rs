/// 实体缓存操作
/// 按实体提供 cache_x / get_x / invalidate_x，键和过期时间由策略目录决定

pub mod api;
pub mod commerce;
pub mod content;
pub mod session;
pub mod tenant;
pub mod user;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::manager::CacheManager;
use super::policy::Entity;

#[derive(Clone)]
pub struct CacheStrategy {
    cache: CacheManager,
}

impl CacheStrategy {
    pub fn new(cache: CacheManager) -> Self {
        Self { cache }
    }

    pub fn manager(&self) -> &CacheManager {
        &self.cache
    }

    async fn put<T: Serialize + ?Sized>(&self, entity: Entity, key: &str, value: &T) -> bool {
        self.cache.set(key, value, Some(entity.ttl())).await
    }

    async fn put_tagged<T: Serialize + ?Sized>(
        &self,
        entity: Entity,
        key: &str,
        value: &T,
        tags: &[String],
    ) -> bool {
        self.cache
            .set_with_tags(key, value, tags, Some(entity.ttl()))
            .await
    }

    /// 写入二级索引，值为主键 ID
    async fn put_index(&self, entity: Entity, index_key: &str, id: &str) -> bool {
        self.cache.set(index_key, id, Some(entity.ttl())).await
    }

    /// 二级索引 -> ID -> 主键，两步任意一步未命中都返回 None
    async fn resolve<T: DeserializeOwned>(
        &self,
        entity: Entity,
        index_key: &str,
        primary_key: impl FnOnce(&str) -> String,
    ) -> Option<T> {
        let id: String = self.cache.get(index_key).await?;
        if !admits(entity, &id) {
            return None;
        }
        self.cache.get(&primary_key(&id)).await
    }

    /// 主键和所有二级索引一起删除
    async fn remove(&self, primary: String, secondary: impl IntoIterator<Item = String>) -> bool {
        let mut keys = vec![primary];
        keys.extend(secondary);
        self.cache.delete_many(&keys).await
    }
}

/// 会与二级索引键冲突的 ID 不读写缓存
fn admits(entity: Entity, id: &str) -> bool {
    let admitted = entity.accepts_id(id);
    if !admitted {
        warn!(?entity, id, "Cache id overlaps a secondary index key, skipped");
    }
    admitted
}

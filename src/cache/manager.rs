use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use super::stats::CacheStats;
use super::tags;
use crate::store::{KeyTtl, Store};

/// 缓存管理器
///
/// 在存储客户端之上负责 JSON 序列化、默认过期时间和组合操作。
/// 所有方法都不向调用方返回错误：后端故障被记录日志后转换为
/// None / false / 0 / 空集合，调用方按缓存未命中处理即可。
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn Store>,
    default_ttl: u64,
}

impl CacheManager {
    pub fn new(store: Arc<dyn Store>, default_ttl_secs: u64) -> Self {
        Self {
            store,
            default_ttl: default_ttl_secs,
        }
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    /// 未指定时使用默认值；0 表示不过期
    fn effective_ttl(&self, ttl_secs: Option<u64>) -> Option<u64> {
        match ttl_secs.unwrap_or(self.default_ttl) {
            0 => None,
            ttl => Some(ttl),
        }
    }

    fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Option<String> {
        match serde_json::to_string(value) {
            Ok(json) => Some(json),
            Err(e) => {
                error!("Failed to serialize cache value for {}: {}", key, e);
                None
            }
        }
    }

    fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Failed to deserialize cache value for {}: {}", key, e);
                None
            }
        }
    }

    pub async fn connect(&self) -> bool {
        match self.store.connect().await {
            Ok(()) => true,
            Err(e) => {
                error!("Cache store {} unavailable: {}", self.store.name(), e);
                false
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: Option<u64>,
    ) -> bool {
        let Some(json) = Self::encode(key, value) else {
            return false;
        };
        match self.store.set(key, &json, self.effective_ttl(ttl_secs)).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache set {} failed: {}", key, e);
                false
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(raw)) => {
                debug!(key, outcome = "hit", "cache get");
                Self::decode(key, &raw)
            }
            Ok(None) => {
                debug!(key, outcome = "miss", "cache get");
                None
            }
            Err(e) => {
                warn!("Cache get {} failed: {}", key, e);
                None
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        match self.store.del(&[key.to_string()]).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Cache delete {} failed: {}", key, e);
                false
            }
        }
    }

    /// 批量删除，返回是否全部成功下发
    pub async fn delete_many(&self, keys: &[String]) -> bool {
        match self.store.del(keys).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Cache delete of {} keys failed: {}", keys.len(), e);
                false
            }
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        match self.store.exists(key).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Cache exists {} failed: {}", key, e);
                false
            }
        }
    }

    pub async fn mset<T: Serialize>(&self, entries: &HashMap<String, T>, ttl_secs: Option<u64>) -> bool {
        let mut encoded = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let Some(json) = Self::encode(key, value) else {
                return false;
            };
            encoded.push((key.clone(), json));
        }

        // 与单键 set 不同，批量写入只在显式指定时设置过期时间
        let ttl = ttl_secs.filter(|ttl| *ttl > 0);
        match self.store.mset(&encoded, ttl).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache mset of {} keys failed: {}", encoded.len(), e);
                false
            }
        }
    }

    /// 部分未命中不影响整批结果
    pub async fn mget<T: DeserializeOwned>(&self, keys: &[String]) -> HashMap<String, Option<T>> {
        let values = match self.store.mget(keys).await {
            Ok(values) => values,
            Err(e) => {
                warn!("Cache mget of {} keys failed: {}", keys.len(), e);
                vec![None; keys.len()]
            }
        };

        keys.iter()
            .zip(values)
            .map(|(key, raw)| {
                let value = raw.and_then(|raw| Self::decode(key, &raw));
                (key.clone(), value)
            })
            .collect()
    }

    /// 原子自增；结果为 1（窗口内第一次写入）且指定了 ttl 时设置过期时间
    ///
    /// 之后的自增发现计数器没有过期时间（上次 EXPIRE 失败）时补设，避免计数永不重置。
    pub async fn incr(&self, key: &str, ttl_secs: Option<u64>) -> i64 {
        let count = match self.store.incr(key).await {
            Ok(count) => count,
            Err(e) => {
                warn!("Cache incr {} failed: {}", key, e);
                return 0;
            }
        };

        let Some(ttl) = ttl_secs.filter(|ttl| *ttl > 0) else {
            return count;
        };
        let needs_expiry = count == 1
            || match self.store.ttl(key).await {
                Ok(remaining) => remaining == KeyTtl::Persistent,
                Err(e) => {
                    warn!("Cache ttl {} after incr failed: {}", key, e);
                    false
                }
            };
        if needs_expiry {
            if let Err(e) = self.store.expire(key, ttl).await {
                warn!("Cache expire {} after incr failed: {}", key, e);
            }
        }

        count
    }

    pub async fn decr(&self, key: &str) -> i64 {
        match self.store.decr(key).await {
            Ok(count) => count,
            Err(e) => {
                warn!("Cache decr {} failed: {}", key, e);
                0
            }
        }
    }

    /// 过期时间作用于整个哈希
    pub async fn hset<T: Serialize + ?Sized>(
        &self,
        key: &str,
        field: &str,
        value: &T,
        ttl_secs: Option<u64>,
    ) -> bool {
        let Some(json) = Self::encode(key, value) else {
            return false;
        };
        if let Err(e) = self.store.hset(key, field, &json).await {
            warn!("Cache hset {}.{} failed: {}", key, field, e);
            return false;
        }
        if let Some(ttl) = ttl_secs.filter(|ttl| *ttl > 0) {
            if let Err(e) = self.store.expire(key, ttl).await {
                warn!("Cache expire {} after hset failed: {}", key, e);
                return false;
            }
        }
        true
    }

    pub async fn hget<T: DeserializeOwned>(&self, key: &str, field: &str) -> Option<T> {
        match self.store.hget(key, field).await {
            Ok(raw) => raw.and_then(|raw| Self::decode(key, &raw)),
            Err(e) => {
                warn!("Cache hget {}.{} failed: {}", key, field, e);
                None
            }
        }
    }

    /// 无法解析的字段会被跳过
    pub async fn hgetall<T: DeserializeOwned>(&self, key: &str) -> HashMap<String, T> {
        match self.store.hgetall(key).await {
            Ok(fields) => fields
                .into_iter()
                .filter_map(|(field, raw)| Self::decode(key, &raw).map(|value| (field, value)))
                .collect(),
            Err(e) => {
                warn!("Cache hgetall {} failed: {}", key, e);
                HashMap::new()
            }
        }
    }

    pub async fn hdel(&self, key: &str, field: &str) -> bool {
        match self.store.hdel(key, field).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Cache hdel {}.{} failed: {}", key, field, e);
                false
            }
        }
    }

    /// 先写值再登记标签；两步之间失败时该键只是无法按标签失效，到期后自然消失
    pub async fn set_with_tags<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        tags: &[String],
        ttl_secs: Option<u64>,
    ) -> bool {
        if !self.set(key, value, ttl_secs).await {
            return false;
        }
        match tags::register(self.store.as_ref(), key, tags, self.effective_ttl(ttl_secs)).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache tag registration for {} failed: {}", key, e);
                false
            }
        }
    }

    /// 幂等：不存在或已清空的标签直接返回 true
    pub async fn invalidate_by_tags(&self, tags: &[String]) -> bool {
        match tags::invalidate(self.store.as_ref(), tags).await {
            Ok(removed) => {
                debug!(?tags, removed, "invalidated cache tags");
                true
            }
            Err(e) => {
                warn!("Cache invalidation of tags {:?} failed: {}", tags, e);
                false
            }
        }
    }

    pub async fn get_stats(&self) -> CacheStats {
        match self.store.info().await {
            Ok(info) => CacheStats::from_info(&info),
            Err(e) => {
                warn!("Cache stats unavailable: {}", e);
                CacheStats::default()
            }
        }
    }

    /// 清空整个存储，仅供运维和测试使用
    pub async fn flush_all(&self) -> bool {
        match self.store.flush_all().await {
            Ok(()) => {
                warn!("Cache store {} flushed", self.store.name());
                true
            }
            Err(e) => {
                error!("Cache flush failed: {}", e);
                false
            }
        }
    }

    pub async fn close(&self) {
        self.store.close().await;
    }

    /// 旁路缓存：命中直接返回；未命中时执行 loader 并写入成功结果。
    /// loader 的错误原样返回且不会被缓存。
    pub async fn remember<T, E, F, Fut>(
        &self,
        key: &str,
        ttl_secs: Option<u64>,
        loader: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return Ok(cached);
        }
        let value = loader().await?;
        self.set(key, &value, ttl_secs).await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: u32,
        name: String,
        tags: Vec<String>,
    }

    fn widget(id: u32) -> Widget {
        Widget {
            id,
            name: format!("widget-{}", id),
            tags: vec!["blue".to_string()],
        }
    }

    fn manager() -> (Arc<MemoryStore>, CacheManager) {
        let store = Arc::new(MemoryStore::new());
        let manager = CacheManager::new(store.clone(), 3600);
        (store, manager)
    }

    #[tokio::test]
    async fn set_then_get_returns_equal_value() {
        let (_, cache) = manager();
        assert!(cache.set("widget:1", &widget(1), None).await);
        assert_eq!(cache.get::<Widget>("widget:1").await, Some(widget(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn default_ttl_applies_when_none_given() {
        let (store, cache) = manager();
        cache.set("k", &1, None).await;
        assert_eq!(store.ttl("k").await.expect("ttl"), KeyTtl::Expires(3600));

        cache.set("forever", &1, Some(0)).await;
        assert_eq!(store.ttl("forever").await.expect("ttl"), KeyTtl::Persistent);
        assert!(store.exists("forever").await.expect("exists"));
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let (_, cache) = manager();
        cache.set("short", &"lived", Some(1)).await;
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(cache.get::<String>("short").await, None);
    }

    #[tokio::test]
    async fn malformed_json_reads_as_miss() {
        let (store, cache) = manager();
        store.set("broken", "{not json", None).await.expect("raw set");
        assert_eq!(cache.get::<Widget>("broken").await, None);
    }

    #[tokio::test]
    async fn unserializable_value_fails_write() {
        let (_, cache) = manager();
        let mut bad = HashMap::new();
        bad.insert((1, 2), "tuple keys are not valid json object keys");
        assert!(!cache.set("bad", &bad, None).await);
        assert!(!cache.exists("bad").await);
    }

    #[tokio::test]
    async fn mget_reports_partial_misses() {
        let (_, cache) = manager();
        let mut entries = HashMap::new();
        entries.insert("k1".to_string(), "v1".to_string());
        entries.insert("k3".to_string(), "v3".to_string());
        assert!(cache.mset(&entries, Some(60)).await);

        let keys = vec!["k1".to_string(), "k2".to_string(), "k3".to_string()];
        let found = cache.mget::<String>(&keys).await;

        assert_eq!(found.len(), 3);
        assert_eq!(found["k1"].as_deref(), Some("v1"));
        assert_eq!(found["k2"], None);
        assert_eq!(found["k3"].as_deref(), Some("v3"));
    }

    #[tokio::test(start_paused = true)]
    async fn mset_applies_ttl_to_every_key() {
        let (store, cache) = manager();
        let entries = HashMap::from([("a".to_string(), 1), ("b".to_string(), 2)]);
        cache.mset(&entries, Some(30)).await;
        assert_eq!(store.ttl("a").await.expect("ttl"), KeyTtl::Expires(30));
        assert_eq!(store.ttl("b").await.expect("ttl"), KeyTtl::Expires(30));
    }

    #[tokio::test]
    async fn concurrent_incr_counts_every_call() {
        let (_, cache) = manager();
        let calls = (0..50).map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.incr("hits", Some(60)).await })
        });
        let mut seen_one = 0;
        for handle in calls.collect::<Vec<_>>() {
            if handle.await.expect("task") == 1 {
                seen_one += 1;
            }
        }

        assert_eq!(seen_one, 1);
        assert_eq!(cache.get::<i64>("hits").await, Some(50));
    }

    #[tokio::test(start_paused = true)]
    async fn incr_sets_ttl_only_on_first_increment() {
        let (store, cache) = manager();
        assert_eq!(cache.incr("c", Some(10)).await, 1);
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(cache.incr("c", Some(10)).await, 2);
        assert_eq!(store.ttl("c").await.expect("ttl"), KeyTtl::Expires(6));
        assert_eq!(cache.decr("c").await, 1);
    }

    #[tokio::test]
    async fn hash_fields_round_trip() {
        let (_, cache) = manager();
        assert!(cache.hset("profile:1", "widget", &widget(1), Some(60)).await);
        assert!(cache.hset("profile:1", "other", &widget(2), None).await);

        assert_eq!(
            cache.hget::<Widget>("profile:1", "widget").await,
            Some(widget(1))
        );
        let all = cache.hgetall::<Widget>("profile:1").await;
        assert_eq!(all.len(), 2);
        assert_eq!(all["other"], widget(2));

        assert!(cache.hdel("profile:1", "widget").await);
        assert_eq!(cache.hget::<Widget>("profile:1", "widget").await, None);
    }

    #[tokio::test]
    async fn tag_invalidation_is_idempotent() {
        let (_, cache) = manager();
        let tags = vec!["catalog".to_string()];
        assert!(cache.set_with_tags("p:1", &widget(1), &tags, Some(60)).await);
        assert!(cache.set_with_tags("p:2", &widget(2), &tags, Some(60)).await);
        cache.set("untagged", &widget(3), Some(60)).await;

        assert!(cache.invalidate_by_tags(&tags).await);
        assert_eq!(cache.get::<Widget>("p:1").await, None);
        assert_eq!(cache.get::<Widget>("p:2").await, None);
        assert_eq!(cache.get::<Widget>("untagged").await, Some(widget(3)));

        assert!(cache.invalidate_by_tags(&tags).await);
        assert!(cache.invalidate_by_tags(&["never-used".to_string()]).await);
    }

    #[tokio::test(start_paused = true)]
    async fn tag_still_reaches_persistent_entry_after_short_one_expires() {
        let (_, cache) = manager();
        let tags = vec!["catalog".to_string()];
        assert!(cache.set_with_tags("forever", &1, &tags, Some(0)).await);
        assert!(cache.set_with_tags("short", &2, &tags, Some(60)).await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.invalidate_by_tags(&tags).await);
        assert_eq!(cache.get::<i32>("forever").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn tag_reaches_persistent_entry_registered_after_short_one() {
        let (_, cache) = manager();
        let tags = vec!["catalog".to_string()];
        assert!(cache.set_with_tags("short", &2, &tags, Some(60)).await);
        assert!(cache.set_with_tags("forever", &1, &tags, Some(0)).await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.invalidate_by_tags(&tags).await);
        assert_eq!(cache.get::<i32>("forever").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn incr_restores_missing_window_expiry() {
        let (store, cache) = manager();
        // 计数器已存在但没有过期时间，相当于首次 EXPIRE 丢失
        store.incr("hits").await.expect("incr");

        assert_eq!(cache.incr("hits", Some(60)).await, 2);
        assert_eq!(store.ttl("hits").await.expect("ttl"), KeyTtl::Expires(60));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.incr("hits", Some(60)).await, 1);
    }

    #[tokio::test]
    async fn unavailable_store_degrades_to_empty_results() {
        let (store, cache) = manager();
        cache.set("k", &1, None).await;
        store.set_available(false);

        assert!(!cache.connect().await);
        assert!(!cache.set("k", &2, None).await);
        assert_eq!(cache.get::<i32>("k").await, None);
        assert!(!cache.delete("k").await);
        assert!(!cache.exists("k").await);
        assert_eq!(cache.incr("n", Some(5)).await, 0);
        assert_eq!(cache.decr("n").await, 0);
        assert!(!cache.hset("h", "f", &1, None).await);
        assert!(cache.hgetall::<i32>("h").await.is_empty());
        assert!(!cache.invalidate_by_tags(&["t".to_string()]).await);
        assert!(!cache.flush_all().await);
        assert_eq!(cache.get_stats().await, CacheStats::default());

        let keys = vec!["k".to_string(), "j".to_string()];
        let found = cache.mget::<i32>(&keys).await;
        assert_eq!(found.len(), 2);
        assert!(found.values().all(Option::is_none));

        store.set_available(true);
        assert_eq!(cache.get::<i32>("k").await, Some(1));
    }

    #[tokio::test]
    async fn remember_loads_once_and_skips_errors() {
        let (_, cache) = manager();

        let first: Result<Widget, String> =
            cache.remember("w", None, || async { Ok(widget(7)) }).await;
        assert_eq!(first, Ok(widget(7)));

        let second: Result<Widget, String> = cache
            .remember("w", None, || async { Err("loader should not run".to_string()) })
            .await;
        assert_eq!(second, Ok(widget(7)));

        let failed: Result<Widget, String> = cache
            .remember("missing", None, || async { Err("db down".to_string()) })
            .await;
        assert_eq!(failed, Err("db down".to_string()));
        assert!(!cache.exists("missing").await);
    }

    #[tokio::test]
    async fn flush_all_and_close() {
        let (store, cache) = manager();
        cache.set("a", &1, None).await;
        assert!(cache.flush_all().await);
        assert!(store.is_empty().await);

        cache.close().await;
        assert!(!cache.set("a", &1, None).await);
    }
}

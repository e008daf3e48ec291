use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;

use super::{KeyTtl, Store, StoreResult};
use crate::error::StoreError;

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Default)]
struct Keyspace {
    slots: HashMap<String, Slot>,
}

impl Keyspace {
    /// 惰性过期：访问时发现已过期就移除
    fn live(&mut self, key: &str) -> Option<&mut Slot> {
        let now = Instant::now();
        if self.slots.get(key).is_some_and(|slot| slot.is_expired(now)) {
            self.slots.remove(key);
        }
        self.slots.get_mut(key)
    }

    fn purge_expired(&mut self) {
        let now = Instant::now();
        self.slots.retain(|_, slot| !slot.is_expired(now));
    }

    fn add(&mut self, key: &str, delta: i64) -> StoreResult<i64> {
        let current = match self.live(key) {
            Some(Slot {
                value: Value::Str(raw),
                ..
            }) => raw
                .parse::<i64>()
                .map_err(|_| StoreError::NotInteger(key.to_string()))?,
            Some(_) => return Err(StoreError::WrongType(key.to_string())),
            None => 0,
        };
        let next = current + delta;
        match self.live(key) {
            // 与 Redis 一致，INCR 保留原有过期时间
            Some(slot) => slot.value = Value::Str(next.to_string()),
            None => {
                self.slots
                    .insert(key.to_string(), Slot::new(Value::Str(next.to_string())));
            }
        }
        Ok(next)
    }
}

fn deadline(ttl_secs: u64) -> Instant {
    Instant::now() + Duration::from_secs(ttl_secs)
}

/// 进程内存储
///
/// 语义与 Redis 命令保持一致（字符串、哈希、集合、计数器、过期时间），
/// 用于测试和本地开发。`set_available(false)` 可以模拟后端不可用。
#[derive(Default)]
pub struct MemoryStore {
    keyspace: Mutex<Keyspace>,
    unavailable: AtomicBool,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::Release);
    }

    fn check(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        if self.unavailable.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }

    /// 当前未过期的键数量
    pub async fn len(&self) -> usize {
        let mut keyspace = self.keyspace.lock().await;
        keyspace.purge_expired();
        keyspace.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn connect(&self) -> StoreResult<()> {
        self.check()
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check()?;
        let mut keyspace = self.keyspace.lock().await;
        match keyspace.live(key) {
            Some(Slot {
                value: Value::Str(raw),
                ..
            }) => Ok(Some(raw.clone())),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> StoreResult<()> {
        self.check()?;
        let mut slot = Slot::new(Value::Str(value.to_string()));
        slot.expires_at = ttl_secs.map(deadline);
        self.keyspace
            .lock()
            .await
            .slots
            .insert(key.to_string(), slot);
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        self.check()?;
        let mut keyspace = self.keyspace.lock().await;
        Ok(keys
            .iter()
            .map(|key| match keyspace.live(key) {
                Some(Slot {
                    value: Value::Str(raw),
                    ..
                }) => Some(raw.clone()),
                // MGET 对非字符串类型返回 nil
                _ => None,
            })
            .collect())
    }

    async fn mset(&self, entries: &[(String, String)], ttl_secs: Option<u64>) -> StoreResult<()> {
        self.check()?;
        let mut keyspace = self.keyspace.lock().await;
        for (key, value) in entries {
            let mut slot = Slot::new(Value::Str(value.clone()));
            slot.expires_at = ttl_secs.map(deadline);
            keyspace.slots.insert(key.clone(), slot);
        }
        Ok(())
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> StoreResult<bool> {
        self.check()?;
        let mut keyspace = self.keyspace.lock().await;
        match keyspace.live(key) {
            Some(slot) => {
                slot.expires_at = Some(deadline(ttl_secs));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl> {
        self.check()?;
        let mut keyspace = self.keyspace.lock().await;
        let now = Instant::now();
        Ok(match keyspace.live(key) {
            None => KeyTtl::Missing,
            Some(Slot { expires_at: None, .. }) => KeyTtl::Persistent,
            Some(Slot {
                expires_at: Some(at),
                ..
            }) => KeyTtl::Expires(at.saturating_duration_since(now).as_secs_f64().ceil() as u64),
        })
    }

    async fn persist(&self, key: &str) -> StoreResult<bool> {
        self.check()?;
        let mut keyspace = self.keyspace.lock().await;
        Ok(keyspace
            .live(key)
            .and_then(|slot| slot.expires_at.take())
            .is_some())
    }

    async fn del(&self, keys: &[String]) -> StoreResult<u64> {
        self.check()?;
        let mut keyspace = self.keyspace.lock().await;
        let mut removed = 0;
        for key in keys {
            if keyspace.live(key).is_some() {
                keyspace.slots.remove(key);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.check()?;
        Ok(self.keyspace.lock().await.live(key).is_some())
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        self.check()?;
        self.keyspace.lock().await.add(key, 1)
    }

    async fn decr(&self, key: &str) -> StoreResult<i64> {
        self.check()?;
        self.keyspace.lock().await.add(key, -1)
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        self.check()?;
        let mut keyspace = self.keyspace.lock().await;
        match keyspace.live(key) {
            Some(Slot {
                value: Value::Hash(fields),
                ..
            }) => {
                fields.insert(field.to_string(), value.to_string());
            }
            Some(_) => return Err(StoreError::WrongType(key.to_string())),
            None => {
                let fields = HashMap::from([(field.to_string(), value.to_string())]);
                keyspace
                    .slots
                    .insert(key.to_string(), Slot::new(Value::Hash(fields)));
            }
        }
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        self.check()?;
        let mut keyspace = self.keyspace.lock().await;
        match keyspace.live(key) {
            Some(Slot {
                value: Value::Hash(fields),
                ..
            }) => Ok(fields.get(field).cloned()),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(None),
        }
    }

    async fn hgetall(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        self.check()?;
        let mut keyspace = self.keyspace.lock().await;
        match keyspace.live(key) {
            Some(Slot {
                value: Value::Hash(fields),
                ..
            }) => Ok(fields.clone()),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(HashMap::new()),
        }
    }

    async fn hdel(&self, key: &str, field: &str) -> StoreResult<bool> {
        self.check()?;
        let mut keyspace = self.keyspace.lock().await;
        let (removed, now_empty) = match keyspace.live(key) {
            Some(Slot {
                value: Value::Hash(fields),
                ..
            }) => {
                let removed = fields.remove(field).is_some();
                (removed, fields.is_empty())
            }
            Some(_) => return Err(StoreError::WrongType(key.to_string())),
            None => (false, false),
        };
        // 最后一个字段被删除时整个键消失
        if now_empty {
            keyspace.slots.remove(key);
        }
        Ok(removed)
    }

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<()> {
        self.check()?;
        let mut keyspace = self.keyspace.lock().await;
        match keyspace.live(key) {
            Some(Slot {
                value: Value::Set(members),
                ..
            }) => {
                members.insert(member.to_string());
            }
            Some(_) => return Err(StoreError::WrongType(key.to_string())),
            None => {
                let members = HashSet::from([member.to_string()]);
                keyspace
                    .slots
                    .insert(key.to_string(), Slot::new(Value::Set(members)));
            }
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>> {
        self.check()?;
        let mut keyspace = self.keyspace.lock().await;
        match keyspace.live(key) {
            Some(Slot {
                value: Value::Set(members),
                ..
            }) => Ok(members.iter().cloned().collect()),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn flush_all(&self) -> StoreResult<()> {
        self.check()?;
        self.keyspace.lock().await.slots.clear();
        Ok(())
    }

    async fn info(&self) -> StoreResult<String> {
        self.check()?;
        let mut keyspace = self.keyspace.lock().await;
        keyspace.purge_expired();
        let keys = keyspace.slots.len();
        let expires = keyspace
            .slots
            .values()
            .filter(|slot| slot.expires_at.is_some())
            .count();

        let mut info = String::from("# Server\r\nuptime_in_seconds:0\r\n");
        info.push_str("# Clients\r\nconnected_clients:1\r\n");
        info.push_str("# Memory\r\nused_memory_human:n/a\r\n");
        info.push_str("# Keyspace\r\n");
        if keys > 0 {
            info.push_str(&format!("db0:keys={},expires={},avg_ttl=0\r\n", keys, expires));
        }
        Ok(info)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        info!("Memory store closed");
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn keys_expire_after_ttl() {
        let store = MemoryStore::new();
        store.set("k", "v", Some(1)).await.expect("set");
        assert_eq!(store.get("k").await.expect("get").as_deref(), Some("v"));

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert_eq!(store.get("k").await.expect("get"), None);
        assert!(!store.exists("k").await.expect("exists"));
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_distinguishes_missing_from_persistent() {
        let store = MemoryStore::new();
        store.set("forever", "1", None).await.expect("set");
        store.set("short", "2", Some(30)).await.expect("set");

        assert_eq!(store.ttl("absent").await.expect("ttl"), KeyTtl::Missing);
        assert_eq!(store.ttl("forever").await.expect("ttl"), KeyTtl::Persistent);
        assert_eq!(store.ttl("short").await.expect("ttl"), KeyTtl::Expires(30));

        assert!(store.persist("short").await.expect("persist"));
        assert!(!store.persist("short").await.expect("persist"));
        assert!(!store.persist("absent").await.expect("persist"));
        assert_eq!(store.ttl("short").await.expect("ttl"), KeyTtl::Persistent);
    }

    #[tokio::test(start_paused = true)]
    async fn incr_keeps_existing_expiry() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("counter").await.expect("incr"), 1);
        assert!(store.expire("counter", 10).await.expect("expire"));
        assert_eq!(store.incr("counter").await.expect("incr"), 2);

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(store.incr("counter").await.expect("incr"), 1);
    }

    #[tokio::test]
    async fn incr_on_non_numeric_value_fails() {
        let store = MemoryStore::new();
        store.set("k", "\"text\"", None).await.expect("set");
        assert!(matches!(
            store.incr("k").await,
            Err(StoreError::NotInteger(_))
        ));
    }

    #[tokio::test]
    async fn wrong_type_is_reported() {
        let store = MemoryStore::new();
        store.sadd("members", "a").await.expect("sadd");
        assert!(matches!(
            store.get("members").await,
            Err(StoreError::WrongType(_))
        ));
        assert_eq!(
            store.mget(&["members".to_string()]).await.expect("mget"),
            vec![None]
        );
    }

    #[tokio::test]
    async fn removing_last_hash_field_removes_key() {
        let store = MemoryStore::new();
        store.hset("h", "a", "1").await.expect("hset");
        assert!(store.hdel("h", "a").await.expect("hdel"));
        assert!(!store.hdel("h", "a").await.expect("hdel"));
        assert!(!store.exists("h").await.expect("exists"));
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_command() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert!(matches!(store.get("k").await, Err(StoreError::Unavailable)));
        assert!(matches!(store.incr("k").await, Err(StoreError::Unavailable)));

        store.set_available(true);
        assert_eq!(store.get("k").await.expect("get"), None);
    }

    #[tokio::test]
    async fn info_reports_keyspace() {
        let store = MemoryStore::new();
        store.set("a", "1", Some(60)).await.expect("set");
        store.set("b", "2", None).await.expect("set");

        let info = store.info().await.expect("info");
        assert!(info.contains("db0:keys=2,expires=1"));
    }
}

/// 后端存储客户端
/// 对键值存储的原始命令做一层异步抽象，缓存管理器只依赖这个 trait
pub mod memory;
pub mod redis_store;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// TTL 查询结果，区分键不存在和没有过期时间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    Missing,
    Persistent,
    Expires(u64),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// 建立连接；已有可用连接时直接返回
    async fn connect(&self) -> StoreResult<()>;

    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> StoreResult<()>;

    /// 批量读取，结果与 keys 顺序一致
    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>>;

    /// 批量写入，并为每个键设置相同的过期时间
    async fn mset(&self, entries: &[(String, String)], ttl_secs: Option<u64>) -> StoreResult<()>;

    async fn expire(&self, key: &str, ttl_secs: u64) -> StoreResult<bool>;

    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl>;

    /// 去掉过期时间；键存在且原本有过期时间时返回 true
    async fn persist(&self, key: &str) -> StoreResult<bool>;

    /// 返回实际删除的键数量
    async fn del(&self, keys: &[String]) -> StoreResult<u64>;

    async fn exists(&self, key: &str) -> StoreResult<bool>;

    async fn incr(&self, key: &str) -> StoreResult<i64>;

    async fn decr(&self, key: &str) -> StoreResult<i64>;

    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()>;

    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>>;

    async fn hgetall(&self, key: &str) -> StoreResult<HashMap<String, String>>;

    async fn hdel(&self, key: &str, field: &str) -> StoreResult<bool>;

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<()>;

    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>>;

    async fn flush_all(&self) -> StoreResult<()>;

    /// 服务端 INFO 文本
    async fn info(&self) -> StoreResult<String>;

    async fn close(&self);

    fn name(&self) -> &'static str;
}

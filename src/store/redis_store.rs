use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client as RedisClient, RedisResult};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::{KeyTtl, Store, StoreResult};
use crate::error::StoreError;

/// Redis 存储
///
/// 进程内只持有一条多路复用连接，由各请求共享。命令失败且连接已断开时丢弃连接，
/// 下一次调用会重新建立。
pub struct RedisStore {
    client: RedisClient,
    conn: Mutex<Option<MultiplexedConnection>>,
    closed: AtomicBool,
    command_timeout: Duration,
}

impl RedisStore {
    pub fn new(redis_url: &str, command_timeout: Duration) -> Result<Self, StoreError> {
        let client = RedisClient::open(redis_url)?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
            closed: AtomicBool::new(false),
            command_timeout,
        })
    }

    fn timeout_ms(&self) -> u64 {
        self.command_timeout.as_millis() as u64
    }

    async fn connection(&self) -> StoreResult<MultiplexedConnection> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }

        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = match timeout(
            self.command_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                error!("Failed to connect to Redis: {}", e);
                return Err(e.into());
            }
            Err(_) => {
                error!("Timed out connecting to Redis");
                return Err(StoreError::Timeout(self.timeout_ms()));
            }
        };

        info!("Redis connection ready");
        *guard = Some(conn.clone());
        Ok(conn)
    }

    async fn reset(&self) {
        if self.conn.lock().await.take().is_some() {
            warn!("Redis connection dropped, will reconnect on next command");
        }
    }

    async fn run<T, F, Fut>(&self, command: &'static str, f: F) -> StoreResult<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut + Send,
        Fut: Future<Output = RedisResult<T>> + Send,
    {
        let conn = self.connection().await?;
        match timeout(self.command_timeout, f(conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!("Redis {} failed: {}", command, e);
                if e.is_connection_dropped() || e.is_io_error() {
                    self.reset().await;
                }
                Err(e.into())
            }
            Err(_) => {
                error!("Redis {} timed out", command);
                self.reset().await;
                Err(StoreError::Timeout(self.timeout_ms()))
            }
        }
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn connect(&self) -> StoreResult<()> {
        self.connection().await.map(|_| ())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.run("GET", |mut conn| async move {
            conn.get::<_, Option<String>>(key).await
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> StoreResult<()> {
        self.run("SET", |mut conn| async move {
            match ttl_secs {
                Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl).await,
                None => conn.set::<_, _, ()>(key, value).await,
            }
        })
        .await
    }

    async fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        self.run("MGET", |mut conn| async move {
            let values: Vec<Option<String>> =
                redis::cmd("MGET").arg(keys).query_async(&mut conn).await?;
            Ok(values)
        })
        .await
    }

    async fn mset(&self, entries: &[(String, String)], ttl_secs: Option<u64>) -> StoreResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.run("MSET", |mut conn| async move {
            // MULTI/EXEC，写入与过期一起提交
            let mut pipe = redis::pipe();
            pipe.atomic().cmd("MSET").arg(entries).ignore();
            if let Some(ttl) = ttl_secs {
                for (key, _) in entries {
                    pipe.cmd("EXPIRE").arg(key).arg(ttl).ignore();
                }
            }
            let _: () = pipe.query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> StoreResult<bool> {
        self.run("EXPIRE", |mut conn| async move {
            let applied: bool = redis::cmd("EXPIRE")
                .arg(key)
                .arg(ttl_secs)
                .query_async(&mut conn)
                .await?;
            Ok(applied)
        })
        .await
    }

    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl> {
        self.run("TTL", |mut conn| async move {
            let remaining: i64 = conn.ttl(key).await?;
            Ok(match remaining {
                -2 => KeyTtl::Missing,
                remaining if remaining < 0 => KeyTtl::Persistent,
                remaining => KeyTtl::Expires(remaining as u64),
            })
        })
        .await
    }

    async fn persist(&self, key: &str) -> StoreResult<bool> {
        self.run("PERSIST", |mut conn| async move {
            conn.persist::<_, bool>(key).await
        })
        .await
    }

    async fn del(&self, keys: &[String]) -> StoreResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.run("DEL", |mut conn| async move {
            conn.del::<_, u64>(keys).await
        })
        .await
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.run("EXISTS", |mut conn| async move {
            conn.exists::<_, bool>(key).await
        })
        .await
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        self.run("INCR", |mut conn| async move {
            conn.incr::<_, _, i64>(key, 1).await
        })
        .await
    }

    async fn decr(&self, key: &str) -> StoreResult<i64> {
        self.run("DECR", |mut conn| async move {
            conn.decr::<_, _, i64>(key, 1).await
        })
        .await
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        self.run("HSET", |mut conn| async move {
            conn.hset::<_, _, _, ()>(key, field, value).await
        })
        .await
    }

    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        self.run("HGET", |mut conn| async move {
            conn.hget::<_, _, Option<String>>(key, field).await
        })
        .await
    }

    async fn hgetall(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        self.run("HGETALL", |mut conn| async move {
            conn.hgetall::<_, HashMap<String, String>>(key).await
        })
        .await
    }

    async fn hdel(&self, key: &str, field: &str) -> StoreResult<bool> {
        self.run("HDEL", |mut conn| async move {
            let removed: i64 = conn.hdel(key, field).await?;
            Ok(removed > 0)
        })
        .await
    }

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<()> {
        self.run("SADD", |mut conn| async move {
            conn.sadd::<_, _, ()>(key, member).await
        })
        .await
    }

    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>> {
        self.run("SMEMBERS", |mut conn| async move {
            conn.smembers::<_, Vec<String>>(key).await
        })
        .await
    }

    async fn flush_all(&self) -> StoreResult<()> {
        self.run("FLUSHALL", |mut conn| async move {
            let _: () = redis::cmd("FLUSHALL").query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    async fn info(&self) -> StoreResult<String> {
        self.run("INFO", |mut conn| async move {
            let info: String = redis::cmd("INFO").query_async(&mut conn).await?;
            Ok(info)
        })
        .await
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if self.conn.lock().await.take().is_some() {
            info!("Redis connection closed");
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

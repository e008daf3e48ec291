use std::sync::Arc;

use config::{Config, StoreBackend};
use store::{MemoryStore, RedisStore, Store};

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod rate_limit;
pub mod result;
pub mod routes;
pub mod store;

use cache::{CacheManager, CacheStrategy};
use error::StoreError;
use rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub cache: CacheStrategy,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// 按配置创建存储并组装缓存与限流组件
    pub fn from_config(config: Config) -> Result<Self, StoreError> {
        let store: Arc<dyn Store> = match config.store_backend {
            StoreBackend::Redis => Arc::new(RedisStore::new(
                &config.redis_url(),
                config.command_timeout(),
            )?),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn Store>) -> Self {
        let manager = CacheManager::new(store, config.default_ttl_secs);
        let rate_limiter = RateLimiter::new(manager.clone(), config.rate_limit_window());
        Self {
            cache: CacheStrategy::new(manager),
            rate_limiter,
            config,
        }
    }
}

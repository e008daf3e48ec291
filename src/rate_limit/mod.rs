use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::CacheManager;
use crate::cache::keys::rate_limit_key;

/// 一次限流检查的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    /// 毫秒时间戳
    pub reset_time: i64,
}

/// 固定窗口限流器
///
/// 每个 (identifier, action) 一个计数器键，窗口内第一次自增时设置过期时间，
/// 过期后计数自然归零。依赖存储的原子自增，并发调用中只有一个会看到计数 1。
#[derive(Clone)]
pub struct RateLimiter {
    cache: CacheManager,
    window: Duration,
}

impl RateLimiter {
    pub fn new(cache: CacheManager, window: Duration) -> Self {
        Self { cache, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub async fn check_rate_limit(&self, identifier: &str, action: &str, limit: u32) -> RateLimitResult {
        let key = rate_limit_key(identifier, action);
        let count = self.cache.incr(&key, Some(self.window.as_secs().max(1))).await;
        let reset_time = chrono::Utc::now().timestamp_millis() + self.window.as_millis() as i64;

        // 计数器不可用时放行
        if count <= 0 {
            warn!("Rate limit counter {} unavailable, allowing request", key);
            return RateLimitResult {
                allowed: true,
                remaining: limit,
                reset_time,
            };
        }

        let allowed = count <= i64::from(limit);
        let remaining = (i64::from(limit) - count).max(0) as u32;
        if !allowed {
            debug!(identifier, action, count, limit, "rate limit exceeded");
        }

        RateLimitResult {
            allowed,
            remaining,
            reset_time,
        }
    }
}

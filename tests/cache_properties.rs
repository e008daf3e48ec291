//! End-to-end cache properties over the in-process store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cache_layer::cache::{CacheManager, CacheStrategy, CachedTenant, CachedUser};
use cache_layer::rate_limit::RateLimiter;
use cache_layer::store::MemoryStore;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Session {
    user_id: String,
    roles: Vec<String>,
    expires_at: i64,
}

fn setup() -> (Arc<MemoryStore>, CacheManager, CacheStrategy) {
    let store = Arc::new(MemoryStore::new());
    let manager = CacheManager::new(store.clone(), 3600);
    let strategy = CacheStrategy::new(manager.clone());
    (store, manager, strategy)
}

#[tokio::test]
async fn nested_values_round_trip() {
    let (_, cache, _) = setup();
    let value = json!({
        "id": 7,
        "name": "dashboard",
        "widgets": [{"kind": "chart", "series": [1, 2, 3]}, {"kind": "table"}],
        "owner": null,
        "ratio": 0.25
    });

    assert!(cache.set("dashboard:7", &value, None).await);
    assert_eq!(cache.get::<serde_json::Value>("dashboard:7").await, Some(value));
}

#[tokio::test(start_paused = true)]
async fn entries_vanish_after_their_ttl() {
    let (_, cache, _) = setup();
    cache.set("short", &"lived", Some(1)).await;
    assert!(cache.exists("short").await);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(cache.get::<String>("short").await, None);
}

#[tokio::test]
async fn tag_invalidation_then_repeat_is_noop() {
    let (_, cache, _) = setup();
    let tags = vec!["T".to_string()];
    assert!(cache.set_with_tags("K", &json!({"v": 1}), &tags, None).await);

    assert!(cache.invalidate_by_tags(&tags).await);
    assert_eq!(cache.get::<serde_json::Value>("K").await, None);
    assert!(cache.invalidate_by_tags(&tags).await);
}

#[tokio::test]
async fn entry_deleted_directly_stays_harmless_in_tag_set() {
    let (_, cache, _) = setup();
    let tags = vec!["reports".to_string()];
    cache.set_with_tags("report:1", &1, &tags, Some(60)).await;
    cache.set_with_tags("report:2", &2, &tags, Some(60)).await;

    // 直接删除不会清理标签集合，后续按标签失效仍然正常
    assert!(cache.delete("report:1").await);
    assert!(cache.invalidate_by_tags(&tags).await);
    assert_eq!(cache.get::<i32>("report:2").await, None);
}

#[tokio::test]
async fn concurrent_increments_are_exact() {
    let (_, cache, _) = setup();
    let tasks: Vec<_> = (0..100)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.incr("fresh", None).await })
        })
        .collect();
    for task in tasks {
        task.await.expect("incr task");
    }

    assert_eq!(cache.get::<i64>("fresh").await, Some(100));
}

#[tokio::test]
async fn login_limit_allows_five_then_denies() {
    let (_, cache, _) = setup();
    let limiter = RateLimiter::new(cache, Duration::from_secs(60));

    let mut remaining = Vec::new();
    for call in 1..=6 {
        let result = limiter.check_rate_limit("user1", "login", 5).await;
        assert_eq!(result.allowed, call <= 5, "call {}", call);
        remaining.push(result.remaining);
    }
    assert_eq!(remaining, vec![4, 3, 2, 1, 0, 0]);
}

#[tokio::test]
async fn mget_keeps_missing_keys_as_none() {
    let (_, cache, _) = setup();
    cache.set("K1", &"v1", None).await;
    cache.set("K3", &"v3", None).await;

    let keys = vec!["K1".to_string(), "K2".to_string(), "K3".to_string()];
    let found: HashMap<String, Option<String>> = cache.mget(&keys).await;

    let expected = HashMap::from([
        ("K1".to_string(), Some("v1".to_string())),
        ("K2".to_string(), None),
        ("K3".to_string(), Some("v3".to_string())),
    ]);
    assert_eq!(found, expected);
}

#[tokio::test]
async fn invalidate_user_clears_email_lookup() {
    let (_, cache, strategy) = setup();
    strategy
        .cache_user(&CachedUser::new("42", "grace@example.com").with("role", "admin"))
        .await;
    assert!(strategy.get_user_by_email("grace@example.com").await.is_some());

    assert!(strategy.invalidate_user("42", &["grace@example.com"]).await);
    assert!(!cache.exists("user:42").await);
    assert!(!cache.exists("user:email:grace@example.com").await);
    assert_eq!(strategy.get_user_by_email("grace@example.com").await, None);
}

#[tokio::test(start_paused = true)]
async fn tenant_slug_indirection_and_expected_staleness() {
    let (store, cache, strategy) = setup();
    let tenant = CachedTenant::new("t1", "acme");
    assert!(strategy.cache_tenant(&tenant).await);

    assert_eq!(strategy.get_tenant_by_slug("acme").await, Some(tenant));
    assert_eq!(
        cache_layer::store::Store::ttl(store.as_ref(), "tenant:t1")
            .await
            .expect("ttl"),
        cache_layer::store::KeyTtl::Expires(7200)
    );

    // 绕过 invalidate_tenant 直接删除主键：slug 索引仍存在但解析结果为 None。
    // 这是预期的陈旧状态，不会返回错误数据。
    cache.delete("tenant:t1").await;
    assert!(cache.exists("tenant:slug:acme").await);
    assert_eq!(strategy.get_tenant_by_slug("acme").await, None);
}

#[tokio::test(start_paused = true)]
async fn sessions_last_a_day() {
    let (_, _, strategy) = setup();
    let session = Session {
        user_id: "42".to_string(),
        roles: vec!["editor".to_string()],
        expires_at: 1_900_000_000,
    };
    assert!(strategy.cache_session("s1", &session).await);
    assert_eq!(strategy.get_session::<Session>("s1").await, Some(session));

    tokio::time::advance(Duration::from_secs(86_399)).await;
    assert!(strategy.get_session::<Session>("s1").await.is_some());
    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(strategy.get_session::<Session>("s1").await, None);

    assert!(strategy.invalidate_session("s1").await);
}

#[tokio::test]
async fn outage_looks_like_a_miss_to_callers() {
    let (store, cache, strategy) = setup();
    strategy.cache_user(&CachedUser::new("1", "a@b.c")).await;
    store.set_available(false);

    assert_eq!(strategy.get_user("1").await, None);
    assert_eq!(strategy.get_user_by_email("a@b.c").await, None);
    assert!(!strategy.cache_tenant(&CachedTenant::new("t1", "acme")).await);

    let loaded: Result<u32, std::io::Error> = cache.remember("expensive", None, || async { Ok(9) }).await;
    assert_eq!(loaded.expect("loader result"), 9);
}

//! 标签索引
//! 每个标签对应一个集合，保存带该标签写入的缓存键，仅由 CacheManager 使用
use futures_util::future::try_join_all;

use crate::store::{KeyTtl, Store, StoreResult};

const TAG_PREFIX: &str = "tag:";

pub(crate) fn tag_key(tag: &str) -> String {
    format!("{}{}", TAG_PREFIX, tag)
}

/// 把 key 登记到每个标签的成员集合
///
/// 成员集合的过期时间只会延长不会缩短，保证不早于其中最长寿的缓存项失效；
/// 登记永不过期的缓存项时集合也改为永不过期。
pub(crate) async fn register(
    store: &dyn Store,
    key: &str,
    tags: &[String],
    ttl_secs: Option<u64>,
) -> StoreResult<()> {
    for tag in tags {
        let members_key = tag_key(tag);
        // 先查再写：新建的集合需要设置过期时间，已永久的集合保持不变
        let current = store.ttl(&members_key).await?;
        store.sadd(&members_key, key).await?;

        match (ttl_secs, current) {
            (None, KeyTtl::Expires(_)) => {
                store.persist(&members_key).await?;
            }
            (Some(ttl), KeyTtl::Missing) => {
                store.expire(&members_key, ttl).await?;
            }
            (Some(ttl), KeyTtl::Expires(remaining)) if remaining < ttl => {
                store.expire(&members_key, ttl).await?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// 删除标签下的所有缓存键以及标签集合本身，返回删除的缓存键数量
///
/// 各标签并发处理，任一标签失败即返回错误。
pub(crate) async fn invalidate(store: &dyn Store, tags: &[String]) -> StoreResult<u64> {
    let removed = try_join_all(tags.iter().map(|tag| invalidate_one(store, tag))).await?;
    Ok(removed.into_iter().sum())
}

async fn invalidate_one(store: &dyn Store, tag: &str) -> StoreResult<u64> {
    let members_key = tag_key(tag);
    let members = store.smembers(&members_key).await?;
    let mut removed = 0;
    if !members.is_empty() {
        removed = store.del(&members).await?;
    }
    store.del(&[members_key]).await?;
    Ok(removed)
}

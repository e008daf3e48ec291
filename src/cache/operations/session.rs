use serde::Serialize;
use serde::de::DeserializeOwned;

use super::CacheStrategy;
use crate::cache::keys::session_key;
use crate::cache::policy::Entity;

/// 会话缓存操作
impl CacheStrategy {
    pub async fn cache_session<T: Serialize + ?Sized>(&self, session_id: &str, session: &T) -> bool {
        self.put(Entity::Session, &session_key(session_id), session)
            .await
    }

    pub async fn get_session<T: DeserializeOwned>(&self, session_id: &str) -> Option<T> {
        self.cache.get(&session_key(session_id)).await
    }

    pub async fn invalidate_session(&self, session_id: &str) -> bool {
        self.cache.delete(&session_key(session_id)).await
    }
}

use super::{CacheStrategy, admits};
use crate::cache::keys::{user_email_key, user_key};
use crate::cache::models::CachedUser;
use crate::cache::policy::Entity;

/// 用户缓存操作
impl CacheStrategy {
    /// 缓存用户并写入邮箱索引
    pub async fn cache_user(&self, user: &CachedUser) -> bool {
        if !admits(Entity::User, &user.id) {
            return false;
        }
        let stored = self.put(Entity::User, &user_key(&user.id), user).await;
        let indexed = self
            .put_index(Entity::User, &user_email_key(&user.email), &user.id)
            .await;
        stored && indexed
    }

    pub async fn get_user(&self, user_id: &str) -> Option<CachedUser> {
        if !admits(Entity::User, user_id) {
            return None;
        }
        self.cache.get(&user_key(user_id)).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Option<CachedUser> {
        self.resolve(Entity::User, &user_email_key(email), user_key).await
    }

    /// 邮箱变更时传入旧邮箱，避免旧索引残留
    pub async fn invalidate_user(&self, user_id: &str, emails: &[&str]) -> bool {
        if !admits(Entity::User, user_id) {
            return false;
        }
        self.remove(
            user_key(user_id),
            emails.iter().map(|email| user_email_key(email)),
        )
        .await
    }
}

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{CacheStrategy, admits};
use crate::cache::keys::{generation_key, page_key, page_slug_key, project_key, tenant_content_tag};
use crate::cache::models::CachedPage;
use crate::cache::policy::Entity;

/// AI 生成结果、可视化项目和内容页面缓存操作
impl CacheStrategy {
    /// 生成结果不可变，缓存一天
    pub async fn cache_generation<T: Serialize + ?Sized>(&self, generation_id: &str, result: &T) -> bool {
        self.put(Entity::Generation, &generation_key(generation_id), result)
            .await
    }

    pub async fn get_generation<T: DeserializeOwned>(&self, generation_id: &str) -> Option<T> {
        self.cache.get(&generation_key(generation_id)).await
    }

    pub async fn invalidate_generation(&self, generation_id: &str) -> bool {
        self.cache.delete(&generation_key(generation_id)).await
    }

    pub async fn cache_project<T: Serialize + ?Sized>(
        &self,
        tenant_id: &str,
        project_id: &str,
        project: &T,
    ) -> bool {
        self.put_tagged(
            Entity::Project,
            &project_key(project_id),
            project,
            &[tenant_content_tag(tenant_id)],
        )
        .await
    }

    pub async fn get_project<T: DeserializeOwned>(&self, project_id: &str) -> Option<T> {
        self.cache.get(&project_key(project_id)).await
    }

    pub async fn invalidate_project(&self, project_id: &str) -> bool {
        self.cache.delete(&project_key(project_id)).await
    }

    pub async fn cache_page(&self, page: &CachedPage) -> bool {
        if !admits(Entity::Page, &page.id) {
            return false;
        }
        let stored = self
            .put_tagged(
                Entity::Page,
                &page_key(&page.id),
                page,
                &[tenant_content_tag(&page.tenant_id)],
            )
            .await;
        let indexed = self
            .put_index(Entity::Page, &page_slug_key(&page.tenant_id, &page.slug), &page.id)
            .await;
        stored && indexed
    }

    pub async fn get_page(&self, page_id: &str) -> Option<CachedPage> {
        if !admits(Entity::Page, page_id) {
            return None;
        }
        self.cache.get(&page_key(page_id)).await
    }

    pub async fn get_page_by_slug(&self, tenant_id: &str, slug: &str) -> Option<CachedPage> {
        self.resolve(Entity::Page, &page_slug_key(tenant_id, slug), page_key).await
    }

    pub async fn invalidate_page(&self, page_id: &str, tenant_id: &str, slugs: &[&str]) -> bool {
        if !admits(Entity::Page, page_id) {
            return false;
        }
        self.remove(
            page_key(page_id),
            slugs.iter().map(|slug| page_slug_key(tenant_id, slug)),
        )
        .await
    }
}

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::CacheStrategy;
use crate::cache::keys::{order_key, product_key, tenant_content_tag};
use crate::cache::policy::Entity;

/// 商品和订单缓存操作
impl CacheStrategy {
    /// 库存和价格变化频繁，过期时间较短
    pub async fn cache_product<T: Serialize + ?Sized>(
        &self,
        tenant_id: &str,
        product_id: &str,
        product: &T,
    ) -> bool {
        self.put_tagged(
            Entity::Product,
            &product_key(product_id),
            product,
            &[tenant_content_tag(tenant_id)],
        )
        .await
    }

    pub async fn get_product<T: DeserializeOwned>(&self, product_id: &str) -> Option<T> {
        self.cache.get(&product_key(product_id)).await
    }

    pub async fn invalidate_product(&self, product_id: &str) -> bool {
        self.cache.delete(&product_key(product_id)).await
    }

    pub async fn cache_order<T: Serialize + ?Sized>(&self, order_id: &str, order: &T) -> bool {
        self.put(Entity::Order, &order_key(order_id), order).await
    }

    pub async fn get_order<T: DeserializeOwned>(&self, order_id: &str) -> Option<T> {
        self.cache.get(&order_key(order_id)).await
    }

    pub async fn invalidate_order(&self, order_id: &str) -> bool {
        self.cache.delete(&order_key(order_id)).await
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 内容页面缓存数据模型
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedPage {
    pub id: String,
    pub tenant_id: String,
    pub slug: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl CachedPage {
    pub fn new(
        id: impl Into<String>,
        tenant_id: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tenant_id: tenant_id.into(),
            slug: slug.into(),
            attributes: Map::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }
}

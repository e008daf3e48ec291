use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 租户缓存数据模型
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedTenant {
    pub id: String,
    pub slug: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl CachedTenant {
    pub fn new(id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
            attributes: Map::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }
}

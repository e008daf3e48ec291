use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 用户缓存数据模型
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedUser {
    pub id: String,
    pub email: String,
    /// 其余字段原样保留
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl CachedUser {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            attributes: Map::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }
}

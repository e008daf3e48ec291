// 缓存模块
// 包含缓存管理器、标签索引、实体缓存策略和诊断信息

pub mod keys;
pub mod manager;
pub mod models;
pub mod operations;
pub mod policy;
pub mod stats;
mod tags;

// 重新导出常用类型，方便其他模块使用
pub use manager::CacheManager;
pub use models::{CachedPage, CachedTenant, CachedUser};
pub use operations::CacheStrategy;
pub use policy::{Entity, EntityPolicy};
pub use stats::CacheStats;

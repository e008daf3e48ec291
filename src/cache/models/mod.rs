/// 缓存数据模型
/// 需要二级索引的实体在这里定义；其余实体由调用方的类型直接序列化

pub mod page;
pub mod tenant;
pub mod user;

pub use page::CachedPage;
pub use tenant::CachedTenant;
pub use user::CachedUser;

/// 用户缓存键前缀
const USER_PREFIX: &str = "user:";

/// 邮箱到用户 ID 的二级索引前缀
const USER_EMAIL_PREFIX: &str = "user:email:";

/// 会话缓存键前缀
const SESSION_PREFIX: &str = "session:";

/// 生成用户缓存键
pub fn user_key(user_id: &str) -> String {
    format!("{}{}", USER_PREFIX, user_id)
}

/// 生成邮箱索引键，邮箱不区分大小写
pub fn user_email_key(email: &str) -> String {
    format!("{}{}", USER_EMAIL_PREFIX, email.trim().to_lowercase())
}

/// 生成会话缓存键
pub fn session_key(session_id: &str) -> String {
    format!("{}{}", SESSION_PREFIX, session_id)
}

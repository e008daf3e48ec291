/// 实体缓存策略目录
///
/// 每种实体对应固定的键模板和过期时间。过期时间按变化频率和重新计算的代价选择：
/// AI 生成结果一经产生不再变化且计算昂贵，功能开关需要尽快生效。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    User,
    Tenant,
    Generation,
    Project,
    Page,
    Product,
    Order,
    FeatureFlag,
    ApiResponse,
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityPolicy {
    pub primary: &'static str,
    pub secondary: &'static [&'static str],
    pub ttl_secs: u64,
}

impl Entity {
    pub const fn policy(self) -> EntityPolicy {
        match self {
            Entity::User => EntityPolicy {
                primary: "user:{id}",
                secondary: &["user:email:{email}"],
                ttl_secs: 3600,
            },
            Entity::Tenant => EntityPolicy {
                primary: "tenant:{id}",
                secondary: &["tenant:slug:{slug}"],
                ttl_secs: 7200,
            },
            Entity::Generation => EntityPolicy {
                primary: "ai:generation:{id}",
                secondary: &[],
                ttl_secs: 86400,
            },
            Entity::Project => EntityPolicy {
                primary: "builder:project:{id}",
                secondary: &[],
                ttl_secs: 3600,
            },
            Entity::Page => EntityPolicy {
                primary: "page:{id}",
                secondary: &["page:slug:{tenant_id}:{slug}"],
                ttl_secs: 1800,
            },
            Entity::Product => EntityPolicy {
                primary: "product:{id}",
                secondary: &[],
                ttl_secs: 1800,
            },
            Entity::Order => EntityPolicy {
                primary: "order:{id}",
                secondary: &[],
                ttl_secs: 7200,
            },
            Entity::FeatureFlag => EntityPolicy {
                primary: "feature:{tenant_id}:{flag}",
                secondary: &[],
                ttl_secs: 300,
            },
            // 调用方可覆盖
            Entity::ApiResponse => EntityPolicy {
                primary: "api:{key}",
                secondary: &[],
                ttl_secs: 300,
            },
            Entity::Session => EntityPolicy {
                primary: "session:{id}",
                secondary: &[],
                ttl_secs: 86400,
            },
        }
    }

    pub const fn ttl(self) -> u64 {
        self.policy().ttl_secs
    }

    /// 主键拼接后不能落入二级索引的键空间，例如用户 ID `email:a@b.c`
    /// 生成的 `user:email:a@b.c` 会和邮箱索引冲突
    pub fn accepts_id(self, id: &str) -> bool {
        let policy = self.policy();
        let key = format!("{}{}", template_prefix(policy.primary), id);
        !policy
            .secondary
            .iter()
            .any(|secondary| key.starts_with(template_prefix(secondary)))
    }
}

/// 模板中第一个占位符之前的固定部分
fn template_prefix(template: &str) -> &str {
    template.split('{').next().unwrap_or(template)
}

//! # 缓存键命名规范
//!
//! 定义统一的缓存键生成和管理策略

use serde::{Deserialize, Serialize};

/// 缓存键类型
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CacheKey {
    /// 验证码 - `captcha:{captcha_id}`
    Captcha { captcha_id: String },

    /// 首页看板聚合 - `dashboard:{date}`
    Dashboard { date: String },

    /// 配置缓存 - `config:{section}`
    Config { section: String },

    /// 自定义键 - `custom:{prefix}:{key}`
    Custom { prefix: String, key: String },
}

impl CacheKey {
    /// 生成缓存键字符串
    #[must_use]
    pub fn build(&self) -> String {
        match self {
            Self::Captcha { captcha_id } => format!("captcha:{captcha_id}"),
            Self::Dashboard { date } => format!("dashboard:{date}"),
            Self::Config { section } => format!("config:{section}"),
            Self::Custom { prefix, key } => format!("custom:{prefix}:{key}"),
        }
    }

    /// 获取缓存键的命名空间
    #[must_use]
    pub const fn namespace(&self) -> &'static str {
        match self {
            Self::Captcha { .. } => "captcha",
            Self::Dashboard { .. } => "dashboard",
            Self::Config { .. } => "config",
            Self::Custom { .. } => "custom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_building() {
        let key = CacheKey::Captcha {
            captcha_id: "abc-123".to_string(),
        };
        assert_eq!(key.build(), "captcha:abc-123");
        assert_eq!(key.namespace(), "captcha");

        let key = CacheKey::Dashboard {
            date: "2025-01-10".to_string(),
        };
        assert_eq!(key.build(), "dashboard:2025-01-10");
    }
}

//! # 应用配置结构定义

use crate::error::{DormError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 服务配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,
    /// 认证配置
    #[serde(default)]
    pub auth: AuthConfig,
    /// 指纹硬件接入配置
    #[serde(default)]
    pub hardware: HardwareConfig,
    /// 备份配置
    #[serde(default)]
    pub backup: BackupConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    pub bind_address: String,
    /// 监听端口
    pub port: u16,
    /// 是否启用CORS
    pub enable_cors: bool,
    /// 允许的CORS源地址
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库URL
    pub url: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 连接超时时间（秒）
    pub connect_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/dorm_check.db".to_string(),
            max_connections: 10,
            connect_timeout: 30,
        }
    }
}

impl DatabaseConfig {
    /// 检查是否为SQLite数据库
    #[must_use]
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }

    /// 检查是否为内存数据库
    #[must_use]
    pub fn is_memory_database(&self) -> bool {
        self.url.contains(":memory:")
    }

    /// SQLite 数据库文件路径（内存库与非 SQLite 返回 None）
    #[must_use]
    pub fn sqlite_path(&self) -> Option<&Path> {
        if !self.is_sqlite() || self.is_memory_database() {
            return None;
        }
        let path = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))?;
        Some(Path::new(path))
    }
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 内存缓存最大条目数
    pub memory_max_entries: usize,
    /// 默认过期时间（秒）
    pub default_ttl: u64,
    /// 验证码过期时间（秒）
    pub captcha_ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_max_entries: 10000,
            default_ttl: 300,
            captcha_ttl: 300,
        }
    }
}

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT 签名密钥
    pub jwt_secret: String,
    /// 访问令牌有效期（秒）
    pub jwt_expires_in: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expires_in: 8 * 3600,
        }
    }
}

/// 指纹硬件接入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareConfig {
    /// 硬件 API 访问令牌
    pub api_token: String,
    /// 设备离线阈值（秒），last_seen 超过该值视为离线
    pub offline_threshold: i64,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            api_token: "change-me-device-token".to_string(),
            offline_threshold: 120,
        }
    }
}

/// 备份配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// 备份文件目录
    pub dir: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: "./data/backups".to_string(),
        }
    }
}

impl AppConfig {
    /// 从 TOML 文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DormError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 加载配置；文件不存在时回退到默认配置
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            warn!("配置文件 {} 不存在，使用默认配置", path.display());
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(DormError::config("数据库 URL 不能为空"));
        }
        if self.database.max_connections == 0 {
            return Err(DormError::config("数据库最大连接数必须大于 0"));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(DormError::config("JWT 密钥不能为空"));
        }
        if self.auth.jwt_expires_in <= 0 {
            return Err(DormError::config("JWT 有效期必须大于 0"));
        }
        if self.hardware.api_token.is_empty() {
            return Err(DormError::config("硬件 API 令牌不能为空"));
        }
        if self.hardware.offline_threshold <= 0 {
            return Err(DormError::config("设备离线阈值必须大于 0"));
        }
        if self.cache.memory_max_entries == 0 {
            return Err(DormError::config("缓存最大条目数必须大于 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.hardware.offline_threshold, 120);
    }

    #[test]
    fn parse_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            bind_address = "127.0.0.1"
            port = 9000
            enable_cors = false
            cors_origins = []

            [auth]
            jwt_secret = "test-secret"
            jwt_expires_in = 3600
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.jwt_secret, "test-secret");
        // 未给出的段落落到默认值
        assert_eq!(config.database.max_connections, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = String::new();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.hardware.offline_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn sqlite_path_extraction() {
        let config = DatabaseConfig::default();
        assert!(config.is_sqlite());
        assert_eq!(
            config.sqlite_path().unwrap(),
            Path::new("./data/dorm_check.db")
        );

        let memory = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(memory.sqlite_path().is_none());
    }
}

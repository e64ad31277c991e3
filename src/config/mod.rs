//! # 配置模块
//!
//! TOML 配置文件的结构定义与加载

pub mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, BackupConfig, CacheConfig, DatabaseConfig, HardwareConfig, ServerConfig,
};

//! # 系统维护服务
//!
//! 系统信息、缓存管理与 SQLite 备份

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;
use sysinfo::System;

use crate::cache::{CacheProvider, CacheStats};
use crate::config::{BackupConfig, DatabaseConfig};
use crate::error::{DormError, Result};
use crate::management::server::AppState;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// 记录进程启动时间（在 main 中尽早调用）
pub fn init_start_time() {
    let _ = START_TIME.set(Instant::now());
}

fn uptime_seconds() -> u64 {
    START_TIME.get().map_or(0, |t| t.elapsed().as_secs())
}

/// 系统信息响应
#[derive(Debug, Serialize)]
pub struct SystemInfoResponse {
    pub version: String,
    pub os: String,
    pub cpu_count: usize,
    pub total_memory_mb: u64,
    pub used_memory_mb: u64,
    pub uptime_seconds: u64,
}

/// 备份条目
#[derive(Debug, Serialize)]
pub struct BackupInfo {
    pub name: String,
    pub size_bytes: u64,
    pub modified_at: Option<String>,
}

/// 收集系统信息
#[must_use]
pub fn system_info() -> SystemInfoResponse {
    let mut sys = System::new_all();
    sys.refresh_all();

    SystemInfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        os: format!(
            "{} {}",
            System::name().unwrap_or_else(|| "unknown".to_string()),
            System::os_version().unwrap_or_default()
        ),
        cpu_count: sys.cpus().len(),
        total_memory_mb: sys.total_memory() / 1024 / 1024,
        used_memory_mb: sys.used_memory() / 1024 / 1024,
        uptime_seconds: uptime_seconds(),
    }
}

/// 备份文件名只允许安全字符，拒绝路径穿越
fn validate_backup_name(name: &str) -> Result<()> {
    let legal = !name.is_empty()
        && name.ends_with(".db")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
    if !legal || name.contains("..") {
        return Err(DormError::validation(format!("非法的备份文件名: {name}")));
    }
    Ok(())
}

/// 创建一份数据库备份，返回备份信息
pub fn create_backup(database: &DatabaseConfig, backup: &BackupConfig) -> Result<BackupInfo> {
    let source = database
        .sqlite_path()
        .ok_or_else(|| DormError::business("当前数据库不支持文件备份"))?;
    if !source.exists() {
        return Err(DormError::business("数据库文件不存在，无法备份"));
    }

    let dir = Path::new(&backup.dir);
    std::fs::create_dir_all(dir)?;

    let name = format!("dorm_check_{}.db", Utc::now().format("%Y%m%d_%H%M%S"));
    let target: PathBuf = dir.join(&name);
    std::fs::copy(source, &target)?;

    let meta = std::fs::metadata(&target)?;
    Ok(BackupInfo {
        name,
        size_bytes: meta.len(),
        modified_at: Some(Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()),
    })
}

/// 列出备份目录下的所有备份
pub fn list_backups(backup: &BackupConfig) -> Result<Vec<BackupInfo>> {
    let dir = Path::new(&backup.dir);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut backups = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.ends_with(".db") {
            continue;
        }
        let meta = entry.metadata()?;
        let modified_at = meta
            .modified()
            .ok()
            .map(chrono::DateTime::<Utc>::from)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string());
        backups.push(BackupInfo {
            name,
            size_bytes: meta.len(),
            modified_at,
        });
    }
    backups.sort_by(|a, b| b.name.cmp(&a.name));
    Ok(backups)
}

/// 删除一份备份
pub fn delete_backup(backup: &BackupConfig, name: &str) -> Result<()> {
    validate_backup_name(name)?;
    let path = Path::new(&backup.dir).join(name);
    if !path.exists() {
        return Err(DormError::not_found(format!("备份 {name} 不存在")));
    }
    std::fs::remove_file(path)?;
    Ok(())
}

/// 系统维护服务
pub struct SystemService<'a> {
    state: &'a AppState,
}

impl<'a> SystemService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// 缓存统计
    pub async fn cache_stats(&self) -> Result<CacheStats> {
        self.state.cache.stats().await
    }

    /// 清空缓存
    pub async fn flush_cache(&self) -> Result<()> {
        self.state.cache.clear().await
    }

    /// 创建备份
    pub fn create_backup(&self) -> Result<BackupInfo> {
        create_backup(&self.state.config.database, &self.state.config.backup)
    }

    /// 列出备份
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        list_backups(&self.state.config.backup)
    }

    /// 删除备份
    pub fn delete_backup(&self, name: &str) -> Result<()> {
        delete_backup(&self.state.config.backup, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn configs(dir: &Path) -> (DatabaseConfig, BackupConfig) {
        let db_path = dir.join("main.db");
        std::fs::write(&db_path, b"fake sqlite payload").unwrap();
        (
            DatabaseConfig {
                url: format!("sqlite://{}", db_path.display()),
                ..DatabaseConfig::default()
            },
            BackupConfig {
                dir: dir.join("backups").display().to_string(),
            },
        )
    }

    #[test]
    fn backup_create_list_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let (database, backup) = configs(tmp.path());

        let info = create_backup(&database, &backup).unwrap();
        assert!(info.name.starts_with("dorm_check_"));
        assert_eq!(info.size_bytes, 19);

        let listed = list_backups(&backup).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, info.name);

        delete_backup(&backup, &info.name).unwrap();
        assert!(list_backups(&backup).unwrap().is_empty());
        assert!(delete_backup(&backup, &info.name).is_err());
    }

    #[test]
    fn backup_rejects_memory_database() {
        let tmp = tempfile::tempdir().unwrap();
        let backup = BackupConfig {
            dir: tmp.path().display().to_string(),
        };
        let database = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(create_backup(&database, &backup).is_err());
    }

    #[test]
    fn backup_name_is_sanitized() {
        let tmp = tempfile::tempdir().unwrap();
        let backup = BackupConfig {
            dir: tmp.path().display().to_string(),
        };
        assert!(delete_backup(&backup, "../etc/passwd").is_err());
        assert!(delete_backup(&backup, "a/b.db").is_err());
        assert!(delete_backup(&backup, "").is_err());
        assert!(delete_backup(&backup, "not_a_db.txt").is_err());
    }

    #[test]
    fn system_info_is_populated() {
        let info = system_info();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert!(info.cpu_count > 0);
    }
}

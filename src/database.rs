//! # 数据库模块
//!
//! 数据库连接、迁移与初始数据管理

use crate::error::DormError;
use bcrypt::{DEFAULT_COST, hash};
use chrono::Utc;
use entity::{users, users::Entity as Users};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{Database, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Set};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// 初始化数据库连接
pub async fn init_database(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    info!("正在连接数据库: {}", database_url);

    // 对于SQLite数据库，确保数据库文件的目录和文件存在
    if database_url.starts_with("sqlite:") && !database_url.contains(":memory:") {
        let db_path = database_url
            .strip_prefix("sqlite://")
            .unwrap_or(database_url.strip_prefix("sqlite:").unwrap_or(database_url));
        let db_file_path = Path::new(db_path);

        if let Some(parent_dir) = db_file_path.parent() {
            if !parent_dir.exists() {
                debug!("创建数据库目录: {}", parent_dir.display());
                std::fs::create_dir_all(parent_dir).map_err(|e| {
                    DbErr::Custom(format!(
                        "无法创建数据库目录 {}: {}",
                        parent_dir.display(),
                        e
                    ))
                })?;
            }
        }

        if !db_file_path.exists() {
            debug!("创建数据库文件: {}", db_file_path.display());
            std::fs::File::create(db_file_path).map_err(|e| {
                DbErr::Custom(format!(
                    "无法创建数据库文件 {}: {}",
                    db_file_path.display(),
                    e
                ))
            })?;
        }
    }

    let db = Database::connect(database_url).await?;

    info!("数据库连接成功");
    Ok(db)
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    info!("开始运行数据库迁移...");

    match ::migration::Migrator::up(db, None).await {
        Ok(()) => {
            info!("数据库迁移完成");
            Ok(())
        }
        Err(e) => {
            error!("数据库迁移失败: {}", e);
            Err(e)
        }
    }
}

/// 确保存在默认管理员账号
///
/// 用户表为空时创建 `admin` 账号并打印初始密码提醒。
pub async fn ensure_default_admin(db: &DatabaseConnection) -> Result<(), DormError> {
    let user_count = Users::find().count(db).await?;
    if user_count > 0 {
        debug!("用户表已有 {} 个账号，跳过默认管理员初始化", user_count);
        return Ok(());
    }

    let salt: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let password_hash = hash("admin123", DEFAULT_COST)
        .map_err(|e| DormError::internal_with_source("初始密码哈希失败", e))?;

    let now = Utc::now().naive_utc();
    let admin = users::ActiveModel {
        username: Set("admin".to_string()),
        password_hash: Set(password_hash),
        salt: Set(salt),
        display_name: Set("系统管理员".to_string()),
        role: Set("admin".to_string()),
        is_active: Set(true),
        last_login: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Users::insert(admin).exec(db).await?;

    warn!("已创建默认管理员 admin / admin123，请尽快修改密码");
    Ok(())
}

//! # 宿舍查寝管理系统主程序

use clap::Parser;
use dorm_check::{
    AppConfig, DormError, Result,
    management::{AppContext, ManagementServer},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "dorm-check", about = "学生宿舍查寝与请假管理系统", version)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// 日志级别（trace/debug/info/warn/error）
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dorm_check::logging::init_logging(cli.log_level.as_deref());

    // 进程启动时间用于 /api/system/info 的 uptime
    dorm_check::management::services::system::init_start_time();

    let config = AppConfig::load(&cli.config)?;

    let db = dorm_check::database::init_database(&config.database.url)
        .await
        .map_err(|e| DormError::database_with_source("数据库连接失败", e))?;

    dorm_check::database::run_migrations(&db)
        .await
        .map_err(|e| DormError::database_with_source("数据库迁移失败", e))?;

    dorm_check::database::ensure_default_admin(&db).await?;

    info!("服务启动中");
    let context = Arc::new(AppContext::new(config, db));
    let server = ManagementServer::new(context)?;
    server.run().await?;

    info!("服务正常关闭");
    Ok(())
}

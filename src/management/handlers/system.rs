//! # 系统维护处理器

use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

use super::require_admin;
use crate::management::middleware::AuthContext;
use crate::management::response::{app_error, success, success_without_data};
use crate::management::server::AppState;
use crate::management::services::dashboard::DashboardService;
use crate::management::services::logs::log_operation;
use crate::management::services::system::{SystemService, system_info};

/// 看板查询参数
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub date: Option<NaiveDate>,
}

/// 系统信息
pub async fn get_system_info() -> Response {
    success(system_info())
}

/// 首页看板
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let date = query.date.unwrap_or_else(|| Utc::now().naive_utc().date());
    let service = DashboardService::new(&state);
    match service.summary(date).await {
        Ok(summary) => success(summary),
        Err(e) => app_error(e),
    }
}

/// 缓存统计
pub async fn cache_stats(State(state): State<AppState>) -> Response {
    let service = SystemService::new(&state);
    match service.cache_stats().await {
        Ok(stats) => success(stats),
        Err(e) => app_error(e),
    }
}

/// 清空缓存（仅管理员）
pub async fn flush_cache(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    if let Err(e) = require_admin(&auth) {
        return app_error(e);
    }
    let service = SystemService::new(&state);
    match service.flush_cache().await {
        Ok(()) => {
            log_operation(&state.database, &auth.username, "flush_cache", None, None).await;
            success_without_data("缓存已清空")
        }
        Err(e) => app_error(e),
    }
}

/// 列出备份
pub async fn list_backups(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    if let Err(e) = require_admin(&auth) {
        return app_error(e);
    }
    let service = SystemService::new(&state);
    match service.list_backups() {
        Ok(backups) => success(backups),
        Err(e) => app_error(e),
    }
}

/// 创建备份（仅管理员）
pub async fn create_backup(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    if let Err(e) = require_admin(&auth) {
        return app_error(e);
    }
    let service = SystemService::new(&state);
    match service.create_backup() {
        Ok(info) => {
            log_operation(
                &state.database,
                &auth.username,
                "create_backup",
                Some(&info.name),
                None,
            )
            .await;
            success(info)
        }
        Err(e) => app_error(e),
    }
}

/// 删除备份（仅管理员）
pub async fn delete_backup(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(name): Path<String>,
) -> Response {
    if let Err(e) = require_admin(&auth) {
        return app_error(e);
    }
    let service = SystemService::new(&state);
    match service.delete_backup(&name) {
        Ok(()) => {
            log_operation(
                &state.database,
                &auth.username,
                "delete_backup",
                Some(&name),
                None,
            )
            .await;
            success_without_data("备份已删除")
        }
        Err(e) => app_error(e),
    }
}

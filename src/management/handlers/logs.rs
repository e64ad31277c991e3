//! # 操作日志处理器

use axum::Extension;
use axum::extract::{Query, State};
use axum::response::Response;
use std::sync::Arc;

use super::require_admin;
use crate::management::middleware::AuthContext;
use crate::management::response::{app_error, paginated, success_without_data};
use crate::management::server::AppState;
use crate::management::services::logs::{LogQuery, LogsService};

/// 列出操作日志
pub async fn list_logs(State(state): State<AppState>, Query(query): Query<LogQuery>) -> Response {
    let service = LogsService::new(&state);
    match service.list(&query).await {
        Ok(result) => paginated(result.logs, result.pagination),
        Err(e) => app_error(e),
    }
}

/// 清空操作日志（仅管理员）
pub async fn clear_logs(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    if let Err(e) = require_admin(&auth) {
        return app_error(e);
    }
    let service = LogsService::new(&state);
    match service.clear().await {
        Ok(removed) => success_without_data(&format!("已清空 {removed} 条日志")),
        Err(e) => app_error(e),
    }
}

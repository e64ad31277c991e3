//! # 签到记录处理器

use axum::Extension;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::Response;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::management::middleware::AuthContext;
use crate::management::response::{app_error, paginated, success};
use crate::management::server::AppState;
use crate::management::services::checks::{
    CancelLeaveRequest, CheckQuery, CheckRecordsService, CreateCheckRequest,
};
use crate::management::services::logs::log_operation;
use crate::management::services::transfer;

/// 看板查询参数
#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    /// 省略时取今天
    pub date: Option<NaiveDate>,
}

/// 列出签到记录
pub async fn list_checks(State(state): State<AppState>, Query(query): Query<CheckQuery>) -> Response {
    let service = CheckRecordsService::new(&state);
    match service.list(&query).await {
        Ok(result) => paginated(result.records, result.pagination),
        Err(e) => app_error(e),
    }
}

/// 手工补录签到
pub async fn create_check(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    axum::Json(request): axum::Json<CreateCheckRequest>,
) -> Response {
    let service = CheckRecordsService::new(&state);
    match service.create_manual(&request, &auth.username).await {
        Ok(record) => {
            log_operation(
                &state.database,
                &auth.username,
                "manual_check",
                Some(&format!("student:{}", record.student_id)),
                Some(&record.status),
            )
            .await;
            success(record)
        }
        Err(e) => app_error(e),
    }
}

/// 查寝看板（全体学生某日派生状态）
pub async fn board(State(state): State<AppState>, Query(query): Query<BoardQuery>) -> Response {
    let date = query.date.unwrap_or_else(|| Utc::now().naive_utc().date());
    let service = CheckRecordsService::new(&state);
    match service.board(date).await {
        Ok(entries) => success(entries),
        Err(e) => app_error(e),
    }
}

/// 取消请假状态（仅写入一条"在寝"覆盖记录）
pub async fn cancel_leave(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    axum::Json(request): axum::Json<CancelLeaveRequest>,
) -> Response {
    let service = CheckRecordsService::new(&state);
    match service
        .cancel_leave_status(&request.student_id, &auth.username, request.date)
        .await
    {
        Ok(record) => {
            log_operation(
                &state.database,
                &auth.username,
                "cancel_leave_status",
                Some(&format!("student:{}", request.student_id)),
                Some(&request.date.format("%Y-%m-%d").to_string()),
            )
            .await;
            success(record)
        }
        Err(e) => app_error(e),
    }
}

/// 导出签到记录 CSV（应用与列表一致的过滤条件，不分页）
pub async fn export_checks_csv(
    State(state): State<AppState>,
    Query(query): Query<CheckQuery>,
) -> Response {
    let service = CheckRecordsService::new(&state);
    let result = match service.export(&query).await {
        Ok(records) => transfer::checks_to_csv(&records),
        Err(e) => Err(e),
    };
    match result {
        Ok(csv) => Response::builder()
            .header(CONTENT_TYPE, "text/csv; charset=utf-8")
            .header(CONTENT_DISPOSITION, "attachment; filename=\"checks.csv\"")
            .body(Body::from(csv))
            .unwrap_or_else(|_| app_error(crate::internal_error!("响应构建失败"))),
        Err(e) => app_error(e),
    }
}

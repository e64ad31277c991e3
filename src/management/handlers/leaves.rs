//! # 请假审核处理器（管理端）

use axum::Extension;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::Response;
use std::sync::Arc;

use crate::management::middleware::AuthContext;
use crate::management::response::{app_error, paginated, success, success_with_message};
use crate::management::server::AppState;
use crate::management::services::leaves::{LeaveQuery, LeaveService};
use crate::management::services::logs::log_operation;
use crate::management::services::transfer;

/// 列出请假申请
pub async fn list_leaves(State(state): State<AppState>, Query(query): Query<LeaveQuery>) -> Response {
    let service = LeaveService::new(&state);
    match service.list(&query).await {
        Ok(result) => paginated(result.applications, result.pagination),
        Err(e) => app_error(e),
    }
}

/// 获取单个申请
pub async fn get_leave(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    let service = LeaveService::new(&state);
    match service.get(id).await {
        Ok(leave) => success(leave),
        Err(e) => app_error(e),
    }
}

/// 审批通过（副作用：为每个请假日期写入"请假"签到记录）
pub async fn approve_leave(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(id): Path<i32>,
) -> Response {
    let service = LeaveService::new(&state);
    match service.approve(id, &auth.username).await {
        Ok(leave) => {
            log_operation(
                &state.database,
                &auth.username,
                "approve_leave",
                Some(&format!("leave:{id}")),
                Some(&format!("学生 {}", leave.student_id)),
            )
            .await;
            success_with_message(leave, "已批准")
        }
        Err(e) => app_error(e),
    }
}

/// 驳回申请
pub async fn reject_leave(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(id): Path<i32>,
) -> Response {
    let service = LeaveService::new(&state);
    match service.reject(id, &auth.username).await {
        Ok(leave) => {
            log_operation(
                &state.database,
                &auth.username,
                "reject_leave",
                Some(&format!("leave:{id}")),
                Some(&format!("学生 {}", leave.student_id)),
            )
            .await;
            success_with_message(leave, "已驳回")
        }
        Err(e) => app_error(e),
    }
}

/// 导出请假台账 CSV（不分页）
pub async fn export_leaves_csv(
    State(state): State<AppState>,
    Query(query): Query<LeaveQuery>,
) -> Response {
    let service = LeaveService::new(&state);
    let result = match service.export(&query).await {
        Ok(applications) => transfer::leaves_to_csv(&applications),
        Err(e) => Err(e),
    };
    match result {
        Ok(csv) => Response::builder()
            .header(CONTENT_TYPE, "text/csv; charset=utf-8")
            .header(CONTENT_DISPOSITION, "attachment; filename=\"leaves.csv\"")
            .body(Body::from(csv))
            .unwrap_or_else(|_| app_error(crate::internal_error!("响应构建失败"))),
        Err(e) => app_error(e),
    }
}

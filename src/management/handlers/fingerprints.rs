//! # 指纹映射处理器

use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use std::sync::Arc;

use crate::management::middleware::AuthContext;
use crate::management::response::{app_error, paginated, success, success_without_data};
use crate::management::server::AppState;
use crate::management::services::fingerprints::{
    FingerprintBatchRow, FingerprintQuery, FingerprintService,
};
use crate::management::services::logs::log_operation;
use crate::management::services::transfer;

/// 更新录入状态请求
#[derive(Debug, Deserialize)]
pub struct UpdateEnrollmentRequest {
    pub enrollment_status: String,
}

/// 列出指纹映射
pub async fn list_fingerprints(
    State(state): State<AppState>,
    Query(query): Query<FingerprintQuery>,
) -> Response {
    let service = FingerprintService::new(&state);
    match service.list(&query).await {
        Ok(result) => paginated(result.mappings, result.pagination),
        Err(e) => app_error(e),
    }
}

/// 批量导入（JSON 行数组）
pub async fn batch_import(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    axum::Json(rows): axum::Json<Vec<FingerprintBatchRow>>,
) -> Response {
    let service = FingerprintService::new(&state);
    match service.batch_import(&rows).await {
        Ok(report) => {
            log_operation(
                &state.database,
                &auth.username,
                "import_fingerprints",
                None,
                Some(&format!(
                    "共 {} 行：成功 {}，失败 {}，警告 {}",
                    report.total, report.accepted, report.rejected, report.warnings
                )),
            )
            .await;
            success(report)
        }
        Err(e) => app_error(e),
    }
}

/// 批量导入（UTF-8 CSV 文本）
pub async fn import_csv(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    body: String,
) -> Response {
    let rows = match transfer::parse_fingerprints_csv(&body) {
        Ok(rows) => rows,
        Err(e) => return app_error(e),
    };

    let service = FingerprintService::new(&state);
    match service.batch_import(&rows).await {
        Ok(report) => {
            log_operation(
                &state.database,
                &auth.username,
                "import_fingerprints",
                None,
                Some(&format!(
                    "共 {} 行：成功 {}，失败 {}",
                    report.total, report.accepted, report.rejected
                )),
            )
            .await;
            success(report)
        }
        Err(e) => app_error(e),
    }
}

/// 更新录入状态
pub async fn update_enrollment(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(id): Path<i32>,
    axum::Json(request): axum::Json<UpdateEnrollmentRequest>,
) -> Response {
    let service = FingerprintService::new(&state);
    match service.update_status(id, &request.enrollment_status).await {
        Ok(mapping) => {
            log_operation(
                &state.database,
                &auth.username,
                "update_fingerprint",
                Some(&format!("fingerprint:{id}")),
                Some(&request.enrollment_status),
            )
            .await;
            success(mapping)
        }
        Err(e) => app_error(e),
    }
}

/// 删除映射
pub async fn delete_fingerprint(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(id): Path<i32>,
) -> Response {
    let service = FingerprintService::new(&state);
    match service.delete(id).await {
        Ok(()) => {
            log_operation(
                &state.database,
                &auth.username,
                "delete_fingerprint",
                Some(&format!("fingerprint:{id}")),
                None,
            )
            .await;
            success_without_data("指纹映射已删除")
        }
        Err(e) => app_error(e),
    }
}

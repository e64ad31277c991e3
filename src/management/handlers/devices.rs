//! # 设备管理处理器

use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use std::sync::Arc;

use crate::management::middleware::AuthContext;
use crate::management::response::{app_error, paginated, success, success_without_data};
use crate::management::server::AppState;
use crate::management::services::devices::{
    CreateDeviceRequest, DeviceQuery, DeviceService, UpdateDeviceRequest,
};
use crate::management::services::logs::log_operation;

/// 列出设备（含派生 online 字段）
pub async fn list_devices(State(state): State<AppState>, Query(query): Query<DeviceQuery>) -> Response {
    let service = DeviceService::new(&state);
    match service.list(&query).await {
        Ok(result) => paginated(result.devices, result.pagination),
        Err(e) => app_error(e),
    }
}

/// 获取单个设备
pub async fn get_device(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    let service = DeviceService::new(&state);
    match service.get(id).await {
        Ok(device) => success(device),
        Err(e) => app_error(e),
    }
}

/// 创建设备
pub async fn create_device(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    axum::Json(request): axum::Json<CreateDeviceRequest>,
) -> Response {
    let service = DeviceService::new(&state);
    match service.create(&request).await {
        Ok(device) => {
            log_operation(
                &state.database,
                &auth.username,
                "create_device",
                Some(&format!("device:{}", device.device_id)),
                None,
            )
            .await;
            success(device)
        }
        Err(e) => app_error(e),
    }
}

/// 更新设备
pub async fn update_device(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(id): Path<i32>,
    axum::Json(request): axum::Json<UpdateDeviceRequest>,
) -> Response {
    let service = DeviceService::new(&state);
    match service.update(id, &request).await {
        Ok(device) => {
            log_operation(
                &state.database,
                &auth.username,
                "update_device",
                Some(&format!("device:{}", device.device_id)),
                None,
            )
            .await;
            success(device)
        }
        Err(e) => app_error(e),
    }
}

/// 删除设备
pub async fn delete_device(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(id): Path<i32>,
) -> Response {
    let service = DeviceService::new(&state);
    match service.delete(id).await {
        Ok(()) => {
            log_operation(
                &state.database,
                &auth.username,
                "delete_device",
                Some(&format!("device_row:{id}")),
                None,
            )
            .await;
            success_without_data("设备已删除")
        }
        Err(e) => app_error(e),
    }
}

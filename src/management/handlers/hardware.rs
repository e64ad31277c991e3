//! # 硬件接入处理器
//!
//! 指纹设备回调：签到、心跳、未签到名单。鉴权由 device_token 中间件完成。

use axum::extract::{Query, State};
use axum::response::Response;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::management::response::{app_error, success, success_without_data};
use crate::management::server::AppState;
use crate::management::services::checks::CheckRecordsService;
use crate::management::services::devices::DeviceService;
use crate::management::services::fingerprints::FingerprintService;
use crate::types::CheckStatus;
use entity::students;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

/// 指纹签到请求
#[derive(Debug, Deserialize)]
pub struct CheckinRequest {
    pub device_id: String,
    pub fingerprint_id: i32,
}

/// 心跳请求
#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub device_id: String,
}

/// 未签到名单查询
#[derive(Debug, Deserialize)]
pub struct UncheckedQuery {
    pub device_id: String,
    /// 省略时取今天
    pub date: Option<NaiveDate>,
}

/// 指纹签到：解析映射 -> 写入"在寝"记录 -> 刷新设备 last_seen
pub async fn checkin(
    State(state): State<AppState>,
    axum::Json(request): axum::Json<CheckinRequest>,
) -> Response {
    let fingerprints = FingerprintService::new(&state);
    let student = match fingerprints
        .resolve(&request.device_id, request.fingerprint_id)
        .await
    {
        Ok(student) => student,
        Err(e) => return app_error(e),
    };

    let checks = CheckRecordsService::new(&state);
    let record = match checks
        .insert_record(
            &student.student_id,
            CheckStatus::Present,
            Utc::now().naive_utc(),
            &request.device_id,
        )
        .await
    {
        Ok(record) => record,
        Err(e) => return app_error(e),
    };

    let devices = DeviceService::new(&state);
    if let Err(e) = devices.heartbeat(&request.device_id).await {
        return app_error(e);
    }

    success(json!({
        "student_id": student.student_id,
        "name": student.name,
        "status": record.status,
        "check_time": record.check_time.format("%Y-%m-%d %H:%M:%S").to_string(),
    }))
}

/// 设备心跳
pub async fn heartbeat(
    State(state): State<AppState>,
    axum::Json(request): axum::Json<HeartbeatRequest>,
) -> Response {
    let devices = DeviceService::new(&state);
    match devices.heartbeat(&request.device_id).await {
        Ok(()) => success_without_data("心跳已记录"),
        Err(e) => app_error(e),
    }
}

/// 查询设备所在楼栋当日未签到的学生
pub async fn unchecked_students(
    State(state): State<AppState>,
    Query(query): Query<UncheckedQuery>,
) -> Response {
    let devices = DeviceService::new(&state);
    let device = match devices.find_by_device_id(&query.device_id).await {
        Ok(device) => device,
        Err(e) => return app_error(e),
    };

    let date = query.date.unwrap_or_else(|| Utc::now().naive_utc().date());
    let building_students = match students::Entity::find()
        .filter(students::Column::Building.eq(&device.building))
        .order_by_asc(students::Column::StudentId)
        .all(state.database.as_ref())
        .await
    {
        Ok(students) => students,
        Err(e) => return app_error(e.into()),
    };

    let checks = CheckRecordsService::new(&state);
    let mut unchecked = Vec::new();
    for student in building_students {
        match checks.current_status(&student.student_id, date).await {
            Ok(status) if status == crate::types::DerivedStatus::NotCheckedIn => {
                unchecked.push(json!({
                    "student_id": student.student_id,
                    "name": student.name,
                    "room": student.room,
                }));
            }
            Ok(_) => {}
            Err(e) => return app_error(e),
        }
    }

    success(json!({
        "date": date.format("%Y-%m-%d").to_string(),
        "building": device.building,
        "unchecked": unchecked,
    }))
}

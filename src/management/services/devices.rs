//! # 设备管理服务
//!
//! 指纹设备 CRUD 与心跳。在线判定为派生值：
//! `last_seen` 距当前时间不超过阈值即在线，不落库。

use chrono::{NaiveDateTime, Utc};
use entity::{devices, devices::Entity as Devices};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::error::{DormError, Result};
use crate::management::response::Pagination;
use crate::management::server::AppState;
use crate::types::DeviceStatus;

use super::shared::{PaginationParams, build_page};

/// 设备列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct DeviceQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    pub building: Option<String>,
}

/// 创建设备请求
#[derive(Debug, Deserialize)]
pub struct CreateDeviceRequest {
    pub device_id: String,
    pub name: String,
    pub building: String,
    #[serde(default)]
    pub sequence: i32,
    pub max_fingerprints: Option<i32>,
    pub status: Option<String>,
}

/// 更新设备请求
#[derive(Debug, Deserialize)]
pub struct UpdateDeviceRequest {
    pub name: Option<String>,
    pub building: Option<String>,
    pub sequence: Option<i32>,
    pub max_fingerprints: Option<i32>,
    pub status: Option<String>,
}

/// 设备响应
#[derive(Debug, Serialize)]
pub struct DeviceResponse {
    pub id: i32,
    pub device_id: String,
    pub name: String,
    pub building: String,
    pub sequence: i32,
    pub max_fingerprints: i32,
    pub status: String,
    pub last_seen: Option<String>,
    /// 派生字段：last_seen 距今不超过离线阈值
    pub online: bool,
}

impl DeviceResponse {
    fn from_model(device: devices::Model, offline_threshold: i64, now: NaiveDateTime) -> Self {
        let online = is_online(device.last_seen, offline_threshold, now);
        Self {
            id: device.id,
            device_id: device.device_id,
            name: device.name,
            building: device.building,
            sequence: device.sequence,
            max_fingerprints: device.max_fingerprints,
            status: device.status,
            last_seen: device
                .last_seen
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            online,
        }
    }
}

/// 在线判定
#[must_use]
pub fn is_online(last_seen: Option<NaiveDateTime>, offline_threshold: i64, now: NaiveDateTime) -> bool {
    last_seen.is_some_and(|seen| (now - seen).num_seconds() <= offline_threshold)
}

#[derive(Debug)]
pub struct ListDevicesResult {
    pub devices: Vec<DeviceResponse>,
    pub pagination: Pagination,
}

/// 设备管理服务
pub struct DeviceService<'a> {
    db: &'a DatabaseConnection,
    offline_threshold: i64,
}

impl<'a> DeviceService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
            offline_threshold: state.config.hardware.offline_threshold,
        }
    }

    #[must_use]
    pub const fn with_db(db: &'a DatabaseConnection, offline_threshold: i64) -> Self {
        Self {
            db,
            offline_threshold,
        }
    }

    /// 分页查询设备
    pub async fn list(&self, query: &DeviceQuery) -> Result<ListDevicesResult> {
        let params = PaginationParams::new(query.page, query.limit, 20, 100);

        let mut select = Devices::find();
        if let Some(status) = &query.status {
            select = select.filter(devices::Column::Status.eq(status));
        }
        if let Some(building) = &query.building {
            select = select.filter(devices::Column::Building.eq(building));
        }

        let total = select.clone().count(self.db).await?;
        let rows = select
            .order_by_asc(devices::Column::Building)
            .order_by_asc(devices::Column::Sequence)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await?;

        let now = Utc::now().naive_utc();
        Ok(ListDevicesResult {
            devices: rows
                .into_iter()
                .map(|d| DeviceResponse::from_model(d, self.offline_threshold, now))
                .collect(),
            pagination: build_page(total, params).into(),
        })
    }

    pub async fn get(&self, id: i32) -> Result<DeviceResponse> {
        let device = Devices::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| DormError::not_found(format!("设备记录 {id} 不存在")))?;
        Ok(DeviceResponse::from_model(
            device,
            self.offline_threshold,
            Utc::now().naive_utc(),
        ))
    }

    pub async fn find_by_device_id(&self, device_id: &str) -> Result<devices::Model> {
        Devices::find()
            .filter(devices::Column::DeviceId.eq(device_id))
            .one(self.db)
            .await?
            .ok_or_else(|| DormError::not_found(format!("设备 {device_id} 不存在")))
    }

    /// 创建设备
    pub async fn create(&self, request: &CreateDeviceRequest) -> Result<DeviceResponse> {
        if request.device_id.trim().is_empty() {
            return Err(DormError::validation("设备号不能为空"));
        }
        if request.name.trim().is_empty() {
            return Err(DormError::validation("设备名称不能为空"));
        }
        let status = request
            .status
            .as_deref()
            .unwrap_or("active")
            .parse::<DeviceStatus>()?;

        let exists = Devices::find()
            .filter(devices::Column::DeviceId.eq(&request.device_id))
            .one(self.db)
            .await?;
        if exists.is_some() {
            return Err(DormError::conflict(format!(
                "设备号 {} 已存在",
                request.device_id
            )));
        }

        let now = Utc::now().naive_utc();
        let device = devices::ActiveModel {
            device_id: Set(request.device_id.trim().to_string()),
            name: Set(request.name.trim().to_string()),
            building: Set(request.building.clone()),
            sequence: Set(request.sequence),
            max_fingerprints: Set(request.max_fingerprints.unwrap_or(1000)),
            status: Set(status.as_str().to_string()),
            last_seen: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let created = device.insert(self.db).await?;
        Ok(DeviceResponse::from_model(
            created,
            self.offline_threshold,
            now,
        ))
    }

    /// 更新设备
    pub async fn update(&self, id: i32, request: &UpdateDeviceRequest) -> Result<DeviceResponse> {
        let device = Devices::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| DormError::not_found(format!("设备记录 {id} 不存在")))?;

        let mut active: devices::ActiveModel = device.into();
        if let Some(name) = &request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(building) = &request.building {
            active.building = Set(building.clone());
        }
        if let Some(sequence) = request.sequence {
            active.sequence = Set(sequence);
        }
        if let Some(max_fingerprints) = request.max_fingerprints {
            if max_fingerprints <= 0 {
                return Err(DormError::validation("指纹容量必须大于 0"));
            }
            active.max_fingerprints = Set(max_fingerprints);
        }
        if let Some(status) = &request.status {
            let parsed: DeviceStatus = status.parse()?;
            active.status = Set(parsed.as_str().to_string());
        }
        active.updated_at = Set(Utc::now().naive_utc());

        let updated = active.update(self.db).await?;
        Ok(DeviceResponse::from_model(
            updated,
            self.offline_threshold,
            Utc::now().naive_utc(),
        ))
    }

    /// 删除设备
    pub async fn delete(&self, id: i32) -> Result<()> {
        let result = Devices::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(DormError::not_found(format!("设备记录 {id} 不存在")));
        }
        Ok(())
    }

    /// 硬件心跳：刷新 last_seen
    pub async fn heartbeat(&self, device_id: &str) -> Result<()> {
        let device = self.find_by_device_id(device_id).await?;
        let mut active: devices::ActiveModel = device.into();
        active.last_seen = Set(Some(Utc::now().naive_utc()));
        active.update(self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures::DeviceFixture, helpers::create_test_db};
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    #[test]
    fn online_heuristic_uses_threshold() {
        let now = Utc::now().naive_utc();
        assert!(!is_online(None, 120, now));
        assert!(is_online(Some(now - Duration::seconds(60)), 120, now));
        assert!(is_online(Some(now - Duration::seconds(120)), 120, now));
        assert!(!is_online(Some(now - Duration::seconds(121)), 120, now));
    }

    #[tokio::test]
    async fn create_get_update_delete() {
        let db = create_test_db().await.unwrap();
        let service = DeviceService::with_db(&db, 120);

        let created = service
            .create(&CreateDeviceRequest {
                device_id: "FP-A-01".to_string(),
                name: "6号楼东门".to_string(),
                building: "6号楼".to_string(),
                sequence: 1,
                max_fingerprints: Some(500),
                status: None,
            })
            .await
            .unwrap();
        assert_eq!(created.status, "active");
        assert!(!created.online);

        let err = service
            .create(&CreateDeviceRequest {
                device_id: "FP-A-01".to_string(),
                name: "重复".to_string(),
                building: "6号楼".to_string(),
                sequence: 2,
                max_fingerprints: None,
                status: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_and_code().1, "RESOURCE_CONFLICT");

        let updated = service
            .update(
                created.id,
                &UpdateDeviceRequest {
                    name: None,
                    building: None,
                    sequence: None,
                    max_fingerprints: None,
                    status: Some("maintenance".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, "maintenance");

        service.delete(created.id).await.unwrap();
        assert!(service.get(created.id).await.is_err());
    }

    #[tokio::test]
    async fn heartbeat_marks_device_online() {
        let db = create_test_db().await.unwrap();
        DeviceFixture::new().device_id("FP-A-01").insert(&db).await;
        let service = DeviceService::with_db(&db, 120);

        service.heartbeat("FP-A-01").await.unwrap();

        let listed = service.list(&DeviceQuery::default()).await.unwrap();
        assert_eq!(listed.devices.len(), 1);
        assert!(listed.devices[0].online);

        assert!(service.heartbeat("FP-X-99").await.is_err());
    }

    #[tokio::test]
    async fn invalid_status_is_rejected() {
        let db = create_test_db().await.unwrap();
        let service = DeviceService::with_db(&db, 120);

        let err = service
            .create(&CreateDeviceRequest {
                device_id: "FP-A-02".to_string(),
                name: "测试".to_string(),
                building: "6号楼".to_string(),
                sequence: 0,
                max_fingerprints: None,
                status: Some("broken".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_and_code().1, "VALIDATION_ERROR");
    }
}

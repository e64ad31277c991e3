//! # 看板聚合服务
//!
//! 首页统计卡片：当日各状态人数、待审批假条与设备在线数。
//! 聚合结果短暂缓存；逐学生的状态派生本身永远现算。

use chrono::{NaiveDate, Utc};
use entity::{devices, leave_applications, students};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cache::{CacheKey, CacheProvider, MemoryCache};
use crate::error::Result;
use crate::management::server::AppState;
use crate::types::{CheckStatus, DerivedStatus};

use super::checks::CheckRecordsService;
use super::devices::is_online;

/// 聚合缓存的保留时间
const DASHBOARD_TTL: Duration = Duration::from_secs(30);

/// 看板响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub date: String,
    pub total_students: u64,
    pub present: u64,
    pub out: u64,
    pub on_leave: u64,
    pub unchecked: u64,
    pub pending_leaves: u64,
    pub devices_total: u64,
    pub devices_online: u64,
}

/// 看板聚合服务
pub struct DashboardService<'a> {
    db: &'a DatabaseConnection,
    cache: Option<&'a MemoryCache>,
    offline_threshold: i64,
}

impl<'a> DashboardService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
            cache: Some(state.cache.as_ref()),
            offline_threshold: state.config.hardware.offline_threshold,
        }
    }

    #[must_use]
    pub const fn with_db(db: &'a DatabaseConnection, offline_threshold: i64) -> Self {
        Self {
            db,
            cache: None,
            offline_threshold,
        }
    }

    /// 读取看板（短 TTL 缓存）
    pub async fn summary(&self, date: NaiveDate) -> Result<DashboardResponse> {
        let key = CacheKey::Dashboard {
            date: date.format("%Y-%m-%d").to_string(),
        }
        .build();

        if let Some(cache) = self.cache {
            if let Some(cached) = cache.get::<DashboardResponse>(&key).await? {
                return Ok(cached);
            }
        }

        let computed = self.compute(date).await?;

        if let Some(cache) = self.cache {
            cache
                .set(&key, computed.clone(), Some(DASHBOARD_TTL))
                .await?;
        }
        Ok(computed)
    }

    /// 现算看板数据
    pub async fn compute(&self, date: NaiveDate) -> Result<DashboardResponse> {
        let checks = CheckRecordsService::with_db(self.db);

        let all_students = students::Entity::find().all(self.db).await?;
        let total_students = all_students.len() as u64;

        let mut present = 0_u64;
        let mut out = 0_u64;
        let mut on_leave = 0_u64;
        let mut unchecked = 0_u64;
        for student in &all_students {
            match checks.current_status(&student.student_id, date).await? {
                DerivedStatus::Checked(CheckStatus::Present) => present += 1,
                DerivedStatus::Checked(CheckStatus::Out) => out += 1,
                DerivedStatus::Checked(CheckStatus::OnLeave) => on_leave += 1,
                DerivedStatus::NotCheckedIn => unchecked += 1,
            }
        }

        let pending_leaves = leave_applications::Entity::find()
            .filter(leave_applications::Column::Status.eq("pending"))
            .count(self.db)
            .await?;

        let all_devices = devices::Entity::find().all(self.db).await?;
        let devices_total = all_devices.len() as u64;
        let now = Utc::now().naive_utc();
        let devices_online = all_devices
            .iter()
            .filter(|d| is_online(d.last_seen, self.offline_threshold, now))
            .count() as u64;

        Ok(DashboardResponse {
            date: date.format("%Y-%m-%d").to_string(),
            total_students,
            present,
            out,
            on_leave,
            unchecked,
            pending_leaves,
            devices_total,
            devices_online,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        fixtures::{DeviceFixture, StudentFixture},
        helpers::create_test_db,
    };
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn compute_counts_statuses() {
        let db = create_test_db().await.unwrap();
        StudentFixture::new().student_id("20230001").insert(&db).await;
        StudentFixture::new()
            .student_id("20230002")
            .name("李四")
            .insert(&db)
            .await;
        StudentFixture::new()
            .student_id("20230003")
            .name("王五")
            .insert(&db)
            .await;
        DeviceFixture::new().device_id("FP-A-01").insert(&db).await;

        let checks = CheckRecordsService::with_db(&db);
        let now = Utc::now().naive_utc();
        checks
            .insert_record("20230001", CheckStatus::Present, now, "FP-A-01")
            .await
            .unwrap();
        checks
            .insert_record("20230002", CheckStatus::OnLeave, now, "admin")
            .await
            .unwrap();

        let service = DashboardService::with_db(&db, 120);
        let summary = service.compute(now.date()).await.unwrap();

        assert_eq!(summary.total_students, 3);
        assert_eq!(summary.present, 1);
        assert_eq!(summary.on_leave, 1);
        assert_eq!(summary.unchecked, 1);
        assert_eq!(summary.out, 0);
        assert_eq!(summary.devices_total, 1);
        assert_eq!(summary.devices_online, 0);
    }
}

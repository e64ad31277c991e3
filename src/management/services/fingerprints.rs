//! # 指纹映射服务
//!
//! 批量导入校验：逐行校验、逐行落库，部分成功是常态，
//! 不做整体事务回滚；结果按行返回并附带汇总计数。

use chrono::Utc;
use entity::{
    devices, fingerprint_mappings, fingerprint_mappings::Entity as FingerprintMappings, students,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{DormError, Result};
use crate::management::response::Pagination;
use crate::management::server::AppState;
use crate::types::{DeviceStatus, EnrollmentStatus};

use super::shared::{PaginationParams, build_page};

/// 指纹槽位上限（含）
pub const MAX_FINGERPRINT_ID: i32 = 999;

/// 批量导入的候选行
#[derive(Debug, Clone, Deserialize)]
pub struct FingerprintBatchRow {
    pub student_id: String,
    pub device_id: String,
    pub fingerprint_id: i32,
    pub finger_index: Option<i32>,
}

/// 单行校验/落库结果
#[derive(Debug, Serialize)]
pub struct RowOutcome {
    /// 行号（从 1 开始）
    pub row: usize,
    pub student_id: String,
    pub device_id: String,
    pub fingerprint_id: i32,
    pub accepted: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// 批量导入汇总
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub warnings: usize,
    pub rows: Vec<RowOutcome>,
}

/// 指纹映射列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct FingerprintQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub device_id: Option<String>,
    pub student_id: Option<String>,
    pub enrollment_status: Option<String>,
}

/// 指纹映射响应
#[derive(Debug, Serialize)]
pub struct FingerprintResponse {
    pub id: i32,
    pub device_id: String,
    pub fingerprint_id: i32,
    pub student_id: String,
    pub finger_index: Option<i32>,
    pub enrollment_status: String,
}

impl From<fingerprint_mappings::Model> for FingerprintResponse {
    fn from(mapping: fingerprint_mappings::Model) -> Self {
        Self {
            id: mapping.id,
            device_id: mapping.device_id,
            fingerprint_id: mapping.fingerprint_id,
            student_id: mapping.student_id,
            finger_index: mapping.finger_index,
            enrollment_status: mapping.enrollment_status,
        }
    }
}

#[derive(Debug)]
pub struct ListFingerprintsResult {
    pub mappings: Vec<FingerprintResponse>,
    pub pagination: Pagination,
}

/// 行校验的中间结论
enum RowVerdict {
    /// 可落库；若该槽位已有 failed 映射则走更新
    Insert { update_existing: Option<i32>, warning: Option<String> },
    Reject(String),
}

/// 指纹映射服务
pub struct FingerprintService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> FingerprintService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
        }
    }

    #[must_use]
    pub const fn with_db(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// 批量导入指纹映射
    ///
    /// 先整体校验（含批内查重），再逐行落库；已成功的行不随后续失败回滚。
    pub async fn batch_import(&self, rows: &[FingerprintBatchRow]) -> Result<BatchReport> {
        // 批内查重索引：学号与 (设备, 槽位) 各自出现的行号（1 起）
        let mut student_rows: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut slot_rows: HashMap<(&str, i32), Vec<usize>> = HashMap::new();
        for (idx, row) in rows.iter().enumerate() {
            student_rows
                .entry(row.student_id.as_str())
                .or_default()
                .push(idx + 1);
            slot_rows
                .entry((row.device_id.as_str(), row.fingerprint_id))
                .or_default()
                .push(idx + 1);
        }

        let mut outcomes = Vec::with_capacity(rows.len());
        let mut verdicts = Vec::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            let row_no = idx + 1;
            let verdict = self
                .validate_row(row, row_no, &student_rows, &slot_rows)
                .await?;
            verdicts.push(verdict);
        }

        let mut accepted = 0_usize;
        let mut rejected = 0_usize;
        let mut warnings = 0_usize;

        for (idx, (row, verdict)) in rows.iter().zip(verdicts).enumerate() {
            let row_no = idx + 1;
            match verdict {
                RowVerdict::Reject(message) => {
                    rejected += 1;
                    outcomes.push(RowOutcome {
                        row: row_no,
                        student_id: row.student_id.clone(),
                        device_id: row.device_id.clone(),
                        fingerprint_id: row.fingerprint_id,
                        accepted: false,
                        message,
                        warning: None,
                    });
                }
                RowVerdict::Insert {
                    update_existing,
                    warning,
                } => match self.persist_row(row, update_existing).await {
                    Ok(()) => {
                        accepted += 1;
                        if warning.is_some() {
                            warnings += 1;
                        }
                        outcomes.push(RowOutcome {
                            row: row_no,
                            student_id: row.student_id.clone(),
                            device_id: row.device_id.clone(),
                            fingerprint_id: row.fingerprint_id,
                            accepted: true,
                            message: "已登记".to_string(),
                            warning,
                        });
                    }
                    Err(e) => {
                        rejected += 1;
                        outcomes.push(RowOutcome {
                            row: row_no,
                            student_id: row.student_id.clone(),
                            device_id: row.device_id.clone(),
                            fingerprint_id: row.fingerprint_id,
                            accepted: false,
                            message: format!("写入失败: {e}"),
                            warning: None,
                        });
                    }
                },
            }
        }

        Ok(BatchReport {
            total: rows.len(),
            accepted,
            rejected,
            warnings,
            rows: outcomes,
        })
    }

    async fn validate_row(
        &self,
        row: &FingerprintBatchRow,
        row_no: usize,
        student_rows: &HashMap<&str, Vec<usize>>,
        slot_rows: &HashMap<(&str, i32), Vec<usize>>,
    ) -> Result<RowVerdict> {
        // 1. 学号必须存在
        if row.student_id.trim().is_empty() {
            return Ok(RowVerdict::Reject("缺少学号".to_string()));
        }
        let student = students::Entity::find()
            .filter(students::Column::StudentId.eq(&row.student_id))
            .one(self.db)
            .await?;
        if student.is_none() {
            return Ok(RowVerdict::Reject(format!(
                "学生 {} 不存在",
                row.student_id
            )));
        }

        // 2. 设备必须存在且处于 active 状态
        if row.device_id.trim().is_empty() {
            return Ok(RowVerdict::Reject("缺少设备号".to_string()));
        }
        let device = devices::Entity::find()
            .filter(devices::Column::DeviceId.eq(&row.device_id))
            .one(self.db)
            .await?;
        let Some(device) = device else {
            return Ok(RowVerdict::Reject(format!(
                "设备 {} 不存在",
                row.device_id
            )));
        };
        if device.status.parse::<DeviceStatus>()? != DeviceStatus::Active {
            return Ok(RowVerdict::Reject(format!(
                "设备 {} 未启用（{}）",
                row.device_id, device.status
            )));
        }

        // 3. 槽位范围
        if row.fingerprint_id < 0 || row.fingerprint_id > MAX_FINGERPRINT_ID {
            return Ok(RowVerdict::Reject(format!(
                "指纹槽位 {} 超出范围 [0, {MAX_FINGERPRINT_ID}]",
                row.fingerprint_id
            )));
        }

        // 5. 批内查重（学号或槽位对在本批次内重复，所有相关行都报错并互相引用行号）
        if let Some(dups) = student_rows.get(row.student_id.as_str()) {
            if dups.len() > 1 {
                let others = cite_other_rows(dups, row_no);
                return Ok(RowVerdict::Reject(format!(
                    "学号 {} 在批次内重复（与第 {others} 行冲突）",
                    row.student_id
                )));
            }
        }
        if let Some(dups) = slot_rows.get(&(row.device_id.as_str(), row.fingerprint_id)) {
            if dups.len() > 1 {
                let others = cite_other_rows(dups, row_no);
                return Ok(RowVerdict::Reject(format!(
                    "设备 {} 槽位 {} 在批次内重复（与第 {others} 行冲突）",
                    row.device_id, row.fingerprint_id
                )));
            }
        }

        // 4. 与已有映射的冲突
        let existing = FingerprintMappings::find()
            .filter(fingerprint_mappings::Column::DeviceId.eq(&row.device_id))
            .filter(fingerprint_mappings::Column::FingerprintId.eq(row.fingerprint_id))
            .one(self.db)
            .await?;
        let mut update_existing = None;
        if let Some(existing) = existing {
            let status: EnrollmentStatus = existing.enrollment_status.parse()?;
            if status.occupies_slot() {
                if existing.student_id == row.student_id {
                    return Ok(RowVerdict::Reject("重复映射：该槽位已登记此学生".to_string()));
                }
                return Ok(RowVerdict::Reject(format!(
                    "设备 {} 槽位 {} 已被学生 {} 占用",
                    row.device_id, row.fingerprint_id, existing.student_id
                )));
            }
            // failed 状态的槽位允许覆盖登记
            update_existing = Some(existing.id);
        }

        // 同一学生在其他设备已有映射只提示，不拦截
        let elsewhere = FingerprintMappings::find()
            .filter(fingerprint_mappings::Column::StudentId.eq(&row.student_id))
            .filter(fingerprint_mappings::Column::DeviceId.ne(&row.device_id))
            .filter(
                fingerprint_mappings::Column::EnrollmentStatus
                    .is_in(["pending", "enrolled"]),
            )
            .count(self.db)
            .await?;
        let warning = (elsewhere > 0).then(|| {
            format!(
                "学生 {} 已在其他 {elsewhere} 台设备登记指纹",
                row.student_id
            )
        });

        Ok(RowVerdict::Insert {
            update_existing,
            warning,
        })
    }

    async fn persist_row(
        &self,
        row: &FingerprintBatchRow,
        update_existing: Option<i32>,
    ) -> Result<()> {
        let now = Utc::now().naive_utc();
        if let Some(id) = update_existing {
            let existing = FingerprintMappings::find_by_id(id)
                .one(self.db)
                .await?
                .ok_or_else(|| DormError::not_found("映射已被删除"))?;
            let mut active: fingerprint_mappings::ActiveModel = existing.into();
            active.student_id = Set(row.student_id.clone());
            active.finger_index = Set(row.finger_index);
            active.enrollment_status = Set(EnrollmentStatus::Pending.as_str().to_string());
            active.updated_at = Set(now);
            active.update(self.db).await?;
        } else {
            let mapping = fingerprint_mappings::ActiveModel {
                device_id: Set(row.device_id.clone()),
                fingerprint_id: Set(row.fingerprint_id),
                student_id: Set(row.student_id.clone()),
                finger_index: Set(row.finger_index),
                enrollment_status: Set(EnrollmentStatus::Pending.as_str().to_string()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            mapping.insert(self.db).await?;
        }
        Ok(())
    }

    /// 按 (设备, 槽位) 解析学生（硬件端签到用，仅 enrolled 生效）
    pub async fn resolve(&self, device_id: &str, fingerprint_id: i32) -> Result<students::Model> {
        let mapping = FingerprintMappings::find()
            .filter(fingerprint_mappings::Column::DeviceId.eq(device_id))
            .filter(fingerprint_mappings::Column::FingerprintId.eq(fingerprint_id))
            .filter(
                fingerprint_mappings::Column::EnrollmentStatus
                    .eq(EnrollmentStatus::Enrolled.as_str()),
            )
            .one(self.db)
            .await?
            .ok_or_else(|| {
                DormError::not_found(format!("设备 {device_id} 槽位 {fingerprint_id} 无已录入映射"))
            })?;

        students::Entity::find()
            .filter(students::Column::StudentId.eq(&mapping.student_id))
            .one(self.db)
            .await?
            .ok_or_else(|| DormError::not_found(format!("学生 {} 不存在", mapping.student_id)))
    }

    /// 更新录入状态
    pub async fn update_status(&self, id: i32, status: &str) -> Result<FingerprintResponse> {
        let parsed: EnrollmentStatus = status.parse()?;
        let mapping = FingerprintMappings::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| DormError::not_found(format!("指纹映射 {id} 不存在")))?;

        let mut active: fingerprint_mappings::ActiveModel = mapping.into();
        active.enrollment_status = Set(parsed.as_str().to_string());
        active.updated_at = Set(Utc::now().naive_utc());
        Ok(active.update(self.db).await?.into())
    }

    /// 删除映射
    pub async fn delete(&self, id: i32) -> Result<()> {
        let result = FingerprintMappings::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(DormError::not_found(format!("指纹映射 {id} 不存在")));
        }
        Ok(())
    }

    /// 分页查询
    pub async fn list(&self, query: &FingerprintQuery) -> Result<ListFingerprintsResult> {
        let params = PaginationParams::new(query.page, query.limit, 20, 100);

        let mut select = FingerprintMappings::find();
        if let Some(device_id) = &query.device_id {
            select = select.filter(fingerprint_mappings::Column::DeviceId.eq(device_id));
        }
        if let Some(student_id) = &query.student_id {
            select = select.filter(fingerprint_mappings::Column::StudentId.eq(student_id));
        }
        if let Some(status) = &query.enrollment_status {
            select = select.filter(fingerprint_mappings::Column::EnrollmentStatus.eq(status));
        }

        let total = select.clone().count(self.db).await?;
        let mappings = select
            .order_by_asc(fingerprint_mappings::Column::DeviceId)
            .order_by_asc(fingerprint_mappings::Column::FingerprintId)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await?;

        Ok(ListFingerprintsResult {
            mappings: mappings.into_iter().map(FingerprintResponse::from).collect(),
            pagination: build_page(total, params).into(),
        })
    }
}

/// 引用同组中除自身外的行号，如 `2、4`
fn cite_other_rows(rows: &[usize], this_row: usize) -> String {
    rows.iter()
        .filter(|&&r| r != this_row)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("、")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        fixtures::{DeviceFixture, StudentFixture},
        helpers::create_test_db,
    };
    use pretty_assertions::assert_eq;

    fn row(student_id: &str, device_id: &str, fingerprint_id: i32) -> FingerprintBatchRow {
        FingerprintBatchRow {
            student_id: student_id.to_string(),
            device_id: device_id.to_string(),
            fingerprint_id,
            finger_index: Some(1),
        }
    }

    async fn seed(db: &sea_orm::DatabaseConnection) {
        StudentFixture::new().student_id("20230001").insert(db).await;
        StudentFixture::new()
            .student_id("20230002")
            .name("李四")
            .insert(db)
            .await;
        DeviceFixture::new().device_id("FP-A-01").insert(db).await;
    }

    #[tokio::test]
    async fn duplicate_pair_in_batch_rejects_both_rows() {
        let db = create_test_db().await.unwrap();
        seed(&db).await;
        let service = FingerprintService::with_db(&db);

        let report = service
            .batch_import(&[row("20230001", "FP-A-01", 5), row("20230002", "FP-A-01", 5)])
            .await
            .unwrap();

        assert_eq!(report.accepted, 0);
        assert_eq!(report.rejected, 2);
        assert!(report.rows[0].message.contains("第 2 行"));
        assert!(report.rows[1].message.contains("第 1 行"));

        // 该槽位没有任何行落库
        let committed = FingerprintMappings::find().all(&db).await.unwrap();
        assert!(committed.is_empty());
    }

    #[tokio::test]
    async fn duplicate_student_in_batch_rejects_both_rows() {
        let db = create_test_db().await.unwrap();
        seed(&db).await;
        let service = FingerprintService::with_db(&db);

        let report = service
            .batch_import(&[row("20230001", "FP-A-01", 1), row("20230001", "FP-A-01", 2)])
            .await
            .unwrap();

        assert_eq!(report.accepted, 0);
        assert_eq!(report.rejected, 2);
    }

    #[tokio::test]
    async fn unknown_student_and_device_are_rejected() {
        let db = create_test_db().await.unwrap();
        seed(&db).await;
        let service = FingerprintService::with_db(&db);

        let report = service
            .batch_import(&[
                row("99999999", "FP-A-01", 1),
                row("20230001", "FP-X-99", 2),
                row("20230002", "FP-A-01", 1000),
            ])
            .await
            .unwrap();

        assert_eq!(report.accepted, 0);
        assert_eq!(report.rejected, 3);
        assert!(report.rows[0].message.contains("不存在"));
        assert!(report.rows[1].message.contains("不存在"));
        assert!(report.rows[2].message.contains("超出范围"));
    }

    #[tokio::test]
    async fn inactive_device_is_rejected() {
        let db = create_test_db().await.unwrap();
        seed(&db).await;
        DeviceFixture::new()
            .device_id("FP-B-01")
            .status("maintenance")
            .insert(&db)
            .await;
        let service = FingerprintService::with_db(&db);

        let report = service
            .batch_import(&[row("20230001", "FP-B-01", 1)])
            .await
            .unwrap();
        assert_eq!(report.rejected, 1);
        assert!(report.rows[0].message.contains("未启用"));
    }

    #[tokio::test]
    async fn occupied_slot_conflicts_are_rejected() {
        let db = create_test_db().await.unwrap();
        seed(&db).await;
        let service = FingerprintService::with_db(&db);

        let first = service
            .batch_import(&[row("20230001", "FP-A-01", 5)])
            .await
            .unwrap();
        assert_eq!(first.accepted, 1);

        // 同一槽位映射另一学生 → 冲突；映射同一学生 → 完全重复
        let report = service
            .batch_import(&[row("20230002", "FP-A-01", 5)])
            .await
            .unwrap();
        assert_eq!(report.rejected, 1);
        assert!(report.rows[0].message.contains("占用"));

        let report = service
            .batch_import(&[row("20230001", "FP-A-01", 5)])
            .await
            .unwrap();
        assert_eq!(report.rejected, 1);
        assert!(report.rows[0].message.contains("重复映射"));
    }

    #[tokio::test]
    async fn cross_device_mapping_is_warning_only() {
        let db = create_test_db().await.unwrap();
        seed(&db).await;
        DeviceFixture::new().device_id("FP-B-01").insert(&db).await;
        let service = FingerprintService::with_db(&db);

        service
            .batch_import(&[row("20230001", "FP-A-01", 5)])
            .await
            .unwrap();

        let report = service
            .batch_import(&[row("20230001", "FP-B-01", 7)])
            .await
            .unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.warnings, 1);
        assert!(report.rows[0].warning.as_ref().unwrap().contains("其他"));
    }

    #[tokio::test]
    async fn partial_success_keeps_good_rows() {
        let db = create_test_db().await.unwrap();
        seed(&db).await;
        let service = FingerprintService::with_db(&db);

        let report = service
            .batch_import(&[row("20230001", "FP-A-01", 1), row("99999999", "FP-A-01", 2)])
            .await
            .unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected, 1);

        let committed = FingerprintMappings::find().all(&db).await.unwrap();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].student_id, "20230001");
    }

    #[tokio::test]
    async fn failed_slot_can_be_reenrolled() {
        let db = create_test_db().await.unwrap();
        seed(&db).await;
        let service = FingerprintService::with_db(&db);

        let report = service
            .batch_import(&[row("20230001", "FP-A-01", 5)])
            .await
            .unwrap();
        let id = {
            let committed = FingerprintMappings::find().all(&db).await.unwrap();
            committed[0].id
        };
        assert_eq!(report.accepted, 1);
        service.update_status(id, "failed").await.unwrap();

        // failed 槽位允许另一学生覆盖登记
        let report = service
            .batch_import(&[row("20230002", "FP-A-01", 5)])
            .await
            .unwrap();
        assert_eq!(report.accepted, 1);

        let committed = FingerprintMappings::find().all(&db).await.unwrap();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].student_id, "20230002");
        assert_eq!(committed[0].enrollment_status, "pending");
    }

    #[tokio::test]
    async fn resolve_requires_enrolled_mapping() {
        let db = create_test_db().await.unwrap();
        seed(&db).await;
        let service = FingerprintService::with_db(&db);

        service
            .batch_import(&[row("20230001", "FP-A-01", 5)])
            .await
            .unwrap();

        // pending 不可用于签到
        assert!(service.resolve("FP-A-01", 5).await.is_err());

        let id = FingerprintMappings::find().all(&db).await.unwrap()[0].id;
        service.update_status(id, "enrolled").await.unwrap();

        let student = service.resolve("FP-A-01", 5).await.unwrap();
        assert_eq!(student.student_id, "20230001");
    }
}

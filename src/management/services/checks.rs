//! # 签到记录服务
//!
//! 归寝状态的写入与派生读取。"当前状态"永远从记录日志现算，
//! 不落任何物化列；唯一的例外是请假审批会提前写入状态记录（见 leaves 模块）。

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use entity::{check_records, check_records::Entity as CheckRecords, students};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::error::{DormError, Result};
use crate::management::response::Pagination;
use crate::management::server::AppState;
use crate::types::{CheckStatus, DerivedStatus, day_bounds};

use super::shared::{PaginationParams, build_page};

/// 签到记录列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct CheckQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub student_id: Option<String>,
    /// 限定某个日历日（YYYY-MM-DD）
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
}

/// 手工补录签到请求
#[derive(Debug, Deserialize)]
pub struct CreateCheckRequest {
    pub student_id: String,
    pub status: String,
    /// 省略时取当前时间
    pub check_time: Option<NaiveDateTime>,
}

/// 取消请假状态请求（管理端动作，作用于签到记录而非申请单）
#[derive(Debug, Deserialize)]
pub struct CancelLeaveRequest {
    pub student_id: String,
    pub date: NaiveDate,
}

/// 签到记录响应
#[derive(Debug, Serialize)]
pub struct CheckRecordResponse {
    pub id: i32,
    pub student_id: String,
    pub status: String,
    pub check_time: String,
    pub recorder: String,
}

impl From<check_records::Model> for CheckRecordResponse {
    fn from(record: check_records::Model) -> Self {
        Self {
            id: record.id,
            student_id: record.student_id,
            status: record.status,
            check_time: record.check_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            recorder: record.recorder,
        }
    }
}

/// 查寝看板中的一行
#[derive(Debug, Serialize)]
pub struct BoardEntry {
    pub student_id: String,
    pub name: String,
    pub class_name: String,
    pub building: String,
    pub room: String,
    /// 派生状态：在寝 / 离寝 / 请假 / 未签到
    pub status: String,
}

#[derive(Debug)]
pub struct ListChecksResult {
    pub records: Vec<CheckRecordResponse>,
    pub pagination: Pagination,
}

/// 请假/销假记录的生效时间。
///
/// 写入非当日日期时必须落在该日内且不早于当日已有记录，
/// 否则在 `(check_time, id)` 排序下无法生效；同一时刻由 id 更大者胜出。
#[must_use]
pub fn status_mark_time(date: NaiveDate, now: NaiveDateTime) -> NaiveDateTime {
    if date == now.date() {
        now
    } else {
        date.and_time(NaiveTime::from_hms_opt(23, 59, 59).expect("valid time"))
    }
}

/// 签到记录服务
pub struct CheckRecordsService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> CheckRecordsService<'a> {
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

    /// 派生某学生在某日的当前状态
    ///
    /// 取该日 `(check_time, id)` 最大的一条记录的状态；无记录返回"未签到"。
    /// 每次读取都重新计算。
    pub async fn current_status(&self, student_id: &str, date: NaiveDate) -> Result<DerivedStatus> {
        let (start, end) = day_bounds(date);

        let latest = CheckRecords::find()
            .filter(check_records::Column::StudentId.eq(student_id))
            .filter(check_records::Column::CheckTime.gte(start))
            .filter(check_records::Column::CheckTime.lt(end))
            .order_by_desc(check_records::Column::CheckTime)
            // 同一时刻的插入按自增 id 取最大者
            .order_by_desc(check_records::Column::Id)
            .one(self.db)
            .await?;

        match latest {
            Some(record) => {
                let status: CheckStatus = record.status.parse()?;
                Ok(DerivedStatus::Checked(status))
            }
            None => Ok(DerivedStatus::NotCheckedIn),
        }
    }

    /// 追加一条状态记录
    pub async fn insert_record(
        &self,
        student_id: &str,
        status: CheckStatus,
        check_time: NaiveDateTime,
        recorder: &str,
    ) -> Result<check_records::Model> {
        let record = check_records::ActiveModel {
            student_id: Set(student_id.to_string()),
            status: Set(status.as_str().to_string()),
            check_time: Set(check_time),
            recorder: Set(recorder.to_string()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };
        Ok(record.insert(self.db).await?)
    }

    /// 手工补录签到
    pub async fn create_manual(
        &self,
        request: &CreateCheckRequest,
        operator: &str,
    ) -> Result<CheckRecordResponse> {
        let status: CheckStatus = request.status.parse()?;

        let exists = students::Entity::find()
            .filter(students::Column::StudentId.eq(&request.student_id))
            .one(self.db)
            .await?;
        if exists.is_none() {
            return Err(DormError::not_found(format!(
                "学生 {} 不存在",
                request.student_id
            )));
        }

        let check_time = request.check_time.unwrap_or_else(|| Utc::now().naive_utc());
        let record = self
            .insert_record(&request.student_id, status, check_time, operator)
            .await?;
        Ok(record.into())
    }

    /// 取消某日的请假状态
    ///
    /// 仅向签到记录追加一条"在寝"，让派生排序盖过"请假"；
    /// 不回写任何请假申请行——申请单与在寝状态只通过审批副作用松耦合。
    pub async fn cancel_leave_status(
        &self,
        student_id: &str,
        operator: &str,
        date: NaiveDate,
    ) -> Result<CheckRecordResponse> {
        let current = self.current_status(student_id, date).await?;
        if !current.is_on_leave() {
            return Err(DormError::business(format!(
                "该学生 {date} 状态为「{current}」，无请假可取消"
            )));
        }

        let mark_time = status_mark_time(date, Utc::now().naive_utc());
        let record = self
            .insert_record(student_id, CheckStatus::Present, mark_time, operator)
            .await?;
        Ok(record.into())
    }

    /// 分页查询签到记录
    pub async fn list(&self, query: &CheckQuery) -> Result<ListChecksResult> {
        let params = PaginationParams::new(query.page, query.limit, 20, 100);

        let mut select = CheckRecords::find();
        if let Some(student_id) = &query.student_id {
            select = select.filter(check_records::Column::StudentId.eq(student_id));
        }
        if let Some(date) = query.date {
            let (start, end) = day_bounds(date);
            select = select
                .filter(check_records::Column::CheckTime.gte(start))
                .filter(check_records::Column::CheckTime.lt(end));
        }
        if let Some(status) = &query.status {
            select = select.filter(check_records::Column::Status.eq(status));
        }

        let total = select.clone().count(self.db).await?;
        let records = select
            .order_by_desc(check_records::Column::CheckTime)
            .order_by_desc(check_records::Column::Id)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await?;

        Ok(ListChecksResult {
            records: records.into_iter().map(CheckRecordResponse::from).collect(),
            pagination: build_page(total, params).into(),
        })
    }

    /// 导出用：按相同过滤条件返回全部记录，不分页
    pub async fn export(&self, query: &CheckQuery) -> Result<Vec<CheckRecordResponse>> {
        let mut select = CheckRecords::find();
        if let Some(student_id) = &query.student_id {
            select = select.filter(check_records::Column::StudentId.eq(student_id));
        }
        if let Some(date) = query.date {
            let (start, end) = day_bounds(date);
            select = select
                .filter(check_records::Column::CheckTime.gte(start))
                .filter(check_records::Column::CheckTime.lt(end));
        }
        if let Some(status) = &query.status {
            select = select.filter(check_records::Column::Status.eq(status));
        }

        let records = select
            .order_by_desc(check_records::Column::CheckTime)
            .order_by_desc(check_records::Column::Id)
            .all(self.db)
            .await?;
        Ok(records.into_iter().map(CheckRecordResponse::from).collect())
    }

    /// 查寝看板：全体学生某日的派生状态
    pub async fn board(&self, date: NaiveDate) -> Result<Vec<BoardEntry>> {
        let all_students = students::Entity::find()
            .order_by_asc(students::Column::StudentId)
            .all(self.db)
            .await?;

        let mut entries = Vec::with_capacity(all_students.len());
        for student in all_students {
            let status = self.current_status(&student.student_id, date).await?;
            entries.push(BoardEntry {
                student_id: student.student_id,
                name: student.name,
                class_name: student.class_name,
                building: student.building,
                room: student.room,
                status: status.as_str().to_string(),
            });
        }
        Ok(entries)
    }
}

//! # 请假申请服务
//!
//! 状态机：pending -> approved / rejected / cancelled，终态不再迁移。
//! 审批通过时按日期批量预写"请假"签到记录——这是系统中派生状态与
//! 存储状态唯一允许分叉的地方，下游报表依赖该行为，不得改为纯派生。

use chrono::{NaiveDate, Utc};
use entity::{leave_applications, leave_applications::Entity as LeaveApplications, students};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::error::{DormError, Result};
use crate::management::response::Pagination;
use crate::management::server::AppState;
use crate::types::{CheckStatus, LeaveStatus, parse_leave_dates, serialize_leave_dates};

use super::checks::{CheckRecordsService, status_mark_time};
use super::shared::{PaginationParams, build_page};

/// 学生提交请假申请
#[derive(Debug, Deserialize)]
pub struct SubmitLeaveRequest {
    pub student_id: String,
    pub name: String,
    /// 请假日期（YYYY-MM-DD）
    pub leave_dates: Vec<String>,
    pub reason: String,
}

/// 请假申请列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct LeaveQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    pub class_name: Option<String>,
    pub student_id: Option<String>,
}

/// 请假申请响应
#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    pub id: i32,
    pub student_id: String,
    pub student_name: String,
    pub class_name: String,
    pub leave_dates: Vec<String>,
    pub reason: String,
    pub status: String,
    pub status_label: String,
    pub apply_time: String,
    pub reviewer: Option<String>,
    pub review_time: Option<String>,
}

impl From<leave_applications::Model> for LeaveResponse {
    fn from(app: leave_applications::Model) -> Self {
        let status_label = app
            .status
            .parse::<LeaveStatus>()
            .map_or("未知", LeaveStatus::label);
        Self {
            id: app.id,
            student_id: app.student_id,
            student_name: app.student_name,
            class_name: app.class_name,
            leave_dates: serde_json::from_str(&app.leave_dates).unwrap_or_default(),
            reason: app.reason,
            status: app.status,
            status_label: status_label.to_string(),
            apply_time: app.apply_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            reviewer: app.reviewer,
            review_time: app
                .review_time
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

#[derive(Debug)]
pub struct ListLeavesResult {
    pub applications: Vec<LeaveResponse>,
    pub pagination: Pagination,
}

/// 请假申请服务
pub struct LeaveService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> LeaveService<'a> {
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

    /// 按学号+姓名核对学生身份（自助端弱身份校验）
    pub async fn verify_student(&self, student_id: &str, name: &str) -> Result<students::Model> {
        let student = students::Entity::find()
            .filter(students::Column::StudentId.eq(student_id))
            .filter(students::Column::Name.eq(name))
            .one(self.db)
            .await?;
        student.ok_or_else(|| DormError::not_found("学号或姓名不正确"))
    }

    /// 提交请假申请
    ///
    /// 两个并发提交同一学生同一日期不会互斥，这里不做跨请求锁。
    pub async fn submit(&self, request: &SubmitLeaveRequest) -> Result<LeaveResponse> {
        let student = self
            .verify_student(&request.student_id, &request.name)
            .await?;

        if request.leave_dates.is_empty() {
            return Err(DormError::validation("请至少选择一个请假日期"));
        }
        if request.reason.trim().is_empty() {
            return Err(DormError::validation("请填写请假事由"));
        }

        let today = Utc::now().naive_utc().date();
        let mut dates: Vec<NaiveDate> = Vec::with_capacity(request.leave_dates.len());
        for raw in &request.leave_dates {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| DormError::validation(format!("日期格式错误: {raw}")))?;
            if date < today {
                return Err(DormError::validation(format!("请假日期 {raw} 早于今天")));
            }
            dates.push(date);
        }
        dates.sort_unstable();
        dates.dedup();

        let app = leave_applications::ActiveModel {
            student_id: Set(student.student_id),
            student_name: Set(student.name),
            class_name: Set(student.class_name),
            leave_dates: Set(serialize_leave_dates(&dates)),
            reason: Set(request.reason.trim().to_string()),
            status: Set(LeaveStatus::Pending.as_str().to_string()),
            apply_time: Set(Utc::now().naive_utc()),
            reviewer: Set(None),
            review_time: Set(None),
            ..Default::default()
        };
        Ok(app.insert(self.db).await?.into())
    }

    async fn fetch(&self, id: i32) -> Result<leave_applications::Model> {
        LeaveApplications::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| DormError::not_found(format!("请假申请 {id} 不存在")))
    }

    /// 校验当前状态是否允许审核
    fn ensure_pending(app: &leave_applications::Model) -> Result<()> {
        let status: LeaveStatus = app.status.parse()?;
        match status {
            LeaveStatus::Pending => Ok(()),
            LeaveStatus::Approved | LeaveStatus::Rejected => {
                Err(DormError::business("该申请已审核，不能重复操作"))
            }
            LeaveStatus::Cancelled => Err(DormError::business("该申请已被学生取消")),
        }
    }

    /// 审批通过
    ///
    /// 副作用：为每个请假日期写入一条"请假"签到记录（含未来日期），
    /// 之后该日期的派生状态即为请假，即便设备从未扫描过该学生。
    /// 并发双重审批仅靠此处的 pending 复查拦截，不加行锁。
    pub async fn approve(&self, id: i32, reviewer: &str) -> Result<LeaveResponse> {
        let app = self.fetch(id).await?;
        Self::ensure_pending(&app)?;

        let dates = parse_leave_dates(&app.leave_dates)?;
        let student_id = app.student_id.clone();

        let mut active: leave_applications::ActiveModel = app.into();
        active.status = Set(LeaveStatus::Approved.as_str().to_string());
        active.reviewer = Set(Some(reviewer.to_string()));
        active.review_time = Set(Some(Utc::now().naive_utc()));
        let updated = active.update(self.db).await?;

        let checks = CheckRecordsService::with_db(self.db);
        let now = Utc::now().naive_utc();
        for date in dates {
            checks
                .insert_record(
                    &student_id,
                    CheckStatus::OnLeave,
                    status_mark_time(date, now),
                    reviewer,
                )
                .await?;
        }

        Ok(updated.into())
    }

    /// 驳回申请（无签到记录副作用）
    pub async fn reject(&self, id: i32, reviewer: &str) -> Result<LeaveResponse> {
        let app = self.fetch(id).await?;
        Self::ensure_pending(&app)?;

        let mut active: leave_applications::ActiveModel = app.into();
        active.status = Set(LeaveStatus::Rejected.as_str().to_string());
        active.reviewer = Set(Some(reviewer.to_string()));
        active.review_time = Set(Some(Utc::now().naive_utc()));
        Ok(active.update(self.db).await?.into())
    }

    /// 学生撤回自己的待审申请
    pub async fn cancel(&self, id: i32, student_id: &str, name: &str) -> Result<LeaveResponse> {
        let app = self.fetch(id).await?;
        if app.student_id != student_id || app.student_name != name {
            return Err(DormError::permission("只能撤回本人的申请"));
        }
        let status: LeaveStatus = app.status.parse()?;
        if status != LeaveStatus::Pending {
            return Err(DormError::business(format!(
                "申请当前为「{}」，不能撤回",
                status.label()
            )));
        }

        let mut active: leave_applications::ActiveModel = app.into();
        active.status = Set(LeaveStatus::Cancelled.as_str().to_string());
        Ok(active.update(self.db).await?.into())
    }

    /// 获取单个申请
    pub async fn get(&self, id: i32) -> Result<LeaveResponse> {
        Ok(self.fetch(id).await?.into())
    }

    /// 学生查询本人的申请列表
    pub async fn my_applications(&self, student_id: &str, name: &str) -> Result<Vec<LeaveResponse>> {
        // 身份不匹配时返回同样的"不存在"错误，不泄露学号是否有效
        self.verify_student(student_id, name).await?;

        let apps = LeaveApplications::find()
            .filter(leave_applications::Column::StudentId.eq(student_id))
            .order_by_desc(leave_applications::Column::ApplyTime)
            .order_by_desc(leave_applications::Column::Id)
            .all(self.db)
            .await?;
        Ok(apps.into_iter().map(LeaveResponse::from).collect())
    }

    /// 导出用：按相同过滤条件返回全部申请，不分页
    pub async fn export(&self, query: &LeaveQuery) -> Result<Vec<LeaveResponse>> {
        let mut select = LeaveApplications::find();
        if let Some(status) = &query.status {
            select = select.filter(leave_applications::Column::Status.eq(status));
        }
        if let Some(class_name) = &query.class_name {
            select = select.filter(leave_applications::Column::ClassName.eq(class_name));
        }
        if let Some(student_id) = &query.student_id {
            select = select.filter(leave_applications::Column::StudentId.eq(student_id));
        }

        let applications = select
            .order_by_desc(leave_applications::Column::ApplyTime)
            .order_by_desc(leave_applications::Column::Id)
            .all(self.db)
            .await?;
        Ok(applications.into_iter().map(LeaveResponse::from).collect())
    }

    /// 管理端分页查询
    pub async fn list(&self, query: &LeaveQuery) -> Result<ListLeavesResult> {
        let params = PaginationParams::new(query.page, query.limit, 20, 100);

        let mut select = LeaveApplications::find();
        if let Some(status) = &query.status {
            select = select.filter(leave_applications::Column::Status.eq(status));
        }
        if let Some(class_name) = &query.class_name {
            select = select.filter(leave_applications::Column::ClassName.eq(class_name));
        }
        if let Some(student_id) = &query.student_id {
            select = select.filter(leave_applications::Column::StudentId.eq(student_id));
        }

        let total = select.clone().count(self.db).await?;
        let applications = select
            .order_by_desc(leave_applications::Column::ApplyTime)
            .order_by_desc(leave_applications::Column::Id)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await?;

        Ok(ListLeavesResult {
            applications: applications.into_iter().map(LeaveResponse::from).collect(),
            pagination: build_page(total, params).into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures::StudentFixture, helpers::create_test_db};
    use crate::types::DerivedStatus;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn submit_request(dates: Vec<String>) -> SubmitLeaveRequest {
        SubmitLeaveRequest {
            student_id: "20230001".to_string(),
            name: "张三".to_string(),
            leave_dates: dates,
            reason: "回家".to_string(),
        }
    }

    fn future_date(days: i64) -> String {
        (Utc::now().naive_utc().date() + Duration::days(days))
            .format("%Y-%m-%d")
            .to_string()
    }

    #[tokio::test]
    async fn submit_creates_pending_application() {
        let db = create_test_db().await.unwrap();
        StudentFixture::new().student_id("20230001").insert(&db).await;
        let service = LeaveService::with_db(&db);

        let app = service
            .submit(&submit_request(vec![future_date(1), future_date(2)]))
            .await
            .unwrap();
        assert_eq!(app.status, "pending");
        assert_eq!(app.leave_dates.len(), 2);
        assert_eq!(app.class_name, "软件2301");
    }

    #[tokio::test]
    async fn submit_rejects_unknown_identity() {
        let db = create_test_db().await.unwrap();
        StudentFixture::new().student_id("20230001").insert(&db).await;
        let service = LeaveService::with_db(&db);

        let mut request = submit_request(vec![future_date(1)]);
        request.name = "李四".to_string();
        let err = service.submit(&request).await.unwrap_err();
        assert_eq!(err.status_and_code().1, "RESOURCE_NOT_FOUND");
    }

    #[tokio::test]
    async fn submit_rejects_past_dates_and_empty_input() {
        let db = create_test_db().await.unwrap();
        StudentFixture::new().student_id("20230001").insert(&db).await;
        let service = LeaveService::with_db(&db);

        let past = (Utc::now().naive_utc().date() - Duration::days(1))
            .format("%Y-%m-%d")
            .to_string();
        assert!(service.submit(&submit_request(vec![past])).await.is_err());
        assert!(service.submit(&submit_request(vec![])).await.is_err());
        assert!(
            service
                .submit(&submit_request(vec!["2025/01/10".to_string()]))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn approve_writes_leave_records_for_each_date() {
        let db = create_test_db().await.unwrap();
        StudentFixture::new().student_id("20230001").insert(&db).await;
        let service = LeaveService::with_db(&db);

        let d1 = future_date(1);
        let d2 = future_date(2);
        let app = service
            .submit(&submit_request(vec![d1.clone(), d2.clone()]))
            .await
            .unwrap();

        let approved = service.approve(app.id, "counselor01").await.unwrap();
        assert_eq!(approved.status, "approved");
        assert_eq!(approved.reviewer.as_deref(), Some("counselor01"));
        assert!(approved.review_time.is_some());

        // 审批副作用：两天的派生状态都变为请假
        let checks = CheckRecordsService::with_db(&db);
        for raw in [d1, d2] {
            let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").unwrap();
            let status = checks.current_status("20230001", date).await.unwrap();
            assert!(status.is_on_leave(), "{raw} 应为请假");
        }
    }

    #[tokio::test]
    async fn approve_covers_today() {
        let db = create_test_db().await.unwrap();
        StudentFixture::new().student_id("20230001").insert(&db).await;
        let service = LeaveService::with_db(&db);

        let today = Utc::now().naive_utc().date();
        let app = service
            .submit(&submit_request(vec![today.format("%Y-%m-%d").to_string()]))
            .await
            .unwrap();
        service.approve(app.id, "admin").await.unwrap();

        let checks = CheckRecordsService::with_db(&db);
        let status = checks.current_status("20230001", today).await.unwrap();
        assert!(status.is_on_leave());
    }

    #[tokio::test]
    async fn approve_covers_past_dates_retroactively() {
        let db = create_test_db().await.unwrap();
        StudentFixture::new().student_id("20230001").insert(&db).await;
        let service = LeaveService::with_db(&db);

        // 提交时校验日期不得早于今天；待审期间日期可能已成为过去，
        // 这里直接构造这样的存量申请
        let past = Utc::now().naive_utc().date() - Duration::days(2);
        let app = entity::leave_applications::ActiveModel {
            student_id: Set("20230001".to_string()),
            student_name: Set("张三".to_string()),
            class_name: Set("软件2301".to_string()),
            leave_dates: Set(crate::types::serialize_leave_dates(&[past])),
            reason: Set("补办手续".to_string()),
            status: Set("pending".to_string()),
            apply_time: Set(Utc::now().naive_utc() - Duration::days(3)),
            reviewer: Set(None),
            review_time: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        service.approve(app.id, "counselor01").await.unwrap();

        let checks = CheckRecordsService::with_db(&db);
        let status = checks.current_status("20230001", past).await.unwrap();
        assert!(status.is_on_leave());
    }

    #[tokio::test]
    async fn approve_twice_fails_without_mutation() {
        let db = create_test_db().await.unwrap();
        StudentFixture::new().student_id("20230001").insert(&db).await;
        let service = LeaveService::with_db(&db);

        let app = service
            .submit(&submit_request(vec![future_date(1)]))
            .await
            .unwrap();
        service.approve(app.id, "counselor01").await.unwrap();

        let err = service.approve(app.id, "counselor02").await.unwrap_err();
        assert_eq!(err.status_and_code().1, "BUSINESS_ERROR");

        // 复审失败不得改动审核人
        let unchanged = service.get(app.id).await.unwrap();
        assert_eq!(unchanged.reviewer.as_deref(), Some("counselor01"));
    }

    #[tokio::test]
    async fn reject_has_no_check_record_side_effect() {
        let db = create_test_db().await.unwrap();
        StudentFixture::new().student_id("20230001").insert(&db).await;
        let service = LeaveService::with_db(&db);

        let raw = future_date(1);
        let app = service.submit(&submit_request(vec![raw.clone()])).await.unwrap();
        let rejected = service.reject(app.id, "counselor01").await.unwrap();
        assert_eq!(rejected.status, "rejected");

        let checks = CheckRecordsService::with_db(&db);
        let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").unwrap();
        let status = checks.current_status("20230001", date).await.unwrap();
        assert_eq!(status, DerivedStatus::NotCheckedIn);

        // 驳回后不能再批准
        assert!(service.approve(app.id, "admin").await.is_err());
    }

    #[tokio::test]
    async fn cancel_only_from_pending_and_matching_identity() {
        let db = create_test_db().await.unwrap();
        StudentFixture::new().student_id("20230001").insert(&db).await;
        let service = LeaveService::with_db(&db);

        let app = service
            .submit(&submit_request(vec![future_date(1)]))
            .await
            .unwrap();

        // 身份不符
        let err = service.cancel(app.id, "20230001", "李四").await.unwrap_err();
        assert_eq!(err.status_and_code().1, "PERMISSION_ERROR");

        let cancelled = service.cancel(app.id, "20230001", "张三").await.unwrap();
        assert_eq!(cancelled.status, "cancelled");

        // 已取消的申请不能再审核，也不能再次撤回
        assert!(service.approve(app.id, "admin").await.is_err());
        assert!(service.reject(app.id, "admin").await.is_err());
        assert!(service.cancel(app.id, "20230001", "张三").await.is_err());
    }

    #[tokio::test]
    async fn my_applications_requires_identity_match() {
        let db = create_test_db().await.unwrap();
        StudentFixture::new().student_id("20230001").insert(&db).await;
        let service = LeaveService::with_db(&db);

        service
            .submit(&submit_request(vec![future_date(1)]))
            .await
            .unwrap();

        let mine = service.my_applications("20230001", "张三").await.unwrap();
        assert_eq!(mine.len(), 1);

        assert!(service.my_applications("20230001", "王五").await.is_err());
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let db = create_test_db().await.unwrap();
        StudentFixture::new().student_id("20230001").insert(&db).await;
        let service = LeaveService::with_db(&db);

        let app1 = service
            .submit(&submit_request(vec![future_date(1)]))
            .await
            .unwrap();
        service
            .submit(&submit_request(vec![future_date(2)]))
            .await
            .unwrap();
        service.approve(app1.id, "admin").await.unwrap();

        let pending = service
            .list(&LeaveQuery {
                status: Some("pending".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.applications.len(), 1);
        assert_eq!(pending.pagination.total, 1);
    }
}

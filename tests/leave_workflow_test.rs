//! # 请假流程集成测试
//!
//! 覆盖自助提交 -> 审批 -> 状态派生 -> 取消请假的完整链路

use chrono::{Duration, NaiveDate, Utc};
use dorm_check::management::services::checks::CheckRecordsService;
use dorm_check::management::services::leaves::{LeaveService, SubmitLeaveRequest};
use dorm_check::types::{CheckStatus, DerivedStatus};
use entity::students;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.expect("连接内存数据库失败");
    migration::Migrator::up(&db, None).await.expect("迁移失败");
    db
}

async fn seed_student(db: &DatabaseConnection, student_id: &str, name: &str) {
    let now = Utc::now().naive_utc();
    students::ActiveModel {
        student_id: Set(student_id.to_string()),
        name: Set(name.to_string()),
        gender: Set("男".to_string()),
        class_name: Set("软件2301".to_string()),
        building: Set("6号楼".to_string()),
        area: Set("东区".to_string()),
        floor: Set("3".to_string()),
        room: Set("302".to_string()),
        bed: Set("2".to_string()),
        counselor_name: Set("王老师".to_string()),
        counselor_phone: Set("13800138000".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("插入学生失败");
}

fn date_offset(days: i64) -> NaiveDate {
    Utc::now().naive_utc().date() + Duration::days(days)
}

#[tokio::test]
async fn full_leave_lifecycle() {
    let db = setup_db().await;
    seed_student(&db, "20230001", "张三").await;

    let leaves = LeaveService::with_db(&db);
    let checks = CheckRecordsService::with_db(&db);

    let d1 = date_offset(1);
    let d2 = date_offset(2);

    // 提交两天的申请
    let app = leaves
        .submit(&SubmitLeaveRequest {
            student_id: "20230001".to_string(),
            name: "张三".to_string(),
            leave_dates: vec![
                d1.format("%Y-%m-%d").to_string(),
                d2.format("%Y-%m-%d").to_string(),
            ],
            reason: "家中有事".to_string(),
        })
        .await
        .expect("提交失败");
    assert_eq!(app.status, "pending");

    // 审批前两天均未签到
    for date in [d1, d2] {
        let status = checks.current_status("20230001", date).await.unwrap();
        assert_eq!(status, DerivedStatus::NotCheckedIn);
    }

    // 审批通过后两天都派生为请假
    let approved = leaves.approve(app.id, "counselor01").await.expect("审批失败");
    assert_eq!(approved.status, "approved");
    for date in [d1, d2] {
        let status = checks.current_status("20230001", date).await.unwrap();
        assert_eq!(status, DerivedStatus::Checked(CheckStatus::OnLeave));
    }

    // 重复审批失败且不改变状态
    assert!(leaves.approve(app.id, "counselor02").await.is_err());
    assert!(leaves.reject(app.id, "counselor02").await.is_err());
    let unchanged = leaves.get(app.id).await.unwrap();
    assert_eq!(unchanged.reviewer.as_deref(), Some("counselor01"));

    // 取消 d1 的请假状态：新的"在寝"记录在派生排序中胜出
    checks
        .cancel_leave_status("20230001", "admin", d1)
        .await
        .expect("取消请假失败");
    let status = checks.current_status("20230001", d1).await.unwrap();
    assert_eq!(status, DerivedStatus::Checked(CheckStatus::Present));
    // d2 不受影响
    let status = checks.current_status("20230001", d2).await.unwrap();
    assert_eq!(status, DerivedStatus::Checked(CheckStatus::OnLeave));

    // 申请单本身不因取消请假状态而改变
    let still_approved = leaves.get(app.id).await.unwrap();
    assert_eq!(still_approved.status, "approved");
}

#[tokio::test]
async fn student_cancel_before_review() {
    let db = setup_db().await;
    seed_student(&db, "20230001", "张三").await;
    let leaves = LeaveService::with_db(&db);

    let app = leaves
        .submit(&SubmitLeaveRequest {
            student_id: "20230001".to_string(),
            name: "张三".to_string(),
            leave_dates: vec![date_offset(1).format("%Y-%m-%d").to_string()],
            reason: "看病".to_string(),
        })
        .await
        .unwrap();

    let cancelled = leaves.cancel(app.id, "20230001", "张三").await.unwrap();
    assert_eq!(cancelled.status, "cancelled");

    // 取消后不可再审批
    let err = leaves.approve(app.id, "admin").await.unwrap_err();
    assert!(err.to_string().contains("取消"));
}

#[tokio::test]
async fn device_scan_supersedes_earlier_status_today() {
    let db = setup_db().await;
    seed_student(&db, "20230001", "张三").await;
    let checks = CheckRecordsService::with_db(&db);

    let now = Utc::now().naive_utc();
    let today = now.date();

    checks
        .insert_record("20230001", CheckStatus::Out, now - Duration::hours(3), "FP-A-01")
        .await
        .unwrap();
    checks
        .insert_record("20230001", CheckStatus::Present, now - Duration::hours(1), "FP-A-01")
        .await
        .unwrap();

    let status = checks.current_status("20230001", today).await.unwrap();
    assert_eq!(status, DerivedStatus::Checked(CheckStatus::Present));
}

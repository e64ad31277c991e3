//! # 指纹批量导入集成测试

use chrono::Utc;
use dorm_check::management::services::fingerprints::{FingerprintBatchRow, FingerprintService};
use dorm_check::management::services::transfer;
use entity::{devices, students};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;

async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.expect("连接内存数据库失败");
    migration::Migrator::up(&db, None).await.expect("迁移失败");

    let now = Utc::now().naive_utc();
    for (student_id, name) in [("20230001", "张三"), ("20230002", "李四")] {
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
        .insert(&db)
        .await
        .unwrap();
    }

    devices::ActiveModel {
        device_id: Set("FP-A-01".to_string()),
        name: Set("6号楼东门".to_string()),
        building: Set("6号楼".to_string()),
        sequence: Set(1),
        max_fingerprints: Set(1000),
        status: Set("active".to_string()),
        last_seen: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    db
}

#[tokio::test]
async fn csv_batch_import_reports_per_row() {
    let db = setup_db().await;
    let service = FingerprintService::with_db(&db);

    let csv = "\
学号,设备号,指纹槽位,手指序号
20230001,FP-A-01,5,1
20230002,FP-A-01,5,2
";
    let rows = transfer::parse_fingerprints_csv(csv).expect("CSV 解析失败");
    let report = service.batch_import(&rows).await.expect("导入失败");

    // 同一 (设备, 槽位) 在批内重复：两行都被拒绝，互相引用行号
    assert_eq!(report.total, 2);
    assert_eq!(report.accepted, 0);
    assert_eq!(report.rejected, 2);
    assert!(report.rows[0].message.contains("第 2 行"));
    assert!(report.rows[1].message.contains("第 1 行"));

    let committed = entity::FingerprintMappings::find().all(&db).await.unwrap();
    assert!(committed.is_empty());
}

#[tokio::test]
async fn partial_success_is_reported_not_rolled_back() {
    let db = setup_db().await;
    let service = FingerprintService::with_db(&db);

    let report = service
        .batch_import(&[
            FingerprintBatchRow {
                student_id: "20230001".to_string(),
                device_id: "FP-A-01".to_string(),
                fingerprint_id: 1,
                finger_index: Some(1),
            },
            FingerprintBatchRow {
                student_id: "20230002".to_string(),
                device_id: "FP-A-01".to_string(),
                fingerprint_id: 2000,
                finger_index: None,
            },
        ])
        .await
        .unwrap();

    assert_eq!(report.accepted, 1);
    assert_eq!(report.rejected, 1);

    let committed = entity::FingerprintMappings::find().all(&db).await.unwrap();
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].student_id, "20230001");
    assert_eq!(committed[0].enrollment_status, "pending");
}

//! # 学生管理服务
//!
//! 学生档案 CRUD 与批量导入。删除只清理学生行本身，
//! 签到记录与指纹映射按学号松关联，不做级联。

use chrono::Utc;
use entity::{students, students::Entity as Students};
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{DormError, Result};
use crate::management::response::Pagination;
use crate::management::server::AppState;

use super::shared::{PaginationParams, build_page};

static STUDENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{4,32}$").expect("valid regex"));
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^1\d{10}$").expect("valid regex"));

/// 学生列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct StudentQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub class_name: Option<String>,
    pub building: Option<String>,
    /// 学号或姓名模糊搜索
    pub search: Option<String>,
}

/// 创建/导入学生请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStudentRequest {
    pub student_id: String,
    pub name: String,
    #[serde(default)]
    pub gender: String,
    pub class_name: String,
    pub building: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub floor: String,
    pub room: String,
    #[serde(default)]
    pub bed: String,
    #[serde(default)]
    pub counselor_name: String,
    #[serde(default)]
    pub counselor_phone: String,
}

/// 更新学生请求
#[derive(Debug, Deserialize)]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub class_name: Option<String>,
    pub building: Option<String>,
    pub area: Option<String>,
    pub floor: Option<String>,
    pub room: Option<String>,
    pub bed: Option<String>,
    pub counselor_name: Option<String>,
    pub counselor_phone: Option<String>,
}

/// 学生响应
#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub id: i32,
    pub student_id: String,
    pub name: String,
    pub gender: String,
    pub class_name: String,
    pub building: String,
    pub area: String,
    pub floor: String,
    pub room: String,
    pub bed: String,
    pub counselor_name: String,
    pub counselor_phone: String,
}

impl From<students::Model> for StudentResponse {
    fn from(student: students::Model) -> Self {
        Self {
            id: student.id,
            student_id: student.student_id,
            name: student.name,
            gender: student.gender,
            class_name: student.class_name,
            building: student.building,
            area: student.area,
            floor: student.floor,
            room: student.room,
            bed: student.bed,
            counselor_name: student.counselor_name,
            counselor_phone: student.counselor_phone,
        }
    }
}

#[derive(Debug)]
pub struct ListStudentsResult {
    pub students: Vec<StudentResponse>,
    pub pagination: Pagination,
}

/// 导入单行结果
#[derive(Debug, Serialize)]
pub struct ImportRowOutcome {
    pub row: usize,
    pub student_id: String,
    pub accepted: bool,
    pub message: String,
}

/// 导入汇总（部分成功，不回滚已成功的行）
#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub rejected: usize,
    pub rows: Vec<ImportRowOutcome>,
}

fn validate_request(request: &CreateStudentRequest) -> Result<()> {
    if !STUDENT_ID_RE.is_match(&request.student_id) {
        return Err(DormError::validation(format!(
            "学号 {} 格式不正确",
            request.student_id
        )));
    }
    if request.name.trim().is_empty() {
        return Err(DormError::validation("姓名不能为空"));
    }
    if request.class_name.trim().is_empty() {
        return Err(DormError::validation("班级不能为空"));
    }
    if !request.counselor_phone.is_empty() && !PHONE_RE.is_match(&request.counselor_phone) {
        return Err(DormError::validation(format!(
            "辅导员电话 {} 格式不正确",
            request.counselor_phone
        )));
    }
    Ok(())
}

/// 学生管理服务
pub struct StudentsService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> StudentsService<'a> {
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

    /// 分页查询学生
    pub async fn list(&self, query: &StudentQuery) -> Result<ListStudentsResult> {
        let params = PaginationParams::new(query.page, query.limit, 20, 100);

        let mut select = Students::find();
        if let Some(class_name) = &query.class_name {
            select = select.filter(students::Column::ClassName.eq(class_name));
        }
        if let Some(building) = &query.building {
            select = select.filter(students::Column::Building.eq(building));
        }
        if let Some(search) = &query.search {
            let pattern = format!("%{}%", search.trim());
            select = select.filter(
                Condition::any()
                    .add(students::Column::StudentId.like(&pattern))
                    .add(students::Column::Name.like(&pattern)),
            );
        }

        let total = select.clone().count(self.db).await?;
        let rows = select
            .order_by_asc(students::Column::StudentId)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await?;

        Ok(ListStudentsResult {
            students: rows.into_iter().map(StudentResponse::from).collect(),
            pagination: build_page(total, params).into(),
        })
    }

    /// 导出用：全量学生（按学号排序）
    pub async fn all(&self) -> Result<Vec<students::Model>> {
        Ok(Students::find()
            .order_by_asc(students::Column::StudentId)
            .all(self.db)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<StudentResponse> {
        let student = Students::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| DormError::not_found(format!("学生记录 {id} 不存在")))?;
        Ok(student.into())
    }

    async fn find_by_student_id(&self, student_id: &str) -> Result<Option<students::Model>> {
        Ok(Students::find()
            .filter(students::Column::StudentId.eq(student_id))
            .one(self.db)
            .await?)
    }

    /// 创建学生
    pub async fn create(&self, request: &CreateStudentRequest) -> Result<StudentResponse> {
        validate_request(request)?;

        if self.find_by_student_id(&request.student_id).await?.is_some() {
            return Err(DormError::conflict(format!(
                "学号 {} 已存在",
                request.student_id
            )));
        }

        let now = Utc::now().naive_utc();
        let student = students::ActiveModel {
            student_id: Set(request.student_id.clone()),
            name: Set(request.name.trim().to_string()),
            gender: Set(request.gender.clone()),
            class_name: Set(request.class_name.clone()),
            building: Set(request.building.clone()),
            area: Set(request.area.clone()),
            floor: Set(request.floor.clone()),
            room: Set(request.room.clone()),
            bed: Set(request.bed.clone()),
            counselor_name: Set(request.counselor_name.clone()),
            counselor_phone: Set(request.counselor_phone.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(student.insert(self.db).await?.into())
    }

    /// 更新学生
    pub async fn update(&self, id: i32, request: &UpdateStudentRequest) -> Result<StudentResponse> {
        let student = Students::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| DormError::not_found(format!("学生记录 {id} 不存在")))?;

        let mut active: students::ActiveModel = student.into();
        if let Some(name) = &request.name {
            if name.trim().is_empty() {
                return Err(DormError::validation("姓名不能为空"));
            }
            active.name = Set(name.trim().to_string());
        }
        if let Some(gender) = &request.gender {
            active.gender = Set(gender.clone());
        }
        if let Some(class_name) = &request.class_name {
            active.class_name = Set(class_name.clone());
        }
        if let Some(building) = &request.building {
            active.building = Set(building.clone());
        }
        if let Some(area) = &request.area {
            active.area = Set(area.clone());
        }
        if let Some(floor) = &request.floor {
            active.floor = Set(floor.clone());
        }
        if let Some(room) = &request.room {
            active.room = Set(room.clone());
        }
        if let Some(bed) = &request.bed {
            active.bed = Set(bed.clone());
        }
        if let Some(counselor_name) = &request.counselor_name {
            active.counselor_name = Set(counselor_name.clone());
        }
        if let Some(counselor_phone) = &request.counselor_phone {
            if !counselor_phone.is_empty() && !PHONE_RE.is_match(counselor_phone) {
                return Err(DormError::validation("辅导员电话格式不正确"));
            }
            active.counselor_phone = Set(counselor_phone.clone());
        }
        active.updated_at = Set(Utc::now().naive_utc());
        Ok(active.update(self.db).await?.into())
    }

    /// 删除学生（不级联清理关联数据）
    pub async fn delete(&self, id: i32) -> Result<()> {
        let result = Students::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(DormError::not_found(format!("学生记录 {id} 不存在")));
        }
        Ok(())
    }

    /// 批量导入：已存在的学号更新档案，新学号插入；逐行报告，不回滚
    pub async fn import(&self, rows: &[CreateStudentRequest]) -> Result<ImportReport> {
        let mut outcomes = Vec::with_capacity(rows.len());
        let mut created = 0_usize;
        let mut updated = 0_usize;
        let mut rejected = 0_usize;

        for (idx, request) in rows.iter().enumerate() {
            let row_no = idx + 1;
            if let Err(e) = validate_request(request) {
                rejected += 1;
                outcomes.push(ImportRowOutcome {
                    row: row_no,
                    student_id: request.student_id.clone(),
                    accepted: false,
                    message: e.to_string(),
                });
                continue;
            }

            let outcome = match self.find_by_student_id(&request.student_id).await? {
                Some(existing) => {
                    let mut active: students::ActiveModel = existing.into();
                    active.name = Set(request.name.trim().to_string());
                    active.gender = Set(request.gender.clone());
                    active.class_name = Set(request.class_name.clone());
                    active.building = Set(request.building.clone());
                    active.area = Set(request.area.clone());
                    active.floor = Set(request.floor.clone());
                    active.room = Set(request.room.clone());
                    active.bed = Set(request.bed.clone());
                    active.counselor_name = Set(request.counselor_name.clone());
                    active.counselor_phone = Set(request.counselor_phone.clone());
                    active.updated_at = Set(Utc::now().naive_utc());
                    active.update(self.db).await.map(|_| "已更新")
                }
                None => {
                    let now = Utc::now().naive_utc();
                    let student = students::ActiveModel {
                        student_id: Set(request.student_id.clone()),
                        name: Set(request.name.trim().to_string()),
                        gender: Set(request.gender.clone()),
                        class_name: Set(request.class_name.clone()),
                        building: Set(request.building.clone()),
                        area: Set(request.area.clone()),
                        floor: Set(request.floor.clone()),
                        room: Set(request.room.clone()),
                        bed: Set(request.bed.clone()),
                        counselor_name: Set(request.counselor_name.clone()),
                        counselor_phone: Set(request.counselor_phone.clone()),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    };
                    student.insert(self.db).await.map(|_| "已创建")
                }
            };

            match outcome {
                Ok(message) => {
                    if message == "已创建" {
                        created += 1;
                    } else {
                        updated += 1;
                    }
                    outcomes.push(ImportRowOutcome {
                        row: row_no,
                        student_id: request.student_id.clone(),
                        accepted: true,
                        message: message.to_string(),
                    });
                }
                Err(e) => {
                    rejected += 1;
                    outcomes.push(ImportRowOutcome {
                        row: row_no,
                        student_id: request.student_id.clone(),
                        accepted: false,
                        message: format!("写入失败: {e}"),
                    });
                }
            }
        }

        Ok(ImportReport {
            total: rows.len(),
            created,
            updated,
            rejected,
            rows: outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::helpers::create_test_db;
    use pretty_assertions::assert_eq;

    fn request(student_id: &str, name: &str) -> CreateStudentRequest {
        CreateStudentRequest {
            student_id: student_id.to_string(),
            name: name.to_string(),
            gender: "男".to_string(),
            class_name: "软件2301".to_string(),
            building: "6号楼".to_string(),
            area: "东区".to_string(),
            floor: "3".to_string(),
            room: "302".to_string(),
            bed: "2".to_string(),
            counselor_name: "王老师".to_string(),
            counselor_phone: "13800138000".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_duplicate_rejection() {
        let db = create_test_db().await.unwrap();
        let service = StudentsService::with_db(&db);

        let created = service.create(&request("20230001", "张三")).await.unwrap();
        assert_eq!(created.student_id, "20230001");

        let err = service.create(&request("20230001", "张三")).await.unwrap_err();
        assert_eq!(err.status_and_code().1, "RESOURCE_CONFLICT");
    }

    #[tokio::test]
    async fn invalid_fields_are_rejected() {
        let db = create_test_db().await.unwrap();
        let service = StudentsService::with_db(&db);

        assert!(service.create(&request("ab", "张三")).await.is_err());
        assert!(service.create(&request("20230001", "  ")).await.is_err());

        let mut bad_phone = request("20230002", "李四");
        bad_phone.counselor_phone = "123".to_string();
        assert!(service.create(&bad_phone).await.is_err());
    }

    #[tokio::test]
    async fn list_supports_search_and_filters() {
        let db = create_test_db().await.unwrap();
        let service = StudentsService::with_db(&db);
        service.create(&request("20230001", "张三")).await.unwrap();
        let mut other = request("20230002", "李四");
        other.class_name = "网络2302".to_string();
        service.create(&other).await.unwrap();

        let result = service
            .list(&StudentQuery {
                search: Some("张".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.students.len(), 1);
        assert_eq!(result.students[0].name, "张三");

        let result = service
            .list(&StudentQuery {
                class_name: Some("网络2302".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.students.len(), 1);
        assert_eq!(result.pagination.total, 1);
    }

    #[tokio::test]
    async fn import_mixes_create_update_reject() {
        let db = create_test_db().await.unwrap();
        let service = StudentsService::with_db(&db);
        service.create(&request("20230001", "张三")).await.unwrap();

        let mut renamed = request("20230001", "张三丰");
        renamed.room = "401".to_string();
        let report = service
            .import(&[renamed, request("20230002", "李四"), request("x", "无名")])
            .await
            .unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.updated, 1);
        assert_eq!(report.created, 1);
        assert_eq!(report.rejected, 1);

        // 已成功的行不因后续失败回滚
        let updated = service
            .list(&StudentQuery::default())
            .await
            .unwrap();
        assert_eq!(updated.students.len(), 2);
        assert_eq!(updated.students[0].name, "张三丰");
        assert_eq!(updated.students[0].room, "401");
    }

    #[tokio::test]
    async fn delete_is_not_cascading() {
        let db = create_test_db().await.unwrap();
        let service = StudentsService::with_db(&db);
        let created = service.create(&request("20230001", "张三")).await.unwrap();

        // 学生有签到记录时删除学生，记录保留
        let checks = crate::management::services::checks::CheckRecordsService::with_db(&db);
        checks
            .insert_record(
                "20230001",
                crate::types::CheckStatus::Present,
                chrono::Utc::now().naive_utc(),
                "FP-01",
            )
            .await
            .unwrap();

        service.delete(created.id).await.unwrap();
        assert!(service.get(created.id).await.is_err());

        let remaining = entity::CheckRecords::find().all(&db).await.unwrap();
        assert_eq!(remaining.len(), 1);
    }
}

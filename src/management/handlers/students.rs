//! # 学生管理处理器

use axum::Extension;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::Response;
use std::sync::Arc;

use crate::management::middleware::AuthContext;
use crate::management::response::{app_error, paginated, success, success_without_data};
use crate::management::server::AppState;
use crate::management::services::logs::log_operation;
use crate::management::services::students::{
    CreateStudentRequest, StudentQuery, StudentsService, UpdateStudentRequest,
};
use crate::management::services::transfer;

/// 列出学生
pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<StudentQuery>,
) -> Response {
    let service = StudentsService::new(&state);
    match service.list(&query).await {
        Ok(result) => paginated(result.students, result.pagination),
        Err(e) => app_error(e),
    }
}

/// 获取单个学生
pub async fn get_student(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    let service = StudentsService::new(&state);
    match service.get(id).await {
        Ok(student) => success(student),
        Err(e) => app_error(e),
    }
}

/// 创建学生
pub async fn create_student(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    axum::Json(request): axum::Json<CreateStudentRequest>,
) -> Response {
    let service = StudentsService::new(&state);
    match service.create(&request).await {
        Ok(student) => {
            log_operation(
                &state.database,
                &auth.username,
                "create_student",
                Some(&format!("student:{}", student.student_id)),
                None,
            )
            .await;
            success(student)
        }
        Err(e) => app_error(e),
    }
}

/// 更新学生
pub async fn update_student(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(id): Path<i32>,
    axum::Json(request): axum::Json<UpdateStudentRequest>,
) -> Response {
    let service = StudentsService::new(&state);
    match service.update(id, &request).await {
        Ok(student) => {
            log_operation(
                &state.database,
                &auth.username,
                "update_student",
                Some(&format!("student:{}", student.student_id)),
                None,
            )
            .await;
            success(student)
        }
        Err(e) => app_error(e),
    }
}

/// 删除学生
pub async fn delete_student(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(id): Path<i32>,
) -> Response {
    let service = StudentsService::new(&state);
    match service.delete(id).await {
        Ok(()) => {
            log_operation(
                &state.database,
                &auth.username,
                "delete_student",
                Some(&format!("student_row:{id}")),
                None,
            )
            .await;
            success_without_data("学生已删除")
        }
        Err(e) => app_error(e),
    }
}

/// 批量导入学生（请求体为 UTF-8 CSV 文本）
pub async fn import_students(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    body: String,
) -> Response {
    let rows = match transfer::parse_students_csv(&body) {
        Ok(rows) => rows,
        Err(e) => return app_error(e),
    };

    let service = StudentsService::new(&state);
    match service.import(&rows).await {
        Ok(report) => {
            log_operation(
                &state.database,
                &auth.username,
                "import_students",
                None,
                Some(&format!(
                    "共 {} 行：新增 {}，更新 {}，失败 {}",
                    report.total, report.created, report.updated, report.rejected
                )),
            )
            .await;
            success(report)
        }
        Err(e) => app_error(e),
    }
}

/// 导出学生花名册 CSV
pub async fn export_students_csv(State(state): State<AppState>) -> Response {
    let service = StudentsService::new(&state);
    let result = match service.all().await {
        Ok(students) => transfer::students_to_csv(&students),
        Err(e) => Err(e),
    };
    match result {
        Ok(csv) => Response::builder()
            .header(CONTENT_TYPE, "text/csv; charset=utf-8")
            .header(CONTENT_DISPOSITION, "attachment; filename=\"students.csv\"")
            .body(Body::from(csv))
            .unwrap_or_else(|_| app_error(crate::internal_error!("响应构建失败"))),
        Err(e) => app_error(e),
    }
}

/// 导出学生花名册 Excel
pub async fn export_students_xlsx(State(state): State<AppState>) -> Response {
    let service = StudentsService::new(&state);
    let result = match service.all().await {
        Ok(students) => transfer::students_to_xlsx(&students),
        Err(e) => Err(e),
    };
    match result {
        Ok(buffer) => Response::builder()
            .header(
                CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            )
            .header(
                CONTENT_DISPOSITION,
                "attachment; filename=\"students.xlsx\"",
            )
            .body(Body::from(buffer))
            .unwrap_or_else(|_| app_error(crate::internal_error!("响应构建失败"))),
        Err(e) => app_error(e),
    }
}

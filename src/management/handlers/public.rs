//! # 学生自助端处理器
//!
//! 无账号体系：身份由"学号 + 姓名 + 验证码"弱校验，
//! 与管理端的 JWT 会话完全隔离。

use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;

use crate::management::response::{app_error, success};
use crate::management::server::AppState;
use crate::management::services::leaves::{LeaveService, SubmitLeaveRequest};

/// 身份核验请求
#[derive(Debug, Deserialize)]
pub struct VerifyStudentRequest {
    pub student_id: String,
    pub name: String,
    pub captcha_id: String,
    pub captcha_answer: String,
}

/// 提交请假（验证码 + 申请内容）
#[derive(Debug, Deserialize)]
pub struct SubmitWithCaptcha {
    pub captcha_id: String,
    pub captcha_answer: String,
    #[serde(flatten)]
    pub application: SubmitLeaveRequest,
}

/// 查询本人申请的参数
#[derive(Debug, Deserialize)]
pub struct MyLeavesQuery {
    pub student_id: String,
    pub name: String,
}

/// 撤回申请请求
#[derive(Debug, Deserialize)]
pub struct CancelLeaveApplicationRequest {
    pub student_id: String,
    pub name: String,
}

/// 获取验证码
pub async fn get_captcha(State(state): State<AppState>) -> Response {
    match state.captcha.issue().await {
        Ok(challenge) => success(challenge),
        Err(e) => app_error(e),
    }
}

/// 核验学生身份（提交申请前的前置步骤）
pub async fn verify_student(
    State(state): State<AppState>,
    axum::Json(request): axum::Json<VerifyStudentRequest>,
) -> Response {
    if let Err(e) = state
        .captcha
        .verify(&request.captcha_id, &request.captcha_answer)
        .await
    {
        return app_error(e);
    }

    let service = LeaveService::new(&state);
    match service
        .verify_student(&request.student_id, &request.name)
        .await
    {
        Ok(student) => success(json!({
            "student_id": student.student_id,
            "name": student.name,
            "class_name": student.class_name,
            "building": student.building,
            "room": student.room,
        })),
        Err(e) => app_error(e),
    }
}

/// 提交请假申请
pub async fn submit_leave(
    State(state): State<AppState>,
    axum::Json(request): axum::Json<SubmitWithCaptcha>,
) -> Response {
    if let Err(e) = state
        .captcha
        .verify(&request.captcha_id, &request.captcha_answer)
        .await
    {
        return app_error(e);
    }

    let service = LeaveService::new(&state);
    match service.submit(&request.application).await {
        Ok(leave) => success(leave),
        Err(e) => app_error(e),
    }
}

/// 查询本人的申请列表
pub async fn my_leaves(
    State(state): State<AppState>,
    Query(query): Query<MyLeavesQuery>,
) -> Response {
    let service = LeaveService::new(&state);
    match service.my_applications(&query.student_id, &query.name).await {
        Ok(leaves) => success(leaves),
        Err(e) => app_error(e),
    }
}

/// 撤回本人的待审申请
pub async fn cancel_leave_application(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    axum::Json(request): axum::Json<CancelLeaveApplicationRequest>,
) -> Response {
    let service = LeaveService::new(&state);
    match service.cancel(id, &request.student_id, &request.name).await {
        Ok(leave) => success(leave),
        Err(e) => app_error(e),
    }
}

//! # 错误处理系统测试

use super::{Context, DormError};
use axum::http::StatusCode;

#[test]
fn business_error_maps_to_bad_request() {
    let err = DormError::business("该申请已审核，不能重复操作");
    let (status, code) = err.status_and_code();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code, "BUSINESS_ERROR");
    assert!(err.is_client_error());
    assert_eq!(err.to_string(), "该申请已审核，不能重复操作");
}

#[test]
fn not_found_and_conflict_map_to_4xx() {
    let not_found = DormError::not_found("学生不存在");
    assert_eq!(not_found.status_and_code().0, StatusCode::NOT_FOUND);

    let conflict = DormError::conflict("设备号已存在");
    assert_eq!(conflict.status_and_code().0, StatusCode::CONFLICT);
}

#[test]
fn database_error_is_server_error() {
    let err = DormError::database("连接失败");
    let (status, code) = err.status_and_code();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(code, "DATABASE_ERROR");
    assert!(!err.is_client_error());
}

#[test]
fn context_preserves_inner_status() {
    let inner: super::Result<()> = Err(DormError::validation("日期格式错误"));
    let wrapped = inner.context("解析请假日期失败");
    let err = wrapped.unwrap_err();
    assert_eq!(err.to_string(), "解析请假日期失败");
    assert_eq!(err.status_and_code().0, StatusCode::BAD_REQUEST);
}

#[test]
fn db_err_converts_to_database_variant() {
    let db_err = sea_orm::DbErr::Custom("boom".to_string());
    let err: DormError = db_err.into();
    assert_eq!(err.status_and_code().1, "DATABASE_ERROR");
}

#[test]
fn ensure_macros_return_errors() {
    fn guard(flag: bool) -> crate::error::Result<()> {
        crate::ensure!(flag, "状态不允许该操作");
        Ok(())
    }
    assert!(guard(true).is_ok());
    let err = guard(false).unwrap_err();
    assert_eq!(err.status_and_code().1, "BUSINESS_ERROR");
}

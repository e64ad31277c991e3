//! # 用户管理处理器（仅管理员）

use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use std::sync::Arc;

use super::require_admin;
use crate::management::middleware::AuthContext;
use crate::management::response::{app_error, paginated, success, success_without_data};
use crate::management::server::AppState;
use crate::management::services::logs::log_operation;
use crate::management::services::users::{
    CreateUserRequest, ResetPasswordRequest, UpdateUserRequest, UserQuery, UsersService,
};

/// 列出用户
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Query(query): Query<UserQuery>,
) -> Response {
    if let Err(e) = require_admin(&auth) {
        return app_error(e);
    }
    let service = UsersService::new(&state);
    match service.list(&query).await {
        Ok(result) => paginated(result.users, result.pagination),
        Err(e) => app_error(e),
    }
}

/// 创建用户
pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    axum::Json(request): axum::Json<CreateUserRequest>,
) -> Response {
    if let Err(e) = require_admin(&auth) {
        return app_error(e);
    }
    let service = UsersService::new(&state);
    match service.create(&request).await {
        Ok(user) => {
            log_operation(
                &state.database,
                &auth.username,
                "create_user",
                Some(&format!("user:{}", user.username)),
                Some(&user.role),
            )
            .await;
            success(user)
        }
        Err(e) => app_error(e),
    }
}

/// 更新用户
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(id): Path<i32>,
    axum::Json(request): axum::Json<UpdateUserRequest>,
) -> Response {
    if let Err(e) = require_admin(&auth) {
        return app_error(e);
    }
    let service = UsersService::new(&state);
    match service.update(id, &request).await {
        Ok(user) => {
            log_operation(
                &state.database,
                &auth.username,
                "update_user",
                Some(&format!("user:{}", user.username)),
                None,
            )
            .await;
            success(user)
        }
        Err(e) => app_error(e),
    }
}

/// 删除用户
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(id): Path<i32>,
) -> Response {
    if let Err(e) = require_admin(&auth) {
        return app_error(e);
    }
    let service = UsersService::new(&state);
    match service.delete(id, auth.user_id).await {
        Ok(()) => {
            log_operation(
                &state.database,
                &auth.username,
                "delete_user",
                Some(&format!("user_row:{id}")),
                None,
            )
            .await;
            success_without_data("用户已删除")
        }
        Err(e) => app_error(e),
    }
}

/// 重置密码
pub async fn reset_password(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(id): Path<i32>,
    axum::Json(request): axum::Json<ResetPasswordRequest>,
) -> Response {
    if let Err(e) = require_admin(&auth) {
        return app_error(e);
    }
    let service = UsersService::new(&state);
    match service.reset_password(id, &request).await {
        Ok(()) => {
            log_operation(
                &state.database,
                &auth.username,
                "reset_password",
                Some(&format!("user_row:{id}")),
                None,
            )
            .await;
            success_without_data("密码已重置")
        }
        Err(e) => app_error(e),
    }
}

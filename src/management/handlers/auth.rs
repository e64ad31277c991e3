//! # 管理端登录处理器

use axum::Extension;
use axum::extract::State;
use axum::response::Response;
use serde_json::json;
use std::sync::Arc;

use crate::management::middleware::AuthContext;
use crate::management::response::{app_error, success, success_without_data};
use crate::management::server::AppState;
use crate::management::services::auth::{AuthService, LoginRequest};
use crate::management::services::logs::log_operation;

/// 登录
pub async fn login(
    State(state): State<AppState>,
    axum::Json(request): axum::Json<LoginRequest>,
) -> Response {
    let service = AuthService::new(&state);
    match service.login(&request).await {
        Ok(response) => {
            log_operation(&state.database, &response.username, "login", None, None).await;
            success(response)
        }
        Err(e) => app_error(e),
    }
}

/// 退出登录（JWT 无状态，仅记录日志）
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    log_operation(&state.database, &auth.username, "logout", None, None).await;
    success_without_data("已退出登录")
}

/// 校验当前令牌
pub async fn validate_token(Extension(auth): Extension<Arc<AuthContext>>) -> Response {
    success(json!({
        "user_id": auth.user_id,
        "username": auth.username,
        "role": auth.role,
        "is_admin": auth.is_admin,
    }))
}

//! # 认证中间件
//!
//! 从请求头中提取JWT，验证并将其解析的用户信息注入到请求扩展中。

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::extract_bearer_token;
use crate::management::server::AppState;

/// 包含认证用户信息的上下文
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i32,
    pub username: String,
    pub role: String,
    pub is_admin: bool,
}

/// Axum认证中间件
pub async fn auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok());

    let Some(auth_header) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let Some(token) = extract_bearer_token(auth_header) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    match state.jwt.validate_token(token) {
        Ok(claims) => {
            let auth_context = Arc::new(AuthContext {
                user_id: claims.user_id,
                username: claims.username,
                role: claims.role,
                is_admin: claims.is_admin,
            });
            request.extensions_mut().insert(auth_context);
            Ok(next.run(request).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

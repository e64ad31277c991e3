//! # 硬件令牌中间件
//!
//! 指纹设备通过配置中的静态 Bearer Token 访问 `/api/device` 接口。

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::auth::extract_bearer_token;
use crate::management::server::AppState;

/// 校验硬件 API 令牌
pub async fn device_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(extract_bearer_token);

    match token {
        Some(token) if token == state.config.hardware.api_token => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

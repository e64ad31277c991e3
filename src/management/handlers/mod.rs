//! # 管理端请求处理器
//!
//! handler 只负责参数提取、权限判断与响应包装，业务逻辑在 services 层。

pub mod auth;
pub mod checks;
pub mod devices;
pub mod fingerprints;
pub mod hardware;
pub mod leaves;
pub mod logs;
pub mod public;
pub mod students;
pub mod system;
pub mod users;

use crate::error::{DormError, Result};
use crate::management::middleware::AuthContext;

/// 仅管理员可用的接口守卫
pub fn require_admin(auth: &AuthContext) -> Result<()> {
    if auth.is_admin {
        Ok(())
    } else {
        Err(DormError::permission("该操作需要管理员权限"))
    }
}

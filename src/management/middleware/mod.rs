//! # 管理端中间件

pub mod auth;
pub mod device;

pub use auth::{AuthContext, auth};
pub use device::device_token;

//! # 管理端服务层
//!
//! 业务逻辑集中在服务层，HTTP handler 只做参数提取与响应包装。

pub mod auth;
pub mod checks;
pub mod dashboard;
pub mod devices;
pub mod fingerprints;
pub mod leaves;
pub mod logs;
pub mod shared;
pub mod students;
pub mod system;
pub mod transfer;
pub mod users;

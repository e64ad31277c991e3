//! # 管理服务模块
//!
//! HTTP 服务端：管理端 API、学生自助端 API 与硬件接入 API

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod services;

pub use server::{AppContext, AppState, ManagementServer};

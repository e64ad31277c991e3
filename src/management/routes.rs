//! # 路由配置
//!
//! 三块路由面：管理端（JWT）、学生自助端（验证码弱身份）、硬件端（静态令牌）

use crate::management::server::AppState;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};

/// 创建所有路由（挂载于 `/api` 前缀下）
pub fn create_routes(state: AppState) -> Router {
    // 公开路由：登录与学生自助端
    let open_routes = Router::new()
        .route(
            "/auth/login",
            post(crate::management::handlers::auth::login),
        )
        .nest("/public", public_routes());

    // 硬件路由：静态 Bearer Token
    let device_routes = hardware_routes().layer(from_fn_with_state(
        state.clone(),
        crate::management::middleware::device_token,
    ));

    // 管理路由：JWT 会话
    let admin_routes = management_routes().layer(from_fn_with_state(
        state.clone(),
        crate::management::middleware::auth,
    ));

    Router::new()
        .merge(open_routes)
        .nest("/device", device_routes)
        .merge(admin_routes)
        .with_state(state)
}

/// 学生自助端路由
fn public_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/captcha",
            get(crate::management::handlers::public::get_captcha),
        )
        .route(
            "/verify-student",
            post(crate::management::handlers::public::verify_student),
        )
        .route(
            "/leaves",
            post(crate::management::handlers::public::submit_leave),
        )
        .route(
            "/leaves",
            get(crate::management::handlers::public::my_leaves),
        )
        .route(
            "/leaves/{id}/cancel",
            post(crate::management::handlers::public::cancel_leave_application),
        )
}

/// 硬件端路由
fn hardware_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/checkin",
            post(crate::management::handlers::hardware::checkin),
        )
        .route(
            "/heartbeat",
            post(crate::management::handlers::hardware::heartbeat),
        )
        .route(
            "/unchecked",
            get(crate::management::handlers::hardware::unchecked_students),
        )
}

/// 管理端路由
fn management_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/auth/logout",
            post(crate::management::handlers::auth::logout),
        )
        .route(
            "/auth/validate",
            get(crate::management::handlers::auth::validate_token),
        )
        .route(
            "/dashboard",
            get(crate::management::handlers::system::dashboard),
        )
        .nest("/students", student_routes())
        .nest("/checks", check_routes())
        .nest("/leaves", leave_routes())
        .nest("/fingerprints", fingerprint_routes())
        .nest("/devices", device_admin_routes())
        .nest("/users", user_routes())
        .nest("/logs", log_routes())
        .nest("/system", system_routes())
}

/// 学生管理路由
fn student_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(crate::management::handlers::students::list_students),
        )
        .route(
            "/",
            post(crate::management::handlers::students::create_student),
        )
        .route(
            "/import",
            post(crate::management::handlers::students::import_students),
        )
        .route(
            "/export",
            get(crate::management::handlers::students::export_students_csv),
        )
        .route(
            "/export/xlsx",
            get(crate::management::handlers::students::export_students_xlsx),
        )
        .route(
            "/{id}",
            get(crate::management::handlers::students::get_student),
        )
        .route(
            "/{id}",
            put(crate::management::handlers::students::update_student),
        )
        .route(
            "/{id}",
            delete(crate::management::handlers::students::delete_student),
        )
}

/// 签到记录路由
fn check_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(crate::management::handlers::checks::list_checks))
        .route("/", post(crate::management::handlers::checks::create_check))
        .route("/board", get(crate::management::handlers::checks::board))
        .route(
            "/cancel-leave",
            post(crate::management::handlers::checks::cancel_leave),
        )
        .route(
            "/export",
            get(crate::management::handlers::checks::export_checks_csv),
        )
}

/// 请假审核路由
fn leave_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(crate::management::handlers::leaves::list_leaves))
        .route(
            "/export",
            get(crate::management::handlers::leaves::export_leaves_csv),
        )
        .route(
            "/{id}",
            get(crate::management::handlers::leaves::get_leave),
        )
        .route(
            "/{id}/approve",
            post(crate::management::handlers::leaves::approve_leave),
        )
        .route(
            "/{id}/reject",
            post(crate::management::handlers::leaves::reject_leave),
        )
}

/// 指纹映射路由
fn fingerprint_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(crate::management::handlers::fingerprints::list_fingerprints),
        )
        .route(
            "/batch",
            post(crate::management::handlers::fingerprints::batch_import),
        )
        .route(
            "/import",
            post(crate::management::handlers::fingerprints::import_csv),
        )
        .route(
            "/{id}",
            delete(crate::management::handlers::fingerprints::delete_fingerprint),
        )
        .route(
            "/{id}/status",
            put(crate::management::handlers::fingerprints::update_enrollment),
        )
}

/// 设备管理路由
fn device_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(crate::management::handlers::devices::list_devices))
        .route(
            "/",
            post(crate::management::handlers::devices::create_device),
        )
        .route(
            "/{id}",
            get(crate::management::handlers::devices::get_device),
        )
        .route(
            "/{id}",
            put(crate::management::handlers::devices::update_device),
        )
        .route(
            "/{id}",
            delete(crate::management::handlers::devices::delete_device),
        )
}

/// 用户管理路由
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(crate::management::handlers::users::list_users))
        .route("/", post(crate::management::handlers::users::create_user))
        .route(
            "/{id}",
            put(crate::management::handlers::users::update_user),
        )
        .route(
            "/{id}",
            delete(crate::management::handlers::users::delete_user),
        )
        .route(
            "/{id}/reset-password",
            post(crate::management::handlers::users::reset_password),
        )
}

/// 操作日志路由
fn log_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(crate::management::handlers::logs::list_logs))
        .route("/", delete(crate::management::handlers::logs::clear_logs))
}

/// 系统维护路由
fn system_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/info",
            get(crate::management::handlers::system::get_system_info),
        )
        .route(
            "/cache",
            get(crate::management::handlers::system::cache_stats),
        )
        .route(
            "/cache",
            delete(crate::management::handlers::system::flush_cache),
        )
        .route(
            "/backups",
            get(crate::management::handlers::system::list_backups),
        )
        .route(
            "/backups",
            post(crate::management::handlers::system::create_backup),
        )
        .route(
            "/backups/{name}",
            delete(crate::management::handlers::system::delete_backup),
        )
}

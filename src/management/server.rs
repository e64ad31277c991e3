//! # 管理服务器
//!
//! Axum HTTP服务器：装配应用上下文、路由与中间件

use crate::auth::{CaptchaService, JwtManager};
use crate::cache::{MemoryCache, create_cache};
use crate::config::AppConfig;
use crate::error::{DormError, Result};
use axum::Router;
use sea_orm::DatabaseConnection;
use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// 应用上下文：每个请求通过 `AppState` 共享的显式依赖集合
pub struct AppContext {
    /// 应用配置
    pub config: AppConfig,
    /// 数据库连接
    pub database: Arc<DatabaseConnection>,
    /// 进程内缓存
    pub cache: Arc<MemoryCache>,
    /// JWT 管理器
    pub jwt: JwtManager,
    /// 验证码服务
    pub captcha: CaptchaService,
}

impl AppContext {
    #[must_use]
    pub fn new(config: AppConfig, database: DatabaseConnection) -> Self {
        let cache = create_cache(&config.cache);
        let jwt = JwtManager::new(&config.auth);
        let captcha = CaptchaService::new(cache.clone(), config.cache.captcha_ttl);
        Self {
            config,
            database: Arc::new(database),
            cache,
            jwt,
            captcha,
        }
    }
}

/// 管理服务器应用状态
#[derive(Clone)]
pub struct AppState {
    context: Arc<AppContext>,
}

impl AppState {
    #[must_use]
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    #[must_use]
    pub fn context_arc(&self) -> &Arc<AppContext> {
        &self.context
    }
}

impl Deref for AppState {
    type Target = AppContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// 管理服务器
pub struct ManagementServer {
    state: AppState,
    router: Router,
}

impl ManagementServer {
    /// 创建新的管理服务器
    pub fn new(context: Arc<AppContext>) -> Result<Self> {
        let state = AppState::new(context);
        let router = Self::create_router(state.clone());
        Ok(Self { state, router })
    }

    /// 创建路由器
    fn create_router(state: AppState) -> Router {
        let config = &state.config.server;

        let mut router = Router::new()
            .nest("/api", super::routes::create_routes(state.clone()))
            .layer(TraceLayer::new_for_http());

        if config.enable_cors {
            // 简化处理：允许任意来源，与前端部署方式解耦
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        router
    }

    /// 启动服务并一直运行
    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr = format!(
            "{}:{}",
            self.state.config.server.bind_address, self.state.config.server.port
        )
        .parse()
        .map_err(|e| DormError::config_with_source("监听地址无效", anyhow::Error::new(e)))?;

        info!("管理服务监听于 http://{}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| DormError::internal_with_source("端口绑定失败", e))?;

        axum::serve(listener, self.router)
            .await
            .map_err(|e| DormError::internal_with_source("HTTP 服务异常退出", e))?;

        Ok(())
    }
}

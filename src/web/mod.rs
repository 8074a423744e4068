//! 伴生 Web 服务
//!
//! `GET /api/tweets` 抓取并翻译推文，`GET /` 提供简单页面，`GET /health` 健康检查。

pub mod handlers;
pub mod routes;
pub mod templates;
pub mod types;

pub use routes::create_routes;
pub use types::*;

use std::io;
use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::config::WebConfig;

/// Web 服务器
pub struct WebServer {
    config: WebConfig,
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new(config: WebConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone(), &self.config)
    }

    /// 启动 Web 服务器
    pub async fn start(&self) -> io::Result<()> {
        let address = self.config.listen_address();
        let listener = tokio::net::TcpListener::bind(&address).await?;

        tracing::info!(
            provider = self.state.service.provider_name(),
            "Web 服务器已启动: http://{}",
            address
        );

        axum::serve(listener, self.router()).await
    }
}

/// 创建路由器
pub fn create_router(app_state: Arc<AppState>, config: &WebConfig) -> Router {
    let mut app = create_routes().with_state(app_state);

    // 添加CORS支持
    app = app.layer(CorsLayer::permissive());

    if let Some(static_dir) = &config.static_dir {
        app = app.nest_service("/static", ServeDir::new(static_dir));
    }

    app
}

//! Web 路由定义

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::web::handlers::*;
use crate::web::types::AppState;

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/tweets", get(get_tweets).fallback(method_not_allowed))
}

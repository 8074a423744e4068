//! 页面处理器

use axum::response::Html;

use crate::web::templates;

/// 主页处理器
pub async fn index() -> Html<&'static str> {
    Html(templates::INDEX_PAGE)
}

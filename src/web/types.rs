//! Web 模块的数据类型定义

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::config::constants::DEFAULT_MAX_TWEETS;
use crate::feed::{FetchTranslateService, TranslatedTweet};

pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";
pub const MISSING_ID_MESSAGE: &str = "User ID or Tweet ID is required";
pub const INVALID_MAX_TWEETS_MESSAGE: &str = "maxTweets must be a non-negative integer";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch and translate tweets";

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub service: FetchTranslateService,
    pub default_max_tweets: usize,
}

impl AppState {
    pub fn new(service: FetchTranslateService) -> Self {
        Self {
            service,
            default_max_tweets: DEFAULT_MAX_TWEETS,
        }
    }
}

/// `GET /api/tweets` 查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetsQuery {
    pub user_id: Option<String>,
    /// 保留原始字符串，便于返回 400 而不是框架默认的拒绝
    pub max_tweets: Option<String>,
    pub tweet_id: Option<String>,
}

/// 推文响应
#[derive(Debug, Serialize)]
pub struct TweetsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tweets: Option<Vec<TranslatedTweet>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TweetsResponse {
    pub fn ok(tweets: Vec<TranslatedTweet>) -> Self {
        Self {
            success: true,
            tweets: Some(tweets),
            message: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider: String,
}

/// Web 层错误，内部细节只写日志
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebError {
    MethodNotAllowed,
    BadRequest(&'static str),
    Internal,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, "GET")],
                Json(MessageBody {
                    message: METHOD_NOT_ALLOWED_MESSAGE,
                }),
            )
                .into_response(),
            WebError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(MessageBody { message })).into_response()
            }
            WebError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TweetsResponse {
                    success: false,
                    tweets: None,
                    message: Some(FETCH_FAILED_MESSAGE.to_string()),
                }),
            )
                .into_response(),
        }
    }
}

//! 推文数据提供方
//!
//! [`TweetProvider`] 是伴生服务读取推文的唯一接缝；[`client::TwitterApiClient`]
//! 基于 Twitter API v2 实现它。

pub mod client;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::TwitterApiClient;

/// 推文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub author_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Tweet {
    /// 附加作者信息
    pub fn with_author(mut self, author: &TwitterUser) -> Self {
        self.author_username = Some(author.username.clone());
        self.author_name = Some(author.name.clone());
        self
    }
}

/// 用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitterUser {
    pub id: String,
    pub username: String,
    pub name: String,
}

/// 推文提供方错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("网络错误: {0}")]
    Network(String),

    #[error("Twitter API 返回 {status}: {message}")]
    Status { status: u16, message: String },

    #[error("响应解析失败: {0}")]
    Parse(String),

    #[error("未找到: {0}")]
    NotFound(String),

    #[error("配置错误: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ProviderError::Parse(error.to_string())
        } else if let Some(status) = error.status() {
            ProviderError::Status {
                status: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            ProviderError::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(error: serde_json::Error) -> Self {
        ProviderError::Parse(error.to_string())
    }
}

/// 推文数据接口
#[async_trait]
pub trait TweetProvider: Send + Sync {
    /// 用户关注的账号
    async fn list_following(&self, user_id: &str) -> Result<Vec<TwitterUser>, ProviderError>;

    /// 用户最近的推文，最多 `limit` 条
    async fn list_user_tweets(&self, user_id: &str, limit: usize) -> Result<Vec<Tweet>, ProviderError>;

    /// 单条推文及其作者信息
    async fn get_tweet(&self, tweet_id: &str) -> Result<Tweet, ProviderError>;
}

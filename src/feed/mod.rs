//! 推文抓取与翻译服务
//!
//! 组合 [`TweetProvider`](crate::twitter::TweetProvider) 与
//! [`TranslationClient`](crate::translation::TranslationClient)，输出按时间倒序排列的
//! [`TranslatedTweet`] 列表。

pub mod service;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::constants::{DEFAULT_FOLLOWING_CAP, DEFAULT_TWEETS_PER_ACCOUNT};
use crate::config::AppConfig;
use crate::translation::TranslationResult;
use crate::twitter::{ProviderError, Tweet};

pub use service::{sort_newest_first, FetchTranslateService};

/// 推文及其译文
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedTweet {
    #[serde(flatten)]
    pub tweet: Tweet,
    pub translation: TranslationResult,
}

/// 服务层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("推文提供方错误: {0}")]
    Provider(#[from] ProviderError),

    #[error("无效输入: {0}")]
    InvalidInput(String),
}

/// 抓取选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOptions {
    /// 最多读取多少个关注账号
    pub following_cap: usize,
    /// 每个账号读取的推文数
    pub tweets_per_account: usize,
    pub source_lang: String,
    pub target_lang: String,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            following_cap: DEFAULT_FOLLOWING_CAP,
            tweets_per_account: DEFAULT_TWEETS_PER_ACCOUNT,
            source_lang: "auto".to_string(),
            target_lang: "en".to_string(),
        }
    }
}

impl FeedOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            following_cap: config.twitter.following_cap,
            tweets_per_account: config.twitter.tweets_per_account,
            source_lang: config.translation.source_lang.clone(),
            target_lang: config.translation.target_lang.clone(),
        }
    }
}

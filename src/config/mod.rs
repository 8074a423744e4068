//! 配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

pub use manager::{AppConfig, ConfigManager, ProviderKind, TranslationConfig, TwitterConfig, WebConfig};

/// 配置常量
pub mod constants {
    // 默认 API 设置
    pub const DEEPL_API_URL: &str = "https://api-free.deepl.com/v2/translate";
    pub const GOOGLE_GTX_API_URL: &str = "https://translate.googleapis.com/translate_a/single";
    pub const TWITTER_API_BASE: &str = "https://api.twitter.com";
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    // 伴生服务
    pub const DEFAULT_FOLLOWING_CAP: usize = 10;
    pub const DEFAULT_TWEETS_PER_ACCOUNT: usize = 5;
    pub const DEFAULT_MAX_TWEETS: usize = 20;

    // 缓存设置
    pub const DEFAULT_CACHE_SIZE: usize = 1000;

    // Web 设置
    pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 7080;

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "tweet-translator.toml",
        "config.toml",
        ".tweet-translator.toml",
        "~/.config/tweet-translator/config.toml",
        "/etc/tweet-translator/config.toml",
    ];
}

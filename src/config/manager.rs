//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    DeepL,
}

impl ProviderKind {
    pub fn default_api_url(&self) -> &'static str {
        match self {
            ProviderKind::Google => constants::GOOGLE_GTX_API_URL,
            ProviderKind::DeepL => constants::DEEPL_API_URL,
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = TranslationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "google" | "gtx" => Ok(ProviderKind::Google),
            "deepl" => Ok(ProviderKind::DeepL),
            other => Err(TranslationError::ConfigError(format!("未知的翻译提供方: {}", other))),
        }
    }
}

/// 翻译配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub provider: ProviderKind,
    /// 为空时使用提供方的默认地址
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub source_lang: String,
    pub target_lang: String,
    pub request_timeout_secs: u64,
    pub cache_enabled: bool,
    pub cache_size: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::DeepL,
            api_url: None,
            api_key: None,
            source_lang: "auto".to_string(),
            target_lang: "en".to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_enabled: true,
            cache_size: constants::DEFAULT_CACHE_SIZE,
        }
    }
}

impl TranslationConfig {
    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_api_url())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Twitter API 配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    pub following_cap: usize,
    pub tweets_per_account: usize,
    pub request_timeout_secs: u64,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            api_base: constants::TWITTER_API_BASE.to_string(),
            bearer_token: None,
            following_cap: constants::DEFAULT_FOLLOWING_CAP,
            tweets_per_account: constants::DEFAULT_TWEETS_PER_ACCOUNT,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Web 服务器配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebConfig {
    /// 绑定地址
    pub bind_addr: String,
    /// 端口
    pub port: u16,
    /// 静态文件目录
    pub static_dir: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: constants::DEFAULT_BIND_ADDR.to_string(),
            port: constants::DEFAULT_PORT,
            static_dir: None,
        }
    }
}

impl WebConfig {
    /// 获取完整的监听地址
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub translation: TranslationConfig,
    pub twitter: TwitterConfig,
    pub web: WebConfig,
}

impl AppConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.translation.target_lang.trim().is_empty() {
            return Err(TranslationError::ConfigError("目标语言不能为空".to_string()));
        }

        if self.translation.target_lang.eq_ignore_ascii_case("auto") {
            return Err(TranslationError::ConfigError("目标语言不能为 auto".to_string()));
        }

        if self.translation.request_timeout_secs == 0 || self.twitter.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时必须大于0".to_string()));
        }

        if self.translation.cache_enabled && self.translation.cache_size == 0 {
            return Err(TranslationError::ConfigError("启用缓存时缓存大小不能为0".to_string()));
        }

        if self.twitter.following_cap == 0 || self.twitter.tweets_per_account == 0 {
            return Err(TranslationError::ConfigError("推文抓取上限必须大于0".to_string()));
        }

        if self.web.port == 0 {
            return Err(TranslationError::ConfigError("端口不能为0".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{translation, twitter, web, EnvVar};

        if let Ok(provider) = translation::Provider::get() {
            if let Ok(kind) = provider.parse() {
                self.translation.provider = kind;
            }
        }

        if let Ok(api_url) = translation::ApiUrl::get() {
            tracing::info!("环境变量覆盖翻译 API URL: {}", api_url);
            self.translation.api_url = Some(api_url);
        }

        if let Ok(api_key) = translation::ApiKey::get() {
            self.translation.api_key = Some(api_key);
        }

        // 语言变量带有默认值，只在显式设置时覆盖
        if std::env::var(translation::SourceLang::NAME).is_ok() {
            match translation::SourceLang::get() {
                Ok(lang) => self.translation.source_lang = lang,
                Err(e) => tracing::warn!("忽略无效的环境变量: {}", e),
            }
        }

        if std::env::var(translation::TargetLang::NAME).is_ok() {
            match translation::TargetLang::get() {
                Ok(lang) => self.translation.target_lang = lang,
                Err(e) => tracing::warn!("忽略无效的环境变量: {}", e),
            }
        }

        if std::env::var(translation::RequestTimeout::NAME).is_ok() {
            if let Ok(timeout) = translation::RequestTimeout::get() {
                self.translation.request_timeout_secs = timeout.as_secs();
            }
        }

        if std::env::var(translation::CacheEnabled::NAME).is_ok() {
            if let Ok(enabled) = translation::CacheEnabled::get() {
                self.translation.cache_enabled = enabled;
            }
        }

        if std::env::var(translation::CacheSize::NAME).is_ok() {
            if let Ok(size) = translation::CacheSize::get() {
                self.translation.cache_size = size;
            }
        }

        if let Ok(token) = twitter::BearerToken::get() {
            self.twitter.bearer_token = Some(token);
        }

        if let Ok(api_base) = twitter::ApiBase::get() {
            self.twitter.api_base = api_base;
        }

        if std::env::var(twitter::FollowingCap::NAME).is_ok() {
            if let Ok(cap) = twitter::FollowingCap::get() {
                self.twitter.following_cap = cap;
            }
        }

        if std::env::var(twitter::TweetsPerAccount::NAME).is_ok() {
            if let Ok(limit) = twitter::TweetsPerAccount::get() {
                self.twitter.tweets_per_account = limit;
            }
        }

        if std::env::var(web::BindAddress::NAME).is_ok() {
            if let Ok(addr) = web::BindAddress::get() {
                self.web.bind_addr = addr;
            }
        }

        if std::env::var(web::Port::NAME).is_ok() {
            if let Ok(port) = web::Port::get() {
                self.web.port = port;
            }
        }

        if let Ok(static_dir) = web::StaticDir::get() {
            self.web.static_dir = Some(static_dir).filter(|dir| !dir.is_empty());
        }
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: AppConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器：.env → 配置文件 → 环境变量覆盖 → 验证
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 从指定配置文件创建
    pub fn from_path(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();
        let expanded = shellexpand::tilde(path);
        let mut config = Self::load_from_file(&expanded)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    pub fn into_config(self) -> AppConfig {
        self.config
    }

    fn load_config() -> TranslationResult<AppConfig> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(AppConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<AppConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".toml") {
            toml::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env.development", ".env.production", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = AppConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.translation.api_url(), constants::DEEPL_API_URL);
        assert_eq!(config.twitter.following_cap, 10);
        assert_eq!(config.twitter.tweets_per_account, 5);
        assert_eq!(config.web.listen_address(), "127.0.0.1:7080");
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [translation]
            provider = "google"
            target_lang = "ja"

            [web]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(config.translation.provider, ProviderKind::Google);
        assert_eq!(config.translation.target_lang, "ja");
        assert_eq!(config.translation.source_lang, "auto");
        assert_eq!(config.translation.api_url(), constants::GOOGLE_GTX_API_URL);
        assert_eq!(config.web.port, 9000);
        assert_eq!(config.web.bind_addr, "127.0.0.1");
    }

    #[test]
    fn validation_rejects_auto_target() {
        let mut config = AppConfig::default();
        config.translation.target_lang = "auto".to_string();
        assert!(matches!(config.validate(), Err(TranslationError::ConfigError(_))));
    }

    #[test]
    fn validation_rejects_zero_cache_size() {
        let mut config = AppConfig::default();
        config.translation.cache_size = 0;
        assert!(config.validate().is_err());

        config.translation.cache_enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn example_config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweet-translator.toml");
        let path = path.to_str().unwrap();

        ConfigManager::generate_example_config(path).unwrap();
        let manager = ConfigManager::from_path(path).unwrap();

        assert_eq!(manager.get_config().twitter.api_base, constants::TWITTER_API_BASE);
    }

    #[test]
    fn provider_kind_parsing() {
        assert_eq!("GTX".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
        assert_eq!("deepl".parse::<ProviderKind>().unwrap(), ProviderKind::DeepL);
        assert!("bing".parse::<ProviderKind>().is_err());
    }
}

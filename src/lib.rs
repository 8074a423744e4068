//! # Tweet Translator
//!
//! 在页面中就地翻译推文，并通过伴生 Web 服务提供带译文的推文列表。
//!
//! ## 模块组织
//!
//! - `page` - 页面翻译核心：定位、认领、翻译、切换、变化监听
//! - `translation` - 翻译接口、提供方实现与缓存
//! - `twitter` - 推文数据提供方
//! - `feed` - 推文抓取与批量翻译服务
//! - `preferences` - 偏好设置与持久化
//! - `html` - HTML 解析与序列化
//! - `config` / `env` - 配置文件与环境变量
//! - `web` - 伴生 Web 服务（可选）

pub mod config;
pub mod env;
pub mod feed;
pub mod html;
pub mod logging;
pub mod page;
pub mod preferences;
pub mod translation;
pub mod twitter;
#[cfg(feature = "web")]
pub mod web;

pub use feed::{FetchTranslateService, TranslatedTweet};
pub use page::{DocumentTree, NodeId, PageSession, RcDomTree};
pub use preferences::{PreferenceStore, Preferences, PreferencesUpdate};
pub use translation::{TranslationClient, TranslationError, TranslationResult, Translator};

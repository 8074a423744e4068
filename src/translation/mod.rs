//! 翻译模块
//!
//! - `client`: 翻译接口与降级语义
//! - `providers`: DeepL / Google gtx 实现
//! - `cache`: LRU 翻译缓存
//! - `error`: 统一错误类型

pub mod cache;
pub mod client;
pub mod error;
pub mod providers;

pub use cache::{CacheKey, CacheStats, CachedTranslator};
pub use client::{TranslationClient, TranslationOutcome, TranslationResult, Translator};
pub use error::{ErrorSeverity, TranslationError};
pub use providers::{build_translator, DeepLTranslator, GoogleGtxTranslator};

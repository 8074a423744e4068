//! 翻译缓存模块（简化版）
//!
//! 以 `(文本, 源语言, 目标语言)` 为键缓存成功的翻译结果。失败从不入缓存，
//! 因此瞬时的网络错误不会被固化。

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lru::LruCache;

use crate::translation::client::{TranslationOutcome, TranslationResult, Translator};

/// 缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

impl CacheKey {
    pub fn new(text: &str, source_lang: &str, target_lang: &str) -> Self {
        Self {
            text: text.to_string(),
            source_lang: source_lang.to_lowercase(),
            target_lang: target_lang.to_lowercase(),
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// 带 LRU 缓存的翻译器
pub struct CachedTranslator {
    inner: Arc<dyn Translator>,
    entries: Mutex<LruCache<CacheKey, TranslationResult>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedTranslator {
    pub fn new(inner: Arc<dyn Translator>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().map(|cache| cache.len()).unwrap_or(0);
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries,
        }
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.entries.lock() {
            cache.clear();
        }
    }

    fn lookup(&self, key: &CacheKey) -> Option<TranslationResult> {
        let mut cache = self.entries.lock().ok()?;
        cache.get(key).cloned()
    }

    fn store(&self, key: CacheKey, result: TranslationResult) {
        if let Ok(mut cache) = self.entries.lock() {
            cache.put(key, result);
        }
    }
}

#[async_trait]
impl Translator for CachedTranslator {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> TranslationOutcome {
        let key = CacheKey::new(text, source_lang, target_lang);

        if let Some(result) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("翻译缓存命中: {} 字符", text.chars().count());
            return Ok(result);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = self.inner.translate(text, source_lang, target_lang).await?;
        self.store(key, result.clone());

        Ok(result)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

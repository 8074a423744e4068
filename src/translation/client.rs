//! 翻译客户端
//!
//! [`Translator`] 是与外部翻译服务之间的唯一接缝；[`TranslationClient`] 在其上提供
//! "失败即返回原文" 的降级语义以及保持输入顺序的批量翻译。

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::translation::error::{helpers, TranslationError};

/// 翻译结果
///
/// 原文与译文相同表示 "无操作"（语言相同或无法翻译），调用方不应据此改动界面。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub original_text: String,
    pub translated_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
}

impl TranslationResult {
    pub fn new(
        original_text: impl Into<String>,
        translated_text: impl Into<String>,
        detected_language: Option<String>,
    ) -> Self {
        Self {
            original_text: original_text.into(),
            translated_text: translated_text.into(),
            detected_language,
        }
    }

    /// 降级结果：译文即原文
    pub fn unchanged(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            translated_text: text.clone(),
            original_text: text,
            detected_language: Some("unknown".to_string()),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.original_text == self.translated_text
    }
}

/// 提供方边界的显式结果类型
pub type TranslationOutcome = Result<TranslationResult, TranslationError>;

/// 翻译服务接口
#[async_trait]
pub trait Translator: Send + Sync {
    /// `source_lang` 可以为 `"auto"`
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> TranslationOutcome;

    fn name(&self) -> &str;
}

/// 无状态的翻译客户端
#[derive(Clone)]
pub struct TranslationClient {
    translator: Arc<dyn Translator>,
}

impl TranslationClient {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }

    pub fn from_translator<T: Translator + 'static>(translator: T) -> Self {
        Self::new(Arc::new(translator))
    }

    pub fn provider_name(&self) -> &str {
        self.translator.name()
    }

    /// 翻译单条文本，保留失败信息
    pub async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> TranslationOutcome {
        if text.trim().is_empty() {
            return Err(helpers::validation_error("待翻译文本为空"));
        }

        if target_lang.trim().is_empty() {
            return Err(helpers::validation_error("目标语言为空"));
        }

        self.translator.translate(text, source_lang, target_lang).await
    }

    /// 翻译单条文本；任何失败都降级为原文
    pub async fn translate_or_original(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> TranslationResult {
        match self.translate(text, source_lang, target_lang).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(provider = self.provider_name(), "翻译失败，返回原文: {}", e);
                TranslationResult::unchanged(text)
            }
        }
    }

    /// 并发翻译多条文本，结果顺序与输入一致
    pub async fn translate_multiple<S: AsRef<str>>(
        &self,
        texts: &[S],
        source_lang: &str,
        target_lang: &str,
    ) -> Vec<TranslationResult> {
        let requests = texts
            .iter()
            .map(|text| self.translate_or_original(text.as_ref(), source_lang, target_lang));

        join_all(requests).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Uppercase;

    #[async_trait]
    impl Translator for Uppercase {
        async fn translate(&self, text: &str, _source: &str, _target: &str) -> TranslationOutcome {
            if text.contains("fail") {
                return Err(helpers::network_error("boom"));
            }
            Ok(TranslationResult::new(text, text.to_uppercase(), Some("en".to_string())))
        }

        fn name(&self) -> &str {
            "uppercase"
        }
    }

    #[tokio::test]
    async fn failure_degrades_to_original() {
        let client = TranslationClient::from_translator(Uppercase);

        let result = client.translate_or_original("please fail", "auto", "ja").await;
        assert!(result.is_noop());
        assert_eq!(result.translated_text, "please fail");
        assert_eq!(result.detected_language.as_deref(), Some("unknown"));
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_provider() {
        let client = TranslationClient::from_translator(Uppercase);
        let outcome = client.translate("   ", "auto", "ja").await;
        assert!(matches!(outcome, Err(TranslationError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn batch_preserves_input_order() {
        let client = TranslationClient::from_translator(Uppercase);
        let texts = vec!["a", "fail here", "c"];

        let results = client.translate_multiple(&texts, "auto", "en").await;

        let translated: Vec<&str> = results.iter().map(|r| r.translated_text.as_str()).collect();
        assert_eq!(translated, vec!["A", "fail here", "C"]);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let value = serde_json::to_value(TranslationResult::new("hola", "hello", None)).unwrap();
        assert_eq!(value["originalText"], "hola");
        assert_eq!(value["translatedText"], "hello");
        assert!(value.get("detectedLanguage").is_none());
    }
}

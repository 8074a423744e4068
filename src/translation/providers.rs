//! 翻译服务提供方
//!
//! - [`DeepLTranslator`]: DeepL REST API（表单提交）
//! - [`GoogleGtxTranslator`]: Google 网页翻译接口 `translate_a/single?client=gtx`

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{ProviderKind, TranslationConfig};
use crate::translation::cache::CachedTranslator;
use crate::translation::client::{TranslationOutcome, TranslationResult, Translator};
use crate::translation::error::{helpers, TranslationError, TranslationResult as Result};

/// 按配置创建翻译器，启用缓存时外包一层 LRU
pub fn build_translator(config: &TranslationConfig) -> Result<Arc<dyn Translator>> {
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| helpers::config_error(format!("无法创建 HTTP 客户端: {}", e)))?;

    let translator: Arc<dyn Translator> = match config.provider {
        ProviderKind::DeepL => Arc::new(DeepLTranslator::new(
            http,
            config.api_url(),
            config.api_key.clone(),
        )),
        ProviderKind::Google => Arc::new(GoogleGtxTranslator::new(http, config.api_url())),
    };

    tracing::info!(
        provider = translator.name(),
        api_url = config.api_url(),
        cache = config.cache_enabled,
        "翻译器已创建"
    );

    if config.cache_enabled {
        Ok(Arc::new(CachedTranslator::new(translator, config.cache_size)))
    } else {
        Ok(translator)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(TranslationError::ProviderError {
        status: status.as_u16(),
        message: message.chars().take(200).collect(),
    })
}

// ============================================================================
// DeepL
// ============================================================================

pub struct DeepLTranslator {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
    detected_source_language: Option<String>,
}

impl DeepLTranslator {
    pub fn new(http: reqwest::Client, api_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            api_url: api_url.to_string(),
            api_key,
        }
    }
}

/// 解析 DeepL 响应体
pub(crate) fn parse_deepl_response(original: &str, body: &str) -> TranslationOutcome {
    let response: DeepLResponse = serde_json::from_str(body)?;
    let translation = response
        .translations
        .into_iter()
        .next()
        .ok_or_else(|| helpers::parse_error("DeepL 响应中没有 translations"))?;

    Ok(TranslationResult::new(
        original,
        translation.text,
        translation
            .detected_source_language
            .map(|lang| lang.to_lowercase()),
    ))
}

#[async_trait]
impl Translator for DeepLTranslator {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> TranslationOutcome {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| helpers::config_error("DeepL API key not configured"))?;

        let target = target_lang.to_uppercase();
        let mut form = vec![
            ("text", text.to_string()),
            ("target_lang", target),
            ("auth_key", api_key.to_string()),
        ];
        if !source_lang.eq_ignore_ascii_case("auto") {
            form.push(("source_lang", source_lang.to_uppercase()));
        }

        let response = self.http.post(&self.api_url).form(&form).send().await?;
        let body = ensure_success(response).await?.text().await?;

        parse_deepl_response(text, &body).map_err(|e| e.with_context(self.name()))
    }

    fn name(&self) -> &str {
        "deepl"
    }
}

// ============================================================================
// Google gtx
// ============================================================================

pub struct GoogleGtxTranslator {
    http: reqwest::Client,
    api_url: String,
}

impl GoogleGtxTranslator {
    pub fn new(http: reqwest::Client, api_url: &str) -> Self {
        Self {
            http,
            api_url: api_url.to_string(),
        }
    }
}

/// 解析 gtx 响应：`data[0]` 是分段列表，每段的第 0 项是译文，`data[2]` 是检测到的语言
pub(crate) fn parse_gtx_response(original: &str, data: &Value) -> TranslationOutcome {
    let segments = data
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| helpers::parse_error("gtx 响应缺少分段"))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(helpers::parse_error("gtx 响应没有译文"));
    }

    let detected = data.get(2).and_then(Value::as_str).map(str::to_string);

    Ok(TranslationResult::new(original, translated, detected))
}

#[async_trait]
impl Translator for GoogleGtxTranslator {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> TranslationOutcome {
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("client", "gtx"),
                ("sl", source_lang),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let data: Value = ensure_success(response).await?.json().await?;

        parse_gtx_response(text, &data).map_err(|e| e.with_context(self.name()))
    }

    fn name(&self) -> &str {
        "google"
    }
}

// 集成测试公共模块
//
// 提供可控的翻译器、推文提供方以及 HTML 辅助函数

use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use tweet_translator::page::{PageSession, RcDomTree};
use tweet_translator::preferences::{PreferenceStore, Preferences};
use tweet_translator::translation::error::helpers;
use tweet_translator::translation::{TranslationClient, TranslationOutcome, TranslationResult, Translator};
use tweet_translator::twitter::{ProviderError, Tweet, TweetProvider, TwitterUser};

/// 按映射表翻译；表中没有的文本原样返回
#[derive(Default)]
pub struct FakeTranslator {
    mapping: HashMap<String, String>,
    failing: HashSet<String>,
    fail_first: AtomicUsize,
    pub(crate) calls: AtomicUsize,
    targets: Mutex<Vec<String>>,
}

impl FakeTranslator {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            mapping: pairs
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    /// 这些文本总是翻译失败
    pub fn failing(mut self, texts: &[&str]) -> Self {
        self.failing = texts.iter().map(|t| t.to_string()).collect();
        self
    }

    /// 前 `n` 次调用失败
    pub fn fail_first(self, n: usize) -> Self {
        self.fail_first.store(n, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, _source_lang: &str, target_lang: &str) -> TranslationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().unwrap().push(target_lang.to_string());

        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_first.store(remaining - 1, Ordering::SeqCst);
            return Err(helpers::network_error("temporarily unavailable"));
        }

        if self.failing.contains(text) {
            return Err(helpers::network_error("provider down"));
        }

        let translated = self.mapping.get(text).cloned().unwrap_or_else(|| text.to_string());
        Ok(TranslationResult::new(text, translated, Some("xx".to_string())))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// 内存中的推文提供方
#[derive(Default)]
pub struct FakeProvider {
    pub following: Vec<TwitterUser>,
    pub timelines: HashMap<String, Vec<Tweet>>,
    pub tweets: HashMap<String, Tweet>,
    pub fail: bool,
    pub(crate) calls: AtomicUsize,
    pub(crate) timeline_requests: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn timeline_requests(&self) -> Vec<String> {
        self.timeline_requests.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Status {
                status: 503,
                message: "upstream unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TweetProvider for FakeProvider {
    async fn list_following(&self, _user_id: &str) -> Result<Vec<TwitterUser>, ProviderError> {
        self.check()?;
        Ok(self.following.clone())
    }

    async fn list_user_tweets(&self, user_id: &str, limit: usize) -> Result<Vec<Tweet>, ProviderError> {
        self.check()?;
        self.timeline_requests.lock().unwrap().push(user_id.to_string());
        Ok(self
            .timelines
            .get(user_id)
            .map(|tweets| tweets.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_tweet(&self, tweet_id: &str) -> Result<Tweet, ProviderError> {
        self.check()?;
        self.tweets
            .get(tweet_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(tweet_id.to_string()))
    }
}

pub fn user(id: &str) -> TwitterUser {
    TwitterUser {
        id: id.to_string(),
        username: format!("user{}", id),
        name: format!("User {}", id),
    }
}

/// `minute` 越大越新
pub fn tweet(id: &str, author_id: &str, text: &str, minute: u32) -> Tweet {
    Tweet {
        id: id.to_string(),
        text: text.to_string(),
        author_id: author_id.to_string(),
        author_username: None,
        author_name: None,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, minute, 0).unwrap(),
    }
}

/// 模拟时间线：每条推文一个 article
pub fn timeline_page(texts: &[&str]) -> String {
    let articles: String = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            format!(
                r#"<article><div data-testid="tweetText" id="t{}" lang="es" dir="auto"><span>{}</span></div></article>"#,
                i, text
            )
        })
        .collect();
    format!("<html><head></head><body><main>{}</main></body></html>", articles)
}

pub fn session_with(
    html: &str,
    translator: Arc<FakeTranslator>,
    preferences: Preferences,
) -> (Rc<RcDomTree>, PageSession<RcDomTree>, Arc<PreferenceStore>) {
    let tree = Rc::new(RcDomTree::parse(html).unwrap());
    let store = Arc::new(PreferenceStore::new(preferences));
    let session = PageSession::new(tree.clone(), store.clone(), TranslationClient::new(translator));
    (tree, session, store)
}

pub fn session(
    html: &str,
    translator: Arc<FakeTranslator>,
) -> (Rc<RcDomTree>, PageSession<RcDomTree>, Arc<PreferenceStore>) {
    session_with(html, translator, Preferences::default())
}

pub fn html_of(tree: &RcDomTree) -> String {
    String::from_utf8(tree.to_html("utf-8").unwrap()).unwrap()
}

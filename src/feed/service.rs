use std::sync::Arc;

use futures::future::try_join_all;

use super::{FeedError, FeedOptions, TranslatedTweet};
use crate::translation::TranslationClient;
use crate::twitter::{Tweet, TweetProvider};

/// 推文抓取 + 批量翻译
#[derive(Clone)]
pub struct FetchTranslateService {
    provider: Arc<dyn TweetProvider>,
    client: TranslationClient,
    options: FeedOptions,
}

impl FetchTranslateService {
    pub fn new(provider: Arc<dyn TweetProvider>, client: TranslationClient, options: FeedOptions) -> Self {
        Self {
            provider,
            client,
            options,
        }
    }

    pub fn options(&self) -> &FeedOptions {
        &self.options
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    /// 用户关注账号的最新推文
    pub async fn by_user(&self, user_id: &str, max_tweets: usize) -> Result<Vec<TranslatedTweet>, FeedError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(FeedError::InvalidInput("user id is empty".to_string()));
        }

        let following = self.provider.list_following(user_id).await?;
        let accounts: Vec<_> = following.into_iter().take(self.options.following_cap).collect();

        tracing::debug!(user_id, accounts = accounts.len(), "读取关注账号的推文");

        let per_account = self.options.tweets_per_account;
        let timelines = try_join_all(accounts.iter().map(|account| async move {
            let tweets = self
                .provider
                .list_user_tweets(&account.id, per_account)
                .await?;
            Ok::<_, FeedError>(
                tweets
                    .into_iter()
                    .map(|tweet| tweet.with_author(account))
                    .collect::<Vec<_>>(),
            )
        }))
        .await?;

        let mut tweets: Vec<Tweet> = timelines.into_iter().flatten().collect();
        sort_newest_first(&mut tweets);
        tweets.truncate(max_tweets);

        Ok(self.translate_all(tweets).await)
    }

    /// 单条推文
    pub async fn by_tweet(&self, tweet_id: &str) -> Result<Vec<TranslatedTweet>, FeedError> {
        let tweet_id = tweet_id.trim();
        if tweet_id.is_empty() {
            return Err(FeedError::InvalidInput("tweet id is empty".to_string()));
        }

        let tweet = self.provider.get_tweet(tweet_id).await?;
        Ok(self.translate_all(vec![tweet]).await)
    }

    /// 并发翻译全部正文，按下标重新组合
    async fn translate_all(&self, tweets: Vec<Tweet>) -> Vec<TranslatedTweet> {
        let texts: Vec<&str> = tweets.iter().map(|tweet| tweet.text.as_str()).collect();
        let translations = self
            .client
            .translate_multiple(&texts, &self.options.source_lang, &self.options.target_lang)
            .await;

        let translated = translations.iter().filter(|t| !t.is_noop()).count();
        tracing::info!(total = tweets.len(), translated, "推文翻译完成");

        tweets
            .into_iter()
            .zip(translations)
            .map(|(tweet, translation)| TranslatedTweet { tweet, translation })
            .collect()
    }
}

/// 按 `created_at` 倒序排列，相同时间保持原有顺序
pub fn sort_newest_first(tweets: &mut [Tweet]) {
    tweets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn tweet(id: &str, hour: u32) -> Tweet {
        Tweet {
            id: id.to_string(),
            text: id.to_string(),
            author_id: "1".to_string(),
            author_username: None,
            author_name: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn newest_first_is_stable() {
        let mut tweets = vec![tweet("a", 1), tweet("b", 3), tweet("c", 1), tweet("d", 2)];
        sort_newest_first(&mut tweets);

        let ids: Vec<&str> = tweets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }
}

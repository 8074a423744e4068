//! Twitter API v2 客户端

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::{ProviderError, Tweet, TweetProvider, TwitterUser};
use crate::config::TwitterConfig;

/// 时间线接口要求 `max_results` 在 5..=100 之间
const TIMELINE_MIN_RESULTS: usize = 5;
const TIMELINE_MAX_RESULTS: usize = 100;
const FOLLOWING_MAX_RESULTS: usize = 100;

pub struct TwitterApiClient {
    http: reqwest::Client,
    api_base: Url,
    bearer_token: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    includes: Option<Includes>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<TwitterUser>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    title: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTweet {
    id: String,
    text: String,
    author_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl ApiTweet {
    fn into_tweet(self, fallback_author: &str) -> Result<Tweet, ProviderError> {
        let created_at = self
            .created_at
            .ok_or_else(|| ProviderError::Parse(format!("推文 {} 缺少 created_at", self.id)))?;

        Ok(Tweet {
            author_id: self.author_id.unwrap_or_else(|| fallback_author.to_string()),
            id: self.id,
            text: self.text,
            author_username: None,
            author_name: None,
            created_at,
        })
    }
}

impl TwitterApiClient {
    pub fn new(http: reqwest::Client, api_base: &str, bearer_token: &str) -> Result<Self, ProviderError> {
        let api_base = Url::parse(api_base)
            .map_err(|e| ProviderError::Config(format!("无效的 API 地址 {}: {}", api_base, e)))?;

        Ok(Self {
            http,
            api_base,
            bearer_token: bearer_token.to_string(),
        })
    }

    pub fn from_config(config: &TwitterConfig) -> Result<Self, ProviderError> {
        let token = config
            .bearer_token
            .as_deref()
            .ok_or_else(|| ProviderError::Config("TWITTER_BEARER_TOKEN 未配置".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Self::new(http, &config.api_base, token)
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ProviderError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Config(format!("API 地址不能作为基础地址: {}", self.api_base)))?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Envelope<T>, ProviderError> {
        tracing::debug!("请求 Twitter API: {}", url.path());

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn describe_errors(errors: &[ApiError]) -> String {
    errors
        .iter()
        .map(|e| {
            e.detail
                .clone()
                .or_else(|| e.title.clone())
                .unwrap_or_else(|| "unknown error".to_string())
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl TweetProvider for TwitterApiClient {
    async fn list_following(&self, user_id: &str) -> Result<Vec<TwitterUser>, ProviderError> {
        let max_results = FOLLOWING_MAX_RESULTS.to_string();
        let url = self.endpoint(
            &["2", "users", user_id, "following"],
            &[("max_results", &max_results), ("user.fields", "username,name")],
        )?;

        let envelope: Envelope<Vec<TwitterUser>> = self.get_json(url).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn list_user_tweets(&self, user_id: &str, limit: usize) -> Result<Vec<Tweet>, ProviderError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let max_results = limit
            .clamp(TIMELINE_MIN_RESULTS, TIMELINE_MAX_RESULTS)
            .to_string();
        let url = self.endpoint(
            &["2", "users", user_id, "tweets"],
            &[
                ("max_results", &max_results),
                ("tweet.fields", "created_at,author_id"),
                ("exclude", "retweets,replies"),
            ],
        )?;

        let envelope: Envelope<Vec<ApiTweet>> = self.get_json(url).await?;

        envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .map(|tweet| tweet.into_tweet(user_id))
            .collect()
    }

    async fn get_tweet(&self, tweet_id: &str) -> Result<Tweet, ProviderError> {
        let url = self.endpoint(
            &["2", "tweets", tweet_id],
            &[
                ("tweet.fields", "created_at,author_id"),
                ("expansions", "author_id"),
                ("user.fields", "username,name"),
            ],
        )?;

        let envelope: Envelope<ApiTweet> = self.get_json(url).await?;

        let data = match envelope.data {
            Some(data) => data,
            None if !envelope.errors.is_empty() => {
                return Err(ProviderError::NotFound(describe_errors(&envelope.errors)))
            }
            None => return Err(ProviderError::NotFound(format!("Tweet {} not found", tweet_id))),
        };

        let tweet = data.into_tweet("")?;
        let users = envelope.includes.unwrap_or_default().users;
        let author = users
            .iter()
            .find(|user| user.id == tweet.author_id)
            .or_else(|| users.first());

        Ok(match author {
            Some(author) => tweet.with_author(author),
            None => tweet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> TwitterApiClient {
        TwitterApiClient::new(reqwest::Client::new(), base, "token").unwrap()
    }

    #[test]
    fn endpoint_escapes_segments_and_keeps_base_path() {
        let api = client("https://api.twitter.com");
        let url = api
            .endpoint(&["2", "users", "12/34", "tweets"], &[("max_results", "5")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.twitter.com/2/users/12%2F34/tweets?max_results=5"
        );

        let proxied = client("http://localhost:8080/proxy/");
        let url = proxied.endpoint(&["2", "tweets", "1"], &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/proxy/2/tweets/1");
    }

    #[test]
    fn single_tweet_envelope_is_parsed() {
        let body = r#"{
            "data": {"id": "123", "text": "こんにちは", "author_id": "42",
                     "created_at": "2024-03-01T10:00:00.000Z", "edit_history_tweet_ids": ["123"]},
            "includes": {"users": [{"id": "42", "username": "tanaka", "name": "Tanaka"}]}
        }"#;

        let envelope: Envelope<ApiTweet> = serde_json::from_str(body).unwrap();
        let tweet = envelope.data.unwrap().into_tweet("").unwrap();
        let author = &envelope.includes.unwrap().users[0];

        let tweet = tweet.with_author(author);
        assert_eq!(tweet.author_username.as_deref(), Some("tanaka"));
        assert_eq!(tweet.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn missing_created_at_is_parse_error() {
        let api_tweet = ApiTweet {
            id: "1".to_string(),
            text: "hi".to_string(),
            author_id: None,
            created_at: None,
        };
        assert!(matches!(api_tweet.into_tweet("7"), Err(ProviderError::Parse(_))));
    }

    #[test]
    fn not_found_errors_are_described() {
        let body = r#"{"errors": [{"title": "Not Found Error", "detail": "Could not find tweet with id: [1]."}]}"#;
        let envelope: Envelope<ApiTweet> = serde_json::from_str(body).unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(describe_errors(&envelope.errors), "Could not find tweet with id: [1].");
    }

    #[test]
    fn from_config_requires_token() {
        let config = TwitterConfig::default();
        assert!(matches!(
            TwitterApiClient::from_config(&config),
            Err(ProviderError::Config(_))
        ));
    }
}

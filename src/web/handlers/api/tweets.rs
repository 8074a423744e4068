//! 推文 API

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;

use crate::feed::FeedError;
use crate::web::types::{
    AppState, TweetsQuery, TweetsResponse, WebError, INVALID_MAX_TWEETS_MESSAGE, MISSING_ID_MESSAGE,
};

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `GET /api/tweets?userId=..&maxTweets=..` 或 `GET /api/tweets?tweetId=..`
///
/// 同时给出两者时以 `tweetId` 为准。
pub async fn get_tweets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TweetsQuery>,
) -> Result<Json<TweetsResponse>, WebError> {
    let result = if let Some(tweet_id) = non_empty(query.tweet_id) {
        state.service.by_tweet(&tweet_id).await
    } else if let Some(user_id) = non_empty(query.user_id) {
        let max_tweets = match non_empty(query.max_tweets) {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| WebError::BadRequest(INVALID_MAX_TWEETS_MESSAGE))?,
            None => state.default_max_tweets,
        };
        state.service.by_user(&user_id, max_tweets).await
    } else {
        return Err(WebError::BadRequest(MISSING_ID_MESSAGE));
    };

    match result {
        Ok(tweets) => Ok(Json(TweetsResponse::ok(tweets))),
        Err(FeedError::InvalidInput(_)) => Err(WebError::BadRequest(MISSING_ID_MESSAGE)),
        Err(e) => {
            tracing::error!("获取推文失败: {}", e);
            Err(WebError::Internal)
        }
    }
}

/// 非 GET 请求
pub async fn method_not_allowed() -> WebError {
    WebError::MethodNotAllowed
}

//! `/api/tweets` 接口测试
#![cfg(feature = "web")]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use tweet_translator::config::WebConfig;
use tweet_translator::feed::{FeedOptions, FetchTranslateService};
use tweet_translator::translation::TranslationClient;
use tweet_translator::web::{create_router, AppState};

mod common {
    include!("common/mod.rs");
}

use common::{tweet, user, FakeProvider, FakeTranslator};

fn app(provider: Arc<FakeProvider>) -> Router {
    let translator = Arc::new(FakeTranslator::new(&[("hola", "hello")]));
    let service = FetchTranslateService::new(
        provider,
        TranslationClient::new(translator),
        FeedOptions::default(),
    );
    create_router(Arc::new(AppState::new(service)), &WebConfig::default())
}

fn provider_with_data() -> FakeProvider {
    let mut provider = FakeProvider::default();
    provider.tweets.insert("123".to_string(), tweet("123", "9", "hola", 0));
    provider.following = vec![user("9")];
    provider.timelines.insert(
        "9".to_string(),
        (0..5).map(|i| tweet(&format!("t{}", i), "9", "hola", i)).collect(),
    );
    provider
}

async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, Value, axum::http::HeaderMap) {
    let response = app
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body, headers)
}

#[tokio::test]
async fn test_single_tweet_request() {
    let (status, body, _) = send(
        app(Arc::new(provider_with_data())),
        Method::GET,
        "/api/tweets?tweetId=123",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["tweets"].as_array().unwrap().len(), 1);
    assert_eq!(body["tweets"][0]["id"], "123");
    assert_eq!(body["tweets"][0]["translation"]["translatedText"], "hello");
    assert_eq!(body["tweets"][0]["translation"]["originalText"], "hola");
}

#[tokio::test]
async fn test_user_request_respects_max_tweets() {
    let (status, body, _) = send(
        app(Arc::new(provider_with_data())),
        Method::GET,
        "/api/tweets?userId=42&maxTweets=2",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let tweets = body["tweets"].as_array().unwrap();
    assert_eq!(tweets.len(), 2);
    assert_eq!(tweets[0]["id"], "t4");
    assert_eq!(tweets[0]["author_username"], "user9");
}

#[tokio::test]
async fn test_missing_ids_are_rejected() {
    let provider = Arc::new(provider_with_data());
    let (status, body, _) = send(app(provider.clone()), Method::GET, "/api/tweets").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User ID or Tweet ID is required");
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_invalid_max_tweets_is_rejected() {
    let provider = Arc::new(provider_with_data());
    let (status, _, _) = send(app(provider.clone()), Method::GET, "/api/tweets?userId=1&maxTweets=lots").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_non_get_is_method_not_allowed() {
    let provider = Arc::new(provider_with_data());
    let (status, body, headers) = send(app(provider.clone()), Method::POST, "/api/tweets?tweetId=123").await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["message"], "Method not allowed");
    assert_eq!(headers.get(header::ALLOW).unwrap(), "GET");
    assert_eq!(provider.calls(), 0, "不应调用推文提供方");
}

#[tokio::test]
async fn test_provider_failure_is_generic_500() {
    let provider = FakeProvider {
        fail: true,
        ..Default::default()
    };
    let (status, body, _) = send(app(Arc::new(provider)), Method::GET, "/api/tweets?userId=1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Failed to fetch and translate tweets");
    assert!(!body.to_string().contains("upstream"), "内部错误细节不应返回给客户端");
}

#[tokio::test]
async fn test_health_and_index() {
    let (status, body, _) = send(app(Arc::new(FakeProvider::default())), Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider"], "fake");

    let response = app(Arc::new(FakeProvider::default()))
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("/api/tweets"));
}

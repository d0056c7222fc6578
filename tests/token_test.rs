mod common;

use fitplay::{Error, management::TokenState};
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

use common::{MockClock, NOW, TOKEN_PATH, credentials, token_response};

#[tokio::test]
async fn test_valid_token_is_returned_without_network() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = common::token_provider(&server, common::store(&dir), MockClock::at(NOW));
    let creds = credentials("valid-token", NOW + 3600);
    let (token, returned) = provider.get_valid_access_token(creds.clone()).await.unwrap();

    assert_eq!(token, "valid-token");
    assert_eq!(returned, creds);
    assert!(!dir.path().join(".env").exists());
}

#[tokio::test]
async fn test_token_inside_skew_window_is_refreshed() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response("fresh-token", 21600)))
        .expect(1)
        .mount(&server)
        .await;

    let provider = common::token_provider(&server, common::store(&dir), MockClock::at(NOW));
    // 30 seconds left is inside the default 60 second skew.
    let stale = credentials("stale-token", NOW + 30);
    assert_eq!(provider.state(&stale), TokenState::Expired);

    let (token, refreshed) = provider.get_valid_access_token(stale.clone()).await.unwrap();

    assert_eq!(token, "fresh-token");
    assert_eq!(refreshed.expires_at, Some(NOW + 21600));
    assert!(refreshed.expires_at > stale.expires_at);
    assert_eq!(refreshed.refresh_token.as_deref(), Some("refresh-2"));
    assert_eq!(provider.state(&refreshed), TokenState::Valid);

    let stored = common::store(&dir).load().await.unwrap();
    assert_eq!(stored, refreshed);
}

#[tokio::test]
async fn test_absolute_expiry_wins_over_relative() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-token",
            "expires_at": NOW + 7200,
            "expires_in": 100
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = common::token_provider(&server, common::store(&dir), MockClock::at(NOW));
    let refreshed = provider
        .refresh(&credentials("old", NOW - 10))
        .await
        .unwrap();

    assert_eq!(refreshed.expires_at, Some(NOW + 7200));
    // No new refresh token in the response keeps the old one.
    assert_eq!(refreshed.refresh_token.as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn test_rejected_refresh_is_reported() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"message":"Bad Request"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let provider = common::token_provider(&server, common::store(&dir), MockClock::at(NOW));
    let result = provider
        .get_valid_access_token(credentials("old", NOW - 10))
        .await;

    match result {
        Err(Error::RefreshRejected { provider, status, .. }) => {
            assert_eq!(provider, "strava");
            assert_eq!(status, 400);
        }
        other => panic!("expected RefreshRejected, got {:?}", other),
    }
    assert!(!dir.path().join(".env").exists());
}

#[tokio::test]
async fn test_missing_refresh_token_requires_authentication() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = common::token_provider(&server, common::store(&dir), MockClock::at(NOW));
    let mut creds = credentials("old", NOW - 10);
    creds.refresh_token = None;
    creds.access_token = None;
    assert_eq!(provider.state(&creds), TokenState::NoToken);

    let result = provider.get_valid_access_token(creds).await;
    assert!(matches!(result, Err(Error::AuthenticationRequired { .. })));
}

#[tokio::test]
async fn test_response_without_expiry_is_invalid() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "access_token": "fresh-token" })),
        )
        .mount(&server)
        .await;

    let provider = common::token_provider(&server, common::store(&dir), MockClock::at(NOW));
    let result = provider.refresh(&credentials("old", NOW - 10)).await;

    assert!(matches!(result, Err(Error::InvalidTokenResponse { .. })));
}

#[tokio::test]
async fn test_authorization_code_exchange_persists_tokens() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response("first-token", 21600)))
        .expect(1)
        .mount(&server)
        .await;

    let provider = common::token_provider(&server, common::store(&dir), MockClock::at(NOW));
    let mut creds = credentials("unused", 0);
    creds.access_token = None;
    creds.refresh_token = None;
    creds.expires_at = None;

    let updated = provider
        .exchange_authorization_code(&creds, "abc123", Some("http://localhost:8888/callback"))
        .await
        .unwrap();

    assert_eq!(updated.access_token.as_deref(), Some("first-token"));
    assert_eq!(updated.refresh_token.as_deref(), Some("refresh-2"));
    assert_eq!(updated.expires_at, Some(NOW + 21600));
    assert_eq!(common::store(&dir).load().await.unwrap(), updated);
}

#[tokio::test]
async fn test_invalidate_forces_refresh() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let provider = common::token_provider(&server, common::store(&dir), MockClock::at(NOW));

    let creds = provider.invalidate(credentials("valid-token", NOW + 3600));
    assert_eq!(creds.expires_at, Some(0));
    assert_eq!(provider.state(&creds), TokenState::Expired);
}

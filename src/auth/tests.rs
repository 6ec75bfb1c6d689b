//! Tests for the auth module

use super::*;
use crate::error::Error;
use crate::test_support::jwt_expiring_in;
use crate::types::TokenPair;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn refresher_for(server: &MockServer, credentials: CredentialStore) -> (TokenRefresher, AuthEvents) {
    let events = AuthEvents::new();
    let refresher = TokenRefresher::new(
        format!("{}{}", server.uri(), DEFAULT_REFRESH_PATH),
        reqwest::Client::new(),
        credentials,
        events.clone(),
    );
    (refresher, events)
}

// ============================================================================
// Credential store
// ============================================================================

#[tokio::test]
async fn test_memory_store_round_trip() {
    let store = CredentialStore::in_memory();
    assert!(!store.has_tokens().await.unwrap());

    store
        .store_tokens(&TokenPair::new("access-1", "refresh-1"))
        .await
        .unwrap();
    assert_eq!(store.access_token().await.unwrap().as_deref(), Some("access-1"));
    assert_eq!(store.refresh_token().await.unwrap().as_deref(), Some("refresh-1"));
    assert!(store.has_tokens().await.unwrap());

    store.set_user_info(&json!({"username": "amir"})).await.unwrap();
    assert_eq!(
        store.user_info().await.unwrap(),
        Some(json!({"username": "amir"}))
    );

    store.clear().await.unwrap();
    assert!(store.access_token().await.unwrap().is_none());
    assert!(store.refresh_token().await.unwrap().is_none());
    assert!(store.user_info().await.unwrap().is_none());
}

#[tokio::test]
async fn test_partial_store_is_not_complete() {
    let store = CredentialStore::in_memory();
    store.set_access_token("only-access").await.unwrap();
    assert!(!store.has_tokens().await.unwrap());
}

#[tokio::test]
async fn test_file_storage_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("nested").join("credentials.json");

    {
        let store = CredentialStore::new(Arc::new(FileStorage::new(&file)));
        store
            .store_tokens(&TokenPair::new("a", "r"))
            .await
            .unwrap();
    }

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(raw[ACCESS_TOKEN_KEY], "a");
    assert_eq!(raw[REFRESH_TOKEN_KEY], "r");

    let reopened = CredentialStore::new(Arc::new(FileStorage::new(&file)));
    assert_eq!(reopened.access_token().await.unwrap().as_deref(), Some("a"));

    reopened.clear().await.unwrap();
    let reopened_again = CredentialStore::new(Arc::new(FileStorage::new(&file)));
    assert!(!reopened_again.has_tokens().await.unwrap());
}

#[tokio::test]
async fn test_file_storage_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("absent.json"));
    assert!(storage.get(ACCESS_TOKEN_KEY).await.unwrap().is_none());
    storage.remove(ACCESS_TOKEN_KEY).await.unwrap();
    assert!(!dir.path().join("absent.json").exists());
}

#[tokio::test]
async fn test_file_storage_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("credentials.json");
    std::fs::write(&file, "{not json").unwrap();

    let storage = FileStorage::new(&file);
    let err = storage.get(ACCESS_TOKEN_KEY).await.unwrap_err();
    assert!(matches!(err, Error::Storage { .. }));
}

#[tokio::test]
async fn test_file_storage_clear_recovers_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("credentials.json");
    std::fs::write(&file, "{not json").unwrap();

    let store = CredentialStore::new(Arc::new(FileStorage::new(&file)));
    assert!(store.access_token().await.is_err());

    store.clear().await.unwrap();
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(raw, json!({}));
    assert!(!store.has_tokens().await.unwrap());

    store
        .store_tokens(&TokenPair::new("a", "r"))
        .await
        .unwrap();
    assert_eq!(store.access_token().await.unwrap().as_deref(), Some("a"));
}

#[tokio::test]
async fn test_file_storage_failed_write_keeps_previous_values() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("credentials.json");
    let storage = FileStorage::new(&file);
    storage.set(ACCESS_TOKEN_KEY, "a").await.unwrap();

    // A directory squatting on the temp path makes the next write fail
    std::fs::create_dir(file.with_extension("tmp")).unwrap();

    assert!(storage.set(ACCESS_TOKEN_KEY, "b").await.is_err());
    assert!(storage.remove(ACCESS_TOKEN_KEY).await.is_err());
    assert_eq!(
        storage.get(ACCESS_TOKEN_KEY).await.unwrap().as_deref(),
        Some("a")
    );
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn test_refresh_without_refresh_token_skips_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEFAULT_REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "never"})))
        .expect(0)
        .mount(&server)
        .await;

    let store = CredentialStore::in_memory();
    store.set_access_token("dangling").await.unwrap();
    let (refresher, events) = refresher_for(&server, store.clone());
    let mut rx = events.subscribe();

    let err = refresher.refresh().await.unwrap_err();
    assert!(matches!(err, Error::NoRefreshToken));
    assert!(store.access_token().await.unwrap().is_none());
    assert!(matches!(
        rx.recv().await.unwrap(),
        AuthEvent::Unauthenticated { .. }
    ));
}

#[tokio::test]
async fn test_refresh_stores_new_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEFAULT_REFRESH_PATH))
        .and(body_json(json!({"refresh": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "access-2"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = CredentialStore::in_memory();
    store
        .store_tokens(&TokenPair::new("access-1", "refresh-1"))
        .await
        .unwrap();
    let (refresher, events) = refresher_for(&server, store.clone());
    let mut rx = events.subscribe();

    let token = refresher.refresh().await.unwrap();
    assert_eq!(token, "access-2");
    assert_eq!(store.access_token().await.unwrap().as_deref(), Some("access-2"));
    assert_eq!(store.refresh_token().await.unwrap().as_deref(), Some("refresh-1"));
    assert_eq!(rx.recv().await.unwrap(), AuthEvent::TokenRefreshed);
}

#[tokio::test]
async fn test_refresh_stores_rotated_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEFAULT_REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "access-2", "refresh": "refresh-2"})),
        )
        .mount(&server)
        .await;

    let store = CredentialStore::in_memory();
    store
        .store_tokens(&TokenPair::new("access-1", "refresh-1"))
        .await
        .unwrap();
    let (refresher, _) = refresher_for(&server, store.clone());

    refresher.refresh().await.unwrap();
    assert_eq!(store.refresh_token().await.unwrap().as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn test_refresh_rejected_clears_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEFAULT_REFRESH_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid refresh token"})))
        .mount(&server)
        .await;

    let store = CredentialStore::in_memory();
    store
        .store_tokens(&TokenPair::new("access-1", "refresh-1"))
        .await
        .unwrap();
    store.set_user_info(&json!({"id": 1})).await.unwrap();
    let (refresher, _) = refresher_for(&server, store.clone());

    let err = refresher.refresh().await.unwrap_err();
    assert!(matches!(err, Error::TokenRefresh { .. }));
    assert!(err.to_string().contains("400"));
    assert!(store.access_token().await.unwrap().is_none());
    assert!(store.refresh_token().await.unwrap().is_none());
    assert!(store.user_info().await.unwrap().is_none());
}

#[tokio::test]
async fn test_refresh_malformed_response_clears_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEFAULT_REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "wrong-shape"})))
        .mount(&server)
        .await;

    let store = CredentialStore::in_memory();
    store
        .store_tokens(&TokenPair::new("access-1", "refresh-1"))
        .await
        .unwrap();
    let (refresher, _) = refresher_for(&server, store.clone());

    let err = refresher.refresh().await.unwrap_err();
    assert!(err.to_string().contains("malformed refresh response"));
    assert!(!store.has_tokens().await.unwrap());
}

#[tokio::test]
async fn test_refresh_network_failure_clears_credentials() {
    // Nothing listens on this port once the server is dropped
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let store = CredentialStore::in_memory();
    store
        .store_tokens(&TokenPair::new("access-1", "refresh-1"))
        .await
        .unwrap();
    let refresher = TokenRefresher::new(
        format!("{uri}{DEFAULT_REFRESH_PATH}"),
        reqwest::Client::new(),
        store.clone(),
        AuthEvents::new(),
    );

    assert!(refresher.refresh().await.is_err());
    assert!(!store.has_tokens().await.unwrap());
}

#[tokio::test]
async fn test_refresh_if_stale_reuses_concurrent_result() {
    let server = MockServer::start().await;
    let fresh = jwt_expiring_in(300);
    Mock::given(method("POST"))
        .and(path(DEFAULT_REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": fresh}))
                .set_delay(std::time::Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let stale = jwt_expiring_in(-10);
    let store = CredentialStore::in_memory();
    store
        .store_tokens(&TokenPair::new(stale.clone(), "refresh-1"))
        .await
        .unwrap();
    let (refresher, _) = refresher_for(&server, store.clone());

    let results = futures::future::join_all(
        (0..5).map(|_| refresher.refresh_if_stale(Some(stale.as_str()))),
    )
    .await;

    for result in results {
        assert_eq!(result.unwrap(), fresh);
    }
}

#[tokio::test]
async fn test_refresh_if_stale_refreshes_when_token_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEFAULT_REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "access-2"})))
        .expect(1)
        .mount(&server)
        .await;

    let current = jwt_expiring_in(300);
    let store = CredentialStore::in_memory();
    store
        .store_tokens(&TokenPair::new(current.clone(), "refresh-1"))
        .await
        .unwrap();
    let (refresher, _) = refresher_for(&server, store);

    // The backend rejected the token we sent even though it looks unexpired
    let token = refresher.refresh_if_stale(Some(&current)).await.unwrap();
    assert_eq!(token, "access-2");
}

//! Integration tests using mock HTTP server
//!
//! Tests the full session flow: config → login → authenticated requests →
//! refresh and replay → lost session

use chrono::Utc;
use eduportal_client::auth::{AuthEvent, DEFAULT_REFRESH_PATH};
use eduportal_client::{Collection, Error, Portal, PortalConfig, TokenPair};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCUMENTS: &str = "/api/education/documents/";

fn jwt_expiring_in(seconds: i64) -> String {
    let claims = json!({
        "token_type": "access",
        "exp": Utc::now().timestamp() + seconds,
        "user_id": 1,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"integration")).unwrap()
}

fn portal_for(server: &MockServer, dir: &Path) -> Portal {
    let yaml = format!(
        "base_url: {}\ntimeout_secs: 5\ncredentials_path: {}\n",
        server.uri(),
        dir.join("credentials.json").display()
    );
    let config = PortalConfig::from_yaml(&yaml).unwrap();
    Portal::from_config(&config).unwrap()
}

async fn seed_tokens(portal: &Portal, access: &str, refresh: &str) {
    portal
        .client()
        .credentials()
        .store_tokens(&TokenPair::new(access, refresh))
        .await
        .unwrap();
}

// ============================================================================
// Refresh Scenarios
// ============================================================================

#[tokio::test]
async fn test_expired_token_is_refreshed_before_fetching_documents() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let expired = jwt_expiring_in(-60);
    let fresh = jwt_expiring_in(300);

    Mock::given(method("POST"))
        .and(path(DEFAULT_REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": fresh})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DOCUMENTS))
        .and(header("Authorization", format!("Bearer {fresh}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "title": "cv"}])))
        .expect(1)
        .mount(&server)
        .await;

    let portal = portal_for(&server, dir.path());
    seed_tokens(&portal, &expired, "refresh-1").await;

    let documents = portal.education().list(Collection::Documents).await.unwrap();
    assert_eq!(documents[0]["title"], "cv");
    assert_eq!(
        portal.client().credentials().access_token().await.unwrap(),
        Some(fresh)
    );
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_and_request_replayed() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let revoked = jwt_expiring_in(300);
    let fresh = jwt_expiring_in(600);

    Mock::given(method("POST"))
        .and(path(DEFAULT_REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": fresh})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DOCUMENTS))
        .and(header("Authorization", format!("Bearer {revoked}").as_str()))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DOCUMENTS))
        .and(header("Authorization", format!("Bearer {fresh}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let portal = portal_for(&server, dir.path());
    seed_tokens(&portal, &revoked, "refresh-1").await;
    let mut events = portal.client().subscribe();

    let documents = portal.education().list(Collection::Documents).await.unwrap();
    assert_eq!(documents, json!([]));
    assert_eq!(events.recv().await.unwrap(), AuthEvent::TokenRefreshed);
}

#[tokio::test]
async fn test_no_tokens_requires_reauthentication() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path(DEFAULT_REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DOCUMENTS))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let portal = portal_for(&server, dir.path());
    let mut events = portal.client().subscribe();

    let err = portal.education().list(Collection::Documents).await.unwrap_err();
    assert!(err.requires_reauth());
    assert!(!portal.client().credentials().has_tokens().await.unwrap());
    assert!(matches!(
        events.recv().await.unwrap(),
        AuthEvent::Unauthenticated { .. }
    ));
}

#[tokio::test]
async fn test_refresh_rejection_clears_persisted_session() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path(DEFAULT_REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is blacklisted"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DOCUMENTS))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let portal = portal_for(&server, dir.path());
    seed_tokens(&portal, &jwt_expiring_in(300), "refresh-1").await;

    let err = portal.education().list(Collection::Documents).await.unwrap_err();
    assert!(matches!(err, Error::ReauthRequired { .. }));

    // A new process sees no session either
    let reopened = portal_for(&server, dir.path());
    assert!(!reopened.client().credentials().has_tokens().await.unwrap());
}

// ============================================================================
// Login Scenarios
// ============================================================================

#[tokio::test]
async fn test_wrong_password_never_refreshes() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path(DEFAULT_REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"detail": "No active account found with the given credentials"}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let portal = portal_for(&server, dir.path());
    let existing = jwt_expiring_in(300);
    seed_tokens(&portal, &existing, "refresh-1").await;

    let err = portal.auth().login("amir", "wrong").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(matches!(err, Error::InvalidCredentials { .. }));

    let credentials = portal.client().credentials();
    assert_eq!(credentials.access_token().await.unwrap(), Some(existing));
    assert_eq!(
        credentials.refresh_token().await.unwrap().as_deref(),
        Some("refresh-1")
    );
}

#[tokio::test]
async fn test_login_session_survives_restart() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let access = jwt_expiring_in(300);

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": 1, "username": "amir"},
            "tokens": {"access": access, "refresh": "refresh-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/profile/"))
        .and(header("Authorization", format!("Bearer {access}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    portal_for(&server, dir.path())
        .auth()
        .login("amir", "secret")
        .await
        .unwrap();

    let restarted = portal_for(&server, dir.path());
    assert_eq!(restarted.auth().profile().await.unwrap(), json!({"id": 1}));
    assert_eq!(
        restarted.client().credentials().user_info().await.unwrap(),
        Some(json!({"id": 1, "username": "amir"}))
    );
}

#[tokio::test]
async fn test_logout_clears_persisted_session() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let portal = portal_for(&server, dir.path());
    seed_tokens(&portal, &jwt_expiring_in(300), "refresh-1").await;

    portal.auth().logout().await.unwrap();

    let reopened = portal_for(&server, dir.path());
    assert!(reopened.client().credentials().access_token().await.unwrap().is_none());
}

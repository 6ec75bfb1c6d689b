//! Authenticated HTTP client
//!
//! Provides the client every portal API goes through. It handles:
//! - Attaching the stored access token as a bearer credential
//! - Refreshing an expired access token before sending (pre-flight)
//! - One refresh and one replay when the backend answers 401
//! - Error classification for callers

use super::request::ApiRequest;
use crate::auth::{
    token, AuthEndpointMatcher, AuthEvent, AuthEvents, CredentialStore, StorageAdapter,
    TokenRefresher, DEFAULT_REFRESH_PATH,
};
use crate::error::{truncate_body, Error, Result};
use crate::types::JsonValue;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout used by [`AuthenticatedHttpClient::check_connection`]
const CONNECTION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Path requested by [`AuthenticatedHttpClient::check_connection`]
const CONNECTION_CHECK_PATH: &str = "/api/auth/profile/";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: String,
    /// Request timeout; `None` disables the client-side timeout
    pub timeout: Option<Duration>,
    /// Endpoints that must never trigger a refresh
    pub auth_endpoints: AuthEndpointMatcher,
    /// Path of the token refresh endpoint
    pub refresh_path: String,
    /// Refresh an expired access token before sending
    pub preflight_refresh: bool,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: crate::config::LOCAL_FALLBACK_URL.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            auth_endpoints: AuthEndpointMatcher::default(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            preflight_refresh: true,
            default_headers: HashMap::new(),
            user_agent: format!("eduportal-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Disable the client-side timeout
    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    /// Set the authentication endpoint matcher
    pub fn auth_endpoints(mut self, matcher: AuthEndpointMatcher) -> Self {
        self.config.auth_endpoints = matcher;
        self
    }

    /// Set the refresh endpoint path
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.config.refresh_path = path.into();
        self
    }

    /// Enable or disable pre-flight refresh of expired tokens
    pub fn preflight_refresh(mut self, enabled: bool) -> Self {
        self.config.preflight_refresh = enabled;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client with bearer authentication and one-shot refresh
pub struct AuthenticatedHttpClient {
    client: Client,
    config: HttpClientConfig,
    credentials: CredentialStore,
    refresher: TokenRefresher,
    events: AuthEvents,
}

impl AuthenticatedHttpClient {
    /// Create a client over the given credential storage
    pub fn new(config: HttpClientConfig, storage: Arc<dyn StorageAdapter>) -> Result<Self> {
        url::Url::parse(&config.base_url)?;

        let client = Client::builder().user_agent(&config.user_agent).build()?;
        let credentials = CredentialStore::new(storage);
        let events = AuthEvents::new();
        let refresher = TokenRefresher::new(
            join_url(&config.base_url, &config.refresh_path),
            client.clone(),
            credentials.clone(),
            events.clone(),
        )
        .with_timeout(config.timeout);

        Ok(Self {
            client,
            config,
            credentials,
            refresher,
            events,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Stored credentials this client reads and updates
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Subscribe to session events (refresh, logout, re-authentication required)
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub(crate) fn events(&self) -> &AuthEvents {
        &self.events
    }

    /// Exchange the stored refresh token for a new access token
    pub async fn refresh(&self) -> Result<String> {
        self.refresher.refresh().await
    }

    /// Send a request, refreshing and replaying it once if the token is rejected
    pub async fn send(&self, request: ApiRequest) -> Result<Response> {
        let is_auth = self.config.auth_endpoints.is_auth_endpoint(&request.path);
        // Auth endpoints authenticate by their body; a stale bearer would be rejected
        let mut access = if is_auth {
            None
        } else {
            self.credentials.access_token().await?
        };
        let mut refreshed = false;

        if self.config.preflight_refresh && !is_auth {
            if let Some(stale) = access.clone().filter(|t| token::is_expired(t)) {
                debug!(path = %request.path, "Stored access token expired, refreshing before send");
                access = Some(self.refresh_or_reauth(Some(&stale)).await?);
                refreshed = true;
            }
        }

        let response = self.dispatch(&request, access.as_deref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED
            && !request.retried
            && !is_auth
            && !refreshed
        {
            warn!(
                method = %request.method,
                path = %request.path,
                "Request unauthorized, refreshing token and replaying"
            );
            let new_token = self.refresh_or_reauth(access.as_deref()).await?;
            let replay = request.into_replay();
            let response = self.dispatch(&replay, Some(&new_token)).await?;
            return self.classify(&replay, response, false).await;
        }

        self.classify(&request, response, is_auth).await
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        self.send(ApiRequest::get(path)).await
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    /// Make a PUT request with a JSON body
    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    /// Make a PATCH request with a JSON body
    pub async fn patch<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        self.send(ApiRequest::patch(path).json(body)?).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Send a request and parse the JSON response. An empty body parses as `null`.
    pub async fn request_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let timeout = request.timeout.or(self.config.timeout);
        let response = self.send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, timeout))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_value(JsonValue::Null)?);
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::invalid_response(format!("failed to decode response body: {e}")))
    }

    /// Make a GET request and parse the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_json(ApiRequest::get(path)).await
    }

    /// Whether the backend answers at all, regardless of status
    pub async fn check_connection(&self) -> bool {
        let access = self.credentials.access_token().await.ok().flatten();
        let request = ApiRequest::get(CONNECTION_CHECK_PATH).timeout(CONNECTION_CHECK_TIMEOUT);
        match self.dispatch(&request, access.as_deref()).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Connection check failed");
                false
            }
        }
    }

    /// Refresh, mapping any failure to a re-authentication signal
    async fn refresh_or_reauth(&self, stale: Option<&str>) -> Result<String> {
        self.refresher
            .refresh_if_stale(stale)
            .await
            .map_err(|e| Error::reauth(e.to_string()))
    }

    /// Dispatch one HTTP request without any auth recovery
    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response> {
        let url = self.build_url(&request.path);
        let mut req = self
            .client
            .request(reqwest::Method::from(request.method), &url);

        // Add default headers
        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        // Add request-specific headers
        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        if let Some(ref body) = request.body {
            req = req
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        let timeout = request.timeout.or(self.config.timeout);
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }

        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        debug!(
            method = %request.method,
            url = %url,
            authenticated = token.is_some(),
            retried = request.retried,
            "Sending request"
        );

        req.send().await.map_err(|e| transport_error(e, timeout))
    }

    /// Turn a response into the caller-facing result
    async fn classify(
        &self,
        request: &ApiRequest,
        response: Response,
        is_auth: bool,
    ) -> Result<Response> {
        let status = response.status();
        debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            "Response received"
        );

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited {
                retry_after_seconds: extract_retry_after(&response),
            });
        }

        let body = response.text().await.unwrap_or_default();

        if is_auth && matches!(status, StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST) {
            return Err(Error::InvalidCredentials {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        if status == StatusCode::BAD_REQUEST {
            let errors = serde_json::from_str(&body)
                .unwrap_or_else(|_| JsonValue::String(truncate_body(&body)));
            return Err(Error::Validation { errors });
        }

        Err(Error::http_status(status.as_u16(), body))
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        join_url(&self.config.base_url, path)
    }
}

impl std::fmt::Debug for AuthenticatedHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedHttpClient")
            .field("config", &self.config)
            .field("refresher", &self.refresher)
            .finish_non_exhaustive()
    }
}

/// Join a base URL and a path; absolute URLs pass through unchanged
pub(crate) fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

/// Map a transport failure, keeping timeouts distinct from other connectivity errors
fn transport_error(error: reqwest::Error, timeout: Option<Duration>) -> Error {
    if error.is_timeout() {
        Error::Timeout {
            timeout_ms: timeout.map_or(0, |t| t.as_millis() as u64),
        }
    } else {
        Error::Http(error)
    }
}

/// Extract retry-after header value
fn extract_retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}


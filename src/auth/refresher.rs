//! Token refresh
//!
//! Exchanges the stored refresh token for a new access token. Refreshes are
//! serialised behind a single lock so that concurrent requests which all see
//! a rejected token share one refresh call instead of racing.

use super::events::{AuthEvent, AuthEvents};
use super::store::CredentialStore;
use super::token;
use crate::error::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default path of the refresh endpoint, relative to the base URL
pub const DEFAULT_REFRESH_PATH: &str = "/api/auth/token/refresh/";

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// Refresh endpoint response; `refresh` is present when the backend rotates
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// Performs token refresh against the backend
pub struct TokenRefresher {
    /// Full URL of the refresh endpoint
    refresh_url: String,
    /// HTTP client for refresh requests (no auth attached)
    http_client: Client,
    /// Request timeout for the refresh call
    timeout: Option<Duration>,
    credentials: CredentialStore,
    events: AuthEvents,
    /// Held for the duration of a refresh
    in_flight: Mutex<()>,
}

impl TokenRefresher {
    pub fn new(
        refresh_url: impl Into<String>,
        http_client: Client,
        credentials: CredentialStore,
        events: AuthEvents,
    ) -> Self {
        Self {
            refresh_url: refresh_url.into(),
            http_client,
            timeout: None,
            credentials,
            events,
            in_flight: Mutex::new(()),
        }
    }

    /// Set a timeout for the refresh call
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn refresh_url(&self) -> &str {
        &self.refresh_url
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Fails without a network call when no refresh token is stored. Any
    /// failure clears every stored credential and publishes
    /// [`AuthEvent::Unauthenticated`].
    pub async fn refresh(&self) -> Result<String> {
        let _guard = self.in_flight.lock().await;
        self.refresh_locked().await
    }

    /// Refresh unless another task already replaced `stale` while we waited.
    ///
    /// `stale` is the access token the caller sent (or `None` if it sent
    /// none). If the store holds a different, unexpired token once the lock
    /// is acquired, that token is returned without a network call.
    pub async fn refresh_if_stale(&self, stale: Option<&str>) -> Result<String> {
        let _guard = self.in_flight.lock().await;

        // Double-check after acquiring the lock (another task might have refreshed)
        if let Some(current) = self.credentials.access_token().await? {
            if Some(current.as_str()) != stale && !token::is_expired(&current) {
                debug!("Access token already refreshed by a concurrent request");
                return Ok(current);
            }
        }

        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<String> {
        match self.exchange().await {
            Ok(access) => {
                info!("Access token refreshed");
                self.events.emit(AuthEvent::TokenRefreshed);
                Ok(access)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing stored credentials");
                if let Err(clear_err) = self.credentials.clear().await {
                    warn!(error = %clear_err, "Failed to clear stored credentials");
                }
                self.events.emit(AuthEvent::Unauthenticated {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn exchange(&self) -> Result<String> {
        let refresh_token = self
            .credentials
            .refresh_token()
            .await?
            .ok_or(Error::NoRefreshToken)?;

        let mut req = self
            .http_client
            .post(&self.refresh_url)
            .json(&RefreshRequest {
                refresh: &refresh_token,
            });
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::token_refresh(format!("refresh request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::token_refresh(format!(
                "refresh endpoint returned {status}: {}",
                crate::error::truncate_body(&body)
            )));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| Error::token_refresh(format!("malformed refresh response: {e}")))?;

        self.credentials.set_access_token(&body.access).await?;
        if let Some(rotated) = body.refresh.as_deref() {
            self.credentials.set_refresh_token(rotated).await?;
        }

        Ok(body.access)
    }
}

impl std::fmt::Debug for TokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("refresh_url", &self.refresh_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

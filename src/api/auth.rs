//! Account and session endpoints

use super::models::{LoginRequest, LoginResponse, RegisterResponse};
use crate::auth::AuthEvent;
use crate::error::{Error, Result};
use crate::http::{ApiRequest, AuthenticatedHttpClient};
use crate::types::JsonValue;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

const LOGIN_PATH: &str = "/api/auth/login/";
const REGISTER_PATH: &str = "/api/auth/register/";
const LOGOUT_PATH: &str = "/api/auth/logout/";
const PROFILE_PATH: &str = "/api/auth/profile/";

/// Account API: login, registration, profile and password management
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: Arc<AuthenticatedHttpClient>,
}

impl AuthApi {
    /// Create over a shared client
    pub fn new(client: Arc<AuthenticatedHttpClient>) -> Self {
        Self { client }
    }

    /// Log in and store the issued credentials.
    ///
    /// Wrong credentials surface as [`Error::InvalidCredentials`] and leave the
    /// stored tokens untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let request = ApiRequest::post(LOGIN_PATH).json(&LoginRequest { username, password })?;
        let body: JsonValue = self.client.request_json(request).await?;
        let response: LoginResponse = serde_json::from_value(body)
            .map_err(|e| Error::invalid_response(format!("malformed login response: {e}")))?;

        let credentials = self.client.credentials();
        credentials.store_tokens(&response.tokens).await?;
        credentials.set_user_info(&response.user).await?;
        self.client.events().emit(AuthEvent::LoggedIn);
        info!(username, "Logged in");

        Ok(response)
    }

    /// Register a new account, storing credentials when the backend issues them
    pub async fn register(&self, payload: &JsonValue) -> Result<RegisterResponse> {
        let request = ApiRequest::post(REGISTER_PATH).json(payload)?;
        let body: JsonValue = self.client.request_json(request).await?;
        let response: RegisterResponse = serde_json::from_value(body)
            .map_err(|e| Error::invalid_response(format!("malformed register response: {e}")))?;

        if let Some(tokens) = &response.tokens {
            let credentials = self.client.credentials();
            credentials.store_tokens(tokens).await?;
            if let Some(user) = &response.user {
                credentials.set_user_info(user).await?;
            }
            self.client.events().emit(AuthEvent::LoggedIn);
            info!("Registered and logged in");
        }

        Ok(response)
    }

    /// Log out. The server call is best-effort; local credentials are always cleared.
    pub async fn logout(&self) -> Result<()> {
        let credentials = self.client.credentials();

        let refresh = credentials.refresh_token().await.unwrap_or_else(|e| {
            warn!(error = %e, "Stored credentials unreadable, skipping server-side logout");
            None
        });
        if let Some(refresh) = refresh {
            let request = ApiRequest::post(LOGOUT_PATH).json(&json!({ "refresh": refresh }))?;
            if let Err(e) = self.client.send(request).await {
                warn!(error = %e, "Server-side logout failed, clearing local session anyway");
            }
        }

        credentials.clear().await?;
        self.client.events().emit(AuthEvent::LoggedOut);
        info!("Logged out");
        Ok(())
    }

    /// Current user profile
    pub async fn profile(&self) -> Result<JsonValue> {
        self.client.get_json(PROFILE_PATH).await
    }

    /// Partially update the profile
    pub async fn update_profile(&self, changes: &JsonValue) -> Result<JsonValue> {
        self.patch("/api/auth/profile/update/", changes).await
    }

    /// Update the profile together with its extended fields
    pub async fn update_profile_complete(&self, changes: &JsonValue) -> Result<JsonValue> {
        self.patch("/api/auth/profile/update-complete/", changes).await
    }

    /// Change the password of the logged-in user
    pub async fn change_password(&self, payload: &JsonValue) -> Result<JsonValue> {
        self.post("/api/auth/change-password/", Some(payload)).await
    }

    /// Send a password-reset email
    pub async fn request_password_reset(&self, email: &str) -> Result<JsonValue> {
        self.post("/api/auth/password-reset/", Some(&json!({ "email": email })))
            .await
    }

    /// Complete a password reset
    pub async fn verify_password_reset(&self, payload: &JsonValue) -> Result<JsonValue> {
        self.post("/api/auth/password-reset/verify/", Some(payload))
            .await
    }

    /// Ask for a new email verification message
    pub async fn request_email_verification(&self) -> Result<JsonValue> {
        self.post("/api/email/verify/request/", None).await
    }

    /// Confirm an email address
    pub async fn verify_email(&self, token: &str) -> Result<JsonValue> {
        self.client
            .request_json(ApiRequest::get("/api/email/verify/").query("token", token))
            .await
    }

    async fn post(&self, path: &str, body: Option<&JsonValue>) -> Result<JsonValue> {
        let mut request = ApiRequest::post(path);
        if let Some(body) = body {
            request = request.json(body)?;
        }
        self.client.request_json(request).await
    }

    async fn patch(&self, path: &str, body: &JsonValue) -> Result<JsonValue> {
        self.client
            .request_json(ApiRequest::patch(path).json(body)?)
            .await
    }
}

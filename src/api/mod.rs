//! Portal domain clients
//!
//! Thin wrappers over one shared [`AuthenticatedHttpClient`], so every
//! endpoint gets the same token handling, refresh and error classification.
//!
//! ```rust,ignore
//! use eduportal_client::{Portal, PortalConfig};
//!
//! let portal = Portal::from_config(&PortalConfig::discover(None)?)?;
//! portal.auth().login("amir", "secret").await?;
//! let documents = portal.education().list(Collection::Documents).await?;
//! ```

mod auth;
mod education;
mod models;
mod notifications;
mod payments;

pub use auth::AuthApi;
pub use education::EducationApi;
pub use models::{Collection, LoginRequest, LoginResponse, RegisterResponse};
pub use notifications::NotificationsApi;
pub use payments::PaymentsApi;

use crate::auth::FileStorage;
use crate::config::PortalConfig;
use crate::error::Result;
use crate::http::AuthenticatedHttpClient;
use std::sync::Arc;

/// All domain clients over one authenticated client
#[derive(Debug, Clone)]
pub struct Portal {
    client: Arc<AuthenticatedHttpClient>,
    auth: AuthApi,
    education: EducationApi,
    notifications: NotificationsApi,
    payments: PaymentsApi,
}

impl Portal {
    /// Build every domain client over `client`
    pub fn new(client: AuthenticatedHttpClient) -> Self {
        let client = Arc::new(client);
        Self {
            auth: AuthApi::new(Arc::clone(&client)),
            education: EducationApi::new(Arc::clone(&client)),
            notifications: NotificationsApi::new(Arc::clone(&client)),
            payments: PaymentsApi::new(Arc::clone(&client)),
            client,
        }
    }

    /// Build from configuration, persisting credentials to the configured file
    pub fn from_config(config: &PortalConfig) -> Result<Self> {
        let storage = Arc::new(FileStorage::new(config.credentials_path()?));
        let client = AuthenticatedHttpClient::new(config.http_config()?, storage)?;
        Ok(Self::new(client))
    }

    /// The shared HTTP client
    pub fn client(&self) -> &Arc<AuthenticatedHttpClient> {
        &self.client
    }

    /// Account and session endpoints
    pub fn auth(&self) -> &AuthApi {
        &self.auth
    }

    /// Education endpoints
    pub fn education(&self) -> &EducationApi {
        &self.education
    }

    /// Notification endpoints
    pub fn notifications(&self) -> &NotificationsApi {
        &self.notifications
    }

    /// Payment endpoints
    pub fn payments(&self) -> &PaymentsApi {
        &self.payments
    }
}

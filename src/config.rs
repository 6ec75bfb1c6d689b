//! Client configuration
//!
//! Configuration is read from an optional YAML file, then overridden by the
//! environment. Every field has a default, so an empty file (or no file) is a
//! working local-development setup.
//!
//! ```yaml
//! base_url: https://portal.example.com
//! timeout_secs: 10
//! preflight_refresh: true
//! auth_endpoints: ["/login/", "/register/", "/password-reset/", "/token/refresh/"]
//! refresh_path: /api/auth/token/refresh/
//! credentials_path: /home/me/.config/eduportal/credentials.json
//! ```

use crate::auth::{AuthEndpointMatcher, DEFAULT_AUTH_ENDPOINTS, DEFAULT_REFRESH_PATH};
use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application name used for config directory paths
pub const APP_NAME: &str = "eduportal";

/// Environment variable overriding the backend base URL
pub const BASE_URL_ENV: &str = "EDUPORTAL_API_URL";

/// Backend used when nothing more specific applies
pub const LOCAL_FALLBACK_URL: &str = "http://localhost:8000";

/// Hosted production backend
pub const PRODUCTION_URL: &str = "https://backend-production-0046c.up.railway.app";

/// Port the backend listens on during local development
const LOCAL_BACKEND_PORT: u16 = 8000;

/// Portal client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Explicit backend base URL
    pub base_url: Option<String>,

    /// Host the application is served from, used when no base URL is set
    pub served_host: Option<String>,

    /// Request timeout in seconds; 0 disables the client-side timeout
    pub timeout_secs: u64,

    /// Refresh an expired access token before sending
    pub preflight_refresh: bool,

    /// Path fragments of endpoints that must never trigger a refresh
    pub auth_endpoints: Vec<String>,

    /// Path of the token refresh endpoint
    pub refresh_path: String,

    /// Where credentials are persisted
    pub credentials_path: Option<PathBuf>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            served_host: None,
            timeout_secs: 10,
            preflight_refresh: true,
            auth_endpoints: DEFAULT_AUTH_ENDPOINTS.iter().map(|s| (*s).to_string()).collect(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            credentials_path: None,
        }
    }
}

impl PortalConfig {
    /// Parse configuration from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config(format!("Config file '{}' not found", path.display()))
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;
        Self::from_yaml(&content)
    }

    /// Load from `path` if given, else the default location if it exists, then apply env
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::load(default)?,
                _ => Self::default(),
            },
        };
        config.apply_env(std::env::var(BASE_URL_ENV).ok());
        Ok(config)
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.yaml"))
    }

    /// Apply the base-URL environment override; blank values are ignored
    pub fn apply_env(&mut self, base_url: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = Some(url);
        }
    }

    /// Resolved backend base URL
    pub fn resolved_base_url(&self) -> Result<String> {
        let url = resolve_base_url(self.base_url.as_deref(), self.served_host.as_deref());
        url::Url::parse(&url)
            .map_err(|e| Error::invalid_value("base_url", format!("'{url}': {e}")))?;
        Ok(url)
    }

    /// Request timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Credentials file location
    pub fn credentials_path(&self) -> Result<PathBuf> {
        match &self.credentials_path {
            Some(path) => Ok(path.clone()),
            None => crate::auth::FileStorage::default_path(),
        }
    }

    /// Build the HTTP client configuration
    pub fn http_config(&self) -> Result<HttpClientConfig> {
        if self.refresh_path.trim().is_empty() {
            return Err(Error::missing_field("refresh_path"));
        }

        let mut builder = HttpClientConfig::builder()
            .base_url(self.resolved_base_url()?)
            .refresh_path(self.refresh_path.clone())
            .preflight_refresh(self.preflight_refresh)
            .auth_endpoints(AuthEndpointMatcher::new(self.auth_endpoints.iter().cloned())?);
        builder = match self.timeout() {
            Some(timeout) => builder.timeout(timeout),
            None => builder.no_timeout(),
        };
        Ok(builder.build())
    }
}

/// Resolve the backend base URL.
///
/// A non-blank override always wins. Otherwise the host the application is
/// served from decides: local and private-network hosts talk to a backend on
/// the same host, the hosted deployment talks to the production backend, and
/// anything else falls back to localhost.
pub fn resolve_base_url(override_url: Option<&str>, served_host: Option<&str>) -> String {
    if let Some(url) = override_url.map(str::trim).filter(|u| !u.is_empty()) {
        return url.trim_end_matches('/').to_string();
    }

    match served_host.map(str::trim) {
        Some(host) if is_local_host(host) => format!("http://{host}:{LOCAL_BACKEND_PORT}"),
        Some(host) if host.ends_with("railway.app") => PRODUCTION_URL.to_string(),
        _ => LOCAL_FALLBACK_URL.to_string(),
    }
}

fn is_local_host(host: &str) -> bool {
    host == "localhost"
        || host == "127.0.0.1"
        || host.starts_with("10.")
        || host.starts_with("172.")
        || host.starts_with("192.168.")
}

//! Error types for the portal client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::types::JsonValue;
use thiserror::Error;

/// The main error type for the portal client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Invalid credentials (HTTP {status}): {body}")]
    InvalidCredentials { status: u16, body: String },

    #[error("Re-authentication required: {reason}")]
    ReauthRequired { reason: String },

    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Malformed token: {message}")]
    MalformedToken { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Validation failed: {errors}")]
    Validation { errors: JsonValue },

    #[error("Rate limited{}", .retry_after_seconds.map(|s| format!(", retry after {s}s")).unwrap_or_default())]
    RateLimited { retry_after_seconds: Option<u64> },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Credential storage error: {message}")]
    Storage { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

/// Maximum length for response bodies carried in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a token refresh error
    pub fn token_refresh(message: impl Into<String>) -> Self {
        Self::TokenRefresh {
            message: message.into(),
        }
    }

    /// Create a re-authentication error
    pub fn reauth(reason: impl Into<String>) -> Self {
        Self::ReauthRequired {
            reason: reason.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: truncate_body(&body.into()),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// True when the request never produced an HTTP response
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Timeout { .. })
    }

    /// True when the caller must log in again
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Error::ReauthRequired { .. })
    }

    /// HTTP status associated with this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::InvalidCredentials { status, .. } | Error::HttpStatus { status, .. } => {
                Some(*status)
            }
            Error::Validation { .. } => Some(400),
            Error::RateLimited { .. } => Some(429),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Human-readable message for display to an end user
    pub fn user_message(&self) -> String {
        match self {
            Error::Http(_) | Error::Timeout { .. } => {
                "Connection error. Check your internet connection".to_string()
            }
            Error::InvalidCredentials { .. } => "Invalid username or password".to_string(),
            Error::ReauthRequired { .. } | Error::NoRefreshToken => {
                "Your session has expired. Please log in again".to_string()
            }
            Error::Validation { errors } => {
                detail_of(errors).unwrap_or_else(|| "Invalid data".to_string())
            }
            Error::RateLimited { .. } => "Too many requests. Try again later".to_string(),
            Error::HttpStatus { status, body } => match status {
                401 => "Authorization required".to_string(),
                403 => "Access denied".to_string(),
                404 => "Resource not found".to_string(),
                500 => "Server error. Try again later".to_string(),
                _ => serde_json::from_str::<JsonValue>(body)
                    .ok()
                    .and_then(|v| detail_of(&v))
                    .unwrap_or_else(|| format!("Error {status}")),
            },
            other => other.to_string(),
        }
    }
}

/// Pull the `detail` or `error` message out of a backend error payload
fn detail_of(value: &JsonValue) -> Option<String> {
    value
        .get("detail")
        .or_else(|| value.get("error"))
        .and_then(JsonValue::as_str)
        .map(String::from)
}

/// Truncate a response body to avoid carrying excessive data
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

/// Result type alias for the portal client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

//! HTTP client module
//!
//! Provides the authenticated HTTP client shared by every portal API.
//!
//! # Features
//!
//! - **Bearer Authentication**: Stored access token attached to each request
//! - **Pre-flight Refresh**: Expired tokens refreshed before sending
//! - **One-shot Recovery**: A 401 triggers at most one refresh and one replay
//! - **Error Classification**: Connectivity, credentials, validation and status errors

mod client;
mod request;

pub use client::{AuthenticatedHttpClient, HttpClientConfig, HttpClientConfigBuilder, DEFAULT_TIMEOUT};
pub use request::ApiRequest;

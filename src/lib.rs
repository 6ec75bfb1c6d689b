// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Education Portal Client
//!
//! Authenticated HTTP client for the education portal backend.
//!
//! ## Features
//!
//! - **Bearer Authentication**: Stored access token attached to every request
//! - **One-shot Refresh**: A rejected token is refreshed once and the request replayed once
//! - **Shared Refresh**: Concurrent failures wait on a single refresh call
//! - **Session Events**: Login, refresh, logout and lost-session notifications
//! - **Domain Clients**: Auth, education, notifications and payments endpoints
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use eduportal_client::{Collection, Portal, PortalConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let portal = Portal::from_config(&PortalConfig::discover(None)?)?;
//!
//!     portal.auth().login("amir", "secret").await?;
//!     let documents = portal.education().list(Collection::Documents).await?;
//!     println!("{documents}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                         Portal                             │
//! │   AuthApi   EducationApi   NotificationsApi   PaymentsApi  │
//! └─────────────────────────────┬──────────────────────────────┘
//!                               │
//! ┌─────────────────────────────┴──────────────────────────────┐
//! │                  AuthenticatedHttpClient                   │
//! │  attach bearer → send → 401? → refresh once → replay once  │
//! └──────────────┬─────────────────────────────┬───────────────┘
//!                │                             │
//! ┌──────────────┴──────────────┐ ┌────────────┴───────────────┐
//! │       CredentialStore       │ │       TokenRefresher       │
//! │  accessToken refreshToken   │ │  in-flight guard, events   │
//! │  userInfo (memory / file)   │ │                            │
//! └─────────────────────────────┘ └────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the portal client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Configuration and base URL resolution
pub mod config;

/// Credentials, token inspection and refresh
pub mod auth;

/// Authenticated HTTP client
pub mod http;

/// Portal domain clients
pub mod api;

/// Command-line interface
pub mod cli;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use api::{Collection, Portal};
pub use auth::{AuthEvent, CredentialStore, FileStorage, MemoryStorage, StorageAdapter};
pub use config::PortalConfig;
pub use http::{ApiRequest, AuthenticatedHttpClient, HttpClientConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

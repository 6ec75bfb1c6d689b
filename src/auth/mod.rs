//! Authentication module
//!
//! Credential storage, local token inspection and the refresh operation.
//!
//! The `TokenRefresher` owns the refresh flow and its in-flight guard; the
//! HTTP client decides *when* to refresh, this module decides *how*.

mod endpoints;
mod events;
mod refresher;
mod store;
pub mod token;

pub use endpoints::{AuthEndpointMatcher, DEFAULT_AUTH_ENDPOINTS};
pub use events::{AuthEvent, AuthEvents};
pub use refresher::{TokenRefresher, DEFAULT_REFRESH_PATH};
pub use store::{
    CredentialStore, FileStorage, MemoryStorage, StorageAdapter, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY, USER_INFO_KEY,
};

#[cfg(test)]
mod tests;

//! Authentication endpoint detection
//!
//! Calls to login, registration, password reset and token refresh must fail
//! fast on 401 instead of triggering a refresh.

use crate::error::{Error, Result};
use regex::RegexSet;
use std::sync::LazyLock;

/// Path fragments identifying authentication endpoints
pub const DEFAULT_AUTH_ENDPOINTS: &[&str] = &[
    "/login/",
    "/register/",
    "/password-reset/",
    "/token/refresh/",
];

/// Matches request paths against a set of authentication endpoint fragments
#[derive(Debug, Clone)]
pub struct AuthEndpointMatcher {
    fragments: Vec<String>,
    set: RegexSet,
}

impl AuthEndpointMatcher {
    /// Build a matcher from literal path fragments
    pub fn new<I, S>(fragments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fragments: Vec<String> = fragments.into_iter().map(Into::into).collect();
        let patterns = fragments.iter().map(|f| regex::escape(f));
        let set = RegexSet::new(patterns)
            .map_err(|e| Error::invalid_value("auth_endpoints", e.to_string()))?;
        Ok(Self { fragments, set })
    }

    /// Fragments this matcher was built from
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Check whether a request path or URL targets an authentication endpoint.
    ///
    /// Only the path is considered; query strings are ignored.
    pub fn is_auth_endpoint(&self, path_or_url: &str) -> bool {
        let path = match url::Url::parse(path_or_url) {
            Ok(url) => url.path().to_string(),
            Err(_) => path_or_url
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string(),
        };
        self.set.is_match(&path)
    }
}

// Escaped literals always compile
static DEFAULT_MATCHER: LazyLock<AuthEndpointMatcher> = LazyLock::new(|| {
    AuthEndpointMatcher::new(DEFAULT_AUTH_ENDPOINTS.iter().copied()).unwrap_or_else(|_| {
        AuthEndpointMatcher {
            fragments: Vec::new(),
            set: RegexSet::empty(),
        }
    })
});

impl Default for AuthEndpointMatcher {
    fn default() -> Self {
        DEFAULT_MATCHER.clone()
    }
}

//! Request and response shapes shared by the domain clients

use crate::types::{JsonValue, TokenPair};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    /// Account username
    pub username: &'a str,
    /// Account password
    pub password: &'a str,
}

/// Successful login response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    /// Profile of the authenticated user
    pub user: JsonValue,
    /// Issued credentials
    pub tokens: TokenPair,
}

/// Registration response; tokens are issued only by some deployments
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegisterResponse {
    /// Confirmation message
    #[serde(default)]
    pub message: Option<String>,
    /// Profile of the created user
    #[serde(default)]
    pub user: Option<JsonValue>,
    /// Issued credentials
    #[serde(default)]
    pub tokens: Option<TokenPair>,
}

/// Per-user record collections supporting list/create/update/delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Course enrollments
    Enrollments,
    /// University applications
    Applications,
    /// Study plans
    StudyPlans,
    /// Uploaded documents
    Documents,
}

impl Collection {
    /// Every collection, in display order
    pub const ALL: [Collection; 4] = [
        Collection::Enrollments,
        Collection::Applications,
        Collection::StudyPlans,
        Collection::Documents,
    ];

    /// URL segment under the education API
    pub fn segment(self) -> &'static str {
        match self {
            Collection::Enrollments => "enrollments",
            Collection::Applications => "applications",
            Collection::StudyPlans => "study-plans",
            Collection::Documents => "documents",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_response_shape() {
        let response: LoginResponse = serde_json::from_value(json!({
            "user": {"id": 7, "username": "amir"},
            "tokens": {"access": "a", "refresh": "r"}
        }))
        .unwrap();
        assert_eq!(response.tokens, TokenPair::new("a", "r"));
        assert_eq!(response.user["id"], 7);
    }

    #[test]
    fn test_login_response_requires_tokens() {
        let result: Result<LoginResponse, _> =
            serde_json::from_value(json!({"user": {"id": 7}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_register_response_without_tokens() {
        let response: RegisterResponse =
            serde_json::from_value(json!({"message": "check your email"})).unwrap();
        assert!(response.tokens.is_none());
        assert!(response.user.is_none());
    }

    #[test]
    fn test_collection_segments() {
        assert_eq!(Collection::StudyPlans.to_string(), "study-plans");
        assert_eq!(Collection::ALL.len(), 4);
    }
}

//! Access token inspection
//!
//! Access tokens are JWTs. Their claims are decoded locally from the payload
//! segment so expiry can be checked without a network call. Signatures are
//! not verified; the backend remains the authority on token validity.

use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// Claims the client cares about
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    /// Expiration as seconds since the Unix epoch
    #[serde(default)]
    pub exp: Option<i64>,
    /// Issued-at as seconds since the Unix epoch
    #[serde(default)]
    pub iat: Option<i64>,
    /// User id (simplejwt `user_id` claim)
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    /// Token type (`access` or `refresh`)
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Decode the claims of a JWT without verifying its signature
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            return Err(Error::MalformedToken {
                message: "expected three dot-separated segments".to_string(),
            })
        }
    };

    // Tolerate padded encoders
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::MalformedToken {
            message: format!("payload is not base64url: {e}"),
        })?;

    serde_json::from_slice(&bytes).map_err(|e| Error::MalformedToken {
        message: format!("payload is not a JSON claims object: {e}"),
    })
}

/// Expiration instant embedded in the token, if it has one
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    decode_claims(token)
        .ok()
        .and_then(|claims| claims.exp)
        .and_then(|exp| Utc.timestamp_opt(exp, 0).single())
}

/// Check expiry against a given instant.
///
/// A token whose `exp` is at or before `now` is expired. Tokens that cannot
/// be decoded are treated as expired; tokens without an `exp` claim never
/// expire.
pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    match decode_claims(token) {
        Ok(TokenClaims { exp: Some(exp), .. }) => exp <= now.timestamp(),
        Ok(_) => false,
        Err(_) => true,
    }
}

/// Check expiry against the current time
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::Duration;
    use serde_json::json;

    fn unsigned(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.sig")
    }

    #[test]
    fn test_decode_claims() {
        let token = unsigned(&json!({"exp": 1_700_000_000, "user_id": 7, "token_type": "access"}));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.exp, Some(1_700_000_000));
        assert_eq!(claims.token_type.as_deref(), Some("access"));
        assert_eq!(claims.user_id, Some(json!(7)));
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let at_now = unsigned(&json!({"exp": now.timestamp()}));
        let past = unsigned(&json!({"exp": (now - Duration::seconds(1)).timestamp()}));
        let future = unsigned(&json!({"exp": (now + Duration::seconds(1)).timestamp()}));

        assert!(is_expired_at(&at_now, now));
        assert!(is_expired_at(&past, now));
        assert!(!is_expired_at(&future, now));
    }

    #[test]
    fn test_fresh_token_not_expired() {
        let token = unsigned(&json!({"exp": (Utc::now() + Duration::minutes(5)).timestamp()}));
        assert!(!is_expired(&token));
        assert!(expires_at(&token).is_some());
    }

    #[test]
    fn test_no_exp_never_expires() {
        let token = unsigned(&json!({"user_id": 1}));
        assert!(!is_expired(&token));
        assert!(expires_at(&token).is_none());
    }

    #[test]
    fn test_malformed_tokens_are_expired() {
        assert!(is_expired("not-a-jwt"));
        assert!(is_expired("a.b"));
        assert!(is_expired("a.!!!.c"));
        assert!(is_expired(&format!(
            "h.{}.s",
            URL_SAFE_NO_PAD.encode("not json")
        )));
        assert!(matches!(
            decode_claims("a.b.c.d"),
            Err(Error::MalformedToken { .. })
        ));
    }
}

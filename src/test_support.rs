//! Helpers shared by unit tests

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

const TEST_SECRET: &[u8] = b"test-signing-secret";

/// Mint an HS256 access token whose `exp` is `seconds` from now (negative = past)
pub fn jwt_expiring_in(seconds: i64) -> String {
    let exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
    let claims = json!({"token_type": "access", "exp": exp, "user_id": 1});
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .expect("test token encodes")
}

//! Session token verification
//!
//! Tokens are issued by the auth provider and signed with a shared HS256
//! secret. This side only ever verifies them.

use anyhow::Result;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Verifies session tokens with a pre-computed key
///
/// Keys are wrapped in Arc for cheap cloning into request handlers.
#[derive(Clone)]
pub struct SessionVerifier {
    decoding: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl SessionVerifier {
    /// Create a verifier; an empty `audience` skips the `aud` check
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&[audience]);
        }

        Self {
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(validation),
        }
    }

    /// Validate a token and return claims
    #[inline]
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| anyhow::anyhow!("Invalid token: {}", e))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    const SECRET: &str = "test-secret";

    fn sign(sub: &str, aud: Option<&str>, expires_in: Duration) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: (Utc::now() + expires_in).timestamp(),
            email: None,
            aud: aud.map(str::to_string),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_accepted() {
        let verifier = SessionVerifier::new(SECRET, "authenticated");
        let user_id = Uuid::new_v4().to_string();

        let token = sign(&user_id, Some("authenticated"), Duration::hours(1));
        let claims = verifier.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let verifier = SessionVerifier::new(SECRET, "authenticated");
        let token = sign("someone", Some("anon"), Duration::hours(1));
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_audience_check_can_be_disabled() {
        let verifier = SessionVerifier::new(SECRET, "");
        let token = sign("someone", Some("anything"), Duration::hours(1));
        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = SessionVerifier::new(SECRET, "");
        let token = sign("someone", None, Duration::hours(-2));
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_invalid_token_rejected() {
        let verifier = SessionVerifier::new(SECRET, "");
        assert!(verifier.verify("invalid.token.here").is_err());

        let other = SessionVerifier::new("another-secret", "");
        let token = sign("someone", None, Duration::hours(1));
        assert!(other.verify(&token).is_err());
    }
}

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::AuthConfig;
use crate::error::{CourseHubError, Result};

/// JWT Claims structure
///
/// Only the subject is carried; role and profile data are always re-read from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (as UTC timestamp)
    pub iat: u64,
    /// Expiration time (as UTC timestamp)
    pub exp: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl Claims {
    /// Creates claims for a subject expiring `ttl` from now
    pub fn new(subject_id: impl Into<String>, ttl: Duration) -> Self {
        let now = unix_now();
        Self {
            sub: subject_id.into(),
            iat: now,
            exp: now.saturating_add(ttl.as_secs()),
        }
    }

    /// Expiry is strict: a token is dead at the second it expires
    pub fn is_expired(&self) -> bool {
        unix_now() >= self.exp
    }
}

/// Outcome of verifying a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Signature and expiry check out; carries the subject id
    Valid(String),
    Invalid,
}

impl Verification {
    pub fn subject(self) -> Option<String> {
        match self {
            Verification::Valid(sub) => Some(sub),
            Verification::Invalid => None,
        }
    }
}

/// Issues and verifies signed access tokens
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenCodec {
    /// Creates a codec from the startup auth configuration
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            default_ttl: config.token_ttl,
        }
    }

    /// Lifetime applied by `issue_default`
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Signs a token for `subject_id` expiring `ttl` from now
    pub fn issue(&self, subject_id: &str, ttl: Duration) -> Result<String> {
        let claims = Claims::new(subject_id, ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| CourseHubError::TokenError(format!("Failed to generate token: {}", e)))
    }

    /// Signs a token with the configured lifetime
    pub fn issue_default(&self, subject_id: &str) -> Result<String> {
        self.issue(subject_id, self.default_ttl)
    }

    /// Validates a token and returns its subject.
    ///
    /// Bad signatures, malformed payloads, empty subjects and expired tokens are all `Invalid`.
    pub fn verify(&self, token: &str) -> Verification {
        let claims = match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                log::debug!("Token rejected: {}", e);
                return Verification::Invalid;
            }
        };

        // jsonwebtoken accepts exp == now; we do not
        if claims.is_expired() {
            log::debug!("Token rejected: expired");
            return Verification::Invalid;
        }

        if claims.sub.is_empty() {
            log::debug!("Token rejected: empty subject");
            return Verification::Invalid;
        }

        Verification::Valid(claims.sub)
    }
}

/// Extracts bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<String> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(&AuthConfig::with_secret(secret))
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = codec("unit-test-signing-key-0123456789abcdef");
        let token = codec.issue_default("user-123").unwrap();
        assert_eq!(codec.verify(&token), Verification::Valid("user-123".to_string()));
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        let codec = codec("unit-test-signing-key-0123456789abcdef");
        let token = codec.issue("user-123", Duration::ZERO).unwrap();
        assert_eq!(codec.verify(&token), Verification::Invalid);
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let codec = codec("unit-test-signing-key-0123456789abcdef");
        let token = codec.issue_default("user-123").unwrap();

        // Flip one byte in every position; none may survive verification
        for idx in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            if tampered == token {
                continue;
            }
            assert_eq!(
                codec.verify(&tampered),
                Verification::Invalid,
                "tampered byte {} accepted",
                idx
            );
        }
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let issuer = codec("unit-test-signing-key-0123456789abcdef");
        let verifier = codec("another-signing-key-fedcba9876543210");
        let token = issuer.issue_default("user-123").unwrap();
        assert_eq!(verifier.verify(&token), Verification::Invalid);
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        let codec = codec("unit-test-signing-key-0123456789abcdef");
        assert_eq!(codec.verify(""), Verification::Invalid);
        assert_eq!(codec.verify("invalid.token.here"), Verification::Invalid);
        assert_eq!(codec.verify("not-a-jwt"), Verification::Invalid);
    }

    #[test]
    fn test_expired_claims() {
        let mut claims = Claims::new("user-123", Duration::from_secs(3600));
        assert!(!claims.is_expired());
        claims.exp = claims.iat - 1;
        assert!(claims.is_expired());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def".to_string()));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer_token("abc.def"), None);
    }
}

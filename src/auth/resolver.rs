//! Request credential to identity resolution.
//!
//! Resolution never fails loudly: anything other than a verified token naming an
//! existing user yields "no identity".

use std::sync::Arc;

use super::token::{extract_bearer_token, TokenCodec, Verification};
use super::user::Identity;
use crate::security_logger::{log_security_event, SecurityEvent};
use crate::storage::traits::CredentialStore;

/// Pick the raw credential out of a request.
///
/// The `auth_token` cookie wins over an `Authorization: Bearer` header; blank values count as absent.
pub fn extract_credential(cookie: Option<&str>, authorization: Option<&str>) -> Option<String> {
    let from_cookie = cookie
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    from_cookie.or_else(|| authorization.and_then(extract_bearer_token))
}

/// Turns raw credentials into fresh identity snapshots
#[derive(Clone)]
pub struct IdentityResolver {
    codec: Arc<TokenCodec>,
    store: Arc<dyn CredentialStore>,
}

impl IdentityResolver {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn CredentialStore>) -> Self {
        Self { codec, store }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Resolve a raw credential to the identity it names, if any
    pub async fn resolve(&self, raw: Option<&str>) -> Option<Identity> {
        let token = raw?;

        let subject = match self.codec.verify(token) {
            Verification::Valid(subject) => subject,
            Verification::Invalid => {
                log_security_event(SecurityEvent::TokenValidationFailed {
                    reason: "signature, payload or expiry check failed".to_string(),
                });
                return None;
            }
        };

        match self.store.find_identity(&subject).await {
            Ok(Some(identity)) => Some(identity),
            Ok(None) => {
                log::debug!("Token subject {} no longer exists", subject);
                None
            }
            Err(e) => {
                log::warn!("Identity lookup failed for {}: {}", subject, e);
                None
            }
        }
    }

    /// Resolve straight from the request's cookie and `Authorization` header
    pub async fn resolve_request(
        &self,
        cookie: Option<&str>,
        authorization: Option<&str>,
    ) -> Option<Identity> {
        let credential = extract_credential(cookie, authorization);
        self.resolve(credential.as_deref()).await
    }
}

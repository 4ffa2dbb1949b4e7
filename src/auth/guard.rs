//! Warp filters that attach the caller's identity to a route.
//!
//! Place these after the path and method filters so credentials are only
//! resolved for the route that actually matched.

use std::convert::Infallible;
use warp::{Filter, Rejection};

use super::resolver::IdentityResolver;
use super::user::{Identity, UserRole};
use crate::constants::AUTH_COOKIE_NAME;
use crate::error::CourseHubError;
use crate::security_logger::{log_security_event, SecurityEvent};

fn with_resolver(
    resolver: IdentityResolver,
) -> impl Filter<Extract = (IdentityResolver,), Error = Infallible> + Clone {
    warp::any().map(move || resolver.clone())
}

/// Resolve the caller if they presented valid credentials; never rejects on bad ones
pub fn optional_identity(
    resolver: IdentityResolver,
) -> impl Filter<Extract = (Option<Identity>,), Error = Rejection> + Clone {
    warp::cookie::optional::<String>(AUTH_COOKIE_NAME)
        .and(warp::header::optional::<String>("authorization"))
        .and(with_resolver(resolver))
        .then(
            |cookie: Option<String>, authorization: Option<String>, resolver: IdentityResolver| async move {
                resolver
                    .resolve_request(cookie.as_deref(), authorization.as_deref())
                    .await
            },
        )
}

/// Require a resolved identity, rejecting with 401 otherwise
pub fn require_identity(
    resolver: IdentityResolver,
) -> impl Filter<Extract = (Identity,), Error = Rejection> + Clone {
    optional_identity(resolver).and_then(|identity: Option<Identity>| async move {
        identity.ok_or_else(|| warp::reject::custom(CourseHubError::AuthenticationRequired))
    })
}

/// Require an identity holding one of `roles`, rejecting with 401/403 otherwise
pub fn require_role(
    resolver: IdentityResolver,
    roles: &'static [UserRole],
) -> impl Filter<Extract = (Identity,), Error = Rejection> + Clone {
    require_identity(resolver).and_then(move |identity: Identity| async move {
        if identity.has_role(roles) {
            return Ok(identity);
        }

        log_security_event(SecurityEvent::PermissionDenied {
            user_id: identity.id.clone(),
            action: format!("route requiring {:?}", roles),
            resource: None,
        });

        let message = if roles == [UserRole::Admin] {
            "Admin access required"
        } else {
            "Teacher or admin access required"
        };
        Err(warp::reject::custom(CourseHubError::forbidden(message)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenCodec;
    use crate::config::AuthConfig;
    use crate::storage::Database;
    use std::sync::Arc;

    async fn setup() -> (IdentityResolver, String, String) {
        let db = Database::connect(":memory:").await.unwrap();
        let teacher = db.users().create("t@x.com", "h", "T", UserRole::Teacher).await.unwrap();
        let codec = Arc::new(TokenCodec::new(&AuthConfig::with_secret(
            "guard-test-signing-key-0123456789abcdef",
        )));
        let token = codec.issue_default(&teacher.id).unwrap();
        (IdentityResolver::new(codec, Arc::new(db)), token, teacher.id)
    }

    #[tokio::test]
    async fn test_optional_identity_tolerates_garbage() {
        let (resolver, _, _) = setup().await;
        let filter = optional_identity(resolver);

        let identity = warp::test::request()
            .header("authorization", "Bearer not-a-token")
            .filter(&filter)
            .await
            .unwrap();
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn test_require_identity_reads_cookie_and_header() {
        let (resolver, token, teacher_id) = setup().await;
        let filter = require_identity(resolver);

        let from_header = warp::test::request()
            .header("authorization", format!("Bearer {}", token))
            .filter(&filter)
            .await
            .unwrap();
        assert_eq!(from_header.id, teacher_id);

        let from_cookie = warp::test::request()
            .header("cookie", format!("{}={}", AUTH_COOKIE_NAME, token))
            .filter(&filter)
            .await
            .unwrap();
        assert_eq!(from_cookie.id, teacher_id);

        assert!(warp::test::request().filter(&filter).await.is_err());
    }

    #[tokio::test]
    async fn test_require_role() {
        let (resolver, token, _) = setup().await;
        let header = format!("Bearer {}", token);

        let staff = require_role(resolver.clone(), &[UserRole::Teacher, UserRole::Admin]);
        assert!(warp::test::request()
            .header("authorization", header.as_str())
            .filter(&staff)
            .await
            .is_ok());

        let admin = require_role(resolver, &[UserRole::Admin]);
        let rejection = warp::test::request()
            .header("authorization", header.as_str())
            .filter(&admin)
            .await
            .unwrap_err();
        let err = rejection.find::<CourseHubError>().unwrap();
        assert!(matches!(err, CourseHubError::PermissionDenied(_)));
    }
}

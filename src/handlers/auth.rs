//! Registration, login and session endpoints

use serde::Deserialize;
use serde_json::json;
use warp::http::{header, StatusCode};
use warp::reply::{Reply, Response};
use warp::Rejection;

use super::{json_response, non_empty};
use crate::auth::password::{dummy_verify, hash_password, validate_password, verify_password};
use crate::auth::user::{Identity, UserRole};
use crate::constants::{AUTH_COOKIE_NAME, TOKEN_TYPE};
use crate::error::CourseHubError;
use crate::security_logger::{log_security_event, SecurityEvent};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `Set-Cookie` value carrying a fresh access token
fn session_cookie(token: &str, state: &AppState) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        AUTH_COOKIE_NAME,
        token,
        state.config.auth.token_ttl.as_secs()
    );
    if state.config.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the session cookie
fn cleared_cookie(state: &AppState) -> String {
    let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", AUTH_COOKIE_NAME);
    if state.config.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Token response shared by register and login
fn session_response(
    status: StatusCode,
    state: &AppState,
    identity: &Identity,
    message: Option<&str>,
) -> Result<Response, CourseHubError> {
    let token = state.codec().issue_default(&identity.id)?;
    let mut body = json!({
        "access_token": token,
        "token_type": TOKEN_TYPE,
        "user": identity,
    });
    if let Some(message) = message {
        body["message"] = json!(message);
    }

    let reply = warp::reply::with_status(warp::reply::json(&body), status);
    Ok(warp::reply::with_header(reply, header::SET_COOKIE, session_cookie(&token, state)).into_response())
}

/// POST /api/auth/register
pub async fn register(body: RegisterRequest, state: AppState) -> Result<Response, Rejection> {
    let (Some(email), Some(password), Some(name)) = (
        non_empty(body.email),
        body.password.filter(|p| !p.is_empty()),
        non_empty(body.name),
    ) else {
        return Err(CourseHubError::validation("Email, password, and name are required").into());
    };

    let role = match non_empty(body.role) {
        Some(role) => role.parse::<UserRole>()?,
        None => UserRole::Student,
    };
    validate_password(&password)?;

    let hash = hash_password(&password)?;
    let user = state.db.users().create(&email, &hash, &name, role).await?;
    log::info!("Registered {} user {}", user.role, user.id);

    let response = session_response(
        StatusCode::CREATED,
        &state,
        &user.identity(),
        Some("User created successfully"),
    )?;
    Ok(response)
}

/// POST /api/auth/login
pub async fn login(body: LoginRequest, state: AppState) -> Result<Response, Rejection> {
    let (Some(email), Some(password)) = (non_empty(body.email), body.password.filter(|p| !p.is_empty()))
    else {
        return Err(CourseHubError::validation("Email and password are required").into());
    };

    let credentials = match state.db.users().find_credentials(&email).await? {
        Some(credentials) => credentials,
        None => {
            dummy_verify(&password);
            log_security_event(SecurityEvent::AuthenticationFailed {
                email,
                reason: "unknown email".to_string(),
            });
            return Err(CourseHubError::InvalidCredentials.into());
        }
    };

    if !verify_password(&password, &credentials.password_hash) {
        log_security_event(SecurityEvent::AuthenticationFailed {
            email,
            reason: "wrong password".to_string(),
        });
        return Err(CourseHubError::InvalidCredentials.into());
    }

    log_security_event(SecurityEvent::AuthenticationSuccess {
        user_id: credentials.id.clone(),
    });

    let response = session_response(StatusCode::OK, &state, &credentials.identity(), None)?;
    Ok(response)
}

/// GET /api/auth/me
pub async fn me(identity: Identity) -> Result<Response, Rejection> {
    Ok(json_response(StatusCode::OK, &identity))
}

/// POST /api/auth/logout
///
/// Tokens are stateless; logging out only drops the browser's cookie.
pub async fn logout(state: AppState) -> Result<Response, Rejection> {
    let reply = warp::reply::json(&json!({ "message": "Logged out successfully" }));
    Ok(warp::reply::with_header(reply, header::SET_COOKIE, cleared_cookie(&state)).into_response())
}

//! Request handlers for the REST endpoints

pub mod auth;
pub mod comments;
pub mod courses;
pub mod enrollments;
pub mod files;
pub mod rejection;
pub mod users;

use serde::Serialize;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};

pub use rejection::handle_rejection;

/// Serialize `body` as JSON with the given status
pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

/// A trimmed, non-empty string field, if present
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

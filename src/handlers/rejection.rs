//! Rejection to JSON error mapping.
//!
//! Every failed route ends up here, so clients always get `{"error": ..., "details"?: ...}`.

use serde::Serialize;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reject;
use warp::reply::Reply;
use warp::Rejection;

use crate::error::CourseHubError;
use crate::security::with_api_security_headers;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

fn classify(err: &Rejection) -> (StatusCode, ErrorBody) {
    if err.is_not_found() {
        return (StatusCode::NOT_FOUND, ErrorBody::new("Not found"));
    }

    if let Some(e) = err.find::<CourseHubError>() {
        let status = e.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", e);
        }
        return (status, ErrorBody::new(e.public_message()));
    }

    if let Some(e) = err.find::<warp::body::BodyDeserializeError>() {
        return (
            StatusCode::BAD_REQUEST,
            ErrorBody::with_details("Invalid request body", e.to_string()),
        );
    }
    if err.find::<reject::InvalidQuery>().is_some() {
        return (StatusCode::BAD_REQUEST, ErrorBody::new("Invalid query parameters"));
    }
    if let Some(e) = err.find::<reject::InvalidHeader>() {
        return (StatusCode::BAD_REQUEST, ErrorBody::with_details("Invalid header", e.to_string()));
    }
    if err.find::<reject::PayloadTooLarge>().is_some() {
        return (StatusCode::PAYLOAD_TOO_LARGE, ErrorBody::new("Request body too large"));
    }
    if err.find::<reject::LengthRequired>().is_some() {
        return (StatusCode::LENGTH_REQUIRED, ErrorBody::new("Content-Length required"));
    }
    if err.find::<reject::UnsupportedMediaType>().is_some() {
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, ErrorBody::new("Unsupported media type"));
    }
    if err.find::<reject::MissingHeader>().is_some() {
        return (StatusCode::BAD_REQUEST, ErrorBody::new("Missing required header"));
    }
    if err.find::<reject::MethodNotAllowed>().is_some() {
        return (StatusCode::METHOD_NOT_ALLOWED, ErrorBody::new("Method not allowed"));
    }

    log::error!("Unhandled rejection: {:?}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new("An error occurred"))
}

/// Recover filter turning any rejection into a JSON error reply
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = classify(&err);
    let reply = warp::reply::with_status(warp::reply::json(&body), status);
    Ok(with_api_security_headers(reply))
}

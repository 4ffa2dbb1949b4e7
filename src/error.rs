use std::error::Error;
use std::fmt;

use warp::http::StatusCode;

#[derive(Debug)]
pub enum CourseHubError {
    // Request errors
    ValidationError(String),

    // Auth errors
    AuthenticationRequired,
    InvalidCredentials,
    PermissionDenied(String),

    // Resource errors
    NotFound(String),
    Conflict(String),

    // Storage errors
    StorageError(String),
    BlobError(String),

    // Token errors
    TokenError(String),

    // Configuration errors
    ConfigError(String),
}

impl CourseHubError {
    /// HTTP status reported for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationRequired | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::StorageError(_)
            | Self::BlobError(_)
            | Self::TokenError(_)
            | Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that is safe to hand back to a client.
    ///
    /// Server-side failures collapse to a generic message; their details only go to the log.
    pub fn public_message(&self) -> String {
        match self {
            Self::ValidationError(msg) => msg.clone(),
            Self::AuthenticationRequired => "Authentication required".to_string(),
            Self::InvalidCredentials => "Invalid credentials".to_string(),
            Self::PermissionDenied(msg) => msg.clone(),
            Self::NotFound(msg) => msg.clone(),
            Self::Conflict(msg) => msg.clone(),
            _ => "An error occurred".to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl fmt::Display for CourseHubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::AuthenticationRequired => write!(f, "Authentication required"),
            Self::InvalidCredentials => write!(f, "Invalid credentials"),
            Self::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::Conflict(msg) => write!(f, "Conflict: {}", msg),
            Self::StorageError(msg) => write!(f, "Storage error: {}", msg),
            Self::BlobError(msg) => write!(f, "Blob storage error: {}", msg),
            Self::TokenError(msg) => write!(f, "Token error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for CourseHubError {}

impl warp::reject::Reject for CourseHubError {}

// Unique constraint violations surface as conflicts; everything else is a storage failure
impl From<sqlx::Error> for CourseHubError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return CourseHubError::Conflict("Resource already exists".to_string());
            }
            if db_err.is_foreign_key_violation() {
                return CourseHubError::NotFound("Referenced resource not found".to_string());
            }
        }
        CourseHubError::StorageError(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for CourseHubError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        CourseHubError::StorageError(format!("Migration failed: {}", err))
    }
}

impl From<std::io::Error> for CourseHubError {
    fn from(err: std::io::Error) -> Self {
        CourseHubError::BlobError(err.to_string())
    }
}

// Generic result type for Course Hub
pub type Result<T> = std::result::Result<T, CourseHubError>;

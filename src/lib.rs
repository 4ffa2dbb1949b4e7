//! Course Hub - a learning-management REST backend implemented in Rust
//!
//! This library provides token authentication, role-based access control and
//! the course, enrollment, file and comment endpoints built on top of them.

pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod security;
pub mod security_logger;
pub mod server;
pub mod storage;

// Re-export main components
pub use config::*;
pub use constants::*;
pub use error::{CourseHubError, Result};
pub use routes::routes;
pub use server::AppState;

//! Persistence: the SQLite-backed relational store and the upload blob store

pub mod blob;
pub mod comments;
pub mod courses;
pub mod database;
pub mod enrollments;
pub mod files;
pub mod pagination;
pub mod traits;
pub mod users;

// Re-export the store handles
pub use blob::LocalBlobStore;
pub use database::Database;
pub use pagination::{ListQuery, Pagination};
pub use traits::{BlobStore, CredentialStore, StoredCredentials};

//! Abstract storage interfaces for the collaborators the auth layer depends on
//!
//! The identity resolver only needs a read path into the users table, and uploads
//! only need save/delete against some blob backend. Both sit behind traits so the
//! core can be exercised against in-memory fakes.

use async_trait::async_trait;

use crate::auth::user::{Identity, UserRole};
use crate::error::Result;

/// Credential row used by the login flow
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
}

impl StoredCredentials {
    pub fn identity(&self) -> Identity {
        Identity::new(
            self.id.clone(),
            self.email.clone(),
            self.name.clone(),
            self.role,
        )
    }
}

/// Read contract over the users table
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the identity snapshot for a user id
    async fn find_identity(&self, user_id: &str) -> Result<Option<Identity>>;

    /// Look up login credentials by email
    async fn find_credentials(&self, email: &str) -> Result<Option<StoredCredentials>>;
}

/// Save/delete-by-path contract for uploaded course files
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `data` under `name` and return the public URL it is served from
    async fn save(&self, name: &str, data: &[u8]) -> Result<String>;

    /// Remove the blob behind a public URL; `Ok(false)` if nothing was there
    async fn delete(&self, url: &str) -> Result<bool>;

    /// Whether a public URL points into this store
    fn owns(&self, url: &str) -> bool;
}

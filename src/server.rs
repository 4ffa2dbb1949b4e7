//! Shared application state handed to every route

use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

use crate::auth::{IdentityResolver, TokenCodec};
use crate::config::ServerConfig;
use crate::constants::UPLOAD_URL_PREFIX;
use crate::storage::{BlobStore, Database, LocalBlobStore};

/// Handles to the collaborators a request may touch.
///
/// Everything here is immutable after startup or internally synchronized (the pool).
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub blobs: Arc<dyn BlobStore>,
    pub resolver: IdentityResolver,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the state from configuration, storing uploads on the local filesystem
    pub fn new(config: ServerConfig, db: Database) -> Self {
        let blobs = Arc::new(LocalBlobStore::new(
            config.upload_dir.clone(),
            UPLOAD_URL_PREFIX,
        ));
        Self::with_blob_store(config, db, blobs)
    }

    pub fn with_blob_store(config: ServerConfig, db: Database, blobs: Arc<dyn BlobStore>) -> Self {
        let codec = Arc::new(TokenCodec::new(&config.auth));
        let resolver = IdentityResolver::new(codec, Arc::new(db.clone()));
        Self {
            db,
            blobs,
            resolver,
            config: Arc::new(config),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        self.resolver.codec()
    }
}

/// Helper function to include the application state in a request
pub fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

//! Relational store handle.
//!
//! Async SQLite access through SQLx. Every repository borrows the shared pool;
//! connections go back to the pool when the query or transaction guard drops,
//! including on early returns and errors.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::comments::CommentRepository;
use super::courses::CourseRepository;
use super::enrollments::EnrollmentRepository;
use super::files::FileRepository;
use super::traits::{CredentialStore, StoredCredentials};
use super::users::UserRepository;
use crate::auth::user::Identity;
use crate::error::Result;

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connection acquire timeout - bounds how long a request waits for the pool.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Maximum time a file-backed connection can remain idle before being closed.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Open (or create) the database and apply migrations.
    pub async fn connect(path: &str) -> Result<Self> {
        let pool = if path == ":memory:" {
            // Each in-memory database gets a unique shared-cache name so parallel
            // tests never see each other's rows.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let memdb_uri = format!(
                "file:coursehub-memdb-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            );

            let options = SqliteConnectOptions::new()
                .filename(&memdb_uri)
                .shared_cache(true)
                .create_if_missing(true)
                .foreign_keys(true);

            // The database lives only while a connection is open, so keep exactly one alive
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        log::warn!("Failed to create database directory {}: {}", parent.display(), e);
                    }
                }
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .foreign_keys(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .busy_timeout(Self::ACQUIRE_TIMEOUT);

            SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        };

        log::info!("Database connected: {}", path);

        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("Database migrations checked/applied");

        Ok(Self { pool })
    }

    /// Get reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.pool)
    }

    pub fn courses(&self) -> CourseRepository<'_> {
        CourseRepository::new(&self.pool)
    }

    pub fn files(&self) -> FileRepository<'_> {
        FileRepository::new(&self.pool)
    }

    pub fn enrollments(&self) -> EnrollmentRepository<'_> {
        EnrollmentRepository::new(&self.pool)
    }

    pub fn comments(&self) -> CommentRepository<'_> {
        CommentRepository::new(&self.pool)
    }

    /// Cheap liveness probe
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

#[async_trait]
impl CredentialStore for Database {
    async fn find_identity(&self, user_id: &str) -> Result<Option<Identity>> {
        self.users().find_identity(user_id).await
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<StoredCredentials>> {
        self.users().find_credentials(email).await
    }
}

//! Local filesystem blob store for uploaded course files.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::traits::BlobStore;
use crate::error::Result;

/// Longest file extension kept from an uploaded file name
const MAX_EXTENSION_LEN: usize = 16;

/// Writes blobs into one directory and serves them under a fixed URL prefix
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Generated storage name: a fresh UUID plus the original extension, if it is sane
    fn storage_name(original: &str) -> String {
        let extension = Path::new(original)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| {
                !ext.is_empty()
                    && ext.len() <= MAX_EXTENSION_LEN
                    && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .map(|ext| ext.to_ascii_lowercase());

        match extension {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        }
    }

    /// Map a public URL back to a path inside the root, refusing anything that escapes it
    fn path_for(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(&self.url_prefix)?.strip_prefix('/')?;
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return None;
        }
        Some(self.root.join(name))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(&self, name: &str, data: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.root).await?;

        let stored = Self::storage_name(name);
        tokio::fs::write(self.root.join(&stored), data).await?;
        log::debug!("Stored upload {} as {} ({} bytes)", name, stored, data.len());

        Ok(format!("{}/{}", self.url_prefix, stored))
    }

    async fn delete(&self, url: &str) -> Result<bool> {
        let Some(path) = self.path_for(url) else {
            return Ok(false);
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn owns(&self, url: &str) -> bool {
        self.path_for(url).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "/static/uploads");

        let url = store.save("Lecture 1.PDF", b"%PDF-1.4").await.unwrap();
        assert!(url.starts_with("/static/uploads/"));
        assert!(url.ends_with(".pdf"));
        assert!(store.owns(&url));

        let name = url.rsplit('/').next().unwrap();
        assert_eq!(std::fs::read(dir.path().join(name)).unwrap(), b"%PDF-1.4");

        assert!(store.delete(&url).await.unwrap());
        assert!(!store.delete(&url).await.unwrap());
    }

    #[tokio::test]
    async fn test_foreign_urls_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "/static/uploads/");

        assert!(!store.owns("https://example.com/video.mp4"));
        assert!(!store.owns("/static/uploads/../secret.txt"));
        assert!(!store.owns("/static/uploads/"));
        assert!(!store.delete("/course-discussion").await.unwrap());
    }

    #[test]
    fn test_storage_name_sanitizes_extension() {
        assert!(LocalBlobStore::storage_name("notes.md").ends_with(".md"));
        assert!(!LocalBlobStore::storage_name("noext").contains('.'));
        assert!(!LocalBlobStore::storage_name("weird.p$f").contains('.'));
    }
}

//! Content-addressable blob storage keyed by media-root-relative paths.
//!
//! The rest of the service talks to [`BlobStore`] so tests can swap the
//! backing directory; [`LocalStore`] is the filesystem implementation.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Path-keyed binary storage.
///
/// All paths are relative to the store root. Writes create intermediate
/// directories as needed.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write bytes, fully overwriting any existing file.
    async fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()>;

    /// Read a file, failing if it does not exist.
    async fn read(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Read a file, returning `None` if it does not exist.
    async fn try_read(&self, path: &str) -> io::Result<Option<Vec<u8>>>;

    /// Move a file within the store.
    async fn move_file(&self, from: &str, to: &str) -> io::Result<()>;

    /// Whether a file exists.
    async fn exists(&self, path: &str) -> bool;

    /// Remove a file if present.
    async fn remove(&self, path: &str) -> io::Result<()>;

    /// Remove a directory tree if present.
    async fn remove_dir(&self, path: &str) -> io::Result<()>;

    /// Resolve a relative path against the store root.
    fn resolve(&self, path: &str) -> PathBuf;
}

/// Filesystem store rooted at the configured media directory.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStore { root: root.into() }
    }

    async fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        let full = self.resolve(path);
        self.ensure_parent(&full).await?;
        tokio::fs::write(&full, bytes).await
    }

    async fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.resolve(path)).await
    }

    async fn try_read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.resolve(path)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn move_file(&self, from: &str, to: &str) -> io::Result<()> {
        let dest = self.resolve(to);
        self.ensure_parent(&dest).await?;
        tokio::fs::rename(self.resolve(from), dest).await
    }

    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(self.resolve(path)).await.unwrap_or(false)
    }

    async fn remove(&self, path: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.resolve(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn remove_dir(&self, path: &str) -> io::Result<()> {
        match tokio::fs::remove_dir_all(self.resolve(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

//! Storage and File System Abstractions
//!
//! Provides a platform-agnostic trait for the directory operations the
//! library core performs under its root folder.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::platform::PlatformSendSync;

/// File metadata information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// Abstracts directory operations so the core can run against:
/// - Desktop: direct filesystem access through `tokio::fs`
/// - Network or mounted storage with its own latency and failure modes
/// - Test doubles
///
/// Implementations must surface OS failures as [`BridgeError::Io`] with the
/// original error preserved.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn ensure_root(fs: &dyn FileSystemAccess, root: &Path) -> Result<()> {
///     if !fs.exists(root).await? {
///         fs.create_dir_all(root).await?;
///     }
///     Ok(())
/// }
/// ```
///
/// [`BridgeError::Io`]: crate::error::BridgeError::Io
#[async_trait]
pub trait FileSystemAccess: PlatformSendSync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Rename a file or directory, moving everything it contains
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Delete a directory and all its contents
    async fn delete_dir_all(&self, path: &Path) -> Result<()>;

    /// Check that `path` exists and is a directory
    async fn is_directory(&self, path: &Path) -> Result<bool> {
        if !self.exists(path).await? {
            return Ok(false);
        }
        Ok(self.metadata(path).await?.is_directory)
    }
}

//! # Library Folder Store
//!
//! Creates, renames and deletes the on-disk folder of each library under a
//! single configured root. Library names go through
//! [`normalize`](crate::normalize::normalize) before touching the filesystem,
//! so callers never build paths from raw names.
//!
//! ## Error model
//!
//! Expected conditions come back as typed [`FolderError`] values:
//! - `ArgumentNullOrEmpty` - root or name missing (validation)
//! - `UnknownFolder` - the folder to move or delete is not there (state)
//! - `AlreadyExistingFolder` - the rename target is taken (state)
//!
//! Unexpected filesystem failures are returned as `FileSystem`, and a
//! cancelled operation as `Cancelled`.
//!
//! ## Concurrency
//!
//! The existence checks in `move_folder` and `delete` are not locked. Two
//! callers racing on the same folder get `UnknownFolder` or
//! `AlreadyExistingFolder` rather than a silent overwrite: a rename that fails
//! after the checks is re-examined and reported with the matching state error.

use crate::error::ErrorCategory;
use crate::normalize::{is_unusable_folder_name, normalize};
use bridge_traits::error::BridgeError;
use bridge_traits::storage::FileSystemAccess;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const SEPARATORS: [char; 2] = ['/', '\\'];

#[derive(Error, Debug)]
pub enum FolderError {
    #[error("Argument is null or empty: {0}")]
    ArgumentNullOrEmpty(&'static str),

    #[error("Folder does not exist: {}", .0.display())]
    UnknownFolder(PathBuf),

    #[error("Folder already exists: {}", .0.display())]
    AlreadyExistingFolder(PathBuf),

    #[error("Folder operation was cancelled")]
    Cancelled,

    #[error("File system error: {0}")]
    FileSystem(#[from] BridgeError),
}

impl FolderError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FolderError::ArgumentNullOrEmpty(_) => ErrorCategory::Validation,
            FolderError::UnknownFolder(_) | FolderError::AlreadyExistingFolder(_) => {
                ErrorCategory::State
            }
            FolderError::Cancelled => ErrorCategory::Cancelled,
            FolderError::FileSystem(_) => ErrorCategory::Environment,
        }
    }
}

pub type Result<T> = std::result::Result<T, FolderError>;

/// Filesystem side of the library lifecycle.
#[derive(Clone)]
pub struct LibraryFolderStore {
    root_path: String,
    fs: Arc<dyn FileSystemAccess>,
}

impl std::fmt::Debug for LibraryFolderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryFolderStore")
            .field("root_path", &self.root_path)
            .field("fs", &"FileSystemAccess { ... }")
            .finish()
    }
}

impl LibraryFolderStore {
    /// Create a store rooted at `root_path`.
    ///
    /// An empty root is accepted here and reported by every operation as
    /// `ArgumentNullOrEmpty`.
    pub fn new(root_path: impl Into<String>, fs: Arc<dyn FileSystemAccess>) -> Self {
        Self {
            root_path: root_path.into(),
            fs,
        }
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Absolute path of the folder for library `name`.
    pub fn folder_path(&self, name: &str) -> Result<PathBuf> {
        let root = self.trimmed_root()?;
        let folder = normalize(name);
        if is_unusable_folder_name(&folder) {
            return Err(FolderError::ArgumentNullOrEmpty("name"));
        }
        Ok(Path::new(root).join(folder))
    }

    /// Whether the folder for `name` is present as a directory.
    pub async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.folder_path(name)?;
        Ok(self.fs.is_directory(&path).await?)
    }

    /// Create the folder for `name`, including missing parents.
    ///
    /// Creating a folder that already exists succeeds.
    pub async fn create(&self, name: &str) -> Result<()> {
        self.create_with_cancellation(name, &CancellationToken::new())
            .await
    }

    /// [`Self::create`] that gives up when `cancel` fires.
    ///
    /// # Cancellation
    /// `Cancelled` only means the call stopped waiting. The filesystem may
    /// already have applied the change, so callers re-check the folder
    /// (for example with [`Self::exists`]) before acting on the outcome.
    pub async fn create_with_cancellation(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let path = self.folder_path(name)?;
        guarded(cancel, self.fs.create_dir_all(&path)).await?;
        info!(path = ?path, "Created library folder");
        Ok(())
    }

    /// Rename the folder of `old_name` to the folder of `new_name`.
    ///
    /// Never overwrites: fails with `AlreadyExistingFolder` when the target
    /// exists, leaving both folders untouched.
    pub async fn move_folder(&self, old_name: &str, new_name: &str) -> Result<()> {
        self.move_folder_with_cancellation(old_name, new_name, &CancellationToken::new())
            .await
    }

    /// [`Self::move_folder`] that gives up when `cancel` fires.
    ///
    /// # Cancellation
    /// `Cancelled` only means the call stopped waiting. The filesystem may
    /// already have applied the change, so callers re-check the folder
    /// (for example with [`Self::exists`]) before acting on the outcome.
    pub async fn move_folder_with_cancellation(
        &self,
        old_name: &str,
        new_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let source = self.folder_path(old_name)?;
        let target = self.folder_path(new_name)?;

        if !guarded(cancel, self.fs.is_directory(&source)).await? {
            return Err(FolderError::UnknownFolder(source));
        }
        if guarded(cancel, self.fs.exists(&target)).await? {
            return Err(FolderError::AlreadyExistingFolder(target));
        }

        if let Err(err) = guarded(cancel, self.fs.rename(&source, &target)).await {
            return Err(self.explain_failed_move(err, source, target).await);
        }

        info!(from = ?source, to = ?target, "Moved library folder");
        Ok(())
    }

    /// Recursively delete the folder of `name`.
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.delete_with_cancellation(name, &CancellationToken::new())
            .await
    }

    /// [`Self::delete`] that gives up when `cancel` fires.
    ///
    /// # Cancellation
    /// `Cancelled` only means the call stopped waiting. The filesystem may
    /// already have applied the change, so callers re-check the folder
    /// (for example with [`Self::exists`]) before acting on the outcome.
    pub async fn delete_with_cancellation(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let path = self.folder_path(name)?;

        if !guarded(cancel, self.fs.is_directory(&path)).await? {
            return Err(FolderError::UnknownFolder(path));
        }

        match guarded(cancel, self.fs.delete_dir_all(&path)).await {
            Ok(()) => {}
            Err(FolderError::FileSystem(err))
                if err.io_kind() == Some(std::io::ErrorKind::NotFound) =>
            {
                return Err(FolderError::UnknownFolder(path));
            }
            Err(err) => return Err(err),
        }

        info!(path = ?path, "Deleted library folder");
        Ok(())
    }

    fn trimmed_root(&self) -> Result<&str> {
        if self.root_path.is_empty() {
            return Err(FolderError::ArgumentNullOrEmpty("root_path"));
        }
        let trimmed = self.root_path.trim_end_matches(SEPARATORS);
        if trimmed.is_empty() {
            // The root is the filesystem root itself ("/").
            return Ok(&self.root_path[..1]);
        }
        Ok(trimmed)
    }

    /// Map a rename failure caused by a concurrent caller onto the state
    /// errors the checks would have reported.
    async fn explain_failed_move(
        &self,
        err: FolderError,
        source: PathBuf,
        target: PathBuf,
    ) -> FolderError {
        if !matches!(err, FolderError::FileSystem(_)) {
            return err;
        }
        match self.fs.exists(&source).await {
            Ok(false) => return FolderError::UnknownFolder(source),
            Ok(true) | Err(_) => {}
        }
        match self.fs.exists(&target).await {
            Ok(true) => {
                debug!(to = ?target, "Rename target appeared concurrently");
                FolderError::AlreadyExistingFolder(target)
            }
            Ok(false) | Err(_) => err,
        }
    }
}

/// Run a filesystem call unless `cancel` fires first.
///
/// The call is dropped, not rolled back, when `cancel` wins.
async fn guarded<T, F>(cancel: &CancellationToken, call: F) -> Result<T>
where
    F: Future<Output = bridge_traits::error::Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(FolderError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FolderError::Cancelled),
        result = call => result.map_err(FolderError::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_desktop::TokioFileSystem;
    use bridge_traits::storage::FileMetadata;
    use mockall::mock;
    use tempfile::TempDir;

    mock! {
        pub Fs {}

        #[async_trait]
        impl FileSystemAccess for Fs {
            async fn exists(&self, path: &Path) -> bridge_traits::error::Result<bool>;
            async fn metadata(&self, path: &Path) -> bridge_traits::error::Result<FileMetadata>;
            async fn create_dir_all(&self, path: &Path) -> bridge_traits::error::Result<()>;
            async fn rename(&self, from: &Path, to: &Path) -> bridge_traits::error::Result<()>;
            async fn delete_dir_all(&self, path: &Path) -> bridge_traits::error::Result<()>;
        }
    }

    fn dir_metadata() -> FileMetadata {
        FileMetadata {
            size: 0,
            created_at: None,
            modified_at: None,
            is_directory: true,
        }
    }

    fn store_in(temp: &TempDir) -> LibraryFolderStore {
        LibraryFolderStore::new(
            temp.path().to_string_lossy().into_owned(),
            Arc::new(TokioFileSystem::new()),
        )
    }

    #[tokio::test]
    async fn test_create_normalizes_name() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.create("Les Géants").await.unwrap();
        assert!(temp.path().join("LES GEANTS").is_dir());
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.create("Comics").await.unwrap();
        store.create("comics").await.unwrap();
        assert!(temp.path().join("COMICS").is_dir());
    }

    #[tokio::test]
    async fn test_create_builds_missing_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("deep").join("root");
        let store = LibraryFolderStore::new(
            root.to_string_lossy().into_owned(),
            Arc::new(TokioFileSystem::new()),
        );

        store.create("Manga").await.unwrap();
        assert!(root.join("MANGA").is_dir());
    }

    #[tokio::test]
    async fn test_empty_arguments_rejected() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        let rootless = LibraryFolderStore::new("", Arc::new(TokioFileSystem::new()));

        assert!(matches!(
            store.create("").await,
            Err(FolderError::ArgumentNullOrEmpty("name"))
        ));
        assert!(matches!(
            store.create("..").await,
            Err(FolderError::ArgumentNullOrEmpty("name"))
        ));
        assert!(matches!(
            rootless.create("Comics").await,
            Err(FolderError::ArgumentNullOrEmpty("root_path"))
        ));
        assert!(matches!(
            store.move_folder("Comics", "").await,
            Err(FolderError::ArgumentNullOrEmpty("name"))
        ));
        assert!(matches!(
            store.move_folder("", "Comics").await,
            Err(FolderError::ArgumentNullOrEmpty("name"))
        ));
        assert!(matches!(
            rootless.delete("Comics").await,
            Err(FolderError::ArgumentNullOrEmpty("root_path"))
        ));
        assert!(matches!(
            store.delete("").await,
            Err(FolderError::ArgumentNullOrEmpty("name"))
        ));
    }

    #[test]
    fn test_folder_path_trims_root_separators() {
        let store = LibraryFolderStore::new("/srv/comics///", Arc::new(TokioFileSystem::new()));
        assert_eq!(
            store.folder_path("Spirou").unwrap(),
            PathBuf::from("/srv/comics/SPIROU")
        );

        let at_root = LibraryFolderStore::new("/", Arc::new(TokioFileSystem::new()));
        assert_eq!(at_root.folder_path("x").unwrap(), PathBuf::from("/X"));
    }

    #[tokio::test]
    async fn test_move_carries_contents() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.create("Les Géants").await.unwrap();
        std::fs::write(temp.path().join("LES GEANTS").join("tome-1.cbz"), b"pages").unwrap();

        store.move_folder("Les Géants", "Comics").await.unwrap();

        assert!(!temp.path().join("LES GEANTS").exists());
        let moved = temp.path().join("COMICS").join("tome-1.cbz");
        assert_eq!(std::fs::read(moved).unwrap(), b"pages");
    }

    #[tokio::test]
    async fn test_move_unknown_source() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let err = store.move_folder("Missing", "Comics").await.unwrap_err();
        assert!(matches!(err, FolderError::UnknownFolder(ref p) if p.ends_with("MISSING")));
        assert_eq!(err.category(), ErrorCategory::State);
        assert!(!temp.path().join("COMICS").exists());
    }

    #[tokio::test]
    async fn test_move_never_overwrites_target() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.create("Manga").await.unwrap();
        store.create("Comics").await.unwrap();
        std::fs::write(temp.path().join("COMICS").join("keep.txt"), b"mine").unwrap();

        let err = store.move_folder("Manga", "Comics").await.unwrap_err();
        assert!(matches!(err, FolderError::AlreadyExistingFolder(ref p) if p.ends_with("COMICS")));
        assert!(temp.path().join("MANGA").is_dir());
        assert_eq!(
            std::fs::read(temp.path().join("COMICS").join("keep.txt")).unwrap(),
            b"mine"
        );
    }

    #[tokio::test]
    async fn test_move_to_same_normalized_name_is_rejected() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.create("Comics").await.unwrap();
        let err = store.move_folder("Comics", "comics").await.unwrap_err();
        assert!(matches!(err, FolderError::AlreadyExistingFolder(_)));
        assert!(temp.path().join("COMICS").is_dir());
    }

    #[tokio::test]
    async fn test_delete_removes_tree() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.create("Comics").await.unwrap();
        std::fs::create_dir_all(temp.path().join("COMICS").join("a").join("b")).unwrap();
        store.delete("Comics").await.unwrap();
        assert!(!temp.path().join("COMICS").exists());
    }

    #[tokio::test]
    async fn test_delete_unknown_folder() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let err = store.delete("Comics").await.unwrap_err();
        assert!(matches!(err, FolderError::UnknownFolder(_)));
    }

    #[tokio::test]
    async fn test_delete_refuses_plain_file() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        std::fs::write(temp.path().join("COMICS"), b"not a folder").unwrap();

        let err = store.delete("Comics").await.unwrap_err();
        assert!(matches!(err, FolderError::UnknownFolder(_)));
        assert!(temp.path().join("COMICS").is_file());
    }

    #[tokio::test]
    async fn test_unexpected_io_error_propagates() {
        let mut fs = MockFs::new();
        fs.expect_create_dir_all().returning(|_| {
            Err(BridgeError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "denied",
            )))
        });
        let store = LibraryFolderStore::new("/srv/comics", Arc::new(fs));

        let err = store.create("Comics").await.unwrap_err();
        assert!(matches!(err, FolderError::FileSystem(_)));
        assert_eq!(err.category(), ErrorCategory::Environment);
    }

    #[tokio::test]
    async fn test_host_failures_are_not_state_errors() {
        let mut fs = MockFs::new();
        fs.expect_exists().returning(|_| Ok(true));
        fs.expect_metadata().returning(|_| Ok(dir_metadata()));
        fs.expect_delete_dir_all()
            .returning(|_| Err(BridgeError::OperationFailed("share went read-only".into())));
        fs.expect_create_dir_all()
            .returning(|_| Err(BridgeError::NotAvailable("no writable storage".into())));
        let store = LibraryFolderStore::new("/srv/comics", Arc::new(fs));

        let err = store.delete("Comics").await.unwrap_err();
        assert!(matches!(
            err,
            FolderError::FileSystem(BridgeError::OperationFailed(_))
        ));
        let err = store.create("Comics").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Environment);
    }

    #[tokio::test]
    async fn test_rename_race_reported_as_existing_target() {
        let mut fs = MockFs::new();
        let mut target_checks = 0;
        fs.expect_exists().returning(move |path| {
            if path.ends_with("COMICS") {
                target_checks += 1;
                // Absent during the pre-check, present once the rename failed.
                Ok(target_checks > 1)
            } else {
                Ok(true)
            }
        });
        fs.expect_metadata().returning(|_| Ok(dir_metadata()));
        fs.expect_rename().returning(|_, _| {
            Err(BridgeError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "directory not empty",
            )))
        });
        let store = LibraryFolderStore::new("/srv/comics", Arc::new(fs));

        let err = store.move_folder("Manga", "Comics").await.unwrap_err();
        assert!(matches!(err, FolderError::AlreadyExistingFolder(_)));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let mut fs = MockFs::new();
        fs.expect_create_dir_all().never();
        let store = LibraryFolderStore::new("/srv/comics", Arc::new(fs));
        let token = CancellationToken::new();
        token.cancel();

        let err = store
            .create_with_cancellation("Comics", &token)
            .await
            .unwrap_err();
        assert!(matches!(err, FolderError::Cancelled));
        assert_eq!(err.category(), ErrorCategory::Cancelled);
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_pending_call() {
        struct StalledFs;

        #[async_trait]
        impl FileSystemAccess for StalledFs {
            async fn exists(&self, _: &Path) -> bridge_traits::error::Result<bool> {
                std::future::pending().await
            }
            async fn metadata(&self, _: &Path) -> bridge_traits::error::Result<FileMetadata> {
                std::future::pending().await
            }
            async fn create_dir_all(&self, _: &Path) -> bridge_traits::error::Result<()> {
                std::future::pending().await
            }
            async fn rename(&self, _: &Path, _: &Path) -> bridge_traits::error::Result<()> {
                std::future::pending().await
            }
            async fn delete_dir_all(&self, _: &Path) -> bridge_traits::error::Result<()> {
                std::future::pending().await
            }
        }

        let store = LibraryFolderStore::new("/srv/comics", Arc::new(StalledFs));
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = store
            .delete_with_cancellation("Comics", &token)
            .await
            .unwrap_err();
        assert!(matches!(err, FolderError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_create_may_still_leave_folder() {
        // Creates the directory, then never reports back.
        struct AppliedThenStalledFs(TokioFileSystem);

        #[async_trait]
        impl FileSystemAccess for AppliedThenStalledFs {
            async fn exists(&self, path: &Path) -> bridge_traits::error::Result<bool> {
                self.0.exists(path).await
            }
            async fn metadata(&self, path: &Path) -> bridge_traits::error::Result<FileMetadata> {
                self.0.metadata(path).await
            }
            async fn create_dir_all(&self, path: &Path) -> bridge_traits::error::Result<()> {
                self.0.create_dir_all(path).await?;
                std::future::pending().await
            }
            async fn rename(&self, from: &Path, to: &Path) -> bridge_traits::error::Result<()> {
                self.0.rename(from, to).await
            }
            async fn delete_dir_all(&self, path: &Path) -> bridge_traits::error::Result<()> {
                self.0.delete_dir_all(path).await
            }
        }

        let temp = TempDir::new().unwrap();
        let store = LibraryFolderStore::new(
            temp.path().to_string_lossy().into_owned(),
            Arc::new(AppliedThenStalledFs(TokioFileSystem::new())),
        );
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = store
            .create_with_cancellation("Comics", &token)
            .await
            .unwrap_err();
        assert!(matches!(err, FolderError::Cancelled));
        assert!(store.exists("Comics").await.unwrap());
    }
}

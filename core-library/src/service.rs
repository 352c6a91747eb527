//! # Library Service
//!
//! Keeps the catalogue and the library folders in step. Every operation
//! touches the folder first and commits the catalogue second; when the commit
//! fails the folder change is undone so the two do not drift apart.

use crate::error::{LibraryError, Result};
use crate::models::Library;
use crate::query::LibraryQuery;
use crate::repositories::{LibraryRepository, PagedResult, SqliteLibraryRepository};
use crate::storage::{FolderError, LibraryFolderStore};
use crate::unit_of_work::AuditingUnitOfWork;
use bridge_traits::time::Clock;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const ENTITY: &str = "Library";

/// Page size limits applied to listing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            max_page_size: 200,
        }
    }
}

/// Create, rename, delete and list libraries.
#[derive(Clone)]
pub struct LibraryService {
    repository: SqliteLibraryRepository,
    folders: LibraryFolderStore,
    clock: Arc<dyn Clock>,
    limits: PageLimits,
}

impl LibraryService {
    pub fn new(
        repository: SqliteLibraryRepository,
        folders: LibraryFolderStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            folders,
            clock,
            limits: PageLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> PageLimits {
        self.limits
    }

    pub fn folders(&self) -> &LibraryFolderStore {
        &self.folders
    }

    /// First page with the configured default page size.
    pub fn first_page(&self) -> LibraryQuery {
        LibraryQuery::new(1, self.limits.default_page_size)
    }

    fn unit_of_work(&self) -> AuditingUnitOfWork<Library, SqliteLibraryRepository> {
        AuditingUnitOfWork::new(self.repository.clone(), Arc::clone(&self.clock))
    }

    /// Register a new library and create its folder.
    ///
    /// # Errors
    /// - `InvalidInput` when the name is blank or has no usable folder characters
    /// - `AlreadyExists` when another library maps to the same folder
    #[instrument(skip(self))]
    pub async fn create_library(&self, name: &str) -> Result<Library> {
        let library = Library::new(name);
        validate_name(&library)?;
        self.ensure_path_free(library.relative_path()).await?;

        let existed = self.folders.exists(name).await?;
        self.folders.create(name).await?;

        let mut uow = self.unit_of_work();
        uow.add(library.clone());
        if let Err(err) = uow.commit().await {
            if !existed && self.folder_unclaimed(&library, &err).await {
                if let Err(undo) = self.folders.delete(name).await {
                    warn!(error = %undo, "Failed to remove folder after rejected create");
                }
            }
            return Err(err);
        }

        let created = committed(&uow, &library.id)?;
        info!(id = %created.id, path = created.relative_path(), "Created library");
        Ok(created)
    }

    /// Give a library a new name, moving its folder when the folder name changes.
    #[instrument(skip(self))]
    pub async fn rename_library(&self, id: &str, new_name: &str) -> Result<Library> {
        let library = self.get_library(id).await?;
        let old_name = library.name().to_string();
        let old_path = library.relative_path().to_string();

        let mut renamed = library.clone();
        renamed.rename(new_name);
        validate_name(&renamed)?;

        let moves_folder = renamed.relative_path() != old_path;
        if moves_folder {
            self.ensure_path_free(renamed.relative_path()).await?;
            self.folders.move_folder(&old_name, new_name).await?;
        }

        let mut uow = self.unit_of_work();
        uow.attach(library);
        uow.modify(id, |l| l.rename(new_name));
        if let Err(err) = uow.commit().await {
            if moves_folder {
                if let Err(undo) = self.folders.move_folder(new_name, &old_name).await {
                    warn!(error = %undo, "Failed to move folder back after rejected rename");
                }
            }
            return Err(err);
        }

        let updated = committed(&uow, id)?;
        info!(id, from = %old_path, to = updated.relative_path(), "Renamed library");
        Ok(updated)
    }

    /// Remove a library and its folder.
    ///
    /// A folder that is already gone does not block removing the entry.
    #[instrument(skip(self))]
    pub async fn delete_library(&self, id: &str) -> Result<()> {
        let library = self.get_library(id).await?;

        match self.folders.delete(library.name()).await {
            Ok(()) => {}
            Err(FolderError::UnknownFolder(path)) => {
                warn!(path = ?path, "Library folder already missing");
            }
            Err(err) => return Err(err.into()),
        }

        let mut uow = self.unit_of_work();
        uow.remove(library);
        uow.commit().await?;

        info!(id, "Deleted library");
        Ok(())
    }

    pub async fn get_library(&self, id: &str) -> Result<Library> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::NotFound {
                entity_type: ENTITY.to_string(),
                id: id.to_string(),
            })
    }

    /// One page of libraries; the page size is capped at the configured maximum.
    pub async fn list_libraries(&self, query: &LibraryQuery) -> Result<PagedResult<Library>> {
        let mut query = query.clone();
        query.page_size = query.page_request().clamped(self.limits.max_page_size).page_size;
        self.repository.query(&query).await
    }

    /// Whether a folder created for `library` may be removed after its commit
    /// failed. A concurrent create of the same folder that won the commit owns
    /// the folder now, so it is left alone.
    async fn folder_unclaimed(&self, library: &Library, err: &LibraryError) -> bool {
        if matches!(err, LibraryError::AlreadyExists { .. }) {
            debug!(path = library.relative_path(), "Folder claimed by a concurrent create");
            return false;
        }
        match self
            .repository
            .find_by_relative_path(library.relative_path())
            .await
        {
            Ok(None) => true,
            Ok(Some(owner)) => owner.id == library.id,
            Err(lookup) => {
                warn!(error = %lookup, "Keeping folder, owner lookup failed");
                false
            }
        }
    }

    async fn ensure_path_free(&self, relative_path: &str) -> Result<()> {
        if self
            .repository
            .find_by_relative_path(relative_path)
            .await?
            .is_some()
        {
            return Err(LibraryError::AlreadyExists {
                entity_type: ENTITY.to_string(),
                key: relative_path.to_string(),
            });
        }
        Ok(())
    }
}

fn validate_name(library: &Library) -> Result<()> {
    library.validate().map_err(|message| LibraryError::InvalidInput {
        field: "name".to_string(),
        message,
    })
}

fn committed(
    uow: &AuditingUnitOfWork<Library, SqliteLibraryRepository>,
    id: &str,
) -> Result<Library> {
    uow.get(id).cloned().ok_or_else(|| LibraryError::NotFound {
        entity_type: ENTITY.to_string(),
        id: id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, create_test_pool, DatabaseConfig};
    use crate::error::ErrorCategory;
    use bridge_desktop::TokioFileSystem;
    use bridge_traits::time::ManualClock;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    struct Fixture {
        service: LibraryService,
        clock: Arc<ManualClock>,
        root: TempDir,
    }

    async fn fixture() -> Fixture {
        fixture_on(create_test_pool().await.unwrap())
    }

    fn fixture_on(pool: sqlx::SqlitePool) -> Fixture {
        let root = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ));
        let folders = LibraryFolderStore::new(
            root.path().to_string_lossy().to_string(),
            Arc::new(TokioFileSystem),
        );
        let service = LibraryService::new(
            SqliteLibraryRepository::new(pool),
            folders,
            clock.clone(),
        );
        Fixture {
            service,
            clock,
            root,
        }
    }

    #[tokio::test]
    async fn test_create_library_creates_folder_and_row() {
        let fx = fixture().await;

        let library = fx.service.create_library("Les Géants").await.unwrap();

        assert_eq!(library.relative_path(), "LES GEANTS");
        assert!(fx.root.path().join("LES GEANTS").is_dir());
        assert_eq!(library.created_on_utc(), Some(fx.clock.now()));
        assert_eq!(library.modified_on_utc(), None);

        let stored = fx.service.get_library(&library.id).await.unwrap();
        assert_eq!(stored, library);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_and_duplicate_names() {
        let fx = fixture().await;

        let blank = fx.service.create_library("   ").await.unwrap_err();
        assert_eq!(blank.category(), ErrorCategory::Validation);

        fx.service.create_library("Manga").await.unwrap();
        let duplicate = fx.service.create_library("mangà").await.unwrap_err();
        assert!(matches!(duplicate, LibraryError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_creates_keep_winner_folder() {
        for _ in 0..20 {
            let pool = create_pool(DatabaseConfig::in_memory().max_connections(1))
                .await
                .unwrap();
            let fx = fixture_on(pool);

            let (first, second) = tokio::join!(
                fx.service.create_library("Manga"),
                fx.service.create_library("Manga")
            );

            let (winner, loser) = match (first, second) {
                (Ok(winner), Err(loser)) | (Err(loser), Ok(winner)) => (winner, loser),
                other => panic!("expected exactly one create to win, got {other:?}"),
            };
            assert!(matches!(loser, LibraryError::AlreadyExists { .. }));
            assert!(fx.root.path().join("MANGA").is_dir());
            assert_eq!(fx.service.get_library(&winner.id).await.unwrap(), winner);
        }
    }

    #[tokio::test]
    async fn test_failed_commit_removes_only_its_own_folder() {
        let fx = fixture().await;
        let existing = fx.service.create_library("Manga").await.unwrap();

        // Same folder, different row: the commit is rejected by the unique path.
        let mut uow = fx.service.unit_of_work();
        uow.add(Library::new("mangà"));
        let err = uow.commit().await.unwrap_err();
        let rejected = Library::new("mangà");
        assert!(!fx.service.folder_unclaimed(&rejected, &err).await);

        let unrelated = LibraryError::InvalidInput {
            field: "name".to_string(),
            message: "rejected".to_string(),
        };
        assert!(!fx.service.folder_unclaimed(&rejected, &unrelated).await);
        assert!(fx.service.folder_unclaimed(&existing, &unrelated).await);
        assert!(fx.service.folder_unclaimed(&Library::new("Comics"), &unrelated).await);
        assert!(fx.root.path().join("MANGA").is_dir());
    }

    #[tokio::test]
    async fn test_rename_moves_folder_and_stamps_modified() {
        let fx = fixture().await;
        let library = fx.service.create_library("Les Géants").await.unwrap();
        std::fs::write(fx.root.path().join("LES GEANTS/issue-1.cbz"), b"pages").unwrap();

        fx.clock.advance(Duration::minutes(5));
        let renamed = fx.service.rename_library(&library.id, "Comics").await.unwrap();

        assert_eq!(renamed.relative_path(), "COMICS");
        assert!(!fx.root.path().join("LES GEANTS").exists());
        assert!(fx.root.path().join("COMICS/issue-1.cbz").is_file());
        assert_eq!(renamed.created_on_utc(), library.created_on_utc());
        assert_eq!(renamed.modified_on_utc(), Some(fx.clock.now()));
    }

    #[tokio::test]
    async fn test_rename_with_same_folder_only_updates_name() {
        let fx = fixture().await;
        let library = fx.service.create_library("comics").await.unwrap();

        let renamed = fx.service.rename_library(&library.id, "Comics").await.unwrap();

        assert_eq!(renamed.name(), "Comics");
        assert_eq!(renamed.relative_path(), "COMICS");
        assert!(fx.root.path().join("COMICS").is_dir());
    }

    #[tokio::test]
    async fn test_rename_onto_existing_library_fails() {
        let fx = fixture().await;
        let first = fx.service.create_library("First").await.unwrap();
        fx.service.create_library("Second").await.unwrap();

        let err = fx.service.rename_library(&first.id, "second").await.unwrap_err();

        assert!(matches!(err, LibraryError::AlreadyExists { .. }));
        assert!(fx.root.path().join("FIRST").is_dir());
    }

    #[tokio::test]
    async fn test_delete_library_removes_folder_and_row() {
        let fx = fixture().await;
        let library = fx.service.create_library("Archive").await.unwrap();

        fx.service.delete_library(&library.id).await.unwrap();

        assert!(!fx.root.path().join("ARCHIVE").exists());
        let err = fx.service.get_library(&library.id).await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_folder() {
        let fx = fixture().await;
        let library = fx.service.create_library("Archive").await.unwrap();
        std::fs::remove_dir(fx.root.path().join("ARCHIVE")).unwrap();

        fx.service.delete_library(&library.id).await.unwrap();
        assert!(fx.service.get_library(&library.id).await.is_err());
    }

    #[tokio::test]
    async fn test_list_clamps_page_size() {
        let fx = fixture().await;
        let service = fx.service.clone().with_limits(PageLimits {
            default_page_size: 2,
            max_page_size: 3,
        });
        for name in ["a", "b", "c", "d", "e"] {
            service.create_library(name).await.unwrap();
        }

        let page = service
            .list_libraries(&LibraryQuery::new(1, 100).with_sort("name", "asc"))
            .await
            .unwrap();
        assert_eq!(page.page_size, 3);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total_count, 5);

        let first = service.list_libraries(&service.first_page()).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(first.has_next_page());
    }
}

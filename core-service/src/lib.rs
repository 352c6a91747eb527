//! Core service façade and bootstrap helpers.
//!
//! Wires a [`CoreConfig`] into a ready-to-use library service: opens the
//! catalogue database, binds the folder store to the configured root and
//! hands both to [`LibraryService`]. Desktop apps enable the `desktop-shims`
//! feature (the default) so a tokio-backed filesystem is provided when none
//! is injected.

pub mod error;

pub use core_library::{Library, LibraryQuery, LibraryService, PagedResult};
pub use core_runtime::config::{CoreConfig, CoreConfigBuilder};
pub use error::{CoreError, Result};

use bridge_traits::error::BridgeError;
use bridge_traits::storage::FileSystemAccess;
use core_library::db::{create_pool, DatabaseConfig};
use core_library::{LibraryFolderStore, PageLimits, SqliteLibraryRepository};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    libraries: LibraryService,
}

impl CoreService {
    /// Validate `config`, open the database and assemble the services.
    ///
    /// The library root itself is not created here; it appears with the
    /// first library folder.
    ///
    /// # Errors
    /// - `Runtime` when the configuration is invalid
    /// - `InitializationFailed` when the library root exists but is not a directory
    /// - `Library` when the database cannot be opened or migrated
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let database = match &config.database_path {
            Some(path) => DatabaseConfig::new(path),
            None => DatabaseConfig::in_memory(),
        };
        ensure_root_usable(&config).await?;
        let pool = create_pool(database).await?;

        let folders =
            LibraryFolderStore::new(config.library_root.clone(), Arc::clone(&config.file_system));
        let libraries = LibraryService::new(
            SqliteLibraryRepository::new(pool),
            folders,
            Arc::clone(&config.clock),
        )
        .with_limits(PageLimits {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        });

        info!(
            library_root = %config.library_root,
            persistent = config.database_path.is_some(),
            "Core service ready"
        );

        Ok(Self {
            config: Arc::new(config),
            libraries,
        })
    }

    /// Library management operations.
    pub fn libraries(&self) -> &LibraryService {
        &self.libraries
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }
}

/// A missing root is fine; a root that is something other than a directory
/// would make every folder operation fail later.
async fn ensure_root_usable(config: &CoreConfig) -> Result<()> {
    let root = Path::new(&config.library_root);
    let unusable = |e: BridgeError| {
        CoreError::InitializationFailed(format!("library root {}: {e}", config.library_root))
    };
    if config.file_system.exists(root).await.map_err(unusable)?
        && !config.file_system.is_directory(root).await.map_err(unusable)?
    {
        return Err(CoreError::InitializationFailed(format!(
            "library root {} is not a directory",
            config.library_root
        )));
    }
    Ok(())
}

#[cfg(all(test, feature = "desktop-shims"))]
mod tests {
    use super::*;
    use bridge_traits::time::ManualClock;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_bootstrap_in_memory() {
        let root = TempDir::new().unwrap();
        let config = CoreConfig::builder()
            .library_root(root.path().to_string_lossy())
            .max_page_size(2)
            .default_page_size(2)
            .build()
            .unwrap();

        let core = CoreService::bootstrap(config).await.unwrap();
        let library = core.libraries().create_library("Les Géants").await.unwrap();

        assert!(root.path().join("LES GEANTS").is_dir());
        let page = core
            .libraries()
            .list_libraries(&LibraryQuery::new(1, 50))
            .await
            .unwrap();
        assert_eq!(page.page_size, 2);
        assert_eq!(page.items[0].id, library.id);
    }

    #[tokio::test]
    async fn test_bootstrap_persists_to_file() {
        let root = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap(),
        ));
        let build = || {
            CoreConfig::builder()
                .library_root(root.path().to_string_lossy())
                .database_path(data.path().join("shelf.db"))
                .clock(clock.clone())
                .build()
                .unwrap()
        };

        let created = CoreService::bootstrap(build())
            .await
            .unwrap()
            .libraries()
            .create_library("Comics")
            .await
            .unwrap();

        let reopened = CoreService::bootstrap(build()).await.unwrap();
        let loaded = reopened.libraries().get_library(&created.id).await.unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_invalid_config() {
        let mut config = CoreConfig::builder().library_root("/tmp/x").build().unwrap();
        config.max_page_size = 0;

        let result = CoreService::bootstrap(config).await;
        assert!(matches!(result, Err(CoreError::Runtime(_))));
    }

    #[tokio::test]
    async fn test_bootstrap_reports_unopenable_database() {
        let root = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();
        let config = CoreConfig::builder()
            .library_root(root.path().to_string_lossy())
            .database_path(data.path().join("missing").join("shelf.db"))
            .build()
            .unwrap();

        let result = CoreService::bootstrap(config).await;
        assert!(matches!(
            result,
            Err(CoreError::Library(core_library::LibraryError::Database(_)))
        ));
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_file_as_library_root() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        let config = CoreConfig::builder()
            .library_root(file.to_string_lossy())
            .build()
            .unwrap();

        let result = CoreService::bootstrap(config).await;
        assert!(matches!(result, Err(CoreError::InitializationFailed(_))));
    }

    #[tokio::test]
    async fn test_bootstrap_accepts_missing_library_root() {
        let temp = TempDir::new().unwrap();
        let config = CoreConfig::builder()
            .library_root(temp.path().join("later").to_string_lossy())
            .build()
            .unwrap();

        let core = CoreService::bootstrap(config).await.unwrap();
        core.libraries().create_library("Comics").await.unwrap();
        assert!(temp.path().join("later/COMICS").is_dir());
    }
}

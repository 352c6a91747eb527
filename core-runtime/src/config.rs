//! # Core Configuration Module
//!
//! Builds the [`CoreConfig`] the shelf core is bootstrapped from.
//!
//! ## Overview
//!
//! Configuration uses a builder with fail-fast validation: a missing library
//! root or inconsistent page sizes are reported by [`CoreConfigBuilder::build`]
//! before anything touches the disk.
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `FileSystemAccess` - folder operations (desktop default: tokio fs)
//! - `Clock` - audit timestamps (default: system clock)
//!
//! Without the `desktop-shims` feature a `FileSystemAccess` must be injected.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .library_root("/srv/comics")
//!     .database_path("/var/lib/shelf/shelf.db")
//!     .max_page_size(100)
//!     .build()?;
//! ```
//!
//! ## Environment
//!
//! [`CoreConfigBuilder::from_env`] reads:
//!
//! | Variable                  | Setting             |
//! |---------------------------|---------------------|
//! | `SHELF_LIBRARY_ROOT`      | `library_root`      |
//! | `SHELF_DATABASE_PATH`     | `database_path`     |
//! | `SHELF_DEFAULT_PAGE_SIZE` | `default_page_size` |
//! | `SHELF_MAX_PAGE_SIZE`     | `max_page_size`     |

use crate::error::{Error, Result};
use bridge_traits::storage::FileSystemAccess;
use bridge_traits::time::{Clock, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;

pub const ENV_LIBRARY_ROOT: &str = "SHELF_LIBRARY_ROOT";
pub const ENV_DATABASE_PATH: &str = "SHELF_DATABASE_PATH";
pub const ENV_DEFAULT_PAGE_SIZE: &str = "SHELF_DEFAULT_PAGE_SIZE";
pub const ENV_MAX_PAGE_SIZE: &str = "SHELF_MAX_PAGE_SIZE";

const DEFAULT_PAGE_SIZE: u32 = 25;
const MAX_PAGE_SIZE: u32 = 200;

/// Core configuration for the shelf core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Directory holding one folder per library
    pub library_root: String,

    /// SQLite database file; `None` keeps the catalogue in memory
    pub database_path: Option<PathBuf>,

    /// Page size used when a caller does not ask for one
    pub default_page_size: u32,

    /// Upper bound applied to every requested page size
    pub max_page_size: u32,

    pub file_system: Arc<dyn FileSystemAccess>,

    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("library_root", &self.library_root)
            .field("database_path", &self.database_path)
            .field("default_page_size", &self.default_page_size)
            .field("max_page_size", &self.max_page_size)
            .field("file_system", &"FileSystemAccess { ... }")
            .field("clock", &"Clock { ... }")
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// This checks:
    /// - Library root is not empty
    /// - Database path, when given, is not empty
    /// - Page sizes are non-zero and the default does not exceed the maximum
    pub fn validate(&self) -> Result<()> {
        if self.library_root.trim().is_empty() {
            return Err(Error::Config("Library root cannot be empty".to_string()));
        }

        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(Error::Config(
                "Page sizes must be greater than 0".to_string(),
            ));
        }

        if self.default_page_size > self.max_page_size {
            return Err(Error::Config(format!(
                "Default page size {} exceeds maximum page size {}",
                self.default_page_size, self.max_page_size
            )));
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    use bridge_desktop::TokioFileSystem;

    let fs: Arc<dyn FileSystemAccess> = Arc::new(TokioFileSystem);
    Ok(fs)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "FileSystemAccess implementation is required for library folders. \
                  Desktop: enable the 'desktop-shims' feature to use TokioFileSystem. \
                  Other hosts: inject one with .file_system()."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    library_root: Option<String>,
    database_path: Option<PathBuf>,
    default_page_size: Option<u32>,
    max_page_size: Option<u32>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CoreConfigBuilder {
    /// Start from the `SHELF_*` environment variables.
    ///
    /// Unset variables leave the setting untouched; unparsable page sizes
    /// are an `Error::Config`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::default();
        if let Some(root) = lookup(ENV_LIBRARY_ROOT) {
            builder = builder.library_root(root);
        }
        if let Some(path) = lookup(ENV_DATABASE_PATH).filter(|p| !p.trim().is_empty()) {
            builder = builder.database_path(path);
        }
        if let Some(size) = lookup(ENV_DEFAULT_PAGE_SIZE) {
            builder = builder.default_page_size(parse_page_size(ENV_DEFAULT_PAGE_SIZE, &size)?);
        }
        if let Some(size) = lookup(ENV_MAX_PAGE_SIZE) {
            builder = builder.max_page_size(parse_page_size(ENV_MAX_PAGE_SIZE, &size)?);
        }
        Ok(builder)
    }

    /// Sets the directory that holds the library folders (required).
    pub fn library_root(mut self, root: impl Into<String>) -> Self {
        self.library_root = Some(root.into());
        self
    }

    /// Persists the catalogue to a SQLite file instead of memory.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = Some(size);
        self
    }

    pub fn max_page_size(mut self, size: u32) -> Self {
        self.max_page_size = Some(size);
        self
    }

    /// Injects the filesystem used for library folders.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Injects the clock used for audit timestamps.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds and validates the final `CoreConfig`.
    pub fn build(self) -> Result<CoreConfig> {
        let library_root = self.library_root.ok_or_else(|| {
            Error::Config("Library root is required. Use .library_root() to set it.".to_string())
        })?;

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let config = CoreConfig {
            library_root,
            database_path: self.database_path,
            default_page_size: self.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            max_page_size: self.max_page_size.unwrap_or(MAX_PAGE_SIZE),
            file_system,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        config.validate()?;

        Ok(config)
    }
}

fn parse_page_size(variable: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{variable} must be a positive integer: {e}")))
}
